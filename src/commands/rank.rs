use anyhow::Result;

use crate::shelf::config::load_config;
use crate::shelf::paths::resolve_paths;
use crate::shelf::serve::{self, RankedPage, RawRankRequest, resolve_request};
use crate::shelf::util::truncate_with_ellipsis;

#[derive(Debug, Clone, Default)]
pub struct RankOptions {
    pub rank: Option<String>,
    pub query: Option<String>,
    pub time_filter: Option<String>,
    pub page_number: Option<String>,
}

pub fn run(opts: &RankOptions) -> Result<RankedPage> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;

    let raw = RawRankRequest {
        rank: opts.rank.as_deref(),
        query: opts.query.as_deref(),
        time_filter: opts.time_filter.as_deref(),
        page_number: opts.page_number.as_deref(),
    };
    let request = resolve_request(&raw);
    serve::handle(&paths, &cfg, &request)
}

pub fn render_text(page: &RankedPage) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "rank={} query={:?} time_filter={:?} page={}\n",
        page.gvars.rank, page.gvars.search_query, page.gvars.time_filter, page.gvars.page_number
    ));
    if page.papers.is_empty() {
        out.push_str("(no papers)\n");
        return out;
    }
    for paper in &page.papers {
        out.push_str(&format!(
            "{:>10.3}  {}  [{}]  {}\n",
            paper.weight,
            paper.id,
            paper.time,
            truncate_with_ellipsis(&paper.title, 80)
        ));
        if !paper.authors.is_empty() {
            out.push_str(&format!(
                "            {}\n",
                truncate_with_ellipsis(&paper.authors, 100)
            ));
        }
    }
    out
}
