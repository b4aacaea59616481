use crate::shelf::record::PaperRecord;
use crate::shelf::source::{RawAuthors, RawPaper};

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Remove every run of whitespace that is followed by a standalone number,
/// e.g. the affiliation markers in `"Grace Hopper 1 13"`.
pub fn strip_footnote_markers(author: &str) -> String {
    let chars: Vec<char> = author.chars().collect();
    let mut out = String::with_capacity(author.len());
    let mut i = 0usize;

    while i < chars.len() {
        if !chars[i].is_whitespace() {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        let mut k = j;
        while k < chars.len() && chars[k].is_ascii_digit() {
            k += 1;
        }

        let standalone_number = k > j && (k == chars.len() || !is_word_char(chars[k]));
        if standalone_number {
            i = k;
            continue;
        }

        out.extend(&chars[i..j]);
        i = j;
    }

    out
}

/// Map a raw source row onto the corpus shape. Rows missing any required
/// field are dropped.
pub fn normalize(raw: RawPaper) -> Option<PaperRecord> {
    let RawPaper {
        authors: Some(authors),
        title: Some(title),
        doi: Some(id),
        year: Some(timestamp),
    } = raw
    else {
        return None;
    };

    let authors = match authors {
        RawAuthors::One(name) => vec![strip_footnote_markers(&name)],
        RawAuthors::Many(names) => names.iter().map(|n| strip_footnote_markers(n)).collect(),
    };

    Some(PaperRecord {
        authors,
        title,
        summary: String::new(),
        timestamp: timestamp.seconds(),
        id,
    })
}

/// Normalize a batch and order it newest first. Equal timestamps keep their
/// source order. Returns the records and the number of dropped rows.
pub fn normalize_batch(rows: Vec<RawPaper>) -> (Vec<PaperRecord>, usize) {
    let total = rows.len();
    let mut records = rows.into_iter().filter_map(normalize).collect::<Vec<_>>();
    let dropped = total - records.len();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    (records, dropped)
}
