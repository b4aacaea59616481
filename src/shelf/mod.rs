pub mod audit;
pub mod config;
pub mod ingest;
pub mod normalize;
pub mod page;
pub mod paths;
pub mod rank;
pub mod record;
pub mod sanitize;
pub mod serve;
pub mod source;
pub mod stats;
pub mod store;
pub mod util;
pub mod warn;
