pub mod config;
pub mod error;
pub mod news_query;
pub mod types;

pub use config::Config;
pub use error::RadarError;
pub use news_query::{NewsQuery, NewsSort};
pub use types::*;
