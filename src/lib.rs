pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod logging;
pub mod server;
pub mod service;
pub mod utils;

pub use error::{AppError, Result};
pub use extract::{ExtractionResult, ExtractionSchema, Extractor, FieldRule, SelectorPolicy};
pub use service::{CrawlRequest, CrawlResponse, CrawlService};
