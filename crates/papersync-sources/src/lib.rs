//! papersync sources: Notion database client and Semantic Scholar lookup.

pub mod error;
pub mod http;
pub mod sources;

pub use error::{Result, SourceError};
pub use http::HttpClient;
pub use sources::{NotionClient, S2Paper, SemanticScholarSource};
