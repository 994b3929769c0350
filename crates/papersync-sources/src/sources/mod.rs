pub mod notion;
pub mod semantic_scholar;

pub use notion::NotionClient;
pub use semantic_scholar::{S2Paper, SemanticScholarSource};
