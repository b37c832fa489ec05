pub mod serper;

pub use serper::SerperClient;

use async_trait::async_trait;
use thiserror::Error;

/// A search failure is fatal to the whole query; it is the only error the
/// orchestrator lets cross its boundary.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search failed with status {status}")]
    Status { status: u16 },
    #[error("network error: unable to reach the search API")]
    Network(#[source] reqwest::Error),
    #[error("failed to decode search response")]
    Decode(#[source] reqwest::Error),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs one web search and returns the results as a formatted text block.
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}
