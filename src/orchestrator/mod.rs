mod assemble;
mod prompt;

use tracing::{info, warn};

use crate::llm::CompletionProvider;
use crate::search::{SearchError, SearchProvider};
use crate::store::{HistoryStore, Persistence};

pub const SOURCE_CACHE: &str = "cache";
pub const SOURCE_SEARCH: &str = "search";

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Try the cache first and return a hit without any network calls.
    /// A miss falls through to the full pipeline.
    pub quick: bool,
    /// Ask the models for a longer-form answer.
    pub detailed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    pub response: String,
    /// Which path produced the answer: `cache`, a model tag, or `search`.
    pub source: &'static str,
    pub search_results: Option<String>,
    pub model_used: Option<&'static str>,
    /// Set only on cache hits: when the cached answer was stored.
    pub cached_at: Option<String>,
}

/// Coordinates one query: cache check, search, primary completion, fallback
/// completion, response assembly, persistence. Only a search failure crosses
/// this boundary as an error; completion failures degrade the answer and
/// persistence failures are logged by the store.
pub struct Orchestrator<P> {
    search: Box<dyn SearchProvider>,
    primary: Box<dyn CompletionProvider>,
    fallback: Box<dyn CompletionProvider>,
    store: HistoryStore<P>,
}

impl<P: Persistence> Orchestrator<P> {
    pub fn new(
        search: Box<dyn SearchProvider>,
        primary: Box<dyn CompletionProvider>,
        fallback: Box<dyn CompletionProvider>,
        store: HistoryStore<P>,
    ) -> Self {
        Self {
            search,
            primary,
            fallback,
            store,
        }
    }

    pub async fn answer(
        &mut self,
        question: &str,
        opts: QueryOptions,
    ) -> Result<QueryOutcome, SearchError> {
        if opts.quick {
            if let Some(entry) = self.store.cached(question) {
                info!(question, "cache hit");
                return Ok(QueryOutcome {
                    response: entry.response.clone(),
                    source: SOURCE_CACHE,
                    search_results: None,
                    model_used: None,
                    cached_at: Some(entry.timestamp.clone()),
                });
            }
        }

        let search_results = self.search.search(question).await?;
        let prompt = prompt::build_prompt(question, &search_results, opts.detailed);

        let mut model_used = None;
        let mut model_answer = None;
        match self.primary.generate(&prompt).await {
            Ok(text) => {
                model_used = Some(self.primary.name());
                model_answer = Some(text);
            }
            Err(err) => {
                warn!(
                    model = self.primary.name(),
                    error = %err,
                    "primary completion failed, trying fallback"
                );
                match self.fallback.generate(&prompt).await {
                    Ok(text) => {
                        model_used = Some(self.fallback.name());
                        model_answer = Some(text);
                    }
                    Err(err) => {
                        warn!(
                            model = self.fallback.name(),
                            error = %err,
                            "fallback completion failed, using search results"
                        );
                    }
                }
            }
        }

        let response = match model_answer {
            Some(text) => text,
            None => assemble::derive_from_search(&search_results, question),
        };

        self.store.cache_response(question, &response);
        self.store.record(question, &response);

        Ok(QueryOutcome {
            response,
            source: model_used.unwrap_or(SOURCE_SEARCH),
            search_results: Some(search_results),
            model_used,
            cached_at: None,
        })
    }

    pub fn store(&self) -> &HistoryStore<P> {
        &self.store
    }
}
