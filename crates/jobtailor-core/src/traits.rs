use std::future::Future;

use crate::error::AppError;
use crate::generate::{Completion, ExtractionRequest};

/// Fetches rendered markdown for a job-posting URL (via the reader proxy).
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Sends one chat-completion request to a model and returns the raw reply
/// content plus token usage. Implementations own retry/backoff for
/// throttling responses.
pub trait Completer: Send + Sync + Clone {
    fn complete(
        &self,
        request: &ExtractionRequest,
    ) -> impl Future<Output = Result<Completion, AppError>> + Send;
}
