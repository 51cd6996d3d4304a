//! Mock model client for dependency injection in unit tests. Uses
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::generate::{Completion, ExtractionRequest};
use crate::traits::Completer;

// ---------------------------------------------------------------------------
// MockCompleter
// ---------------------------------------------------------------------------

/// Mock completer that records every request and replays queued results.
#[derive(Clone)]
pub struct MockCompleter {
    responses: Arc<Mutex<Vec<Result<Completion, AppError>>>>,
    pub requests: Arc<Mutex<Vec<ExtractionRequest>>>,
}

impl MockCompleter {
    pub fn new(completion: Completion) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(completion)])),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_responses(responses: Vec<Result<Completion, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Completer for MockCompleter {
    async fn complete(&self, request: &ExtractionRequest) -> Result<Completion, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Completion {
                content: String::new(),
                total_tokens: 0,
            })
        } else {
            responses.remove(0)
        }
    }
}
