mod backoff;
pub mod fetcher;
pub mod llm;
#[cfg(test)]
mod testsupport;

pub use fetcher::ReaderFetcher;
pub use llm::ChatCompleter;
