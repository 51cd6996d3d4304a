pub mod classify;
pub mod document;
pub mod error;
pub mod generate;
pub mod node;
pub mod payload;
pub mod reply;
pub mod traits;

pub mod testutil;

pub use document::parse;
pub use error::AppError;
pub use generate::{TailorService, TailoredApplication};
pub use node::{Node, NodeType};
pub use reply::ReplyFormat;
pub use traits::{Completer, Fetcher};
