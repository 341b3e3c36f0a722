//! Speech recognition collaborator boundary.

mod base;
mod http;

pub use base::SpeechRecognizer;
pub use http::HttpRecognizer;
