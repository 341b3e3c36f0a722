//! Reply generation collaborator boundary.

mod base;
mod http;

pub use base::ReplyGenerator;
pub use http::HttpGenerator;
