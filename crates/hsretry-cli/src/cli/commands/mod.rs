//! CLI command handlers.

mod request;

pub use request::run_request;
