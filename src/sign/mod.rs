//! Inline sign overrides read from the instance document.
pub mod handler;
pub mod instance;

pub use handler::{SignHandler, SignedValue};
pub use instance::{find_instance_document, resolve_instance};
