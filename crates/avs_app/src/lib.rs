//! AVS application layer: file-backed stores and the inbound operations.
pub mod handlers;
pub mod persistence;
