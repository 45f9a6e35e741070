// SSHE — Library root
//
// Re-exports the cipher, store, query, selection, session, config and CLI
// modules.

pub mod cipher;
pub mod cli;
pub mod config;
pub mod error;
pub mod query;
pub mod select;
pub mod session;
pub mod store;

pub use error::{Result, SsheError};
