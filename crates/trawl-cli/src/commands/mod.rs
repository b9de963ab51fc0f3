//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`extract`] - List the leaves of a nested archive
//! - [`search`] - Index archives and search their logs

pub mod extract;
pub mod search;

pub use extract::ExtractCommand;
pub use search::SearchCommand;
