//! Report renderers for classification results.
//!
//! - [`terminal`] — summary box and tables; respects `--verbose` / `--quiet`.
//!
//! JSON output is the serialized [`Report`](crate::models::Report).

pub mod terminal;
