//! License identification.
//!
//! - [`corpus`] — loads the reference templates a license text is compared with.
//! - [`locator`] — finds the license file governing a package directory.
//! - [`classifier`] — scores a license text against the corpus and applies
//!   the confidence threshold.

pub mod classifier;
pub mod corpus;
pub mod locator;
