use std::path::PathBuf;

use thiserror::Error;

/// Invalid user configuration. Always fatal, reported before any scanning.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("license named {key:?} override value {value:?} must be one of {allowed}")]
    InvalidOverrideValue {
        key: String,
        value: String,
        allowed: String,
    },

    #[error("malformed override {0:?}, expected <import path>=<license type>")]
    MalformedOverride(String),

    #[error("confidence threshold {0} must lie in [0, 1]")]
    ThresholdOutOfRange(f64),

    #[error("jobs must be at least 1")]
    InvalidJobs,

    #[error("disallowed license type {value:?} must be one of {allowed}")]
    InvalidDisallowedType { value: String, allowed: String },

    #[error("no license corpus configured; pass --corpus or set scan.corpus")]
    MissingCorpus,

    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// The reference corpus could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("reading corpus file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing corpus index {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("corpus entry {name:?} has invalid type {value:?}, must be one of {allowed}")]
    InvalidType {
        name: String,
        value: String,
        allowed: String,
    },

    #[error("corpus entry {0:?} is listed more than once")]
    Duplicate(String),

    #[error("corpus at {0} contains no license templates")]
    Empty(PathBuf),
}

/// Failure to build the import graph or to resolve a root package. Fatal.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("running `go list`: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("`go list` exited with {status}: {stderr}")]
    Command { status: String, stderr: String },

    #[error("reading package listing {path}: {source}")]
    ReadListing {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing package listing: {0}")]
    Listing(#[from] serde_json::Error),

    #[error("cannot resolve root package {path:?}: {source}")]
    RootUnresolved {
        path: String,
        #[source]
        source: LoadError,
    },
}

/// Failure to load a single package. Recorded per package for transitive imports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("package not found")]
    NotFound,

    #[error("{0}")]
    Failed(String),
}
