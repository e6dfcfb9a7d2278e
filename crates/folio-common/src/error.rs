//! Error types shared by the folio crates.

use miette::Diagnostic;

/// Main error type for configuration and environment operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum FolioError {
    /// IO error
    #[error(transparent)]
    #[diagnostic(code(folio::io))]
    Io(#[from] std::io::Error),

    /// The config file is not valid KDL
    #[error(transparent)]
    #[diagnostic(code(folio::config::parse))]
    Kdl(#[from] kdl::KdlError),

    /// A config key holds a value of the wrong shape
    #[error("invalid value for config key `{key}`: {reason}")]
    #[diagnostic(
        code(folio::config::invalid_value),
        help("see `folio config --print-default` for the expected layout")
    )]
    InvalidConfig { key: String, reason: String },

    /// No platform config directory
    #[error("could not determine config directory")]
    #[diagnostic(code(folio::config::no_dir))]
    NoConfigDir,
}
