/// Crate-level error types for yiiref resolution and navigation.
use std::path::PathBuf;

/// Every failure carries the path or reference that caused it, so the CLI can
/// render a diagnostic without re-deriving context.
#[allow(clippy::error_impl_error, reason = "crate-level error type re-exported as yiiref::Error")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `.yiiref.toml` parsed but holds values the resolver cannot work with.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// Which key is wrong and why.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of CLI output failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// The path has no convention-directory segment (views or controllers)
    /// followed by the segments the convention requires.
    #[error("not under a `{expected}` directory: {}", path.display())]
    NotInConventionDirectory {
        /// The directory name that was looked for.
        expected: String,
        /// The offending path.
        path: PathBuf,
    },

    /// Every candidate for a controller or view file was probed and none exist.
    #[error("not found: {}", path.display())]
    ResourceNotFound {
        /// The first (preferred) candidate that was expected.
        path: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// A view reference is empty or its alias root is not a known namespace.
    #[error("unresolvable view reference `{reference}`: {reason}")]
    UnresolvableReference {
        /// Why resolution gave up.
        reason: String,
        /// The raw reference string as written in the render call.
        reference: String,
    },
}
