use std::path::PathBuf;

/// Run-level failures. Assertion mismatches are not errors; they are
/// reported per test through TAP.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A spec file that is not a valid extracted document.
    #[error("invalid spec JSON in {}: {source}", path.display())]
    InvalidSpec {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid replay config in {}: {source}", path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no target configured: pass --target or set `target` in the config file")]
    MissingTarget,

    /// The request never produced a response (connection refused, DNS,
    /// malformed header, ...).
    #[error("{method} {path}: {message}")]
    Transport {
        method: String,
        path: String,
        message: String,
    },
}
