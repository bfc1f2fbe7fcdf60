use std::path::PathBuf;

/// Failures while reading or writing the personal-bests store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed personal bests data: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode personal bests: {0}")]
    Encode(#[from] toml::ser::Error),
}
