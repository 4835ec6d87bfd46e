use thiserror::Error;

/// Library error type for loading the site configuration. Store and render
/// failures have their own types (`StoreError`, `anyhow::Error`) and are
/// handled at their boundaries instead of funneling through here.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}
