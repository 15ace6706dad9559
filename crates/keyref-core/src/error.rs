use thiserror::Error;

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The embedded seed dataset could not be decoded.
    #[error("invalid seed dataset: {0}")]
    Seed(#[from] serde_json::Error),
}
