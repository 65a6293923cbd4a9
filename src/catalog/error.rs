use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a catalog or resolving an album from it.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    /// No album carries the requested slug.
    #[error("no album with slug {0:?}")]
    AlbumNotFound(String),

    /// The album exists but has nothing to play.
    #[error("album {0:?} has no songs")]
    EmptyAlbum(String),
}
