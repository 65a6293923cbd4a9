use super::error::CatalogError;

/// A single playable song. `duration` is in seconds and is `NaN` when unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub title: String,
    pub duration: f64,
    pub audio_src: String,
}

/// An immutable catalog entry. Song order is playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub slug: String,
    pub title: String,
    pub artist: String,
    pub album_cover: String,
    pub release_info: String,
    pub songs: Vec<Song>,
}

impl Album {
    pub fn song(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// The loaded catalog, in file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub albums: Vec<Album>,
}

impl Catalog {
    /// Find the first album whose slug matches exactly.
    ///
    /// Albums without songs are rejected here so that a player can always assume
    /// there is a first song to load.
    pub fn find(&self, slug: &str) -> Result<&Album, CatalogError> {
        let album = self
            .albums
            .iter()
            .find(|a| a.slug == slug)
            .ok_or_else(|| CatalogError::AlbumNotFound(slug.to_string()))?;

        if album.is_empty() {
            return Err(CatalogError::EmptyAlbum(slug.to_string()));
        }
        Ok(album)
    }

    /// All slugs in catalog order.
    pub fn slugs(&self) -> Vec<&str> {
        self.albums.iter().map(|a| a.slug.as_str()).collect()
    }
}
