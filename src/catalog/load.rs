use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::error::CatalogError;
use super::model::{Album, Catalog, Song};
use super::probe::probe_duration;

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    albums: Vec<RawAlbum>,
}

#[derive(Debug, Deserialize)]
struct RawAlbum {
    slug: String,
    title: String,
    #[serde(default)]
    artist: String,
    #[serde(default, alias = "albumCover")]
    album_cover: String,
    #[serde(default, alias = "releaseInfo")]
    release_info: String,
    #[serde(default)]
    songs: Vec<RawSong>,
}

#[derive(Debug, Deserialize)]
struct RawSong {
    title: String,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(alias = "audioSrc")]
    audio_src: String,
}

impl Catalog {
    /// Load a catalog file. Relative cover and audio paths are resolved against
    /// the directory containing `path`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let catalog = Self::from_toml_str(&text, base)?;
        debug!(path = %path.display(), albums = catalog.albums.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Parse catalog TOML, resolving relative paths against `base`.
    pub fn from_toml_str(text: &str, base: &Path) -> Result<Self, CatalogError> {
        let raw: RawCatalog = toml::from_str(text)?;
        let albums = raw
            .albums
            .into_iter()
            .map(|a| resolve_album(a, base))
            .collect();
        Ok(Self { albums })
    }
}

fn resolve_album(raw: RawAlbum, base: &Path) -> Album {
    let songs = raw
        .songs
        .into_iter()
        .map(|s| resolve_song(s, base))
        .collect();

    Album {
        slug: raw.slug,
        title: raw.title,
        artist: raw.artist,
        album_cover: if raw.album_cover.trim().is_empty() {
            String::new()
        } else {
            resolve_path(base, &raw.album_cover).display().to_string()
        },
        release_info: raw.release_info,
        songs,
    }
}

fn resolve_song(raw: RawSong, base: &Path) -> Song {
    let path = resolve_path(base, &raw.audio_src);

    // Declared durations win; otherwise measure the file, and fall back to unknown.
    let duration = match raw.duration {
        Some(d) if d.is_finite() && d >= 0.0 => d,
        _ => probe_duration(&path).unwrap_or_else(|| {
            warn!(song = %raw.title, path = %path.display(), "could not determine duration");
            f64::NAN
        }),
    };

    Song {
        title: raw.title,
        duration,
        audio_src: path.display().to_string(),
    }
}

fn resolve_path(base: &Path, src: &str) -> PathBuf {
    let p = Path::new(src);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
