//! Image discovery and first-run seeding.
//!
//! A fresh catalog starts with one stock user owning one album, filled by
//! scanning a designated image directory:
//!
//! ```text
//! data/stock/                 # Seed image directory (not recursive)
//! ├── 01-harbour.jpg          # → photo "01-harbour.jpg"
//! ├── 02-bridge.PNG           # extensions match case-insensitively
//! ├── 10-market.gif           # natural order: 2 sorts before 10
//! ├── notes.txt               # skipped: not an image
//! ├── .DS_Store               # skipped: hidden
//! └── raw/                    # skipped: directories are not descended
//! ```
//!
//! Accepted extensions are `jpg`, `png`, `gif` and `bmp`. Each image becomes a
//! [`Photo`] named after its file, identified by its `file://` URI (see
//! [`image_uri`]) and timestamped with the file's modification time.

use crate::model::{Album, Photo, User};
use crate::store::Snapshot;
use crate::tags::TagTypeRegistry;
use chrono::{DateTime, Local, NaiveDateTime};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Not an image file: {0}")]
    NotAnImage(PathBuf),
}

/// What a first run synthesizes: one user, one album, the initial tag types.
#[derive(Debug, Clone, PartialEq)]
pub struct Seed {
    pub username: String,
    pub album: String,
    pub image_dir: PathBuf,
    pub tag_types: TagTypeRegistry,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "gif", "bmp"];

/// Whether `path` names an image by extension (case-insensitive).
pub fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// The identity key for an image file: a `file://` URI of its absolute path.
///
/// The path is canonicalized when it exists, so `./a.jpg` and `/home/x/a.jpg`
/// resolve to the same identity.
pub fn image_uri(path: &Path) -> String {
    let resolved = fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().replace('\\', "/");
    if text.starts_with('/') {
        format!("file://{text}")
    } else {
        format!("file:///{text}")
    }
}

fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}

/// Build a photo record for an image file on disk.
pub fn photo_from_file(path: &Path) -> Result<Photo, ScanError> {
    if !path.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such file: {}", path.display()),
        )
        .into());
    }
    if !is_image(path) {
        return Err(ScanError::NotAnImage(path.to_path_buf()));
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let timestamp = modified_time(path).unwrap_or_else(|| Local::now().naive_local());
    Ok(Photo::new(name, image_uri(path), timestamp))
}

/// Image files directly inside `dir`, in natural filename order.
/// Hidden files and subdirectories are skipped.
pub fn scan_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut images = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by(|a, b| {
            natord::compare(
                &a.file_name().to_string_lossy(),
                &b.file_name().to_string_lossy(),
            )
        });
    for entry in walker {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || !entry.file_type().is_file() {
            continue;
        }
        if is_image(entry.path()) {
            images.push(entry.into_path());
        } else {
            debug!("Skipping non-image {}", entry.path().display());
        }
    }
    Ok(images)
}

/// Synthesize the first-run snapshot described by `seed`.
///
/// A missing image directory is not an error: the seed album is created
/// empty so the catalog is still usable.
pub fn seed_snapshot(seed: &Seed) -> Result<Snapshot, ScanError> {
    let photos = if seed.image_dir.is_dir() {
        scan_images(&seed.image_dir)?
            .iter()
            .map(|p| photo_from_file(p))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        warn!(
            "Seed image directory {} not found; seed album starts empty",
            seed.image_dir.display()
        );
        Vec::new()
    };
    info!(
        "Seeded user '{}' with album '{}' ({} photos)",
        seed.username,
        seed.album,
        photos.len()
    );
    let album = Album::with_photos(seed.album.clone(), photos);
    let user = User::with_albums(seed.username.clone(), vec![album]);
    Ok(Snapshot::new(vec![user], seed.tag_types.clone()))
}
