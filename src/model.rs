//! Catalog data model: users own albums, albums hold photos, photos carry tags.
//!
//! Every type here is a plain value that serializes straight into the
//! snapshot (see [`crate::store`]). Nothing is shared between albums: a photo
//! that appears in three albums is three independent [`Photo`] records whose
//! only link is an equal [`Photo::image_path`]. Cross-album consistency
//! (captions and tags following the image) is the job of
//! [`crate::catalog::Catalog`], which resolves those links through
//! [`crate::index::PathIndex`].
//!
//! ## Tag invariants
//!
//! A photo never holds two tags that [match](Tag::matches), and never holds
//! two tags of the same restricted type. [`Photo::try_add_tag`] enforces both;
//! the caller supplies whether the tag's type is restricted since that lives
//! in the [`TagTypeRegistry`](crate::tags::TagTypeRegistry).

use crate::tags::names_match;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caption given to photos that have never been captioned.
pub const DEFAULT_CAPTION: &str = "N/A";

/// A `(type, value)` label attached to a photo, e.g. `Place=Paris`.
///
/// Immutable once built. Stored with the spelling it was entered with;
/// comparisons go through [`Tag::matches`], which ignores case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "type")]
    tag_type: String,
    value: String,
}

impl Tag {
    pub fn new(tag_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag_type: tag_type.into(),
            value: value.into(),
        }
    }

    pub fn tag_type(&self) -> &str {
        &self.tag_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Same type and same value, ignoring case.
    pub fn matches(&self, other: &Tag) -> bool {
        self.is_type(&other.tag_type) && names_match(&self.value, &other.value)
    }

    pub fn is_type(&self, tag_type: &str) -> bool {
        names_match(&self.tag_type, tag_type)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.tag_type, self.value)
    }
}

/// Why a tag could not be attached to a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagConflict {
    /// The photo already holds a matching `(type, value)`.
    Duplicate,
    /// The type is restricted and the photo already holds a tag of that type.
    Restricted,
}

/// One album-level photo record.
///
/// `timestamp` is the capture time when the photo is first added and the
/// time of the last caption edit afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub name: String,
    pub caption: String,
    pub timestamp: NaiveDateTime,
    image_path: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

impl Photo {
    pub fn new(
        name: impl Into<String>,
        image_path: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            name: name.into(),
            caption: DEFAULT_CAPTION.to_string(),
            timestamp,
            image_path: image_path.into(),
            tags: Vec::new(),
        }
    }

    /// The identity key shared by every record of the same image.
    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t.matches(tag))
    }

    pub fn has_tag_of_type(&self, tag_type: &str) -> bool {
        self.tags.iter().any(|t| t.is_type(tag_type))
    }

    /// Check whether `tag` could be attached without breaking an invariant.
    pub fn check_tag(&self, tag: &Tag, restricted: bool) -> Result<(), TagConflict> {
        if self.has_tag(tag) {
            return Err(TagConflict::Duplicate);
        }
        if restricted && self.has_tag_of_type(tag.tag_type()) {
            return Err(TagConflict::Restricted);
        }
        Ok(())
    }

    /// Attach `tag` if [`check_tag`](Self::check_tag) allows it.
    pub fn try_add_tag(&mut self, tag: Tag, restricted: bool) -> Result<(), TagConflict> {
        self.check_tag(&tag, restricted)?;
        self.tags.push(tag);
        Ok(())
    }

    /// Remove every tag matching `tag`. Returns whether anything was removed.
    pub fn remove_tag(&mut self, tag: &Tag) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| !t.matches(tag));
        self.tags.len() != before
    }

    /// Replace the caption and stamp the edit time.
    pub fn set_caption(&mut self, caption: impl Into<String>, edited_at: NaiveDateTime) {
        self.caption = caption.into();
        self.timestamp = edited_at;
    }

    /// Take over the caption and tags of another record of the same image.
    pub fn inherit_from(&mut self, other: &Photo) {
        self.caption = other.caption.clone();
        self.tags = other.tags.clone();
    }
}

/// A named, ordered collection of photos. No two photos share an image path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    name: String,
    #[serde(default)]
    photos: Vec<Photo>,
}

/// Display summary of an album: photo count and timestamp range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlbumSummary {
    pub photo_count: usize,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
}

impl Album {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            photos: Vec::new(),
        }
    }

    /// Build an album from photos, dropping any whose path repeats.
    pub fn with_photos(name: impl Into<String>, photos: impl IntoIterator<Item = Photo>) -> Self {
        let mut album = Self::new(name);
        for photo in photos {
            let _ = album.push(photo);
        }
        album
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub(crate) fn photos_mut(&mut self) -> &mut [Photo] {
        &mut self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn contains_path(&self, image_path: &str) -> bool {
        self.photos.iter().any(|p| p.image_path == image_path)
    }

    pub fn photo(&self, image_path: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.image_path == image_path)
    }

    /// Append a photo. Returns the photo back if its path is already present.
    pub(crate) fn push(&mut self, photo: Photo) -> Result<(), Photo> {
        if self.contains_path(&photo.image_path) {
            return Err(photo);
        }
        self.photos.push(photo);
        Ok(())
    }

    pub(crate) fn remove(&mut self, image_path: &str) -> Option<Photo> {
        let pos = self.photos.iter().position(|p| p.image_path == image_path)?;
        Some(self.photos.remove(pos))
    }

    pub fn summary(&self) -> AlbumSummary {
        AlbumSummary {
            photo_count: self.photos.len(),
            earliest: self.photos.iter().map(|p| p.timestamp).min(),
            latest: self.photos.iter().map(|p| p.timestamp).max(),
        }
    }
}

/// Root aggregate: a username and the albums it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    username: String,
    #[serde(default)]
    albums: Vec<Album>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            albums: Vec::new(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub(crate) fn albums_mut(&mut self) -> &mut Vec<Album> {
        &mut self.albums
    }

    pub fn album_position(&self, name: &str) -> Option<usize> {
        self.albums.iter().position(|a| names_match(&a.name, name))
    }

    pub fn album(&self, name: &str) -> Option<&Album> {
        self.album_position(name).map(|i| &self.albums[i])
    }

    /// Build a user that already owns `albums`.
    pub fn with_albums(username: impl Into<String>, albums: Vec<Album>) -> Self {
        Self {
            username: username.into(),
            albums,
        }
    }
}
