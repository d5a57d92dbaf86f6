//! Shared test utilities for the photo-catalog test suite.
//!
//! Provides fixture builders, a store that refuses to save, and lookup
//! helpers that panic with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let store = MemoryStore::new();
//! let catalog = Catalog::from_snapshot(&store, two_user_snapshot());
//!
//! let photo = find_photo(&catalog, "ada", "Trips", "file:///a.jpg");
//! assert_eq!(photo.caption, "ada's trip");
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use std::io;
use std::path::Path;

use crate::catalog::Catalog;
use crate::model::{Album, Photo, Tag, User};
use crate::store::{PhotoStore, Snapshot, StoreError};
use crate::tags::TagTypeRegistry;

// =========================================================================
// Fixture setup
// =========================================================================

/// Noon on the given day.
pub fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap_or_else(|| panic!("invalid date {year}-{month}-{day}"))
}

/// Create `dir` and a small placeholder file for each name in it.
pub fn write_files(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), b"not really an image").unwrap();
    }
}

pub fn tag(tag_type: &str, value: &str) -> Tag {
    Tag::new(tag_type, value)
}

/// A photo named after the last path segment, dated 2024-01-01.
pub fn photo(image_path: &str) -> Photo {
    let name = image_path.rsplit('/').next().unwrap_or(image_path);
    Photo::new(name, image_path, at(2024, 1, 1))
}

fn captioned(image_path: &str, caption: &str) -> Photo {
    let mut p = photo(image_path);
    p.caption = caption.into();
    p
}

/// Two users sharing one image:
///
/// ```text
/// ada
/// ├── Trips       a.jpg ("ada's trip"), b.jpg ("ada's beach")
/// └── Favourites  a.jpg ("ada's trip")
/// grace
/// └── Shared      a.jpg ("grace's copy")
/// ```
pub fn two_user_snapshot() -> Snapshot {
    Snapshot::new(
        vec![
            User::with_albums(
                "ada",
                vec![
                    Album::with_photos(
                        "Trips",
                        [
                            captioned("file:///a.jpg", "ada's trip"),
                            captioned("file:///b.jpg", "ada's beach"),
                        ],
                    ),
                    Album::with_photos("Favourites", [captioned("file:///a.jpg", "ada's trip")]),
                ],
            ),
            User::with_albums(
                "grace",
                vec![Album::with_photos(
                    "Shared",
                    [captioned("file:///a.jpg", "grace's copy")],
                )],
            ),
        ],
        TagTypeRegistry::stock(),
    )
}

// =========================================================================
// Failing store
// =========================================================================

/// Loads a fixed snapshot (or fails to) and never saves.
#[derive(Debug)]
pub struct FailingStore {
    snapshot: Option<Snapshot>,
}

impl FailingStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }

    /// A store whose `load` fails too.
    pub fn broken() -> Self {
        Self { snapshot: None }
    }
}

impl PhotoStore for FailingStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        self.snapshot
            .clone()
            .ok_or_else(|| io::Error::other("disk unavailable").into())
    }

    fn save(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

// =========================================================================
// Catalog lookups (panics with a clear message on miss)
// =========================================================================

/// Find a user by name. Panics if not found.
pub fn find_user<'a, S: PhotoStore>(catalog: &'a Catalog<S>, username: &str) -> &'a User {
    catalog.user(username).unwrap_or_else(|| {
        let names: Vec<&str> = catalog.users().iter().map(User::username).collect();
        panic!("user '{username}' not found. Available: {names:?}")
    })
}

/// Find an album of a user. Panics if not found.
pub fn find_album<'a, S: PhotoStore>(
    catalog: &'a Catalog<S>,
    username: &str,
    album: &str,
) -> &'a Album {
    let user = find_user(catalog, username);
    user.album(album).unwrap_or_else(|| {
        let names: Vec<&str> = user.albums().iter().map(Album::name).collect();
        panic!("album '{album}' not found for '{username}'. Available: {names:?}")
    })
}

/// Find a photo record by image path within an album. Panics if not found.
pub fn find_photo<'a, S: PhotoStore>(
    catalog: &'a Catalog<S>,
    username: &str,
    album: &str,
    image_path: &str,
) -> &'a Photo {
    let found = find_album(catalog, username, album);
    found.photo(image_path).unwrap_or_else(|| {
        let paths: Vec<&str> = found.photos().iter().map(Photo::image_path).collect();
        panic!("photo '{image_path}' not found in '{album}'. Available: {paths:?}")
    })
}
