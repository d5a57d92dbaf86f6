//! Image-path identity index.
//!
//! Photos in different albums (or different users) are "the same photo" when
//! their image paths are equal. [`PathIndex`] maps each image path to the
//! positions of every record holding it, in user → album → photo enumeration
//! order, so propagation and duplicate detection don't rescan the whole
//! catalog.
//!
//! The index holds positions, not references, so it goes stale whenever a
//! photo, album, or user is inserted or removed. The catalog rebuilds it after
//! every such structural change; caption and tag edits leave it valid.

use crate::model::{Photo, User};
use std::collections::HashMap;

/// Position of one photo record: `users[user].albums[album].photos[photo]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhotoRef {
    pub user: usize,
    pub album: usize,
    pub photo: usize,
}

impl PhotoRef {
    /// Resolve against the user list the index was built from.
    pub fn get<'a>(&self, users: &'a [User]) -> Option<&'a Photo> {
        users
            .get(self.user)?
            .albums()
            .get(self.album)?
            .photos()
            .get(self.photo)
    }

    pub(crate) fn get_mut<'a>(&self, users: &'a mut [User]) -> Option<&'a mut Photo> {
        users
            .get_mut(self.user)?
            .albums_mut()
            .get_mut(self.album)?
            .photos_mut()
            .get_mut(self.photo)
    }
}

/// Runtime reverse index `image_path → [PhotoRef]`. Never serialized.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    by_path: HashMap<String, Vec<PhotoRef>>,
}

impl PathIndex {
    /// Walk every user, album, and photo once.
    pub fn build(users: &[User]) -> Self {
        let mut by_path: HashMap<String, Vec<PhotoRef>> = HashMap::new();
        for (u, user) in users.iter().enumerate() {
            for (a, album) in user.albums().iter().enumerate() {
                for (p, photo) in album.photos().iter().enumerate() {
                    by_path
                        .entry(photo.image_path().to_string())
                        .or_default()
                        .push(PhotoRef {
                            user: u,
                            album: a,
                            photo: p,
                        });
                }
            }
        }
        Self { by_path }
    }

    /// Every record of `image_path`, in enumeration order.
    pub fn lookup(&self, image_path: &str) -> &[PhotoRef] {
        self.by_path
            .get(image_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The first record of `image_path`, if any.
    pub fn first(&self, image_path: &str) -> Option<PhotoRef> {
        self.lookup(image_path).first().copied()
    }

    /// Number of distinct image paths.
    pub fn distinct_images(&self) -> usize {
        self.by_path.len()
    }

    /// Total number of photo records.
    pub fn records(&self) -> usize {
        self.by_path.values().map(Vec::len).sum()
    }
}
