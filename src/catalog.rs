//! The photo catalog service.
//!
//! [`Catalog`] owns the loaded [`Snapshot`], the [`PathIndex`] built from it,
//! and the [`PhotoStore`] it came from. Every UI-facing operation is a method
//! here: it validates, mutates the in-memory graph, and then saves the full
//! snapshot.
//!
//! # Photo identity
//!
//! A photo record belongs to exactly one album. Two records are the *same
//! photo* when their image paths are equal, wherever they live. Operations
//! that describe the image rather than the record follow the path:
//!
//! | Operation | Scope |
//! |-----------|-------|
//! | [`add_tag`](Catalog::add_tag) | target record, then every record with the same path |
//! | [`remove_tag`](Catalog::remove_tag) | every record with the path |
//! | [`set_caption`](Catalog::set_caption) | every record with the path |
//! | [`add_photo`](Catalog::add_photo) | new record inherits caption and tags from the first existing record |
//! | [`copy_photo`](Catalog::copy_photo) | new independent record; later path-based edits reach it |
//! | [`move_photo`](Catalog::move_photo), [`remove_photo`](Catalog::remove_photo) | one record only |
//!
//! # Tag propagation
//!
//! `add_tag` is checked strictly against the target record: an exact
//! duplicate fails with [`CatalogError::DuplicateTag`], a second tag of a
//! restricted type fails with [`CatalogError::RestrictedTypeViolation`], and
//! nothing changes. Once the target accepts the tag, each other record of the
//! image gets the same checks, but a record that would break an invariant is
//! skipped instead of failing the operation. [`TagOutcome`] reports the counts.
//!
//! # Persistence
//!
//! Each successful mutation ends with a save. If the save fails the mutation
//! stays applied in memory and [`CatalogError::Persistence`] is returned; the
//! next successful save writes it out.

use crate::index::{PathIndex, PhotoRef};
use crate::model::{Album, Photo, Tag, TagConflict, User};
use crate::search::{self, Hit, Query, SearchError};
use crate::store::{PhotoStore, Snapshot, StoreError};
use crate::tags::{TagTypeExists, TagTypeRegistry, names_match};
use chrono::Local;
use log::{debug, error, info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Photo already has tag {0}")]
    DuplicateTag(Tag),
    #[error("Photo already has a tag of restricted type '{0}'")]
    RestrictedTypeViolation(String),
    #[error("Album '{album}' already contains {image_path}")]
    DuplicateInTarget { album: String, image_path: String },
    #[error("Username already exists: {0}")]
    UsernameExists(String),
    #[error("Album already exists: {0}")]
    AlbumNameExists(String),
    #[error("Tag type already exists: {0}")]
    TagTypeExists(String),
    #[error("Unknown tag type: {0}")]
    UnknownTagType(String),
    #[error("{0} must not be empty")]
    EmptyName(&'static str),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl From<TagTypeExists> for CatalogError {
    fn from(e: TagTypeExists) -> Self {
        CatalogError::TagTypeExists(e.0)
    }
}

/// How an [`add_tag`](Catalog::add_tag) propagated across records of the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagOutcome {
    /// Records that received the tag, the target included.
    pub applied: usize,
    /// Other records that already held a matching tag.
    pub already_tagged: usize,
    /// Other records skipped because they already hold a tag of the restricted type.
    pub skipped_restricted: usize,
}

/// Result of [`add_photo`](Catalog::add_photo).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    /// Caption and tags were taken from an existing record of the same image.
    pub inherited: bool,
}

fn required<'a>(value: &'a str, what: &'static str) -> Result<&'a str, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(CatalogError::EmptyName(what))
    } else {
        Ok(trimmed)
    }
}

/// The loaded catalog and the store it saves to.
#[derive(Debug)]
pub struct Catalog<S: PhotoStore> {
    data: Snapshot,
    index: PathIndex,
    store: S,
}

impl<S: PhotoStore> Catalog<S> {
    /// Load the catalog from `store`. A load failure is returned as is.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let snapshot = store.load()?;
        Ok(Self::from_snapshot(store, snapshot))
    }

    /// Load the catalog, falling back to an empty one (stock tag types) if
    /// the stored snapshot can't be read.
    pub fn open_or_default(store: S) -> Self {
        let snapshot = store.load().unwrap_or_else(|e| {
            error!("Failed to load snapshot: {e}. Starting from an empty catalog.");
            Snapshot::empty()
        });
        Self::from_snapshot(store, snapshot)
    }

    /// Wrap an already-loaded snapshot. Nothing is read from `store`.
    pub fn from_snapshot(store: S, snapshot: Snapshot) -> Self {
        let index = PathIndex::build(&snapshot.users);
        debug!(
            "Indexed {} photo records over {} distinct images",
            index.records(),
            index.distinct_images()
        );
        Self {
            data: snapshot,
            index,
            store,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.data
    }

    pub fn users(&self) -> &[User] {
        &self.data.users
    }

    pub fn tag_types(&self) -> &TagTypeRegistry {
        &self.data.tag_types
    }

    pub fn index(&self) -> &PathIndex {
        &self.index
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the current snapshot to the store.
    pub fn save(&self) -> Result<(), CatalogError> {
        self.store.save(&self.data).map_err(|e| {
            error!("Failed to save snapshot: {e}");
            CatalogError::Persistence(e)
        })
    }

    fn reindex(&mut self) {
        self.index = PathIndex::build(&self.data.users);
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn user_position(&self, username: &str) -> Result<usize, CatalogError> {
        self.data
            .users
            .iter()
            .position(|u| names_match(u.username(), username.trim()))
            .ok_or_else(|| CatalogError::NotFound(format!("user '{username}'")))
    }

    fn album_position(&self, user: usize, album: &str) -> Result<usize, CatalogError> {
        let owner = &self.data.users[user];
        owner.album_position(album.trim()).ok_or_else(|| {
            CatalogError::NotFound(format!("album '{album}' of user '{}'", owner.username()))
        })
    }

    fn locate(&self, username: &str, album: &str, image_path: &str) -> Result<PhotoRef, CatalogError> {
        let user = self.user_position(username)?;
        let album_pos = self.album_position(user, album)?;
        let photo = self.data.users[user].albums()[album_pos]
            .photos()
            .iter()
            .position(|p| p.image_path() == image_path)
            .ok_or_else(|| CatalogError::NotFound(format!("{image_path} in album '{album}'")))?;
        Ok(PhotoRef {
            user,
            album: album_pos,
            photo,
        })
    }

    /// Look up a user by name, as login does.
    pub fn login(&self, username: &str) -> Result<&User, CatalogError> {
        let pos = self.user_position(username)?;
        info!("User '{}' logged in", self.data.users[pos].username());
        Ok(&self.data.users[pos])
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.user_position(username)
            .ok()
            .map(|pos| &self.data.users[pos])
    }

    pub fn album(&self, username: &str, album: &str) -> Result<&Album, CatalogError> {
        let user = self.user_position(username)?;
        let pos = self.album_position(user, album)?;
        Ok(&self.data.users[user].albums()[pos])
    }

    pub fn photo(&self, username: &str, album: &str, image_path: &str) -> Result<&Photo, CatalogError> {
        let r = self.locate(username, album, image_path)?;
        r.get(&self.data.users)
            .ok_or_else(|| CatalogError::NotFound(image_path.to_string()))
    }

    /// Every record of `image_path`, across all users and albums.
    pub fn find_by_image_path(&self, image_path: &str) -> Vec<&Photo> {
        self.index
            .lookup(image_path)
            .iter()
            .filter_map(|r| r.get(&self.data.users))
            .collect()
    }

    /// The first record of `image_path` in user → album → photo order.
    pub fn find_first_duplicate(&self, image_path: &str) -> Option<&Photo> {
        self.index
            .first(image_path)
            .and_then(|r| r.get(&self.data.users))
    }

    /// Every distinct tag held by any record of `image_path`.
    pub fn tags_for_image(&self, image_path: &str) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::new();
        for photo in self.find_by_image_path(image_path) {
            for tag in photo.tags() {
                if !tags.iter().any(|t| t.matches(tag)) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn create_user(&mut self, username: &str) -> Result<(), CatalogError> {
        let username = required(username, "username")?;
        if self.user_position(username).is_ok() {
            return Err(CatalogError::UsernameExists(username.to_string()));
        }
        self.data.users.push(User::new(username));
        info!("Created user '{username}'");
        self.save()
    }

    /// Delete a user with all their albums and photos.
    pub fn delete_user(&mut self, username: &str) -> Result<User, CatalogError> {
        let pos = self.user_position(username)?;
        let removed = self.data.users.remove(pos);
        self.reindex();
        info!("Deleted user '{}'", removed.username());
        self.save()?;
        Ok(removed)
    }

    // =========================================================================
    // Albums
    // =========================================================================

    pub fn create_album(&mut self, username: &str, name: &str) -> Result<(), CatalogError> {
        let name = required(name, "album name")?;
        let user = self.user_position(username)?;
        let owner = &mut self.data.users[user];
        if owner.album(name).is_some() {
            return Err(CatalogError::AlbumNameExists(name.to_string()));
        }
        owner.albums_mut().push(Album::new(name));
        info!("Created album '{name}' for '{}'", owner.username());
        self.save()
    }

    /// Rename an album. Changing only the case of the name is allowed.
    pub fn rename_album(&mut self, username: &str, from: &str, to: &str) -> Result<(), CatalogError> {
        let to = required(to, "album name")?;
        let user = self.user_position(username)?;
        let pos = self.album_position(user, from)?;
        let owner = &mut self.data.users[user];
        if let Some(clash) = owner.album_position(to)
            && clash != pos
        {
            return Err(CatalogError::AlbumNameExists(to.to_string()));
        }
        owner.albums_mut()[pos].rename(to);
        info!("Renamed album '{from}' to '{to}'");
        self.save()
    }

    pub fn delete_album(&mut self, username: &str, name: &str) -> Result<Album, CatalogError> {
        let user = self.user_position(username)?;
        let pos = self.album_position(user, name)?;
        let removed = self.data.users[user].albums_mut().remove(pos);
        self.reindex();
        info!(
            "Deleted album '{}' ({} photos)",
            removed.name(),
            removed.len()
        );
        self.save()?;
        Ok(removed)
    }

    // =========================================================================
    // Photos
    // =========================================================================

    /// Add a new photo record to an album.
    ///
    /// When the image already exists anywhere in the catalog, the new record
    /// takes over that record's caption and tags.
    pub fn add_photo(&mut self, username: &str, album: &str, mut photo: Photo) -> Result<AddOutcome, CatalogError> {
        let user = self.user_position(username)?;
        let pos = self.album_position(user, album)?;
        let target = &self.data.users[user].albums()[pos];
        if target.contains_path(photo.image_path()) {
            return Err(CatalogError::DuplicateInTarget {
                album: target.name().to_string(),
                image_path: photo.image_path().to_string(),
            });
        }

        let inherited = match self.find_first_duplicate(photo.image_path()) {
            Some(existing) => {
                photo.inherit_from(existing);
                true
            }
            None => false,
        };
        if inherited {
            info!(
                "{} already catalogued; copied caption and {} tags",
                photo.image_path(),
                photo.tags().len()
            );
        }

        let image_path = photo.image_path().to_string();
        if self.data.users[user].albums_mut()[pos].push(photo).is_err() {
            return Err(CatalogError::DuplicateInTarget {
                album: album.to_string(),
                image_path,
            });
        }
        self.reindex();
        info!("Added {image_path} to '{album}'");
        self.save()?;
        Ok(AddOutcome { inherited })
    }

    fn check_transfer(&self, username: &str, from: &str, to: &str, image_path: &str) -> Result<(PhotoRef, usize), CatalogError> {
        let source = self.locate(username, from, image_path)?;
        let target = self.album_position(source.user, to)?;
        let target_album = &self.data.users[source.user].albums()[target];
        if target_album.contains_path(image_path) {
            return Err(CatalogError::DuplicateInTarget {
                album: target_album.name().to_string(),
                image_path: image_path.to_string(),
            });
        }
        Ok((source, target))
    }

    /// Move one record between two albums of the same user.
    pub fn move_photo(&mut self, username: &str, from: &str, to: &str, image_path: &str) -> Result<(), CatalogError> {
        let (source, target) = self.check_transfer(username, from, to, image_path)?;
        let albums = self.data.users[source.user].albums_mut();
        let photo = albums[source.album]
            .remove(image_path)
            .ok_or_else(|| CatalogError::NotFound(image_path.to_string()))?;
        if let Err(photo) = albums[target].push(photo) {
            // Unreachable after check_transfer; put the record back.
            let _ = albums[source.album].push(photo);
            return Err(CatalogError::DuplicateInTarget {
                album: to.to_string(),
                image_path: image_path.to_string(),
            });
        }
        self.reindex();
        info!("Moved {image_path} from '{from}' to '{to}'");
        self.save()
    }

    /// Copy one record into another album of the same user.
    ///
    /// The copy is an independent record with the source's name, caption,
    /// timestamp and tags as they are now.
    pub fn copy_photo(&mut self, username: &str, from: &str, to: &str, image_path: &str) -> Result<(), CatalogError> {
        let (source, target) = self.check_transfer(username, from, to, image_path)?;
        let copy = source
            .get(&self.data.users)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(image_path.to_string()))?;
        if self.data.users[source.user].albums_mut()[target]
            .push(copy)
            .is_err()
        {
            return Err(CatalogError::DuplicateInTarget {
                album: to.to_string(),
                image_path: image_path.to_string(),
            });
        }
        self.reindex();
        info!("Copied {image_path} from '{from}' to '{to}'");
        self.save()
    }

    /// Remove one record from one album. Other records of the image stay.
    pub fn remove_photo(&mut self, username: &str, album: &str, image_path: &str) -> Result<Photo, CatalogError> {
        let r = self.locate(username, album, image_path)?;
        let removed = self.data.users[r.user].albums_mut()[r.album]
            .remove(image_path)
            .ok_or_else(|| CatalogError::NotFound(image_path.to_string()))?;
        self.reindex();
        info!("Removed {image_path} from '{album}'");
        self.save()?;
        Ok(removed)
    }

    // =========================================================================
    // Tags and captions
    // =========================================================================

    /// Register a new tag type, optionally restricted to one tag per photo.
    pub fn register_tag_type(&mut self, name: &str, restricted: bool) -> Result<(), CatalogError> {
        let name = required(name, "tag type")?;
        self.data.tag_types.register(name, restricted)?;
        info!(
            "Registered tag type '{name}'{}",
            if restricted { " (restricted)" } else { "" }
        );
        self.save()
    }

    /// Tag one record and every other record of the same image.
    pub fn add_tag(&mut self, username: &str, album: &str, image_path: &str, tag: Tag) -> Result<TagOutcome, CatalogError> {
        let value = required(tag.value(), "tag value")?;
        let tag_type = self
            .data
            .tag_types
            .canonical(tag.tag_type().trim())
            .ok_or_else(|| CatalogError::UnknownTagType(tag.tag_type().to_string()))?
            .to_string();
        let restricted = self.data.tag_types.is_restricted(&tag_type);
        let tag = Tag::new(tag_type, value);

        let target = self.locate(username, album, image_path)?;
        let photo = target
            .get_mut(&mut self.data.users)
            .ok_or_else(|| CatalogError::NotFound(image_path.to_string()))?;
        photo
            .try_add_tag(tag.clone(), restricted)
            .map_err(|conflict| match conflict {
                TagConflict::Duplicate => CatalogError::DuplicateTag(tag.clone()),
                TagConflict::Restricted => {
                    CatalogError::RestrictedTypeViolation(tag.tag_type().to_string())
                }
            })?;

        let mut outcome = TagOutcome {
            applied: 1,
            ..TagOutcome::default()
        };
        let others: Vec<PhotoRef> = self
            .index
            .lookup(image_path)
            .iter()
            .copied()
            .filter(|r| *r != target)
            .collect();
        for r in others {
            let Some(other) = r.get_mut(&mut self.data.users) else {
                continue;
            };
            match other.try_add_tag(tag.clone(), restricted) {
                Ok(()) => outcome.applied += 1,
                Err(TagConflict::Duplicate) => outcome.already_tagged += 1,
                Err(TagConflict::Restricted) => {
                    let owner = &self.data.users[r.user];
                    warn!(
                        "Skipped {tag} on {image_path} in {}/{}: already has a {} tag",
                        owner.username(),
                        owner.albums()[r.album].name(),
                        tag.tag_type()
                    );
                    outcome.skipped_restricted += 1;
                }
            }
        }
        info!(
            "Tagged {image_path} with {tag} ({} records, {} already tagged, {} skipped)",
            outcome.applied, outcome.already_tagged, outcome.skipped_restricted
        );
        self.save()?;
        Ok(outcome)
    }

    /// Remove `tag` from every record of `image_path`. Returns how many
    /// records held it; removing an absent tag is not an error.
    pub fn remove_tag(&mut self, image_path: &str, tag: &Tag) -> Result<usize, CatalogError> {
        let refs = self.index.lookup(image_path).to_vec();
        if refs.is_empty() {
            return Err(CatalogError::NotFound(image_path.to_string()));
        }
        let mut removed = 0;
        for r in refs {
            if let Some(photo) = r.get_mut(&mut self.data.users)
                && photo.remove_tag(tag)
            {
                removed += 1;
            }
        }
        info!("Removed {tag} from {removed} records of {image_path}");
        self.save()?;
        Ok(removed)
    }

    /// Set the caption of every record of `image_path` and stamp the edit
    /// time. Returns the number of records updated.
    pub fn set_caption(&mut self, image_path: &str, caption: &str) -> Result<usize, CatalogError> {
        let caption = required(caption, "caption")?;
        let refs = self.index.lookup(image_path).to_vec();
        if refs.is_empty() {
            return Err(CatalogError::NotFound(image_path.to_string()));
        }
        let now = Local::now().naive_local();
        let mut updated = 0;
        for r in refs {
            if let Some(photo) = r.get_mut(&mut self.data.users) {
                photo.set_caption(caption, now);
                updated += 1;
            }
        }
        info!("Captioned {updated} records of {image_path}");
        self.save()?;
        Ok(updated)
    }

    // =========================================================================
    // Search
    // =========================================================================

    pub fn search(&self, query: &Query) -> Result<Vec<Hit<'_>>, CatalogError> {
        let hits = search::search(&self.data.users, query)?;
        debug!("Search {query:?} matched {} records", hits.len());
        Ok(hits)
    }

    /// Create an album holding independent copies of `photos`.
    ///
    /// Photos repeating an image path are added once. Returns the number of
    /// photos in the new album.
    pub fn create_album_from_results(
        &mut self,
        username: &str,
        name: &str,
        photos: impl IntoIterator<Item = Photo>,
    ) -> Result<usize, CatalogError> {
        let name = required(name, "album name")?;
        let user = self.user_position(username)?;
        if self.data.users[user].album(name).is_some() {
            return Err(CatalogError::AlbumNameExists(name.to_string()));
        }
        let album = Album::with_photos(name, photos);
        if album.is_empty() {
            return Err(CatalogError::NotFound("photos to add to the album".into()));
        }
        let count = album.len();
        self.data.users[user].albums_mut().push(album);
        self.reindex();
        info!("Created album '{name}' from {count} search results");
        self.save()?;
        Ok(count)
    }

    /// Run `query` and save the matches as a new album.
    pub fn create_album_from_search(&mut self, username: &str, name: &str, query: &Query) -> Result<usize, CatalogError> {
        let photos: Vec<Photo> = self
            .search(query)?
            .iter()
            .map(|hit| hit.photo.clone())
            .collect();
        self.create_album_from_results(username, name, photos)
    }
}
