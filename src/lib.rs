//! # Photo Catalog
//!
//! A multi-user photo catalog. Users own albums, albums hold photo records,
//! and photos carry a caption, a timestamp and typed tags such as
//! `Place=Paris` or `Person=Ada`.
//!
//! # Architecture
//!
//! ```text
//! config.toml ─→ CatalogConfig ─→ JsonFileStore (+ Seed)
//!                                        │ load / save
//!                                        ▼
//!                                     Catalog ──→ PathIndex
//!                                        │
//!                              search / output / CLI
//! ```
//!
//! The whole catalog lives in memory as one [`store::Snapshot`]. Every
//! mutating operation on [`catalog::Catalog`] saves the full snapshot back
//! through a [`store::PhotoStore`]. There are no partial writes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`model`] | `Tag`, `Photo`, `Album`, `User` value types |
//! | [`tags`] | Tag-type registry (known + restricted types) and the case policy for names |
//! | [`index`] | Runtime `image_path → records` index used for identity and propagation |
//! | [`catalog`] | Every user-facing operation: invariants, propagation, save-after-mutate |
//! | [`search`] | Date range, tag, AND and OR queries over all users |
//! | [`store`] | Versioned JSON snapshot, `PhotoStore` trait, file and in-memory stores |
//! | [`scan`] | Image discovery and first-run seeding from a stock image directory |
//! | [`config`] | `config.toml` loading, validation, merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Records, Not Shared Photos
//!
//! A photo in three albums is three independent records linked only by an
//! equal image path. There is no shared ownership and no back-pointers.
//! Operations that describe the image (captions, tags) look up every record of
//! the path through [`index::PathIndex`] and update each one. Moving or
//! removing a record touches only that record.
//!
//! ## One Case Policy
//!
//! Usernames, album names, tag types and tag values all compare ignoring case
//! and keep the spelling entered first. Image paths are compared exactly. See
//! [`tags::names_match`].
//!
//! ## Whole-Snapshot Persistence
//!
//! Catalogs are small enough that rewriting everything on each change is
//! simpler than any incremental format, and a snapshot file is easy to
//! inspect by hand. Writes go through a temp file and a rename.

pub mod catalog;
pub mod config;
pub mod index;
pub mod model;
pub mod output;
pub mod scan;
pub mod search;
pub mod store;
pub mod tags;

#[cfg(test)]
pub(crate) mod test_helpers;
