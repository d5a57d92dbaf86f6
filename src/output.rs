//! CLI output formatting for catalog entities.
//!
//! # Information-First Display
//!
//! Every entity (user, album, photo, tag type) leads with its positional
//! index and name. Details follow as indented context lines, with the image
//! path shown last as `Source:` so output reads as an inventory while still
//! tracing each record back to its file.
//!
//! # Output Format
//!
//! ## Users
//!
//! ```text
//! Users
//! 001 stock (1 album)
//! 002 ada (2 albums)
//! ```
//!
//! ## Albums of a user
//!
//! ```text
//! ada
//! 001 Trips (2 photos, 2024-01-01 to 2024-03-10)
//! 002 Empty (0 photos)
//! ```
//!
//! ## Album contents
//!
//! ```text
//! Trips (2 photos, 2024-01-01 to 2024-03-10)
//! 001 harbour.jpg
//!     Caption: Morning ferry
//!     Date: 2024-01-01 08:15:00
//!     Tags: Place=Oslo, Person=Ada
//!     Source: file:///photos/harbour.jpg
//! ```
//!
//! ## Search results
//!
//! ```text
//! Results (1 photo)
//! 001 harbour.jpg
//!     In: ada / Trips
//!     Caption: Morning ferry
//!     ...
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::model::{Album, AlbumSummary, Photo, Tag, User};
use crate::search::Hit;
use crate::tags::TagTypeRegistry;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// `3 photos, 2024-01-01 to 2024-03-10`, or just the count when empty.
fn summary_detail(summary: &AlbumSummary) -> String {
    let count = plural(summary.photo_count, "photo");
    match (summary.earliest, summary.latest) {
        (Some(first), Some(last)) => format!(
            "{count}, {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        ),
        _ => count,
    }
}

/// Photos show their name; an unnamed record falls back to its path in parens.
fn photo_line(index: usize, photo: &Photo) -> String {
    if photo.name.trim().is_empty() {
        format!("{} ({})", format_index(index), photo.image_path())
    } else {
        format!("{} {}", format_index(index), photo.name)
    }
}

fn format_tags(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "none".to_string();
    }
    tags.iter()
        .map(Tag::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn photo_details(photo: &Photo, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    vec![
        format!("{pad}Caption: {}", photo.caption),
        format!("{pad}Date: {}", photo.timestamp.format("%Y-%m-%d %H:%M:%S")),
        format!("{pad}Tags: {}", format_tags(photo.tags())),
        format!("{pad}Source: {}", photo.image_path()),
    ]
}

// ============================================================================
// Users and albums
// ============================================================================

pub fn format_users(users: &[User]) -> Vec<String> {
    let mut lines = vec!["Users".to_string()];
    if users.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, user) in users.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            user.username(),
            plural(user.albums().len(), "album")
        ));
    }
    lines
}

pub fn print_users(users: &[User]) {
    for line in format_users(users) {
        println!("{}", line);
    }
}

/// A user's albums, one summary line each.
pub fn format_user(user: &User) -> Vec<String> {
    let mut lines = vec![user.username().to_string()];
    if user.albums().is_empty() {
        lines.push(format!("{}(no albums)", indent(1)));
    }
    for (i, album) in user.albums().iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            album.name(),
            summary_detail(&album.summary())
        ));
    }
    lines
}

pub fn print_user(user: &User) {
    for line in format_user(user) {
        println!("{}", line);
    }
}

/// An album header followed by every photo with its details.
pub fn format_album(album: &Album) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        album.name(),
        summary_detail(&album.summary())
    )];
    for (i, photo) in album.photos().iter().enumerate() {
        lines.push(photo_line(i + 1, photo));
        lines.extend(photo_details(photo, 1));
    }
    lines
}

pub fn print_album(album: &Album) {
    for line in format_album(album) {
        println!("{}", line);
    }
}

// ============================================================================
// Tags
// ============================================================================

pub fn format_tag_types(registry: &TagTypeRegistry) -> Vec<String> {
    let mut lines = vec!["Tag types".to_string()];
    for (i, name) in registry.known().enumerate() {
        let marker = if registry.is_restricted(name) {
            " (restricted)"
        } else {
            ""
        };
        lines.push(format!("{} {}{}", format_index(i + 1), name, marker));
    }
    lines
}

pub fn print_tag_types(registry: &TagTypeRegistry) {
    for line in format_tag_types(registry) {
        println!("{}", line);
    }
}

/// Tags gathered across every record of one image.
pub fn format_image_tags(image_path: &str, tags: &[Tag]) -> Vec<String> {
    let mut lines = vec![image_path.to_string()];
    if tags.is_empty() {
        lines.push(format!("{}(no tags)", indent(1)));
    }
    for (i, tag) in tags.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), tag));
    }
    lines
}

pub fn print_image_tags(image_path: &str, tags: &[Tag]) {
    for line in format_image_tags(image_path, tags) {
        println!("{}", line);
    }
}

// ============================================================================
// Search
// ============================================================================

pub fn format_search_results(hits: &[Hit<'_>]) -> Vec<String> {
    if hits.is_empty() {
        return vec!["No photos found".to_string()];
    }
    let mut lines = vec![format!("Results ({})", plural(hits.len(), "photo"))];
    for (i, hit) in hits.iter().enumerate() {
        lines.push(photo_line(i + 1, hit.photo));
        lines.push(format!("{}In: {} / {}", indent(1), hit.username, hit.album));
        lines.extend(photo_details(hit.photo, 1));
    }
    lines
}

pub fn print_search_results(hits: &[Hit<'_>]) {
    for line in format_search_results(hits) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
