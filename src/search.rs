//! Photo search across every user and album.
//!
//! Searches are pure functions over the user list. They return [`Hit`]s that
//! borrow from the catalog and remember where each photo record lives, so a
//! caller can display them or hand them to
//! [`Catalog::create_album_from_results`](crate::catalog::Catalog::create_album_from_results).
//!
//! | Query | Matches |
//! |-------|---------|
//! | [`Query::DateRange`] | timestamp falls on a day in `start..=end` |
//! | [`Query::Tag`] | photo holds a tag matching type and value (case-insensitive) |
//! | [`Query::And`] | photo holds both tags |
//! | [`Query::Or`] | photo holds either tag; each album-level record listed once |
//!
//! Results follow user → album → photo order. For `Or`, matches of the first
//! tag come before matches of only the second.

use crate::model::{Photo, Tag, User};
use chrono::NaiveDate;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("Tag type and value must both be given")]
    IncompleteTag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    DateRange { start: NaiveDate, end: NaiveDate },
    Tag(Tag),
    And(Tag, Tag),
    Or(Tag, Tag),
}

/// One matching photo record and where it lives.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub username: &'a str,
    pub album: &'a str,
    pub photo: &'a Photo,
}

impl Query {
    fn validate(&self) -> Result<(), SearchError> {
        let complete = |t: &Tag| !t.tag_type().trim().is_empty() && !t.value().trim().is_empty();
        match self {
            Query::DateRange { start, end } if start > end => Err(SearchError::InvalidRange {
                start: *start,
                end: *end,
            }),
            Query::DateRange { .. } => Ok(()),
            Query::Tag(t) if !complete(t) => Err(SearchError::IncompleteTag),
            Query::And(a, b) | Query::Or(a, b) if !complete(a) || !complete(b) => {
                Err(SearchError::IncompleteTag)
            }
            _ => Ok(()),
        }
    }
}

fn all_photos(users: &[User]) -> impl Iterator<Item = Hit<'_>> {
    users.iter().flat_map(|user| {
        user.albums().iter().flat_map(move |album| {
            album.photos().iter().map(move |photo| Hit {
                username: user.username(),
                album: album.name(),
                photo,
            })
        })
    })
}

/// Run `query` over every photo record.
pub fn search<'a>(users: &'a [User], query: &Query) -> Result<Vec<Hit<'a>>, SearchError> {
    query.validate()?;
    let hits = match query {
        Query::DateRange { start, end } => all_photos(users)
            .filter(|h| {
                let day = h.photo.timestamp.date();
                *start <= day && day <= *end
            })
            .collect(),
        Query::Tag(tag) => all_photos(users).filter(|h| h.photo.has_tag(tag)).collect(),
        Query::And(a, b) => all_photos(users)
            .filter(|h| h.photo.has_tag(a) && h.photo.has_tag(b))
            .collect(),
        Query::Or(a, b) => {
            let mut seen = HashSet::new();
            all_photos(users)
                .filter(|h| h.photo.has_tag(a))
                .chain(all_photos(users).filter(|h| h.photo.has_tag(b)))
                .filter(|h| seen.insert((h.username, h.album, h.photo.image_path())))
                .collect()
        }
    };
    Ok(hits)
}
