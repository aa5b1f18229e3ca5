//! Wishlist entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BookRecord;
use crate::format::book_thumbnail;

/// A saved book, snapshotted from a [`BookRecord`] when it was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub added_at: DateTime<Utc>,
}

impl WishlistEntry {
    pub fn snapshot(book: &BookRecord, added_at: DateTime<Utc>) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            authors: book.authors.clone(),
            thumbnail: Some(book_thumbnail(book.image_links.as_ref())),
            rating: book.average_rating.filter(|r| (0.0..=5.0).contains(r)),
            added_at,
        }
    }
}

/// Membership answer for a single id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipInfo {
    pub id: String,
    pub in_wishlist: bool,
}
