//! Cover selection shared by wishlist snapshots.

use crate::models::ImageLinks;

/// Cover shown when a book has no thumbnail of its own.
pub const PLACEHOLDER_THUMBNAIL: &str =
    "https://via.placeholder.com/150x200/f3f4f6/6b7280?text=No+Cover";

/// Pick the best cover URL: `thumbnail`, then `smallThumbnail`, then the placeholder.
///
/// Catalog links are upgraded to https so they can be embedded in secure pages.
pub fn book_thumbnail(links: Option<&ImageLinks>) -> String {
    links
        .and_then(|l| l.thumbnail.as_deref().or(l.small_thumbnail.as_deref()))
        .map(|url| url.replace("http://", "https://"))
        .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL.to_string())
}
