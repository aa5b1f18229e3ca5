//! Data models for the Book Finder application.
//!
//! Field names are serialized in camelCase to match the frontend interfaces.

mod book;
mod wishlist;

pub use book::*;
pub use wishlist::*;
