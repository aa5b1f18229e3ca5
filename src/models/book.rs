//! Book models: the upstream catalog payload and the normalized record.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Cover image links as reported by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail: Option<String>,
}

/// A normalized catalog entry returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_links: Option<ImageLinks>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratings_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_link: Option<String>,
}

/// Per-item metadata nested under `volumeInfo` in the catalog response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub average_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub ratings_count: Option<u32>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub info_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub preview_link: Option<String>,
}

// Catalog numbers are advisory; a value of the wrong shape reads as absent
// instead of failing the item.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok()))
}

fn lenient_rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()))
}

fn lenient_total<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_u64()))
}

/// A single item of the catalog response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeItem {
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

impl VolumeItem {
    /// Decode one raw item. Items that do not decode are skipped on their own
    /// so the rest of the page survives.
    pub fn from_value(value: Value) -> Option<Self> {
        match serde_json::from_value(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::debug!("Skipping malformed catalog item: {}", e);
                None
            }
        }
    }
}

/// Top-level catalog search response. Items stay raw until
/// [`VolumeItem::from_value`] decodes them one at a time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "lenient_total")]
    pub total_items: Option<u64>,
}

impl BookRecord {
    /// Flatten a catalog item into a record.
    ///
    /// Returns `None` when the title is missing or blank; such items are never
    /// handed to callers.
    pub fn from_volume(item: VolumeItem) -> Option<Self> {
        let info = item.volume_info;
        let title = info.title.filter(|t| !t.trim().is_empty())?;

        Some(Self {
            id: item.id,
            title,
            authors: info.authors,
            description: info.description,
            image_links: info.image_links,
            average_rating: info
                .average_rating
                .filter(|r| (0.0..=5.0).contains(r)),
            ratings_count: info.ratings_count,
            published_date: info.published_date,
            categories: info.categories,
            info_link: info.info_link,
            page_count: info.page_count,
            language: info.language,
            publisher: info.publisher,
            preview_link: info.preview_link,
        })
    }
}
