//! Collection record models
//!
//! One logical record exists per tracked collection slug; the integer id is
//! the opaque handle used by the delete endpoint.

use serde::{Deserialize, Serialize};

/// A stored collection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    /// Opaque record handle (assigned by the store)
    pub id: Option<i64>,

    /// Collection slug
    pub slug: String,

    /// Last known floor price, None if unknown
    pub floor_price: Option<f64>,

    /// Number of items in the collection, if tracked
    pub item_count: Option<i64>,
}

impl CollectionRecord {
    /// Create a record with no price or item count yet
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            id: None,
            slug: slug.into(),
            floor_price: None,
            item_count: None,
        }
    }

    /// Set the floor price
    pub fn with_floor_price(mut self, price: f64) -> Self {
        self.floor_price = Some(price);
        self
    }

    /// Set the item count
    pub fn with_item_count(mut self, count: i64) -> Self {
        self.item_count = Some(count);
        self
    }
}

/// Payload for inserting a record through the CRUD surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCollectionRecord {
    /// Collection slug
    pub slug: String,

    /// Floor price, if known
    #[serde(default)]
    pub floor_price: Option<f64>,

    /// Item count, if known
    #[serde(default)]
    pub item_count: Option<i64>,
}
