//! Core data models shared by the selection engine, the cache and the resolver.
//!
//! [`ProductCandidate`] is the raw, untyped-ish record parsed from the catalog
//! service. [`Match`] is the shape handed back to callers once a candidate has
//! been selected. [`SearchCacheEntry`] and [`RateWindowCounter`] are the
//! documents persisted through the [`KvStore`](crate::store::KvStore).

use serde::{Deserialize, Serialize};

/// Stock level reported by the catalog when an item cannot be bought right now.
pub const STOCK_OUT: &str = "TEMPORARILY_OUT_OF_STOCK";
/// Stock level reported for well-stocked items.
pub const STOCK_HIGH: &str = "HIGH";
/// Stock level reported for items running low.
pub const STOCK_LOW: &str = "LOW";

/// A product record returned by the catalog search endpoint.
///
/// Immutable once fetched. Stored verbatim inside cache entries, so the
/// serialized field names are part of the persisted format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductCandidate {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aisle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_store: Option<bool>,
}

impl ProductCandidate {
    /// Convenience constructor used heavily by tests and fixtures.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_brand(mut self, brand: &str) -> Self {
        self.brand = Some(brand.to_string());
        self
    }

    pub fn with_stock_level(mut self, level: &str) -> Self {
        self.stock_level = Some(level.to_string());
        self
    }

    /// True unless the catalog explicitly reports the item as unavailable.
    pub fn is_available(&self) -> bool {
        self.in_stock != Some(false) && self.stock_level.as_deref() != Some(STOCK_OUT)
    }

    /// Stocked and offered for in-store purchase. A missing fulfillment
    /// flag counts as offered.
    pub fn is_available_in_store(&self) -> bool {
        self.is_available() && self.in_store != Some(false)
    }
}

/// How a product is priced at the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoldBy {
    Weight,
    Unit,
}

impl SoldBy {
    /// Parses the catalog's free-form `soldBy` field. Anything that is not
    /// weight-based is treated as a unit sale.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("weight") => SoldBy::Weight,
            _ => SoldBy::Unit,
        }
    }
}

/// The resolved product returned by the public resolver surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub sold_by: SoldBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aisle: Option<String>,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_level: Option<String>,
}

impl From<&ProductCandidate> for Match {
    fn from(c: &ProductCandidate) -> Self {
        Match {
            id: c.id.clone(),
            name: c.description.clone(),
            image_url: c.image_url.clone(),
            price: c.price,
            sold_by: SoldBy::parse(c.sold_by.as_deref()),
            size: c.size.clone(),
            aisle: c.aisle.clone(),
            available: c.is_available_in_store(),
            stock_level: c.stock_level.clone(),
        }
    }
}

/// A cached search result for one `(location, normalized term)` pair.
///
/// An entry with an empty `candidates` list is a confirmed "not found" and
/// is honored as such until it expires. All timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCacheEntry {
    pub location: String,
    pub raw_term: String,
    pub normalized_term: String,
    pub candidates: Vec<ProductCandidate>,
    pub total: u64,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: i64,
    #[serde(default)]
    pub hit_count: u64,
    #[serde(default)]
    pub last_accessed_at: Option<i64>,
}

impl SearchCacheEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    pub fn is_confirmed_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Request count for one rate-limit window bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindowCounter {
    pub window_key: String,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub expires_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability() {
        let c = ProductCandidate::new("1", "Milk");
        assert!(c.is_available());
        assert!(!c.clone().with_stock_level(STOCK_OUT).is_available());
        let mut gone = c.clone();
        gone.in_stock = Some(false);
        assert!(!gone.is_available());
    }

    #[test]
    fn test_match_from_candidate() {
        let mut c = ProductCandidate::new("0001", "Bananas").with_stock_level(STOCK_HIGH);
        c.sold_by = Some("WEIGHT".to_string());
        c.price = Some(0.59);
        let m = Match::from(&c);
        assert_eq!(m.sold_by, SoldBy::Weight);
        assert_eq!(m.name, "Bananas");
        assert!(m.available);
        assert_eq!(m.price, Some(0.59));
    }

    #[test]
    fn test_match_not_available_when_not_sold_in_store() {
        let mut c = ProductCandidate::new("0002", "Oat Milk").with_stock_level(STOCK_HIGH);
        c.in_store = Some(false);
        assert!(c.is_available());
        assert!(!Match::from(&c).available);

        c.in_store = Some(true);
        assert!(Match::from(&c).available);
    }

    #[test]
    fn test_cache_entry_serializes_camel_case() {
        let entry = SearchCacheEntry {
            location: "01400943".to_string(),
            raw_term: "Eggs".to_string(),
            normalized_term: "eggs".to_string(),
            candidates: Vec::new(),
            total: 0,
            created_at: 1,
            updated_at: 1,
            expires_at: 10,
            hit_count: 0,
            last_accessed_at: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("normalizedTerm").is_some());
        assert!(entry.is_confirmed_empty());
        assert!(entry.is_expired(10));
        assert!(!entry.is_expired(9));
    }
}
