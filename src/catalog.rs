//! Catalog service client.
//!
//! [`CatalogSearch`] is the seam the resolver depends on. [`HttpCatalog`]
//! is the real implementation: each call is queued at its priority,
//! attaches a bearer token, and goes through the resilient transport, which
//! waits for rate budget and counts every attempt it sends. A 401 invalidates the cached token and is retried once with a
//! fresh one.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use grocer_core::models::ProductCandidate;

use crate::auth::TokenProvider;
use crate::error::CatalogError;
use crate::queue::{Priority, RequestQueue};
use crate::transport::ResilientTransport;

const IMAGE_SIZE_PREFERENCE: &[&str] = &["xlarge", "large", "medium", "small", "thumbnail"];

/// One product search against the catalog.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub term: String,
    pub location_id: Option<String>,
    pub limit: u32,
    pub priority: Priority,
}

/// Parsed search response.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub candidates: Vec<ProductCandidate>,
    /// Total hits reported upstream, which may exceed `candidates.len()`.
    pub total: u64,
}

#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, CatalogError>;
}

/// A store location returned by the locations endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLocation {
    pub id: String,
    pub name: String,
    pub chain: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Clone)]
pub struct HttpCatalog {
    base_url: String,
    fulfillment: Option<String>,
    queue: RequestQueue,
    transport: Arc<ResilientTransport>,
    tokens: Arc<dyn TokenProvider>,
}

impl HttpCatalog {
    pub fn new(
        base_url: impl Into<String>,
        fulfillment: Option<String>,
        queue: RequestQueue,
        transport: Arc<ResilientTransport>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            fulfillment,
            queue,
            transport,
            tokens,
        }
    }

    /// Queue a GET of `path`, returning the decoded JSON body.
    async fn get_json(
        &self,
        path: &str,
        params: Vec<(String, String)>,
        priority: Priority,
    ) -> Result<Value, CatalogError> {
        let this = self.clone();
        let url = format!("{}{}", self.base_url, path);
        self.queue
            .enqueue(priority, None, move || async move {
                this.fetch_authorized(&url, &params).await
            })
            .await
    }

    async fn fetch_authorized(&self, url: &str, params: &[(String, String)]) -> Result<Value, CatalogError> {
        let token = self.tokens.get_token().await?;
        match self.fetch(url, params, &token).await {
            Err(CatalogError::Auth { status: 401, .. }) => {
                warn!("catalog rejected access token, refreshing once");
                self.tokens.invalidate().await;
                let token = self.tokens.get_token().await?;
                self.fetch(url, params, &token).await
            }
            other => other,
        }
    }

    async fn fetch(&self, url: &str, params: &[(String, String)], token: &str) -> Result<Value, CatalogError> {
        let response = self
            .transport
            .execute(|client| {
                client
                    .get(url)
                    .bearer_auth(token)
                    .header(reqwest::header::ACCEPT, "application/json")
                    .query(params)
            })
            .await?;
        Ok(response.json::<Value>().await?)
    }

    /// Find store locations near a ZIP code.
    pub async fn search_locations(
        &self,
        zip_code: &str,
        radius_miles: u32,
        limit: u32,
    ) -> Result<Vec<StoreLocation>, CatalogError> {
        let params = vec![
            ("filter.zipCode.near".to_string(), zip_code.to_string()),
            ("filter.radiusInMiles".to_string(), radius_miles.to_string()),
            ("filter.limit".to_string(), limit.to_string()),
        ];
        let body = self.get_json("/locations", params, Priority::LOCATION_SEARCH).await?;
        parse_locations(&body)
    }
}

#[async_trait]
impl CatalogSearch for HttpCatalog {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, CatalogError> {
        let mut params = vec![
            ("filter.term".to_string(), query.term.clone()),
            ("filter.limit".to_string(), query.limit.to_string()),
        ];
        if let Some(loc) = &query.location_id {
            params.push(("filter.locationId".to_string(), loc.clone()));
        }
        if let Some(f) = &self.fulfillment {
            params.push(("filter.fulfillment".to_string(), f.clone()));
        }

        let body = self.get_json("/products", params, query.priority).await?;
        let page = parse_products(&body)?;
        debug!(term = %query.term, returned = page.candidates.len(), total = page.total, "catalog search");
        Ok(page)
    }
}

fn str_at<'a>(v: &'a Value, pointer: &str) -> Option<&'a str> {
    v.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn owned_at(v: &Value, pointer: &str) -> Option<String> {
    str_at(v, pointer).map(str::to_string)
}

/// Pick an image URL: featured image, else the front shot, else the first;
/// then the largest size available in preference order.
fn pick_image(product: &Value) -> Option<String> {
    let images = product.get("images")?.as_array()?;
    let image = images
        .iter()
        .find(|i| i.get("featured").and_then(Value::as_bool) == Some(true))
        .or_else(|| images.iter().find(|i| str_at(i, "/perspective") == Some("front")))
        .or_else(|| images.first())?;
    let sizes = image.get("sizes")?.as_array()?;
    IMAGE_SIZE_PREFERENCE.iter().find_map(|want| {
        sizes
            .iter()
            .find(|s| str_at(s, "/size") == Some(*want))
            .and_then(|s| owned_at(s, "/url"))
    })
}

fn parse_price(item: &Value) -> Option<f64> {
    let promo = item.pointer("/price/promo").and_then(Value::as_f64).filter(|p| *p > 0.0);
    let regular = item.pointer("/price/regular").and_then(Value::as_f64).filter(|p| *p > 0.0);
    promo.or(regular)
}

fn parse_product(product: &Value) -> Option<ProductCandidate> {
    let id = owned_at(product, "/productId")?;
    let item = product.pointer("/items/0").cloned().unwrap_or(Value::Null);

    let categories = product
        .get("categories")
        .and_then(Value::as_array)
        .map(|cs| cs.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    Some(ProductCandidate {
        id,
        description: owned_at(product, "/description").unwrap_or_default(),
        brand: owned_at(product, "/brand"),
        categories,
        price: parse_price(&item),
        stock_level: owned_at(&item, "/inventory/stockLevel"),
        in_stock: item.get("inStock").and_then(Value::as_bool),
        size: owned_at(&item, "/size"),
        sold_by: owned_at(&item, "/soldBy"),
        aisle: owned_at(product, "/aisleLocations/0/description")
            .or_else(|| owned_at(&item, "/aisleLocations/0/description")),
        image_url: pick_image(product),
        in_store: item.pointer("/fulfillment/inStore").and_then(Value::as_bool),
    })
}

/// Parse a products search response body.
pub fn parse_products(body: &Value) -> Result<SearchPage, CatalogError> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::Decode("missing data array".to_string()))?;

    let candidates: Vec<ProductCandidate> = data.iter().filter_map(parse_product).collect();
    let total = body
        .pointer("/meta/pagination/total")
        .and_then(Value::as_u64)
        .unwrap_or(candidates.len() as u64);

    Ok(SearchPage { candidates, total })
}

/// Parse a locations response body.
pub fn parse_locations(body: &Value) -> Result<Vec<StoreLocation>, CatalogError> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::Decode("missing data array".to_string()))?;

    Ok(data
        .iter()
        .filter_map(|loc| {
            Some(StoreLocation {
                id: owned_at(loc, "/locationId")?,
                name: owned_at(loc, "/name").unwrap_or_default(),
                chain: owned_at(loc, "/chain"),
                address: owned_at(loc, "/address/addressLine1"),
                city: owned_at(loc, "/address/city"),
                state: owned_at(loc, "/address/state"),
                zip_code: owned_at(loc, "/address/zipCode"),
            })
        })
        .collect())
}
