//! Canonical query-string construction.
//!
//! Parameters are emitted in the order they are pushed, and every resource
//! pushes them from a closed struct in declaration order, so the same logical
//! request always yields the same string. That string doubles as the
//! parameter half of a [`crate::cache::CacheKey`].

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

/// Ordered list of query parameters with empty values filtered out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryParams {
    pairs: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter unless its value is empty.
    pub fn push(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.pairs.push((key, value));
        }
        self
    }

    pub fn push_opt<V: ToString>(&mut self, key: &'static str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Append a list parameter as a comma-joined value; empty lists are skipped.
    pub fn push_list(&mut self, key: &'static str, values: &[String]) -> &mut Self {
        let joined = values
            .iter()
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        self.push(key, joined)
    }

    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.push(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    /// `application/x-www-form-urlencoded` rendering.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Pagination window; `page` and `limit` default to 1 and 20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub(crate) fn apply(self, params: &mut QueryParams) {
        params.push("page", self.page).push("limit", self.limit);
    }
}

/// Catalogue filters accepted by `/products` and `/products/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilters {
    /// Top-level category name, e.g. `Electronics`.
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Inclusive lower price bound, in `currency`.
    pub min_price: Option<f64>,
    /// Inclusive upper price bound, in `currency`.
    pub max_price: Option<f64>,
    pub currency: Option<String>,
    /// Country of the selling shop.
    pub seller_location: Option<String>,
    /// Shipping option names; matches products offering any of them.
    pub shipping_options: Vec<String>,
    /// Minimum average rating.
    pub rating: Option<f64>,
    /// Matches products carrying any of the tags.
    pub tags: Vec<String>,
    /// Free-text match on title and description.
    pub search: Option<String>,
}

impl ProductFilters {
    pub(crate) fn apply(&self, params: &mut QueryParams) {
        params
            .push_opt("category", self.category.as_deref().map(str::trim))
            .push_opt("subcategory", self.subcategory.as_deref().map(str::trim))
            .push_opt("minPrice", self.min_price)
            .push_opt("maxPrice", self.max_price)
            .push_opt("currency", self.currency.as_deref().map(str::trim))
            .push_opt(
                "sellerLocation",
                self.seller_location.as_deref().map(str::trim),
            )
            .push_list("shippingOptions", &self.shipping_options)
            .push_opt("rating", self.rating)
            .push_list("tags", &self.tags)
            .push_opt("search", self.search.as_deref().map(str::trim));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    Price,
    CreatedAt,
    Rating,
    Relevance,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Price => "price",
            SortField::CreatedAt => "createdAt",
            SortField::Rating => "rating",
            SortField::Relevance => "relevance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOption {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOption {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub(crate) fn apply(self, params: &mut QueryParams) {
        params
            .push("sortBy", self.field.as_str())
            .push("sortOrder", self.direction.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn electronics() -> ProductFilters {
        ProductFilters {
            category: Some("Electronics".to_string()),
            min_price: Some(100.0),
            max_price: Some(500.0),
            ..Default::default()
        }
    }

    #[test]
    fn filters_serialize_in_declaration_order() {
        let mut params = QueryParams::new();
        electronics().apply(&mut params);
        assert_eq!(
            params.encode(),
            "category=Electronics&minPrice=100&maxPrice=500"
        );
    }

    #[test]
    fn empty_values_are_omitted() {
        let filters = ProductFilters {
            category: Some(String::new()),
            subcategory: Some("   ".to_string()),
            currency: None,
            tags: vec![String::new()],
            search: Some("lamp".to_string()),
            ..Default::default()
        };
        let mut params = QueryParams::new();
        filters.apply(&mut params);

        let encoded = params.encode();
        assert_eq!(encoded, "search=lamp");
        assert!(!encoded.contains("category="));
        assert!(!encoded.contains("tags="));
    }

    #[test]
    fn equal_filters_produce_equal_params() {
        let built_in_other_order = ProductFilters {
            max_price: Some(500.0),
            min_price: Some(100.0),
            category: Some("Electronics".to_string()),
            ..Default::default()
        };

        let mut a = QueryParams::new();
        electronics().apply(&mut a);
        let mut b = QueryParams::new();
        built_in_other_order.apply(&mut b);
        assert_eq!(a, b);
        assert_eq!(a.encode(), b.encode());
    }

    #[test]
    fn list_filters_join_with_commas() {
        let filters = ProductFilters {
            tags: vec!["eco".to_string(), "handmade".to_string()],
            ..Default::default()
        };
        let mut params = QueryParams::new();
        filters.apply(&mut params);
        assert_eq!(params.get("tags"), Some("eco,handmade"));
    }

    #[test]
    fn page_defaults_to_first_twenty() {
        let mut params = QueryParams::new();
        Page::default().apply(&mut params);
        assert_eq!(params.encode(), "page=1&limit=20");
    }

    #[test]
    fn sort_uses_backend_field_names() {
        let mut params = QueryParams::new();
        SortOption::new(SortField::CreatedAt, SortDirection::Desc).apply(&mut params);
        assert_eq!(params.encode(), "sortBy=createdAt&sortOrder=desc");
    }

    #[test]
    fn values_are_form_encoded() {
        let params = QueryParams::new().with("q", "red lamp & shade");
        assert_eq!(params.encode(), "q=red+lamp+%26+shade");
    }
}
