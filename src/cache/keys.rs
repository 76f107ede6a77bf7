//! Cache key definitions.
//!
//! A [`CacheKey`] pairs a [`Resource`] with the canonical query string of the
//! request that produced it. Resource names are dotted paths so that
//! invalidation can target a whole subtree (`products` covers
//! `products.search` but not `product`).

use std::fmt;
use std::time::Duration;

use crate::client::QueryParams;

const MINUTE: u64 = 60;

/// Every cacheable read of the marketplace API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    ProductsFeatured,
    ProductsCategories,
    ProductsSearch,
    ProductsByCategory,
    Product,
    SellerProducts,
    SellerOrders,
    SellerDashboardStats,
    SellerDashboardSales,
    SellerDashboardTopProducts,
    BuyerCart,
    BuyerOrders,
    BuyerOrder,
    BuyerAddresses,
    AdminUsers,
    AdminPendingProducts,
    AdminPendingSellers,
    AdminDashboardStats,
    AdminDashboardSales,
    AdminDashboardTopProducts,
    AdminAnalytics,
    AuthMe,
}

impl Resource {
    pub const ALL: [Resource; 23] = [
        Resource::Products,
        Resource::ProductsFeatured,
        Resource::ProductsCategories,
        Resource::ProductsSearch,
        Resource::ProductsByCategory,
        Resource::Product,
        Resource::SellerProducts,
        Resource::SellerOrders,
        Resource::SellerDashboardStats,
        Resource::SellerDashboardSales,
        Resource::SellerDashboardTopProducts,
        Resource::BuyerCart,
        Resource::BuyerOrders,
        Resource::BuyerOrder,
        Resource::BuyerAddresses,
        Resource::AdminUsers,
        Resource::AdminPendingProducts,
        Resource::AdminPendingSellers,
        Resource::AdminDashboardStats,
        Resource::AdminDashboardSales,
        Resource::AdminDashboardTopProducts,
        Resource::AdminAnalytics,
        Resource::AuthMe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Products => "products",
            Resource::ProductsFeatured => "products.featured",
            Resource::ProductsCategories => "products.categories",
            Resource::ProductsSearch => "products.search",
            Resource::ProductsByCategory => "products.category",
            Resource::Product => "product",
            Resource::SellerProducts => "seller.products",
            Resource::SellerOrders => "seller.orders",
            Resource::SellerDashboardStats => "seller.dashboard.stats",
            Resource::SellerDashboardSales => "seller.dashboard.sales",
            Resource::SellerDashboardTopProducts => "seller.dashboard.top_products",
            Resource::BuyerCart => "buyer.cart",
            Resource::BuyerOrders => "buyer.orders",
            Resource::BuyerOrder => "buyer.order",
            Resource::BuyerAddresses => "buyer.addresses",
            Resource::AdminUsers => "admin.users",
            Resource::AdminPendingProducts => "admin.products.pending",
            Resource::AdminPendingSellers => "admin.sellers.pending",
            Resource::AdminDashboardStats => "admin.dashboard.stats",
            Resource::AdminDashboardSales => "admin.dashboard.sales",
            Resource::AdminDashboardTopProducts => "admin.dashboard.top_products",
            Resource::AdminAnalytics => "admin.analytics",
            Resource::AuthMe => "auth.me",
        }
    }

    /// Resource-specific freshness window. `None` falls back to the
    /// configured default.
    pub fn stale_window(self) -> Option<Duration> {
        let minutes = match self {
            Resource::Products | Resource::ProductsByCategory => 5,
            Resource::ProductsFeatured => 10,
            Resource::ProductsCategories => 30,
            Resource::ProductsSearch => 2,
            Resource::SellerDashboardStats | Resource::AdminDashboardStats => 5,
            Resource::SellerDashboardSales
            | Resource::SellerDashboardTopProducts
            | Resource::AdminDashboardSales
            | Resource::AdminDashboardTopProducts => 10,
            Resource::AdminAnalytics => 15,
            _ => return None,
        };
        Some(Duration::from_secs(minutes * MINUTE))
    }

    /// True when this resource is `prefix` itself or nested beneath it.
    pub fn is_under(self, prefix: &str) -> bool {
        matches_segments(self.name(), prefix)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn matches_segments(name: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches(".*");
    match name.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// Identity of one cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: Resource,
    /// Canonical `x-www-form-urlencoded` parameters; empty for singletons.
    pub params: String,
}

impl CacheKey {
    pub fn new(resource: Resource, params: &QueryParams) -> Self {
        Self {
            resource,
            params: params.encode(),
        }
    }

    pub fn singleton(resource: Resource) -> Self {
        Self {
            resource,
            params: String::new(),
        }
    }

    /// Key of a single-entity read, e.g. `product?id=p1`.
    pub fn entity(resource: Resource, id: &str) -> Self {
        Self::new(resource, &QueryParams::new().with("id", id.trim()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(self.resource.name())
        } else {
            write!(f, "{}?{}", self.resource.name(), self.params)
        }
    }
}

/// Selects cache entries to invalidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Exactly one key.
    Exact(CacheKey),
    /// Every key whose resource sits at or beneath the given one.
    Prefix(Resource),
}

impl KeyPattern {
    pub fn matches(&self, key: &CacheKey) -> bool {
        match self {
            KeyPattern::Exact(exact) => exact == key,
            KeyPattern::Prefix(resource) => key.resource.is_under(resource.name()),
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPattern::Exact(key) => key.fmt(f),
            KeyPattern::Prefix(resource) => write!(f, "{}.*", resource.name()),
        }
    }
}
