use bazaar_api_types::{
    Address, CartItem, DashboardStats, Order, OrderStatus, PaginatedResponse, Product,
    ProductStatus, Role, SalesPoint, TopProduct, User,
};
use serde_json::Value;

use super::Marketplace;
use crate::cache::{CacheKey, Resource};
use crate::client::{ClientError, Page, ProductFilters, QueryParams, SortOption};
use crate::resources::{AdminApi, BuyerApi, ProductsApi, SellerApi};

fn paged(page: Option<Page>) -> QueryParams {
    let mut params = QueryParams::new();
    page.unwrap_or_default().apply(&mut params);
    params
}

impl Marketplace {
    pub async fn products(
        &self,
        filters: &ProductFilters,
        sort: Option<SortOption>,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<Product>, ClientError> {
        let key = CacheKey::new(
            Resource::Products,
            &ProductsApi::list_params(filters, sort, page),
        );
        let filters = filters.clone();
        self.query(key, "Failed to load products", move |client| async move {
            client.products().list(&filters, sort, page).await
        })
        .await
    }

    pub async fn product(&self, id: &str) -> Result<Product, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::invalid_input("product id is required"));
        }
        let id = id.trim().to_string();
        let key = CacheKey::entity(Resource::Product, &id);
        self.query(key, "Product not found", move |client| async move {
            client.products().get(&id).await
        })
        .await
    }

    pub async fn featured_products(&self) -> Result<Vec<Product>, ClientError> {
        let key = CacheKey::singleton(Resource::ProductsFeatured);
        self.query(key, "Failed to load featured products", |client| async move {
            client.products().featured().await
        })
        .await
    }

    pub async fn categories(&self) -> Result<Vec<String>, ClientError> {
        let key = CacheKey::singleton(Resource::ProductsCategories);
        self.query(key, "Failed to load categories", |client| async move {
            client.products().categories().await
        })
        .await
    }

    pub async fn search_products(
        &self,
        query: &str,
        filters: &ProductFilters,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<Product>, ClientError> {
        let params = ProductsApi::search_params(query, filters, page)?;
        let key = CacheKey::new(Resource::ProductsSearch, &params);
        let query = query.to_string();
        let filters = filters.clone();
        self.query(key, "Search failed", move |client| async move {
            client.products().search(&query, &filters, page).await
        })
        .await
    }

    pub async fn products_by_category(
        &self,
        category: &str,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<Product>, ClientError> {
        if category.trim().is_empty() {
            return Err(ClientError::invalid_input("category is required"));
        }
        let category = category.trim().to_string();
        let mut params = QueryParams::new().with("category", &category);
        page.unwrap_or_default().apply(&mut params);
        let key = CacheKey::new(Resource::ProductsByCategory, &params);
        self.query(key, "Failed to load category", move |client| async move {
            client.products().by_category(&category, page).await
        })
        .await
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        let key = CacheKey::singleton(Resource::AuthMe);
        let user: User = self
            .query(key, "Not signed in", |client| async move {
                client.auth().me().await
            })
            .await?;
        self.session.update_user(user.clone());
        Ok(user)
    }

    pub async fn seller_products(
        &self,
        status: Option<ProductStatus>,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<Product>, ClientError> {
        let key = CacheKey::new(
            Resource::SellerProducts,
            &SellerApi::products_params(status, page),
        );
        self.query(key, "Failed to load products", move |client| async move {
            client.seller().products(status, page).await
        })
        .await
    }

    pub async fn seller_orders(
        &self,
        status: Option<OrderStatus>,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<Order>, ClientError> {
        let key = CacheKey::new(
            Resource::SellerOrders,
            &SellerApi::orders_params(status, page),
        );
        self.query(key, "Failed to load orders", move |client| async move {
            client.seller().orders(status, page).await
        })
        .await
    }

    pub async fn seller_dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let key = CacheKey::singleton(Resource::SellerDashboardStats);
        self.query(key, "Failed to load dashboard", |client| async move {
            client.seller().dashboard_stats().await
        })
        .await
    }

    pub async fn seller_sales_chart(
        &self,
        period: Option<&str>,
    ) -> Result<Vec<SalesPoint>, ClientError> {
        let params = SellerApi::sales_params(period);
        let key = CacheKey::new(Resource::SellerDashboardSales, &params);
        let period = params.get("period").map(str::to_string);
        self.query(key, "Failed to load sales", move |client| async move {
            client.seller().sales_chart(period.as_deref()).await
        })
        .await
    }

    pub async fn seller_top_products(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<TopProduct>, ClientError> {
        let key = CacheKey::new(
            Resource::SellerDashboardTopProducts,
            &SellerApi::top_products_params(limit),
        );
        self.query(key, "Failed to load top products", move |client| async move {
            client.seller().top_products(limit).await
        })
        .await
    }

    pub async fn cart(&self) -> Result<Vec<CartItem>, ClientError> {
        let key = CacheKey::singleton(Resource::BuyerCart);
        self.query(key, "Failed to load cart", |client| async move {
            client.buyer().cart().await
        })
        .await
    }

    pub async fn buyer_orders(
        &self,
        status: Option<OrderStatus>,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<Order>, ClientError> {
        let key = CacheKey::new(
            Resource::BuyerOrders,
            &BuyerApi::orders_params(status, page),
        );
        self.query(key, "Failed to load orders", move |client| async move {
            client.buyer().orders(status, page).await
        })
        .await
    }

    pub async fn buyer_order(&self, id: &str) -> Result<Order, ClientError> {
        if id.trim().is_empty() {
            return Err(ClientError::invalid_input("order id is required"));
        }
        let id = id.trim().to_string();
        let key = CacheKey::entity(Resource::BuyerOrder, &id);
        self.query(key, "Order not found", move |client| async move {
            client.buyer().order(&id).await
        })
        .await
    }

    pub async fn addresses(&self) -> Result<Vec<Address>, ClientError> {
        let key = CacheKey::singleton(Resource::BuyerAddresses);
        self.query(key, "Failed to load addresses", |client| async move {
            client.buyer().addresses().await
        })
        .await
    }

    pub async fn admin_users(
        &self,
        role: Option<Role>,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<User>, ClientError> {
        let key = CacheKey::new(Resource::AdminUsers, &AdminApi::users_params(role, page));
        self.query(key, "Failed to load users", move |client| async move {
            client.admin().users(role, page).await
        })
        .await
    }

    pub async fn pending_products(
        &self,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<Product>, ClientError> {
        let key = CacheKey::new(Resource::AdminPendingProducts, &paged(page));
        self.query(key, "Failed to load pending products", move |client| async move {
            client.admin().pending_products(page).await
        })
        .await
    }

    pub async fn pending_sellers(
        &self,
        page: Option<Page>,
    ) -> Result<PaginatedResponse<User>, ClientError> {
        let key = CacheKey::new(Resource::AdminPendingSellers, &paged(page));
        self.query(key, "Failed to load pending sellers", move |client| async move {
            client.admin().pending_sellers(page).await
        })
        .await
    }

    pub async fn admin_dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let key = CacheKey::singleton(Resource::AdminDashboardStats);
        self.query(key, "Failed to load dashboard", |client| async move {
            client.admin().dashboard_stats().await
        })
        .await
    }

    pub async fn admin_sales_chart(
        &self,
        period: Option<&str>,
    ) -> Result<Vec<SalesPoint>, ClientError> {
        let params = SellerApi::sales_params(period);
        let key = CacheKey::new(Resource::AdminDashboardSales, &params);
        let period = params.get("period").map(str::to_string);
        self.query(key, "Failed to load sales", move |client| async move {
            client.admin().sales_chart(period.as_deref()).await
        })
        .await
    }

    pub async fn admin_top_products(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<TopProduct>, ClientError> {
        let key = CacheKey::new(
            Resource::AdminDashboardTopProducts,
            &SellerApi::top_products_params(limit),
        );
        self.query(key, "Failed to load top products", move |client| async move {
            client.admin().top_products(limit).await
        })
        .await
    }

    pub async fn analytics(&self) -> Result<Value, ClientError> {
        let key = CacheKey::singleton(Resource::AdminAnalytics);
        self.query(key, "Failed to load analytics", |client| async move {
            client.admin().analytics().await
        })
        .await
    }
}
