use bazaar_api_types::{
    DashboardStats, PaginatedResponse, Product, ResponseEnvelope, Role, SalesPoint, TopProduct,
    User,
};
use serde_json::{Value, json};

use super::seller::SellerApi;
use crate::client::{
    ApiClient, ClientError, Page, QueryParams, RequestDescriptor, path_segment,
};

/// Moderation and platform-wide reporting.
#[derive(Debug, Clone)]
pub struct AdminApi {
    client: ApiClient,
}

impl AdminApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn users_params(role: Option<Role>, page: Option<Page>) -> QueryParams {
        let mut params = QueryParams::new();
        page.unwrap_or_default().apply(&mut params);
        params.push_opt("role", role.map(Role::as_str));
        params
    }

    pub fn pending_params(page: Option<Page>) -> QueryParams {
        let mut params = QueryParams::new();
        page.unwrap_or_default().apply(&mut params);
        params
    }

    pub async fn users(
        &self,
        role: Option<Role>,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<User>>, ClientError> {
        let request =
            RequestDescriptor::get("/admin/users").with_query(Self::users_params(role, page));
        self.client.send(&request).await
    }

    pub async fn update_user_role(
        &self,
        id: &str,
        role: Role,
    ) -> Result<ResponseEnvelope<User>, ClientError> {
        let path = format!("/admin/users/{}/role", path_segment("user id", id)?);
        let request = RequestDescriptor::put(path).with_json(&json!({ "role": role }))?;
        self.client.send(&request).await
    }

    pub async fn pending_products(
        &self,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<Product>>, ClientError> {
        let request =
            RequestDescriptor::get("/admin/products/pending").with_query(Self::pending_params(page));
        self.client.send(&request).await
    }

    pub async fn approve_product(&self, id: &str) -> Result<ResponseEnvelope<Product>, ClientError> {
        let path = format!("/admin/products/{}/approve", path_segment("product id", id)?);
        self.client.send(&RequestDescriptor::post(path)).await
    }

    pub async fn reject_product(
        &self,
        id: &str,
        reason: &str,
    ) -> Result<ResponseEnvelope<Product>, ClientError> {
        let path = format!("/admin/products/{}/reject", path_segment("product id", id)?);
        let request = RequestDescriptor::post(path).with_json(&json!({ "reason": reason }))?;
        self.client.send(&request).await
    }

    pub async fn pending_sellers(
        &self,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<User>>, ClientError> {
        let request =
            RequestDescriptor::get("/admin/sellers/pending").with_query(Self::pending_params(page));
        self.client.send(&request).await
    }

    pub async fn approve_seller(&self, id: &str) -> Result<ResponseEnvelope<User>, ClientError> {
        let path = format!("/admin/sellers/{}/approve", path_segment("seller id", id)?);
        self.client.send(&RequestDescriptor::post(path)).await
    }

    pub async fn reject_seller(
        &self,
        id: &str,
        reason: &str,
    ) -> Result<ResponseEnvelope<User>, ClientError> {
        let path = format!("/admin/sellers/{}/reject", path_segment("seller id", id)?);
        let request = RequestDescriptor::post(path).with_json(&json!({ "reason": reason }))?;
        self.client.send(&request).await
    }

    pub async fn dashboard_stats(&self) -> Result<ResponseEnvelope<DashboardStats>, ClientError> {
        self.client
            .send(&RequestDescriptor::get("/admin/dashboard/stats"))
            .await
    }

    pub async fn sales_chart(
        &self,
        period: Option<&str>,
    ) -> Result<ResponseEnvelope<Vec<SalesPoint>>, ClientError> {
        let request = RequestDescriptor::get("/admin/dashboard/sales")
            .with_query(SellerApi::sales_params(period));
        self.client.send(&request).await
    }

    pub async fn top_products(
        &self,
        limit: Option<u32>,
    ) -> Result<ResponseEnvelope<Vec<TopProduct>>, ClientError> {
        let request = RequestDescriptor::get("/admin/dashboard/top-products")
            .with_query(SellerApi::top_products_params(limit));
        self.client.send(&request).await
    }

    /// Free-form analytics document; its shape is owned by the backend.
    pub async fn analytics(&self) -> Result<ResponseEnvelope<Value>, ClientError> {
        self.client
            .send(&RequestDescriptor::get("/admin/analytics"))
            .await
    }
}
