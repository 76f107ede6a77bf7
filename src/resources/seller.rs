use bazaar_api_types::{
    BankDetails, BankDetailsInput, DashboardStats, DocumentKind, MessageResponse, Order,
    OrderStatus, PaginatedResponse, Product, ProductForm, ProductPatch, ProductStatus,
    ResponseEnvelope, SalesPoint, Shop, ShopPatch, TopProduct, UploadedDocument,
};
use serde_json::json;

use crate::client::{
    ApiClient, ClientError, MultipartPart, Page, QueryParams, RequestDescriptor, path_segment,
};

pub const DEFAULT_SALES_PERIOD: &str = "30d";
pub const DEFAULT_TOP_PRODUCTS: u32 = 10;

/// A file attached to a seller verification upload.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SellerApi {
    client: ApiClient,
}

impl SellerApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn products_params(status: Option<ProductStatus>, page: Option<Page>) -> QueryParams {
        let mut params = QueryParams::new();
        page.unwrap_or_default().apply(&mut params);
        params.push_opt("status", status.map(ProductStatus::as_str));
        params
    }

    pub fn orders_params(status: Option<OrderStatus>, page: Option<Page>) -> QueryParams {
        let mut params = QueryParams::new();
        page.unwrap_or_default().apply(&mut params);
        params.push_opt("status", status.map(OrderStatus::as_str));
        params
    }

    pub fn sales_params(period: Option<&str>) -> QueryParams {
        let period = period
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SALES_PERIOD);
        QueryParams::new().with("period", period)
    }

    pub fn top_products_params(limit: Option<u32>) -> QueryParams {
        QueryParams::new().with("limit", limit.unwrap_or(DEFAULT_TOP_PRODUCTS))
    }

    pub async fn products(
        &self,
        status: Option<ProductStatus>,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<Product>>, ClientError> {
        let request = RequestDescriptor::get("/seller/products")
            .with_query(Self::products_params(status, page));
        self.client.send(&request).await
    }

    pub async fn create_product(
        &self,
        form: &ProductForm,
    ) -> Result<ResponseEnvelope<Product>, ClientError> {
        let request = RequestDescriptor::post("/seller/products").with_json(form)?;
        self.client.send(&request).await
    }

    pub async fn update_product(
        &self,
        id: &str,
        patch: &ProductPatch,
    ) -> Result<ResponseEnvelope<Product>, ClientError> {
        let path = format!("/seller/products/{}", path_segment("product id", id)?);
        let request = RequestDescriptor::put(path).with_json(patch)?;
        self.client.send(&request).await
    }

    pub async fn delete_product(
        &self,
        id: &str,
    ) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        let path = format!("/seller/products/{}", path_segment("product id", id)?);
        self.client.send(&RequestDescriptor::delete(path)).await
    }

    pub async fn orders(
        &self,
        status: Option<OrderStatus>,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<Order>>, ClientError> {
        let request =
            RequestDescriptor::get("/seller/orders").with_query(Self::orders_params(status, page));
        self.client.send(&request).await
    }

    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<ResponseEnvelope<Order>, ClientError> {
        let path = format!("/seller/orders/{}", path_segment("order id", id)?);
        let request = RequestDescriptor::put(path)
            .with_json(&json!({ "status": status, "trackingNumber": tracking_number }))?;
        self.client.send(&request).await
    }

    pub async fn dashboard_stats(&self) -> Result<ResponseEnvelope<DashboardStats>, ClientError> {
        self.client
            .send(&RequestDescriptor::get("/seller/dashboard/stats"))
            .await
    }

    pub async fn sales_chart(
        &self,
        period: Option<&str>,
    ) -> Result<ResponseEnvelope<Vec<SalesPoint>>, ClientError> {
        let request = RequestDescriptor::get("/seller/dashboard/sales")
            .with_query(Self::sales_params(period));
        self.client.send(&request).await
    }

    pub async fn top_products(
        &self,
        limit: Option<u32>,
    ) -> Result<ResponseEnvelope<Vec<TopProduct>>, ClientError> {
        let request = RequestDescriptor::get("/seller/dashboard/top-products")
            .with_query(Self::top_products_params(limit));
        self.client.send(&request).await
    }

    pub async fn update_shop(&self, patch: &ShopPatch) -> Result<ResponseEnvelope<Shop>, ClientError> {
        let request = RequestDescriptor::put("/seller/shop").with_json(patch)?;
        self.client.send(&request).await
    }

    /// Multipart upload; the client leaves `Content-Type` to the form encoder.
    pub async fn upload_document(
        &self,
        file: DocumentUpload,
        kind: DocumentKind,
    ) -> Result<ResponseEnvelope<UploadedDocument>, ClientError> {
        if file.bytes.is_empty() {
            return Err(ClientError::invalid_input("document file is empty"));
        }
        let request = RequestDescriptor::post("/seller/documents").with_multipart(vec![
            MultipartPart::File {
                name: "file",
                file_name: file.file_name,
                mime: file.mime,
                bytes: file.bytes,
            },
            MultipartPart::Text {
                name: "type",
                value: kind.as_str().to_string(),
            },
        ]);
        self.client.send(&request).await
    }

    pub async fn update_bank_details(
        &self,
        details: &BankDetailsInput,
    ) -> Result<ResponseEnvelope<BankDetails>, ClientError> {
        let request = RequestDescriptor::put("/seller/bank-details").with_json(details)?;
        self.client.send(&request).await
    }
}
