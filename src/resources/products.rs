use bazaar_api_types::{PaginatedResponse, Product, ResponseEnvelope};

use crate::client::{
    ApiClient, ClientError, Page, ProductFilters, QueryParams, RequestDescriptor, SortOption,
    path_segment,
};

/// Public catalogue reads.
#[derive(Debug, Clone)]
pub struct ProductsApi {
    client: ApiClient,
}

impl ProductsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Canonical parameters of a catalogue listing: pagination, then filters,
    /// then sort.
    pub fn list_params(
        filters: &ProductFilters,
        sort: Option<SortOption>,
        page: Option<Page>,
    ) -> QueryParams {
        let mut params = QueryParams::new();
        page.unwrap_or_default().apply(&mut params);
        filters.apply(&mut params);
        if let Some(sort) = sort {
            sort.apply(&mut params);
        }
        params
    }

    pub fn search_params(
        query: &str,
        filters: &ProductFilters,
        page: Option<Page>,
    ) -> Result<QueryParams, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::invalid_input("search query is required"));
        }
        let mut params = QueryParams::new().with("q", query);
        page.unwrap_or_default().apply(&mut params);
        filters.apply(&mut params);
        Ok(params)
    }

    pub async fn list(
        &self,
        filters: &ProductFilters,
        sort: Option<SortOption>,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<Product>>, ClientError> {
        let request =
            RequestDescriptor::get("/products").with_query(Self::list_params(filters, sort, page));
        self.client.send(&request).await
    }

    pub async fn get(&self, id: &str) -> Result<ResponseEnvelope<Product>, ClientError> {
        let path = format!("/products/{}", path_segment("product id", id)?);
        self.client.send(&RequestDescriptor::get(path)).await
    }

    pub async fn by_category(
        &self,
        category: &str,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<Product>>, ClientError> {
        let path = format!("/products/category/{}", path_segment("category", category)?);
        let mut params = QueryParams::new();
        page.unwrap_or_default().apply(&mut params);
        let request = RequestDescriptor::get(path).with_query(params);
        self.client.send(&request).await
    }

    pub async fn search(
        &self,
        query: &str,
        filters: &ProductFilters,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<Product>>, ClientError> {
        let request = RequestDescriptor::get("/products/search")
            .with_query(Self::search_params(query, filters, page)?);
        self.client.send(&request).await
    }

    pub async fn featured(&self) -> Result<ResponseEnvelope<Vec<Product>>, ClientError> {
        self.client
            .send(&RequestDescriptor::get("/products/featured"))
            .await
    }

    pub async fn categories(&self) -> Result<ResponseEnvelope<Vec<String>>, ClientError> {
        self.client
            .send(&RequestDescriptor::get("/products/categories"))
            .await
    }
}
