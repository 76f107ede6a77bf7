use bazaar_api_types::{
    Address, AddressInput, AddressPatch, CartItem, CheckoutForm, MessageResponse, Order,
    OrderStatus, PaginatedResponse, ResponseEnvelope, Review,
};
use serde::Serialize;
use serde_json::json;

use crate::client::{
    ApiClient, ClientError, Page, QueryParams, RequestDescriptor, path_segment,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub product_id: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Cart, orders, reviews and address book of the signed-in buyer.
#[derive(Debug, Clone)]
pub struct BuyerApi {
    client: ApiClient,
}

impl BuyerApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn orders_params(status: Option<OrderStatus>, page: Option<Page>) -> QueryParams {
        let mut params = QueryParams::new();
        page.unwrap_or_default().apply(&mut params);
        params.push_opt("status", status.map(OrderStatus::as_str));
        params
    }

    pub async fn cart(&self) -> Result<ResponseEnvelope<Vec<CartItem>>, ClientError> {
        self.client.send(&RequestDescriptor::get("/buyer/cart")).await
    }

    pub async fn add_to_cart(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<ResponseEnvelope<CartItem>, ClientError> {
        if product_id.trim().is_empty() {
            return Err(ClientError::invalid_input("product id is required"));
        }
        let request = RequestDescriptor::post("/buyer/cart")
            .with_json(&json!({ "productId": product_id.trim(), "quantity": quantity }))?;
        self.client.send(&request).await
    }

    pub async fn update_cart_item(
        &self,
        item_id: &str,
        quantity: u32,
    ) -> Result<ResponseEnvelope<CartItem>, ClientError> {
        let path = format!("/buyer/cart/{}", path_segment("cart item id", item_id)?);
        let request = RequestDescriptor::put(path).with_json(&json!({ "quantity": quantity }))?;
        self.client.send(&request).await
    }

    pub async fn remove_from_cart(
        &self,
        item_id: &str,
    ) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        let path = format!("/buyer/cart/{}", path_segment("cart item id", item_id)?);
        self.client.send(&RequestDescriptor::delete(path)).await
    }

    pub async fn clear_cart(&self) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        self.client
            .send(&RequestDescriptor::delete("/buyer/cart"))
            .await
    }

    pub async fn orders(
        &self,
        status: Option<OrderStatus>,
        page: Option<Page>,
    ) -> Result<ResponseEnvelope<PaginatedResponse<Order>>, ClientError> {
        let request =
            RequestDescriptor::get("/buyer/orders").with_query(Self::orders_params(status, page));
        self.client.send(&request).await
    }

    pub async fn order(&self, id: &str) -> Result<ResponseEnvelope<Order>, ClientError> {
        let path = format!("/buyer/orders/{}", path_segment("order id", id)?);
        self.client.send(&RequestDescriptor::get(path)).await
    }

    pub async fn create_order(
        &self,
        form: &CheckoutForm,
    ) -> Result<ResponseEnvelope<Order>, ClientError> {
        let request = RequestDescriptor::post("/buyer/orders").with_json(form)?;
        self.client.send(&request).await
    }

    pub async fn cancel_order(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<ResponseEnvelope<Order>, ClientError> {
        let path = format!("/buyer/orders/{}/cancel", path_segment("order id", id)?);
        let request = RequestDescriptor::post(path).with_json(&json!({ "reason": reason }))?;
        self.client.send(&request).await
    }

    pub async fn add_review(&self, review: &NewReview) -> Result<ResponseEnvelope<Review>, ClientError> {
        if review.product_id.trim().is_empty() {
            return Err(ClientError::invalid_input("product id is required"));
        }
        let request = RequestDescriptor::post("/buyer/reviews").with_json(review)?;
        self.client.send(&request).await
    }

    pub async fn addresses(&self) -> Result<ResponseEnvelope<Vec<Address>>, ClientError> {
        self.client
            .send(&RequestDescriptor::get("/buyer/addresses"))
            .await
    }

    pub async fn add_address(
        &self,
        address: &AddressInput,
    ) -> Result<ResponseEnvelope<Address>, ClientError> {
        let request = RequestDescriptor::post("/buyer/addresses").with_json(address)?;
        self.client.send(&request).await
    }

    pub async fn update_address(
        &self,
        id: &str,
        patch: &AddressPatch,
    ) -> Result<ResponseEnvelope<Address>, ClientError> {
        let path = format!("/buyer/addresses/{}", path_segment("address id", id)?);
        let request = RequestDescriptor::put(path).with_json(patch)?;
        self.client.send(&request).await
    }

    pub async fn delete_address(
        &self,
        id: &str,
    ) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        let path = format!("/buyer/addresses/{}", path_segment("address id", id)?);
        self.client.send(&RequestDescriptor::delete(path)).await
    }
}
