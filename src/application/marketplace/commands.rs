use bazaar_api_types::{
    Address, AddressInput, AddressPatch, BankDetails, BankDetailsInput, CartItem, CheckoutForm,
    DocumentKind, MessageResponse, Order, OrderStatus, Product, ProductForm, ProductPatch,
    ResponseEnvelope, Review, Role, Shop, ShopPatch, UploadedDocument, User,
};

use super::Marketplace;
use crate::application::mutations::MutationKind;
use crate::client::ClientError;
use crate::resources::{DocumentUpload, NewReview};

type Outcome<T> = Result<ResponseEnvelope<T>, ClientError>;

impl Marketplace {
    pub async fn create_product(&self, form: &ProductForm) -> Outcome<Product> {
        let seller = self.client.seller();
        self.mutations
            .mutate(
                &MutationKind::CreateProduct.descriptor(),
                seller.create_product(form),
            )
            .await
    }

    pub async fn update_product(&self, id: &str, patch: &ProductPatch) -> Outcome<Product> {
        let seller = self.client.seller();
        let kind = MutationKind::UpdateProduct { id: id.trim().to_string() };
        self.mutations
            .mutate(&kind.descriptor(), seller.update_product(id, patch))
            .await
    }

    pub async fn delete_product(&self, id: &str) -> Outcome<MessageResponse> {
        let seller = self.client.seller();
        let kind = MutationKind::DeleteProduct { id: id.trim().to_string() };
        self.mutations
            .mutate(&kind.descriptor(), seller.delete_product(id))
            .await
    }

    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Outcome<Order> {
        let seller = self.client.seller();
        let kind = MutationKind::UpdateOrderStatus { id: id.trim().to_string() };
        self.mutations
            .mutate(
                &kind.descriptor(),
                seller.update_order_status(id, status, tracking_number),
            )
            .await
    }

    pub async fn update_shop(&self, patch: &ShopPatch) -> Outcome<Shop> {
        let seller = self.client.seller();
        self.mutations
            .mutate(&MutationKind::UpdateShop.descriptor(), seller.update_shop(patch))
            .await
    }

    pub async fn upload_document(
        &self,
        file: DocumentUpload,
        kind: DocumentKind,
    ) -> Outcome<UploadedDocument> {
        let seller = self.client.seller();
        self.mutations
            .mutate(
                &MutationKind::UploadDocument.descriptor(),
                seller.upload_document(file, kind),
            )
            .await
    }

    pub async fn update_bank_details(&self, details: &BankDetailsInput) -> Outcome<BankDetails> {
        let seller = self.client.seller();
        self.mutations
            .mutate(
                &MutationKind::UpdateBankDetails.descriptor(),
                seller.update_bank_details(details),
            )
            .await
    }

    pub async fn add_to_cart(&self, product_id: &str, quantity: u32) -> Outcome<CartItem> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(
                &MutationKind::AddToCart.descriptor(),
                buyer.add_to_cart(product_id, quantity),
            )
            .await
    }

    pub async fn update_cart_item(&self, item_id: &str, quantity: u32) -> Outcome<CartItem> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(
                &MutationKind::UpdateCartItem.descriptor(),
                buyer.update_cart_item(item_id, quantity),
            )
            .await
    }

    pub async fn remove_from_cart(&self, item_id: &str) -> Outcome<MessageResponse> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(
                &MutationKind::RemoveFromCart.descriptor(),
                buyer.remove_from_cart(item_id),
            )
            .await
    }

    pub async fn clear_cart(&self) -> Outcome<MessageResponse> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(&MutationKind::ClearCart.descriptor(), buyer.clear_cart())
            .await
    }

    pub async fn create_order(&self, form: &CheckoutForm) -> Outcome<Order> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(&MutationKind::CreateOrder.descriptor(), buyer.create_order(form))
            .await
    }

    pub async fn cancel_order(&self, id: &str, reason: Option<&str>) -> Outcome<Order> {
        let buyer = self.client.buyer();
        let kind = MutationKind::CancelOrder { id: id.trim().to_string() };
        self.mutations
            .mutate(&kind.descriptor(), buyer.cancel_order(id, reason))
            .await
    }

    pub async fn add_review(&self, review: &NewReview) -> Outcome<Review> {
        let buyer = self.client.buyer();
        let kind = MutationKind::AddReview {
            product_id: review.product_id.trim().to_string(),
        };
        self.mutations
            .mutate(&kind.descriptor(), buyer.add_review(review))
            .await
    }

    pub async fn add_address(&self, address: &AddressInput) -> Outcome<Address> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(&MutationKind::AddAddress.descriptor(), buyer.add_address(address))
            .await
    }

    pub async fn update_address(&self, id: &str, patch: &AddressPatch) -> Outcome<Address> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(
                &MutationKind::UpdateAddress.descriptor(),
                buyer.update_address(id, patch),
            )
            .await
    }

    pub async fn delete_address(&self, id: &str) -> Outcome<MessageResponse> {
        let buyer = self.client.buyer();
        self.mutations
            .mutate(&MutationKind::DeleteAddress.descriptor(), buyer.delete_address(id))
            .await
    }

    pub async fn update_user_role(&self, id: &str, role: Role) -> Outcome<User> {
        let admin = self.client.admin();
        self.mutations
            .mutate(
                &MutationKind::UpdateUserRole.descriptor(),
                admin.update_user_role(id, role),
            )
            .await
    }

    pub async fn approve_product(&self, id: &str) -> Outcome<Product> {
        let admin = self.client.admin();
        self.mutations
            .mutate(
                &MutationKind::ApproveProduct.descriptor(),
                admin.approve_product(id),
            )
            .await
    }

    pub async fn reject_product(&self, id: &str, reason: &str) -> Outcome<Product> {
        let admin = self.client.admin();
        self.mutations
            .mutate(
                &MutationKind::RejectProduct.descriptor(),
                admin.reject_product(id, reason),
            )
            .await
    }

    pub async fn approve_seller(&self, id: &str) -> Outcome<User> {
        let admin = self.client.admin();
        self.mutations
            .mutate(
                &MutationKind::ApproveSeller.descriptor(),
                admin.approve_seller(id),
            )
            .await
    }

    pub async fn reject_seller(&self, id: &str, reason: &str) -> Outcome<User> {
        let admin = self.client.admin();
        self.mutations
            .mutate(
                &MutationKind::RejectSeller.descriptor(),
                admin.reject_seller(id, reason),
            )
            .await
    }
}
