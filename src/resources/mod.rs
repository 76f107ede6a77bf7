//! One client per backend resource area, each a thin typed layer over
//! [`ApiClient::send`].

mod admin;
mod auth;
mod buyer;
mod products;
mod seller;

pub use admin::AdminApi;
pub use auth::AuthApi;
pub use buyer::{BuyerApi, NewReview};
pub use products::ProductsApi;
pub use seller::{DEFAULT_SALES_PERIOD, DEFAULT_TOP_PRODUCTS, DocumentUpload, SellerApi};

use crate::client::ApiClient;

impl ApiClient {
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.clone())
    }

    pub fn seller(&self) -> SellerApi {
        SellerApi::new(self.clone())
    }

    pub fn buyer(&self) -> BuyerApi {
        BuyerApi::new(self.clone())
    }

    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.clone())
    }
}
