use bazaar_api_types::{
    AuthSession, LoginForm, MessageResponse, RegisterForm, ResponseEnvelope, User,
};
use serde_json::json;

use crate::client::{ApiClient, ClientError, RequestDescriptor};

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(
        &self,
        form: &LoginForm,
    ) -> Result<ResponseEnvelope<AuthSession>, ClientError> {
        let request = RequestDescriptor::post("/auth/login").with_json(form)?;
        self.client.send(&request).await
    }

    pub async fn register(
        &self,
        form: &RegisterForm,
    ) -> Result<ResponseEnvelope<AuthSession>, ClientError> {
        let request = RequestDescriptor::post("/auth/register").with_json(form)?;
        self.client.send(&request).await
    }

    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        if email.trim().is_empty() {
            return Err(ClientError::invalid_input("email is required"));
        }
        let request =
            RequestDescriptor::post("/auth/forgot-password").with_json(&json!({ "email": email }))?;
        self.client.send(&request).await
    }

    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
    ) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::invalid_input("reset token is required"));
        }
        let request = RequestDescriptor::post("/auth/reset-password")
            .with_json(&json!({ "token": token, "password": password }))?;
        self.client.send(&request).await
    }

    /// "Who am I" for whatever token the session currently holds.
    pub async fn me(&self) -> Result<ResponseEnvelope<User>, ClientError> {
        self.client.send(&RequestDescriptor::get("/auth/me")).await
    }

    /// "Who am I" for an explicit token, used while restoring a persisted session.
    pub async fn me_with_token(&self, token: &str) -> Result<ResponseEnvelope<User>, ClientError> {
        let request = RequestDescriptor::get("/auth/me").with_bearer(token)?;
        self.client.send(&request).await
    }

    pub async fn logout(&self) -> Result<ResponseEnvelope<MessageResponse>, ClientError> {
        self.client.send(&RequestDescriptor::post("/auth/logout")).await
    }
}
