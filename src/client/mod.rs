//! Typed request client for the marketplace REST API.
//!
//! Every call goes through [`ApiClient::send`], which attaches JSON and bearer
//! headers, issues the request once, and normalizes the response into a
//! [`ResponseEnvelope`] or a [`ClientError`]. There is no retry and no caching
//! at this layer.

mod error;
mod query;
mod request;

use std::fmt;
use std::sync::Arc;

use bazaar_api_types::ResponseEnvelope;
use metrics::counter;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

pub use error::ClientError;
pub use query::{
    DEFAULT_LIMIT, DEFAULT_PAGE, Page, ProductFilters, QueryParams, SortDirection, SortField,
    SortOption,
};
pub use request::{MultipartPart, RequestBody, RequestDescriptor, path_segment};

use request::{bearer_value, build_form};

const METRIC_REQUESTS: &str = "bazaar_http_requests_total";

/// Supplies the bearer token attached to outgoing requests.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Token source for unauthenticated clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// Cheaply clonable handle; clones share the connection pool and token source.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Arc<str>,
    tokens: Arc<dyn TokenSource>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base: &Url, tokens: Arc<dyn TokenSource>) -> Result<Self, ClientError> {
        let http = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self {
            http,
            base: Arc::from(base.as_str().trim_end_matches('/')),
            tokens,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("bazaar/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Resolve a request against the base URL. Paths are appended verbatim so
    /// a base such as `https://shop.example/api` keeps its prefix.
    pub fn url(&self, request: &RequestDescriptor) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}{}", self.base, request.path))?;
        if !request.query.is_empty() {
            url.set_query(Some(&request.query.encode()));
        }
        Ok(url)
    }

    pub async fn send<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<ResponseEnvelope<T>, ClientError> {
        let url = self.url(request)?;
        let mut builder = self.http.request(request.method.clone(), url);

        if !request.body.is_multipart() {
            builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.has_header(&AUTHORIZATION)
            && let Some(token) = self.tokens.bearer_token()
        {
            builder = builder.header(AUTHORIZATION, bearer_value(&token)?);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await.map_err(|err| {
            warn!(
                method = %request.method,
                path = %request.path,
                error = %err,
                "api request failed before a response arrived"
            );
            record_request(request, "transport_error");
            ClientError::from(err)
        })?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let payload: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(
                method = %request.method,
                path = %request.path,
                status = status.as_u16(),
                message = %message,
                "api request returned an error status"
            );
            record_request(request, "api_error");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
                payload,
            });
        }

        debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "api request completed"
        );
        record_request(request, "ok");
        parse_envelope(&bytes)
    }
}

fn record_request(request: &RequestDescriptor, outcome: &'static str) {
    counter!(
        METRIC_REQUESTS,
        "method" => request.method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

#[derive(Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<Vec<String>>,
}

fn parse_envelope<T: DeserializeOwned>(bytes: &[u8]) -> Result<ResponseEnvelope<T>, ClientError> {
    let raw: RawEnvelope = serde_json::from_slice(bytes)
        .map_err(|e| ClientError::transport(format!("failed to parse body: {e}")))?;

    let data = if raw.success {
        let value = raw.data.unwrap_or(Value::Null);
        Some(
            serde_json::from_value(value)
                .map_err(|e| ClientError::transport(format!("failed to parse data: {e}")))?,
        )
    } else {
        None
    };

    Ok(ResponseEnvelope {
        success: raw.success,
        data,
        message: raw.message,
        errors: raw.errors,
    })
}

/// Unwrap the payload of a successful envelope, turning `success: false` into
/// [`ClientError::Rejected`].
pub fn into_data<T>(envelope: ResponseEnvelope<T>, fallback: &str) -> Result<T, ClientError> {
    match envelope {
        ResponseEnvelope {
            success: true,
            data: Some(data),
            ..
        } => Ok(data),
        ResponseEnvelope {
            message, errors, ..
        } => Err(ClientError::rejected(
            message.unwrap_or_else(|| fallback.to_string()),
            errors.unwrap_or_default(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use bazaar_api_types::MessageResponse;

    use super::*;

    fn client(base: &str) -> ApiClient {
        let base = Url::parse(base).expect("base url");
        ApiClient::new(&base, Arc::new(Anonymous)).expect("client")
    }

    #[test]
    fn url_keeps_base_prefix() {
        let client = client("http://localhost:3000/api/");
        let request = RequestDescriptor::get("/products")
            .with_query(QueryParams::new().with("page", 1));
        let url = client.url(&request).expect("url");
        assert_eq!(url.as_str(), "http://localhost:3000/api/products?page=1");
    }

    #[test]
    fn failed_envelope_drops_data() {
        let envelope: ResponseEnvelope<MessageResponse> = parse_envelope(
            br#"{"success":false,"data":{"unexpected":true},"message":"nope","errors":["a"]}"#,
        )
        .expect("envelope");
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.errors, Some(vec!["a".to_string()]));
    }

    #[test]
    fn non_json_body_is_a_transport_error() {
        let err = parse_envelope::<MessageResponse>(b"<html>oops</html>").expect_err("html");
        assert!(matches!(err, ClientError::Transport { .. }));
    }

    #[test]
    fn into_data_uses_fallback_message() {
        let envelope = ResponseEnvelope::<u32> {
            success: false,
            data: None,
            message: None,
            errors: None,
        };
        let err = into_data(envelope, "Login failed").expect_err("rejected");
        assert!(matches!(err, ClientError::Rejected { ref message, .. } if message == "Login failed"));
    }
}
