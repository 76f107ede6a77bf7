use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::error::ClientError;
use super::query::QueryParams;

/// Everything needed to issue one API call. Built once, never mutated after
/// it is handed to [`super::ApiClient::send`].
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub body: RequestBody,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: QueryParams::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_json<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::invalid_input(format!("failed to encode body: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn with_multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Authenticate this call with an explicit token instead of the session's.
    pub fn with_bearer(self, token: &str) -> Result<Self, ClientError> {
        Ok(self.with_header(AUTHORIZATION, bearer_value(token)?))
    }

    pub fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.iter().any(|(existing, _)| existing == name)
    }

    /// Path plus encoded query, relative to the API base.
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.encode())
        }
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Vec<MultipartPart>),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

#[derive(Debug, Clone)]
pub enum MultipartPart {
    Text {
        name: &'static str,
        value: String,
    },
    File {
        name: &'static str,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

pub(crate) fn build_form(parts: &[MultipartPart]) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            MultipartPart::Text { name, value } => form.text(*name, value.clone()),
            MultipartPart::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    file = file
                        .mime_str(mime)
                        .map_err(|e| ClientError::invalid_input(format!("invalid mime: {e}")))?;
                }
                form.part(*name, file)
            }
        };
    }
    Ok(form)
}

pub(crate) fn bearer_value(token: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| ClientError::invalid_input(e.to_string()))
}

/// Validate a required identifier and encode it as a single path segment.
pub fn path_segment(field: &'static str, value: &str) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid_input(format!("{field} is required")));
    }
    let mut url = Url::parse("http://segment.invalid/")?;
    url.path_segments_mut()
        .map_err(|()| ClientError::invalid_input(format!("{field} cannot be encoded")))?
        .push(trimmed);
    let encoded = url.path().trim_start_matches('/');
    if encoded.is_empty() {
        return Err(ClientError::invalid_input(format!("{field} is not a valid path segment")));
    }
    Ok(encoded.to_string())
}
