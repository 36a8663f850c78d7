/// RAG service HTTP client implementation.
///
/// This module provides `RagClient` for making synchronous HTTP requests to the RAG
/// service, along with error types and a builder for configuration.
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ApiKey;

/// Errors that can occur when interacting with the RAG service.
#[derive(Debug, Error)]
pub enum RagError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// HTTP errors with status code and the service's explanation
    #[error("HTTP error: status {status}: {message}")]
    Http { status: u16, message: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Service-specific errors (malformed or incomplete responses)
    #[error("RAG API error: {message}")]
    Api { message: String },

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Kind of content handed to the service's add-document operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    WebPage,
    PdfFile,
    Docx,
    Mdx,
    Csv,
    Json,
    TextFile,
}

impl DataType {
    /// Returns the wire name used by the service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebPage => "web_page",
            Self::PdfFile => "pdf_file",
            Self::Docx => "docx",
            Self::Mdx => "mdx",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::TextFile => "text_file",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for constructing `RagClient` instances.
///
/// # Examples
///
/// ```
/// use ragchat::rag::RagClientBuilder;
///
/// let client = RagClientBuilder::new()
///     .base_url("http://localhost:8080")
///     .app_id("docs")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.app_id(), "docs");
/// ```
#[derive(Debug, Default)]
pub struct RagClientBuilder {
    base_url: Option<String>,
    app_id: Option<String>,
    api_key: Option<ApiKey>,
}

impl RagClientBuilder {
    /// Creates a new `RagClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL of the RAG service (e.g., "http://localhost:8080").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the application identifier the service routes requests to.
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Sets the API key sent as a bearer token with every request.
    pub fn api_key(mut self, api_key: ApiKey) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Builds the `RagClient` with the configured settings.
    ///
    /// Unset values fall back to `config::DEFAULT_BASE_URL` and
    /// `config::DEFAULT_APP_ID`. Requests carry no `Authorization` header when no
    /// API key was given.
    ///
    /// The client sets no overall request timeout: a query runs until the service
    /// answers or the connection fails. Only connection establishment is bounded.
    ///
    /// # Errors
    ///
    /// Returns `RagError::InvalidUrl` if the base URL does not parse, or
    /// `RagError::Network` if the underlying HTTP client cannot be created.
    pub fn build(self) -> Result<RagClient, RagError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| crate::config::DEFAULT_BASE_URL.to_string());
        let app_id = self
            .app_id
            .unwrap_or_else(|| crate::config::DEFAULT_APP_ID.to_string());

        crate::config::validate_base_url(&base_url).map_err(RagError::InvalidUrl)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Option::<Duration>::None)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(RagError::Network)?;

        Ok(RagClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id,
            api_key: self.api_key,
        })
    }
}

/// Synchronous HTTP client for the RAG service.
///
/// Constructed once at startup with `RagClientBuilder` and shared by reference for
/// every subsequent query.
pub struct RagClient {
    client: reqwest::blocking::Client,
    base_url: String,
    app_id: String,
    api_key: Option<ApiKey>,
}

/// Operations the external RAG service offers.
///
/// This trait enables mocking in unit tests and keeps the dispatcher independent
/// of the HTTP transport.
pub trait RagService: Send + Sync {
    /// Answers a free-text question.
    ///
    /// The question is forwarded exactly as given.
    fn query(&self, question: &str) -> Result<String, RagError>;

    /// Adds one document source to the service's knowledge base.
    fn add(&self, source: &str, data_type: DataType) -> Result<(), RagError>;
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    response: Option<String>,
}

#[derive(Serialize)]
struct AddRequest<'a> {
    source: &'a str,
    data_type: DataType,
}

impl RagClient {
    /// Returns the base URL configured for this client, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the application identifier configured for this client.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.app_id, operation)
    }

    /// Sends a JSON body to an operation endpoint and returns the raw response body.
    fn post<T: Serialize>(&self, operation: &str, body: &T) -> Result<String, RagError> {
        let url = self.endpoint(operation);
        debug!(%url, "sending request to RAG service");

        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose());
        }

        let response = request.send().map_err(RagError::Network)?;
        let status = response.status();
        let text = response.text().map_err(RagError::Network)?;

        if !status.is_success() {
            return Err(RagError::Http {
                status: status.as_u16(),
                message: error_message(&text)
                    .or_else(|| status.canonical_reason().map(String::from))
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        Ok(text)
    }
}

impl RagService for RagClient {
    fn query(&self, question: &str) -> Result<String, RagError> {
        let body = self.post("query", &QueryRequest { query: question })?;
        parse_query_response(&body)
    }

    fn add(&self, source: &str, data_type: DataType) -> Result<(), RagError> {
        self.post("add", &AddRequest { source, data_type })?;
        Ok(())
    }
}

/// Extracts the answer from a query response body.
fn parse_query_response(body: &str) -> Result<String, RagError> {
    let parsed: QueryResponse = serde_json::from_str(body).map_err(RagError::Serialization)?;
    parsed.response.ok_or_else(|| RagError::Api {
        message: "Missing 'response' field in API response".to_string(),
    })
}

/// Pulls a human-readable message out of an error body, if the service sent one.
///
/// Looks for a string `detail` or `error` field.
fn error_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "error"]
        .iter()
        .find_map(|field| json.get(field).and_then(|v| v.as_str()))
        .map(String::from)
}
