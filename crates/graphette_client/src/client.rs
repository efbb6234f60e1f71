//! The GraphQL client: request building and dispatch.
//!
//! Issues one HTTP exchange per call and hands the raw result to the
//! classifier; every outcome comes back as a single
//! [`Outcome`](graphette_codec::Outcome) value. No retries and no caching
//! live here — callers that want them wrap these calls.
//!
//! ```ignore
//! use graphette_client::{Client, Request};
//! use graphette_codec::{decode, encode};
//!
//! let client = Client::new("http://localhost:4000/graphql");
//! let request = Request::new(r#"
//!     query Hero($episode: Episode) {
//!         hero(episode: $episode) { name }
//!     }
//! "#)
//! .operation_name("Hero")
//! .variable("episode", encode::string("JEDI"));
//!
//! let hero = decode::object(|hero| hero)
//!     .field("hero", decode::object(|name| name)
//!         .field("name", decode::string())
//!         .build())
//!     .build::<String>();
//!
//! let outcome = client.run(&request, &hero).await;
//! ```

use serde_json::Value as Json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use graphette_codec::decode::Decoder;
use graphette_codec::encode;
use graphette_codec::response::{
    classify, classify_with_partial_errors, Outcome, RawResponse, ResponseMeta,
};

use crate::http::{percent_encode, HttpClient, HttpError, HttpResponse};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// URL of the GraphQL endpoint.
    pub url: String,
    /// Per-exchange timeout.
    pub timeout: Duration,
    /// Headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(30),
            headers: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Creates a new config with a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a default header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// One GraphQL operation, ready to send.
///
/// The query text is whitespace-normalized on construction so multi-line
/// raw-string literals serialize without their source indentation. Variables
/// keep their insertion order.
#[derive(Debug, Clone)]
pub struct Request {
    query: String,
    operation_name: Option<String>,
    variables: Vec<(String, encode::Value)>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: normalize_query(&query.into()),
            operation_name: None,
            variables: Vec::new(),
        }
    }

    /// Names the operation, for multi-operation documents.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Attaches a variable. Values come from the `encode` combinators, which
    /// is what keeps them JSON-safe.
    pub fn variable(mut self, name: impl Into<String>, value: encode::Value) -> Self {
        self.variables.push((name.into(), value));
        self
    }

    /// The normalized query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The `{ operationName?, query, variables }` body for a POST.
    fn body_json(&self) -> Json {
        let mut body = serde_json::Map::new();
        if let Some(name) = &self.operation_name {
            body.insert("operationName".to_owned(), Json::String(name.clone()));
        }
        body.insert("query".to_owned(), Json::String(self.query.clone()));
        body.insert("variables".to_owned(), Json::Object(self.variables_json()));
        Json::Object(body)
    }

    fn variables_json(&self) -> serde_json::Map<String, Json> {
        let mut variables = serde_json::Map::new();
        for (name, value) in &self.variables {
            variables.insert(
                name.clone(),
                serde_json::to_value(value).unwrap_or(Json::Null),
            );
        }
        variables
    }

    /// The same payload as URL query parameters, for a GET.
    fn query_params(&self) -> String {
        let mut params = format!("query={}", percent_encode(&self.query));
        if let Some(name) = &self.operation_name {
            params.push_str(&format!("&operationName={}", percent_encode(name)));
        }
        if !self.variables.is_empty() {
            let variables = Json::Object(self.variables_json()).to_string();
            params.push_str(&format!("&variables={}", percent_encode(&variables)));
        }
        params
    }
}

/// Strips carriage returns and the common leading indentation, then trims
/// surrounding blank lines. Queries written as indented raw-string literals
/// come out flush-left; single-line queries pass through unchanged.
pub fn normalize_query(query: &str) -> String {
    let without_cr = query.replace('\r', "");
    let indent = without_cr
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let dedented: Vec<&str> = without_cr
        .lines()
        .map(|line| {
            if line.len() >= indent && line.is_char_boundary(indent) {
                &line[indent..]
            } else {
                line.trim_start()
            }
        })
        .collect();
    dedented.join("\n").trim().to_owned()
}

/// A GraphQL client over plain HTTP.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Creates a new client with the given endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(url),
        }
    }

    /// Creates a new client with configuration.
    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// POSTs the request and classifies the response.
    pub async fn run<T: 'static>(&self, request: &Request, decoder: &Decoder<T>) -> Outcome<T> {
        classify(decoder, self.post_raw(request).await)
    }

    /// POSTs the request, keeping partial errors that arrive next to data.
    pub async fn run_with_partial_errors<T: 'static>(
        &self,
        request: &Request,
        decoder: &Decoder<T>,
    ) -> Outcome<T> {
        classify_with_partial_errors(decoder, self.post_raw(request).await)
    }

    /// GETs the request (payload in the query string) and classifies the
    /// response. Some caches and CDNs only ever see GETs.
    pub async fn run_get<T: 'static>(&self, request: &Request, decoder: &Decoder<T>) -> Outcome<T> {
        let separator = if self.config.url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}{}", self.config.url, separator, request.query_params());

        debug!(url = %self.config.url, "dispatching graphql query via GET");
        let http = HttpClient::new(self.config.timeout);
        let raw = match http.get(&url, &self.config.headers).await {
            Ok(response) => self.fold_response(response),
            Err(error) => fold_http_error(error),
        };
        classify(decoder, raw)
    }

    async fn post_raw(&self, request: &Request) -> RawResponse {
        let body = request.body_json().to_string();
        debug!(
            url = %self.config.url,
            operation = request.operation_name.as_deref().unwrap_or(""),
            "dispatching graphql request"
        );

        let http = HttpClient::new(self.config.timeout);
        match http.post(&self.config.url, &body, &self.config.headers).await {
            Ok(response) => self.fold_response(response),
            Err(error) => fold_http_error(error),
        }
    }

    fn fold_response(&self, response: HttpResponse) -> RawResponse {
        RawResponse::Status {
            meta: ResponseMeta {
                url: self.config.url.clone(),
                status_code: response.status_code,
                status_text: response.status_text,
                headers: response.headers,
            },
            body: response.body,
        }
    }
}

fn fold_http_error(error: HttpError) -> RawResponse {
    match error {
        HttpError::BadUrl(url) => RawResponse::BadUrl(url),
        HttpError::Timeout => RawResponse::Timeout,
        HttpError::Network(reason) => {
            debug!(%reason, "network failure");
            RawResponse::NetworkError
        }
    }
}
