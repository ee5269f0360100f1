//! REST API client
//!
//! Thin wrapper over `reqwest` that adds the bearer token, encodes JSON
//! bodies and maps error statuses onto [`HaError`].

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{HaError, HaResult};

/// Home Assistant REST client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HaClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HaClient {
    /// Create a client from a validated config
    pub fn new(config: &ClientConfig) -> HaResult<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform an authenticated request and return the raw response
    ///
    /// The status is not checked; see [`check_response`].
    pub async fn request<B>(&self, method: Method, path: &str, body: Option<&B>) -> HaResult<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "REST request");

        let mut request = self
            .client
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body)?);
        }

        Ok(request.send().await?)
    }

    /// Perform a request and decode the JSON response
    pub async fn json<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> HaResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = check_response(self.request(method, path, body).await?).await?;
        Ok(response.json().await?)
    }

    /// Perform a request and discard the response body
    pub async fn execute<B>(&self, method: Method, path: &str, body: Option<&B>) -> HaResult<()>
    where
        B: Serialize + ?Sized,
    {
        check_response(self.request(method, path, body).await?).await?;
        Ok(())
    }

    /// Perform a request and return the body as text
    pub async fn text<B>(&self, method: Method, path: &str, body: Option<&B>) -> HaResult<String>
    where
        B: Serialize + ?Sized,
    {
        let response = check_response(self.request(method, path, body).await?).await?;
        Ok(response.text().await?)
    }

    /// Perform a request and return the body as bytes
    pub async fn bytes<B>(&self, method: Method, path: &str, body: Option<&B>) -> HaResult<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let response = check_response(self.request(method, path, body).await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// GET and decode JSON
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> HaResult<T> {
        self.json(Method::GET, path, None::<&()>).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<T, B>(&self, path: &str, body: Option<&B>) -> HaResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.json(Method::POST, path, body).await
    }

    /// DELETE and ignore the body
    pub async fn delete(&self, path: &str) -> HaResult<()> {
        self.execute(Method::DELETE, path, None::<&()>).await
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Map a non-2xx response onto an error
pub async fn check_response(response: Response) -> HaResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty());

    debug!(status = status.as_u16(), "REST request failed");

    Err(match status {
        StatusCode::UNAUTHORIZED => HaError::Unauthorized,
        StatusCode::NOT_FOUND => HaError::NotFound,
        StatusCode::BAD_REQUEST if message.is_none() => HaError::BadRequest,
        StatusCode::METHOD_NOT_ALLOWED => HaError::MethodNotAllowed,
        _ => HaError::Api {
            status: status.as_u16(),
            message,
            body,
        },
    })
}

/// Build `?k=v&..` from parameters, skipping empty values
pub fn query_string(params: &BTreeMap<&str, String>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in params {
        if !value.is_empty() {
            serializer.append_pair(key, value);
            any = true;
        }
    }

    if any {
        format!("?{}", serializer.finish())
    } else {
        String::new()
    }
}

/// Format a timestamp the way the API expects in paths and queries
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
