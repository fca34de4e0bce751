//! The authenticated REST request envelope: retry-on-429, multipart
//! assembly, and the representative convenience operations built on top of
//! it.

mod multipart;
mod operations;

pub use multipart::{multipart_form, MultipartPlan};

use crate::error::{map_error_body, ErrorResponse, FluxError, FluxResult};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Automatic retries on HTTP 429 before giving up, mirroring the reference
/// implementation's `_MAX_RATE_LIMIT_RETRIES`.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 5;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> FluxResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(FluxError::from)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token,
        })
    }

    #[cfg(test)]
    pub(crate) fn base_url_for_test(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bot {token}")),
            None => builder,
        }
    }

    /// Issues one logical request, retrying up to [`MAX_RATE_LIMIT_RETRIES`]
    /// times on HTTP 429, sleeping the server's `retry_after` (default 1s)
    /// between attempts.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        json: Option<&Value>,
    ) -> FluxResult<T> {
        let url = self.url(path);
        for attempt in 0..=MAX_RATE_LIMIT_RETRIES {
            let mut builder = self.authed(self.http.request(method.clone(), &url));
            if let Some(body) = json {
                builder = builder.json(body);
            }
            let response = builder.send().await?;
            let status = response.status().as_u16();

            if status == 204 {
                return serde_json::from_value(Value::Object(Default::default()))
                    .map_err(|error| FluxError::InvalidResponse {
                        error: error.to_string(),
                    });
            }

            if status == 429 && attempt < MAX_RATE_LIMIT_RETRIES {
                let body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                    code: None,
                    message: String::new(),
                    retry_after: None,
                });
                let retry_after = body.retry_after.unwrap_or(1.0);
                log::warn!("rate limited on {url}, retrying in {retry_after}s (attempt {attempt})");
                tokio::time::sleep(Duration::from_secs_f64(retry_after)).await;
                continue;
            }

            if !(200..300).contains(&status) {
                let body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                    code: None,
                    message: String::new(),
                    retry_after: None,
                });
                return Err(map_error_body(body, status));
            }

            return response
                .json::<T>()
                .await
                .map_err(|error| FluxError::InvalidResponse {
                    error: error.to_string(),
                });
        }
        Err(FluxError::RateLimited { retry_after: 0.0 })
    }

    /// Like [`request`](Self::request), but sends a multipart body built by
    /// [`multipart_form`] instead of a plain JSON body.
    pub async fn request_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        plan: MultipartPlan,
    ) -> FluxResult<T> {
        let url = self.url(path);
        for attempt in 0..=MAX_RATE_LIMIT_RETRIES {
            let form = multipart_form(&plan)?;
            let builder = self.authed(self.http.request(method.clone(), &url)).multipart(form);
            let response = builder.send().await?;
            let status = response.status().as_u16();

            if status == 429 && attempt < MAX_RATE_LIMIT_RETRIES {
                let body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                    code: None,
                    message: String::new(),
                    retry_after: None,
                });
                let retry_after = body.retry_after.unwrap_or(1.0);
                log::warn!("rate limited on {url}, retrying in {retry_after}s (attempt {attempt})");
                tokio::time::sleep(Duration::from_secs_f64(retry_after)).await;
                continue;
            }

            if !(200..300).contains(&status) {
                let body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                    code: None,
                    message: String::new(),
                    retry_after: None,
                });
                return Err(map_error_body(body, status));
            }

            return response
                .json::<T>()
                .await
                .map_err(|error| FluxError::InvalidResponse {
                    error: error.to_string(),
                });
        }
        Err(FluxError::RateLimited { retry_after: 0.0 })
    }

    pub(crate) fn to_json<T: Serialize>(value: &T) -> FluxResult<Value> {
        serde_json::to_value(value).map_err(|error| FluxError::InvalidArguments {
            message: error.to_string(),
        })
    }
}

pub use operations::*;
