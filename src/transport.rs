// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::HeaderMap;
use serde_json::Value;
use url::Url;

use crate::{error::Result, metadata};

/// Response header that carries the session token after a successful login.
pub(crate) const TOKEN_HEADER: &str = "jwt-token";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Request {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) body: Option<Value>,
}

/// A reply from the server, whatever its status.
///
/// Only failures to exchange a request at all are reported as errors by a
/// [`Transport`]; a 4xx or 5xx reply is a normal [`Reply`].
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reply {
    pub(crate) status: u16,
    pub(crate) token: Option<String>,
    pub(crate) body: Value,
}

impl Reply {
    pub(crate) const fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Whether the status is outside the 2xx range.
    pub(crate) const fn is_error(&self) -> bool {
        self.status < 200 || self.status >= 300
    }

    /// The `message` field the server puts in error bodies, if any.
    pub(crate) fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, req: Request) -> Result<Reply>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, req: Request) -> Result<Reply> {
        (**self).send(req).await
    }
}

pub(crate) struct Http {
    client: reqwest::Client,
}

impl Http {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(metadata::USER_AGENT.as_str())
                .build()?,
        })
    }
}

#[async_trait]
impl Transport for Http {
    async fn send(&self, req: Request) -> Result<Reply> {
        debug!("Sending {:?} {}", req.method, req.url);

        let mut builder = match req.method {
            Method::Get => self.client.get(req.url),
            Method::Post => self.client.post(req.url),
        };
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let token = token_header(response.headers());
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        debug!("Received status {status}");
        Ok(Reply {
            status,
            token,
            body,
        })
    }
}

// A header that is present but not text is still a token; it fails to decode
// later instead of looking absent.
fn token_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(TOKEN_HEADER)?;
    Some(match value.to_str() {
        Ok(token) => token.to_owned(),
        Err(e) => {
            warn!("The {TOKEN_HEADER} header is not valid text: {e}");
            String::from_utf8_lossy(value.as_bytes()).into_owned()
        }
    })
}
