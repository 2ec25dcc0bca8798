//! reqwest による送信

use crate::error::{PetCareError, Result};
use async_trait::async_trait;
use petcare_common::{Error, HttpRequest, HttpResponse, Method, Transport};
use std::time::Duration;

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds.max(1)))
            .user_agent(concat!("petcare-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PetCareError::Config(format!("HTTPクライアントの初期化に失敗: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> petcare_common::Result<HttpResponse> {
        let url = request.url(&self.base_url)?;

        let mut builder = self
            .client
            .request(to_reqwest(request.method), &url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("タイムアウトしました: {}", url))
            } else {
                Error::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}
