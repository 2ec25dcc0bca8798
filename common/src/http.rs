//! HTTPクライアントアダプタ
//!
//! 実際の送信は `Transport` に委譲する（ブラウザでは fetch、CLIでは reqwest）。
//! `ApiClient` はセッションのBearerトークン付与とエンベロープの正規化だけを担う。

use crate::envelope::{self, ApiResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 送信リクエスト
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// `/clients/3` のようなAPIルート相対パス
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl HttpRequest {
    /// ベースURLと結合した完全なURL
    pub fn url(&self, base: &str) -> Result<String> {
        let joined = format!("{}{}", base.trim_end_matches('/'), self.path);
        let mut url = url::Url::parse(&joined)
            .map_err(|e| Error::Network(format!("invalid URL {}: {}", joined, e)))?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url.into())
    }
}

/// 受信レスポンス（ボディは未解釈）
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// 送信手段
///
/// 応答そのものが得られない場合のみ `Error::Network` を返す。
/// 4xx/5xx はレスポンスとして返し、解釈は `ApiClient` に任せる。
#[async_trait(?Send)]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// APIクライアント
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// 以降のリクエストに付与するトークンを差し替える
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// 同じ送信手段を使い、トークンだけ独立させたクライアント
    pub fn scoped(&self, token: Option<String>) -> Self {
        Self {
            transport: self.transport.clone(),
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<ApiResponse<T>> {
        let request = HttpRequest {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
            bearer: self.token(),
        };

        tracing::debug!(%method, path, authenticated = request.bearer.is_some(), "api request");

        let response = self.transport.send(request).await?;

        tracing::debug!(%method, path, status = response.status, "api response");

        envelope::decode(response.status, &response.body)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>> {
        self.request(Method::Get, path, query, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<ApiResponse<T>> {
        self.request(Method::Post, path, &[], Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>> {
        self.request(Method::Delete, path, &[], None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{envelope, MockTransport};
    use serde_json::json;

    #[test]
    fn test_request_url_joins_base_and_query() {
        let request = HttpRequest {
            method: Method::Get,
            path: "/clients".into(),
            query: vec![("page".into(), "2".into()), ("per_page".into(), "10".into())],
            body: None,
            bearer: None,
        };
        let url = request.url("https://api.example.com/api/").unwrap();
        assert_eq!(url, "https://api.example.com/api/clients?page=2&per_page=10");
    }

    #[test]
    fn test_request_url_rejects_garbage_base() {
        let request = HttpRequest {
            method: Method::Get,
            path: "/clients".into(),
            query: vec![],
            body: None,
            bearer: None,
        };
        assert!(matches!(request.url("not a url"), Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_bearer_attached_only_when_token_present() {
        let mock = MockTransport::new();
        mock.respond("GET /breeds", 200, envelope(200, "", json!([])));
        mock.respond("GET /breeds", 200, envelope(200, "", json!([])));
        let api = ApiClient::new(mock.clone());

        let _: ApiResponse<Vec<Value>> = api.get("/breeds", &[]).await.unwrap();
        api.set_token(Some("secret".into()));
        let _: ApiResponse<Vec<Value>> = api.get("/breeds", &[]).await.unwrap();

        let sent = mock.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].bearer, None);
        assert_eq!(sent[1].bearer.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_client_methods_send_matching_verbs() {
        let mock = MockTransport::new();
        mock.respond("GET /pets", 200, envelope(200, "", Value::Null));
        mock.respond("POST /pets/1", 200, envelope(200, "", Value::Null));
        mock.respond("DELETE /pets/1", 200, envelope(200, "", Value::Null));
        let api = ApiClient::new(mock.clone());

        api.get::<Value>("/pets", &[]).await.unwrap();
        api.post::<Value>("/pets/1", json!({"name": "Pochi"})).await.unwrap();
        api.delete::<Value>("/pets/1").await.unwrap();

        let verbs: Vec<&str> = mock.requests().iter().map(|r| r.method.as_str()).collect();
        assert_eq!(verbs, vec!["GET", "POST", "DELETE"]);
    }

    #[tokio::test]
    async fn test_network_failure_propagates() {
        let mock = MockTransport::new();
        mock.fail("GET /clients", "connection refused");
        let api = ApiClient::new(mock);

        let err = api.get::<Value>("/clients", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_envelope_error_under_http_200_is_api_error() {
        let mock = MockTransport::new();
        mock.respond("POST /clients", 200, envelope(422, "Invalid", json!({"email": ["taken"]})));
        let api = ApiClient::new(mock);

        let err = api.post::<Value>("/clients", json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Api { code: 422, .. }));
        assert!(err.field_errors().is_some());
    }
}
