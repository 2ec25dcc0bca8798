//! fetch API による送信
//!
//! 4xx/5xx もレスポンスとして返し、エンベロープの解釈は `ApiClient` に任せる。

use async_trait::async_trait;
use petcare_common::{Error, HttpRequest, HttpResponse, Result, Transport};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// ビルド時に `PETCARE_API_URL` で差し替えられる
pub const DEFAULT_API_URL: &str = match option_env!("PETCARE_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000/api",
};

pub const DEFAULT_STORAGE_URL: &str = match option_env!("PETCARE_STORAGE_URL") {
    Some(url) => url,
    None => "http://localhost:8000/storage",
};

pub struct FetchTransport {
    base_url: String,
}

impl FetchTransport {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

impl Default for FetchTransport {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

fn js_error(value: JsValue) -> Error {
    Error::Network(
        value
            .as_string()
            .unwrap_or_else(|| format!("{:?}", value)),
    )
}

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url(&self.base_url)?;

        let opts = RequestInit::new();
        opts.set_method(request.method.as_str());
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = &request.body {
            let body = serde_json::to_string(body)?;
            opts.set_body(&JsValue::from_str(&body));
        }

        let fetch_request = Request::new_with_str_and_init(&url, &opts).map_err(js_error)?;
        let headers = fetch_request.headers();
        headers.set("Accept", "application/json").map_err(js_error)?;
        if request.body.is_some() {
            headers
                .set("Content-Type", "application/json")
                .map_err(js_error)?;
        }
        if let Some(token) = &request.bearer {
            headers
                .set("Authorization", &format!("Bearer {}", token))
                .map_err(js_error)?;
        }

        let window = web_sys::window().ok_or_else(|| Error::Network("window is unavailable".into()))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&fetch_request))
            .await
            .map_err(js_error)?;
        let resp: Response = resp_value.dyn_into().map_err(js_error)?;

        let text = JsFuture::from(resp.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;

        Ok(HttpResponse {
            status: resp.status(),
            body: text.as_string().unwrap_or_default(),
        })
    }
}
