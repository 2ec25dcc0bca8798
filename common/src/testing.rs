//! テスト用のスクリプト式Transport

use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

enum Reply {
    Respond(HttpResponse),
    Fail(String),
}

struct Scripted {
    reply: Reply,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct Inner {
    routes: HashMap<String, VecDeque<Scripted>>,
    requests: Vec<HttpRequest>,
}

/// ルート（`"GET /clients"`）ごとにFIFOで応答を返すモック
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, route: &str, status: u16, body: String) {
        self.push(route, Reply::Respond(HttpResponse { status, body }), None);
    }

    pub fn fail(&self, route: &str, reason: &str) {
        self.push(route, Reply::Fail(reason.to_string()), None);
    }

    /// 送信側が `()` を送るまで応答を保留する
    pub fn respond_gated(&self, route: &str, status: u16, body: String) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(route, Reply::Respond(HttpResponse { status, body }), Some(rx));
        tx
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn count(&self, route: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| format!("{} {}", r.method, r.path) == route)
            .count()
    }

    fn push(&self, route: &str, reply: Reply, gate: Option<oneshot::Receiver<()>>) {
        self.inner
            .lock()
            .unwrap()
            .routes
            .entry(route.to_string())
            .or_default()
            .push_back(Scripted { reply, gate });
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let route = format!("{} {}", request.method, request.path);
        let scripted = {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request);
            inner.routes.get_mut(&route).and_then(|q| q.pop_front())
        };

        let Some(scripted) = scripted else {
            return Err(Error::Network(format!("no scripted response for {}", route)));
        };

        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }

        match scripted.reply {
            Reply::Respond(response) => Ok(response),
            Reply::Fail(reason) => Err(Error::Network(reason)),
        }
    }
}

/// エンベロープ形式のボディ
pub fn envelope(code: u16, message: &str, result: Value) -> String {
    json!({
        "code": code,
        "title": if code >= 400 { "Error" } else { "Success" },
        "message": message,
        "result": result,
    })
    .to_string()
}

/// ページ形式のボディ
pub fn page_body(data: Vec<Value>, total: u64) -> String {
    envelope(200, "", json!({ "data": data, "total": total }))
}

pub fn client_json(id: i64, first: &str, last: &str) -> Value {
    json!({
        "id": id,
        "first_name": first,
        "last_name": last,
        "email": format!("{}@example.com", first.to_lowercase()),
        "phone": format!("090-0000-{:04}", id),
        "status": "active",
    })
}

pub fn pet_json(id: i64, name: &str, species: &str, client_id: i64) -> Value {
    json!({
        "id": id,
        "client_id": client_id,
        "name": name,
        "species": species,
        "status": "active",
    })
}
