//! APIレスポンスのエンベロープ
//!
//! 全レスポンスは `{code, title, message, result}` で包まれている。
//! HTTP 200 でも `code >= 400` なら業務エラーとして扱う。

use crate::error::{Error, FieldErrors, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 生のエンベロープ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<T>,
}

/// 正規化済みレスポンス
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTPステータス
    pub status: u16,
    /// エンベロープの code（無ければHTTPステータス）
    pub code: u16,
    pub title: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// `result` が必須の呼び出し向け
    pub fn into_data(self) -> Result<T> {
        self.data
            .ok_or_else(|| Error::Decode("response has no result".into()))
    }

    pub fn message(&self) -> Option<String> {
        if self.message.is_empty() {
            None
        } else {
            Some(self.message.clone())
        }
    }
}

/// HTTPステータスとボディをエンベロープとして解釈する
pub fn decode<T: DeserializeOwned>(status: u16, body: &str) -> Result<ApiResponse<T>> {
    let transport_ok = (200..300).contains(&status);

    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(e) if transport_ok => return Err(Error::Decode(e.to_string())),
        Err(_) => {
            return Err(Error::Api {
                code: status,
                message: reason(status),
                field_errors: None,
            })
        }
    };

    let code = envelope.code.unwrap_or(status);

    if !transport_ok || code >= 400 {
        let message = if envelope.message.is_empty() {
            reason(code)
        } else {
            envelope.message
        };
        return Err(Error::Api {
            code,
            message,
            field_errors: envelope.result.as_ref().and_then(field_errors_from),
        });
    }

    let data = match envelope.result {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<T>(value).map_err(|e| Error::Decode(e.to_string()))?,
        ),
    };

    Ok(ApiResponse {
        status,
        code,
        title: envelope.title,
        message: envelope.message,
        data,
    })
}

/// `result` がフィールド名 → 文字列配列のマップならフィールドエラーとして取り出す
///
/// 単一文字列の値は1要素の配列として受け付ける。それ以外の形が混ざっていれば None。
pub fn field_errors_from(value: &Value) -> Option<FieldErrors> {
    let map = value.as_object()?;
    if map.is_empty() {
        return None;
    }

    let mut errors = FieldErrors::new();
    for (field, messages) in map {
        let list = match messages {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()?,
            _ => return None,
        };
        errors.insert(field.clone(), list);
    }
    Some(errors)
}

fn reason(status: u16) -> String {
    match status {
        400 => "Bad Request".into(),
        401 => "Unauthorized".into(),
        403 => "Forbidden".into(),
        404 => "Not Found".into(),
        409 => "Conflict".into(),
        422 => "Unprocessable Entity".into(),
        429 => "Too Many Requests".into(),
        500 => "Internal Server Error".into(),
        502 => "Bad Gateway".into(),
        503 => "Service Unavailable".into(),
        _ => format!("HTTP {}", status),
    }
}
