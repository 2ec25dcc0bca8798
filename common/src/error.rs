//! エラー型定義
//!
//! 通信失敗・APIの業務エラー・入力検証エラーを一つの分類にまとめる。
//! ストアは操作の境界でこれらを捕捉し、`Outcome` に変換して返す。

use std::collections::BTreeMap;
use thiserror::Error;

/// フィールド名 → 検証メッセージ一覧
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    /// 応答が得られなかった（接続不可・タイムアウト）
    #[error("Network error: {0}")]
    Network(String),

    /// サーバが構造化されたエラーを返した
    #[error("API error {code}: {message}")]
    Api {
        code: u16,
        message: String,
        field_errors: Option<FieldErrors>,
    },

    /// 送信前のクライアント側検証で弾かれた
    #[error("Validation error: {}", summarize(.0))]
    Validation(FieldErrors),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// サーバ由来のメッセージ（画面表示用）
    pub fn user_message(&self) -> Option<String> {
        match self {
            Error::Api { message, .. } if !message.is_empty() => Some(message.clone()),
            Error::Validation(errors) => Some(summarize(errors)),
            _ => None,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Error::Api { field_errors, .. } => field_errors.as_ref(),
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .values()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
