use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetCareError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ログインしていません。`petcare login` でログインしてください")]
    NotAuthenticated,

    #[error("見つかりません: {0}")]
    NotFound(String),

    #[error("入力エラー: {0}")]
    InvalidInput(String),

    #[error("操作に失敗しました: {0}")]
    Operation(String),

    #[error("API呼び出しエラー: {0}")]
    Api(#[from] petcare_common::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PetCareError>;
