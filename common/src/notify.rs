//! 操作結果をトーストに変換する

use crate::store::{FetchStatus, Outcome};
use crate::toast::{ToastId, ToastMessage, ToastQueue, ToastSpec};

/// サーバからメッセージが得られなかったときの文言
pub const FALLBACK_ERROR: &str = "エラーが発生しました。時間をおいて再度お試しください。";

const ERROR_TITLE: &str = "エラー";

/// 更新系操作の結果を通知する
///
/// 成功時はサーバのメッセージ（無ければ `done`）、失敗時はフィールドエラーの一覧か
/// サーバのメッセージを出す。
pub fn report_outcome<T>(toasts: &ToastQueue, outcome: &Outcome<T>, done: &str) -> ToastId {
    if outcome.success {
        let message = outcome.message.clone().unwrap_or_else(|| done.to_string());
        return toasts.add(ToastSpec::success("完了", message));
    }

    let message = match &outcome.field_errors {
        Some(errors) if !errors.is_empty() => {
            ToastMessage::Lines(errors.values().flatten().cloned().collect())
        }
        _ => ToastMessage::Text(
            outcome
                .message
                .clone()
                .unwrap_or_else(|| FALLBACK_ERROR.to_string()),
        ),
    };
    toasts.add(ToastSpec::danger(ERROR_TITLE, message))
}

/// 読み込みの失敗だけを通知する（破棄された応答は無視）
pub fn report_fetch(toasts: &ToastQueue, status: &FetchStatus) -> Option<ToastId> {
    match status {
        FetchStatus::Failed(message) if message.is_empty() => {
            Some(toasts.add(ToastSpec::danger(ERROR_TITLE, FALLBACK_ERROR)))
        }
        FetchStatus::Failed(message) => Some(toasts.add(ToastSpec::danger(ERROR_TITLE, message.as_str()))),
        FetchStatus::Applied | FetchStatus::Superseded => None,
    }
}
