//! 送信前のクライアント側入力検証

use crate::error::{Error, FieldErrors, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub const MIN_PASSWORD_LEN: usize = 8;

/// 入力フォームの検証
pub trait Validate {
    /// 問題のあるフィールドごとのメッセージ（空なら妥当）
    fn validate(&self) -> FieldErrors;

    fn check(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }
}

/// フィールドエラーの組み立て補助
#[derive(Debug, Default)]
pub struct Checker {
    errors: FieldErrors,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn required(&mut self, field: &str, value: &str, label: &str) {
        if value.trim().is_empty() {
            self.add(field, &format!("{}を入力してください", label));
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "メールアドレスを入力してください");
        } else if !is_email(value) {
            self.add(field, "メールアドレスの形式が正しくありません");
        }
    }

    /// 任意入力のメールアドレス（空なら検証しない）
    pub fn optional_email(&mut self, field: &str, value: &str) {
        if !value.trim().is_empty() && !is_email(value) {
            self.add(field, "メールアドレスの形式が正しくありません");
        }
    }

    pub fn finish(self) -> FieldErrors {
        self.errors
    }
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}
