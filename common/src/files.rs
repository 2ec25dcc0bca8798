//! ストレージ上のファイル（証明書・写真）のURL

use crate::models::Vaccination;
use url::Url;

/// ストレージ基準の相対パスからダウンロードURLを作る
///
/// 既に絶対URLならそのまま返す。空のパスや不正なベースURLなら None。
pub fn storage_url(base: &str, relative: &str) -> Option<String> {
    let relative = relative.trim();
    if relative.is_empty() {
        return None;
    }
    if let Ok(absolute) = Url::parse(relative) {
        if matches!(absolute.scheme(), "http" | "https") {
            return Some(absolute.into());
        }
    }

    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    );
    Url::parse(&joined).ok().map(String::from)
}

pub fn certificate_url(base: &str, vaccination: &Vaccination) -> Option<String> {
    storage_url(base, vaccination.certificate_path.as_deref()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url_joins_paths() {
        assert_eq!(
            storage_url("https://api.example.com/storage/", "/certificates/rabies 1.pdf").as_deref(),
            Some("https://api.example.com/storage/certificates/rabies%201.pdf")
        );
    }

    #[test]
    fn test_storage_url_passes_absolute_through() {
        assert_eq!(
            storage_url("https://api.example.com/storage", "https://cdn.example.com/a.jpg").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
    }

    #[test]
    fn test_storage_url_rejects_empty_and_bad_base() {
        assert!(storage_url("https://api.example.com/storage", "  ").is_none());
        assert!(storage_url("not a base", "a.pdf").is_none());
    }

    #[test]
    fn test_certificate_url_requires_path() {
        let mut vaccination = Vaccination {
            id: 1,
            vaccine: "狂犬病".into(),
            administered_on: None,
            next_due: None,
            certificate_path: None,
        };
        assert!(certificate_url("https://api.example.com/storage", &vaccination).is_none());

        vaccination.certificate_path = Some("certificates/1.pdf".into());
        assert_eq!(
            certificate_url("https://api.example.com/storage", &vaccination).as_deref(),
            Some("https://api.example.com/storage/certificates/1.pdf")
        );
    }
}
