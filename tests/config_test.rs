//! 設定ファイルのテスト

use petcare_admin::config::Config;
use petcare_admin::error::PetCareError;
use tempfile::tempdir;

/// 設定ファイルが無ければ既定値
#[test]
fn test_missing_config_uses_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let config = Config::load_from(&dir.path().join("config.json")).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.page_size, 10);
}

/// 保存と読み込み
#[test]
fn test_config_roundtrip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("config.json");
    let config = Config {
        base_url: "https://clinic.example.com/api".into(),
        page_size: 25,
        ..Config::default()
    };

    config.save_to(&path).unwrap();
    let loaded = Config::load_from(&path).unwrap();

    assert_eq!(loaded, config);
}

/// 欠けた項目は既定値で補う
#[test]
fn test_partial_config_fills_defaults() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"base_url": "https://api.example.com"}"#).unwrap();

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.base_url, "https://api.example.com");
    assert_eq!(config.timeout_seconds, Config::default().timeout_seconds);
}

/// 壊れたJSONはエラー
#[test]
fn test_broken_config_is_an_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{").unwrap();

    let result = Config::load_from(&path);
    assert!(matches!(result, Err(PetCareError::JsonParse(_))));
}

/// スキームの無いURLは保存前に弾く
#[test]
fn test_set_base_url_rejects_missing_scheme() {
    let mut config = Config::default();
    let result = config.set_base_url("clinic.example.com");

    assert!(matches!(result, Err(PetCareError::Config(_))));
    assert_eq!(config.base_url, Config::default().base_url);
}
