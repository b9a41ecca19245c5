use super::*;

fn settings() -> ClientSettings {
    ClientSettings::default()
}

#[test]
fn endpoint_defaults_to_shop_origin() {
    let url = graphql_endpoint(&settings(), "acme.myshopify.com").unwrap();
    assert_eq!(
        url,
        "https://acme.myshopify.com/admin/api/2025-01/graphql.json"
    );
}

#[test]
fn endpoint_uses_base_url_override() {
    let settings = ClientSettings {
        admin_base_url: Some("http://127.0.0.1:9999/".to_owned()),
        api_version: "unstable".to_owned(),
        ..ClientSettings::default()
    };
    let url = graphql_endpoint(&settings, "acme.myshopify.com").unwrap();
    assert_eq!(url, "http://127.0.0.1:9999/admin/api/unstable/graphql.json");
}

#[test]
fn endpoint_rejects_shop_with_path() {
    let err = graphql_endpoint(&settings(), "acme.myshopify.com/admin").unwrap_err();
    assert!(
        matches!(err, ShopifyError::InvalidShopUrl { .. }),
        "expected InvalidShopUrl, got: {err:?}"
    );
}

#[test]
fn endpoint_rejects_empty_shop() {
    let err = graphql_endpoint(&settings(), "  ").unwrap_err();
    assert!(matches!(err, ShopifyError::InvalidShopUrl { .. }));
}

#[test]
fn retry_after_rounds_fractional_seconds_up() {
    assert_eq!(parse_retry_after("2.0"), Some(2));
    assert_eq!(parse_retry_after("0.5"), Some(1));
    assert_eq!(parse_retry_after("7"), Some(7));
}

#[test]
fn retry_after_rejects_garbage() {
    assert_eq!(parse_retry_after("soon"), None);
    assert_eq!(parse_retry_after("-1"), None);
}

#[test]
fn debug_output_redacts_access_token() {
    let client = ShopifyAdminClient::new(&settings(), "acme.myshopify.com", "shpat_secret")
        .expect("client builds");
    let debug = format!("{client:?}");
    assert!(!debug.contains("shpat_secret"));
    assert!(debug.contains("[redacted]"));
}

#[test]
fn settings_follow_app_config() {
    let config = spector_core::AppConfig {
        database_url: "postgres://example".to_owned(),
        env: spector_core::Environment::Test,
        bind_addr: "127.0.0.1:3000".parse().unwrap(),
        log_level: "info".to_owned(),
        db_max_connections: 10,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
        shopify_api_version: "2024-10".to_owned(),
        shopify_admin_base_url: Some("http://127.0.0.1:8081".to_owned()),
        shopify_request_timeout_secs: 12,
        shopify_max_retries: 5,
        shopify_retry_backoff_base_secs: 2,
    };

    let settings = ClientSettings::from_app_config(&config);
    assert_eq!(
        settings,
        ClientSettings {
            api_version: "2024-10".to_owned(),
            timeout_secs: 12,
            max_retries: 5,
            backoff_base_secs: 2,
            admin_base_url: Some("http://127.0.0.1:8081".to_owned()),
        }
    );
}
