use std::collections::HashMap;

use super::*;

#[test]
fn defaults_match_session_timings() {
    let settings = Settings::default();
    assert_eq!(settings.repaint_debounce(), Duration::from_millis(5));
    assert_eq!(settings.balance_poll_short(), Duration::from_millis(500));
    assert_eq!(settings.balance_poll_long(), Duration::from_secs(10));
    assert_eq!(settings.stable_poll_threshold, 20);
    assert_eq!(settings.wallet_check_backoff(), Duration::from_secs(10));
    assert_eq!(settings.wallet_check_max_backoff(), Duration::from_secs(60));
    assert_eq!(settings.payment_gate_ttl(), Duration::from_secs(60));
    assert_eq!(
        settings.missing_kx_warn_interval(),
        Duration::from_secs(86_400)
    );
    assert_eq!(settings.history_load_limit, 500);
    assert!(settings.validate().is_ok());
}

#[test]
fn parses_partial_toml_on_top_of_defaults() {
    let settings = parse_settings(
        r#"
        is_restore = true
        inbound_queue_capacity = 64
        min_send_balance = 2500
        pinned_windows = ["alice", "dev-gc"]
        "#,
    )
    .expect("parse");

    assert!(settings.is_restore);
    assert_eq!(settings.inbound_queue_capacity, 64);
    assert_eq!(settings.min_send_balance, Amount(2500));
    assert_eq!(settings.pinned_windows, vec!["alice", "dev-gc"]);
    assert_eq!(settings.history_load_limit, 500);
}

#[test]
fn rejects_malformed_toml() {
    let err = parse_settings("inbound_queue_capacity = \"many\"").expect_err("must fail");
    assert!(matches!(err, SessionError::Config(_)));
}

#[test]
fn env_overrides_replace_file_values() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("APP__IS_RESTORE", "true"),
        ("APP__INBOUND_QUEUE_CAPACITY", "12"),
        ("APP__PINNED_WINDOWS", "bob, , carol"),
    ]);
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings, |key| env.get(key).map(|v| v.to_string()))
        .expect("overrides");

    assert!(settings.is_restore);
    assert_eq!(settings.inbound_queue_capacity, 12);
    assert_eq!(settings.pinned_windows, vec!["bob", "carol"]);
}

#[test]
fn env_override_with_bad_value_is_a_config_error() {
    let mut settings = Settings::default();
    let err = apply_env_overrides(&mut settings, |key| {
        (key == "APP__HISTORY_LOAD_LIMIT").then(|| "lots".to_string())
    })
    .expect_err("must fail");
    assert!(err.to_string().contains("APP__HISTORY_LOAD_LIMIT"));
}

#[test]
fn validation_rejects_inverted_backoff_range() {
    let settings = Settings {
        wallet_check_backoff_secs: 30,
        wallet_check_max_backoff_secs: 10,
        ..Settings::default()
    };
    assert!(matches!(settings.validate(), Err(SessionError::Config(_))));
}

#[test]
fn load_settings_reports_missing_file() {
    let err = load_settings(Some(Path::new("/nonexistent/session.toml"))).expect_err("must fail");
    assert!(err.to_string().contains("failed to read"));
}
