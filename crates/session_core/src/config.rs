use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::Amount;

use crate::error::SessionError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub is_restore: bool,
    pub message_log_enabled: bool,
    pub bell_enabled: bool,
    pub inbound_queue_capacity: usize,
    pub history_load_limit: usize,
    pub repaint_debounce_ms: u64,
    pub balance_poll_short_ms: u64,
    pub balance_poll_long_secs: u64,
    pub stable_poll_threshold: u32,
    pub wallet_check_backoff_secs: u64,
    pub wallet_check_max_backoff_secs: u64,
    pub payment_gate_ttl_secs: u64,
    pub missing_kx_warn_interval_secs: u64,
    pub outbound_queue_poll_ms: u64,
    pub min_wallet_balance: Amount,
    pub min_recv_balance: Amount,
    pub min_send_balance: Amount,
    pub pinned_windows: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_restore: false,
            message_log_enabled: true,
            bell_enabled: false,
            inbound_queue_capacity: 10_000,
            history_load_limit: 500,
            repaint_debounce_ms: 5,
            balance_poll_short_ms: 500,
            balance_poll_long_secs: 10,
            stable_poll_threshold: 20,
            wallet_check_backoff_secs: 10,
            wallet_check_max_backoff_secs: 60,
            payment_gate_ttl_secs: 60,
            missing_kx_warn_interval_secs: 24 * 60 * 60,
            outbound_queue_poll_ms: 100,
            min_wallet_balance: Amount::from_coins(1.0),
            min_recv_balance: Amount::from_coins(0.01),
            min_send_balance: Amount::from_coins(0.01),
            pinned_windows: Vec::new(),
        }
    }
}

impl Settings {
    pub fn repaint_debounce(&self) -> Duration {
        Duration::from_millis(self.repaint_debounce_ms)
    }

    pub fn balance_poll_short(&self) -> Duration {
        Duration::from_millis(self.balance_poll_short_ms)
    }

    pub fn balance_poll_long(&self) -> Duration {
        Duration::from_secs(self.balance_poll_long_secs)
    }

    pub fn wallet_check_backoff(&self) -> Duration {
        Duration::from_secs(self.wallet_check_backoff_secs)
    }

    pub fn wallet_check_max_backoff(&self) -> Duration {
        Duration::from_secs(self.wallet_check_max_backoff_secs)
    }

    pub fn payment_gate_ttl(&self) -> Duration {
        Duration::from_secs(self.payment_gate_ttl_secs)
    }

    pub fn missing_kx_warn_interval(&self) -> Duration {
        Duration::from_secs(self.missing_kx_warn_interval_secs)
    }

    pub fn outbound_queue_poll(&self) -> Duration {
        Duration::from_millis(self.outbound_queue_poll_ms)
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.inbound_queue_capacity == 0 {
            return Err(SessionError::Config(
                "inbound_queue_capacity must be positive".into(),
            ));
        }
        if self.wallet_check_backoff_secs == 0
            || self.wallet_check_max_backoff_secs < self.wallet_check_backoff_secs
        {
            return Err(SessionError::Config(format!(
                "wallet check backoff {}s..{}s is not a valid range",
                self.wallet_check_backoff_secs, self.wallet_check_max_backoff_secs
            )));
        }
        if self.balance_poll_short_ms == 0 || self.balance_poll_long_secs == 0 {
            return Err(SessionError::Config(
                "balance poll intervals must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Defaults, then the optional TOML file, then `APP__*` environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, SessionError> {
    let mut settings = match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|err| {
                SessionError::Config(format!("failed to read '{}': {err}", path.display()))
            })?;
            parse_settings(&raw)?
        }
        None => Settings::default(),
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

pub fn parse_settings(raw: &str) -> Result<Settings, SessionError> {
    toml::from_str(raw).map_err(|err| SessionError::Config(err.to_string()))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SessionError> {
    value
        .trim()
        .parse()
        .map_err(|_| SessionError::Config(format!("{key}: cannot parse {value:?}")))
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), SessionError> {
    if let Some(v) = lookup("APP__IS_RESTORE") {
        settings.is_restore = parse_env("APP__IS_RESTORE", &v)?;
    }
    if let Some(v) = lookup("APP__MESSAGE_LOG_ENABLED") {
        settings.message_log_enabled = parse_env("APP__MESSAGE_LOG_ENABLED", &v)?;
    }
    if let Some(v) = lookup("APP__BELL_ENABLED") {
        settings.bell_enabled = parse_env("APP__BELL_ENABLED", &v)?;
    }
    if let Some(v) = lookup("APP__INBOUND_QUEUE_CAPACITY") {
        settings.inbound_queue_capacity = parse_env("APP__INBOUND_QUEUE_CAPACITY", &v)?;
    }
    if let Some(v) = lookup("APP__HISTORY_LOAD_LIMIT") {
        settings.history_load_limit = parse_env("APP__HISTORY_LOAD_LIMIT", &v)?;
    }
    if let Some(v) = lookup("APP__MIN_WALLET_BALANCE") {
        settings.min_wallet_balance = Amount(parse_env("APP__MIN_WALLET_BALANCE", &v)?);
    }
    if let Some(v) = lookup("APP__MIN_RECV_BALANCE") {
        settings.min_recv_balance = Amount(parse_env("APP__MIN_RECV_BALANCE", &v)?);
    }
    if let Some(v) = lookup("APP__MIN_SEND_BALANCE") {
        settings.min_send_balance = Amount(parse_env("APP__MIN_SEND_BALANCE", &v)?);
    }
    if let Some(v) = lookup("APP__PINNED_WINDOWS") {
        settings.pinned_windows = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
