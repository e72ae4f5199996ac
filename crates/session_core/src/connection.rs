use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use anyhow::anyhow;
use shared::domain::ConnectionState;
use tokio::{sync::Notify, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{error::SessionError, lock, notify::UiSignal, session::Session};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerPolicy {
    pub push_rate: u64, // atoms/kB
    pub sub_rate: u64,  // milli-atoms/sub
    pub expiration_days: u64,
}

pub struct ConnectionController {
    state: Mutex<ConnectionState>,
    policy: Mutex<ServerPolicy>,
    skip_check: Notify,
    first_conn: AtomicBool,
}

impl Default for ConnectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ConnectionState::Offline),
            policy: Mutex::new(ServerPolicy::default()),
            skip_check: Notify::new(),
            first_conn: AtomicBool::new(true),
        }
    }

    pub fn current_state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    pub fn server_policy(&self) -> ServerPolicy {
        *lock(&self.policy)
    }

    pub(crate) fn transition(&self, session: &Session, next: ConnectionState) -> bool {
        {
            let mut state = lock(&self.state);
            if *state == next {
                return false;
            }
            if !state.can_transition_to(next) {
                warn!(from = %*state, to = %next, "conn: rejected invalid state transition");
                return false;
            }
            *state = next;
        }
        debug!(state = %next, "conn: state changed");
        session.notify(UiSignal::ConnectionChanged(next));
        true
    }

    fn go_online(&self, session: &Session) {
        if self.current_state() == ConnectionState::Offline {
            self.transition(session, ConnectionState::CheckingWallet);
        }
        self.transition(session, ConnectionState::Online);
    }

    fn go_offline(&self, session: &Session) {
        self.transition(session, ConnectionState::Offline);
    }

    pub fn skip_next_wallet_check(&self) {
        self.skip_check.notify_one();
    }

    /// Gates a fresh server connection on the local wallet being able to pay
    /// the server. Returns an error when the connection or the session is
    /// cancelled before the wallet became usable.
    pub async fn check_server_session(
        &self,
        session: &Session,
        conn: &CancellationToken,
        server_node: &str,
    ) -> Result<(), SessionError> {
        let settings = session.settings();
        let session_cancel = session.cancel_token();
        let was_first_conn = self.first_conn.swap(false, Ordering::SeqCst);

        if settings.is_restore && was_first_conn {
            let client = session.client().clone();
            session.spawn(async move { client.remain_offline().await });
            session.diag_lines([
                String::new(),
                "Wallet was restored - remaining offline from server to allow manual interventions"
                    .to_string(),
                "Use /online to go online after the LN wallet is verified to be up to date"
                    .to_string(),
                String::new(),
                "Use /ln restoremultiscb <scb-file> to restore an SCB backup file to force-close old channels"
                    .to_string(),
                String::new(),
            ]);
            tokio::select! {
                _ = conn.cancelled() => {}
                _ = session_cancel.cancelled() => {}
            }
            self.go_offline(session);
            return Err(SessionError::ConnectionAborted(
                "remaining offline after wallet restore".into(),
            ));
        }

        if conn.is_cancelled() {
            self.go_offline(session);
            return Err(SessionError::ConnectionAborted("connection closed".into()));
        }

        if self.current_state() == ConnectionState::Online {
            self.go_offline(session);
        }
        self.transition(session, ConnectionState::CheckingWallet);
        info!(node = %server_node, "conn: connected to server, checking wallet");
        session.diag_msg("Connected to server! Checking LN conn to server node...");

        let mut backoff = settings.wallet_check_backoff();
        let max_backoff = settings.wallet_check_max_backoff();
        loop {
            if session.client().onboarding_in_progress() {
                info!("conn: skipping wallet checks while onboarding");
                self.go_online(session);
                return Ok(());
            }

            let check = match session.backend().check_wallet_usable(server_node).await {
                Ok(()) if session.backend().exchange_rate() <= 0.0 => {
                    Err(anyhow!("exchange rate is zero"))
                }
                res => res,
            };
            let err = match check {
                Ok(()) => {
                    info!("conn: wallet usable with server");
                    self.go_online(session);
                    return Ok(());
                }
                Err(err) => err,
            };

            warn!(error = %err, backoff_secs = backoff.as_secs(), "conn: wallet not ready for use");
            session.diag_lines([
                String::new(),
                format!("LN Wallet not usable with the server: {err}"),
                format!("Checking again in {}", format_backoff(backoff)),
                "Type /skipwalletcheck to skip these tests".to_string(),
            ]);

            tokio::select! {
                _ = self.skip_check.notified() => {
                    warn!("conn: skipping wallet check as requested");
                    session.diag_msg("Skipping next wallet check as requested");
                    self.go_online(session);
                    return Ok(());
                }
                _ = conn.cancelled() => {
                    self.go_offline(session);
                    return Err(SessionError::ConnectionAborted("connection closed".into()));
                }
                _ = session_cancel.cancelled() => {
                    self.go_offline(session);
                    return Err(SessionError::ConnectionAborted("session shutting down".into()));
                }
                _ = sleep(backoff) => {
                    backoff = (backoff * 2).min(max_backoff);
                }
            }
        }
    }

    pub fn server_session_changed(&self, session: &Session, connected: bool, policy: ServerPolicy) {
        if !connected {
            self.go_offline(session);
            session.diag_msg("Connection to server closed");
            return;
        }

        let previous = {
            let mut current = lock(&self.policy);
            std::mem::replace(&mut *current, policy)
        };
        self.go_online(session);

        let mut lines = Vec::new();
        if previous.push_rate != policy.push_rate || previous.sub_rate != policy.sub_rate {
            lines.push(format!(
                "Push Rate: {:.8} DCR/kB, Sub Rate: {:.8} DCR/sub",
                policy.push_rate as f64 / 1e8,
                policy.sub_rate as f64 / 1e11
            ));
        }
        if previous.expiration_days != policy.expiration_days {
            lines.push(format!("Days to Expire Data: {}", policy.expiration_days));
        }
        lines.push("Client ready!".to_string());
        session.diag_lines(lines);
    }
}

fn format_backoff(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}m0s", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
#[path = "tests/connection_tests.rs"]
mod tests;
