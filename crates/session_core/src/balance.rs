use std::time::Duration;

use shared::{
    domain::Amount,
    protocol::{ChannelBalance, WalletBalance},
};
use tokio::time::sleep;
use tracing::{debug, error, warn};

use crate::{
    config::Settings, error::SessionError, notify::UiSignal, session::Session, PaymentBackend,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub total: Amount,
    pub confirmed: Amount,
    pub recv: Amount,
    pub send: Amount,
}

impl BalanceSnapshot {
    fn from_backend(wallet: &WalletBalance, channels: &ChannelBalance) -> Self {
        Self {
            total: wallet.total,
            confirmed: wallet.confirmed,
            recv: channels.max_inbound,
            send: channels.max_outbound,
        }
    }

    // Confirmed funds moving around is not interesting on its own.
    fn same_as(&self, other: &BalanceSnapshot) -> bool {
        self.total == other.total && self.recv == other.recv && self.send == other.send
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupNeeds {
    pub needs_funds: bool,
    pub needs_send_channel: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    pub snapshot: BalanceSnapshot,
    pub changed: bool,
    pub next_interval: Duration,
    pub unconfirmed_funds: Option<Amount>,
    pub confirmed_funds: Option<Amount>,
}

pub struct BalanceTracker {
    short: Duration,
    long: Duration,
    stable_threshold: u32,
    last: BalanceSnapshot,
    same_count: u32,
    last_unconfirmed: Amount,
}

impl BalanceTracker {
    pub fn new(settings: &Settings) -> Self {
        Self {
            short: settings.balance_poll_short(),
            long: settings.balance_poll_long(),
            stable_threshold: settings.stable_poll_threshold,
            last: BalanceSnapshot::default(),
            same_count: 0,
            last_unconfirmed: Amount::ZERO,
        }
    }

    pub fn observe(&mut self, wallet: &WalletBalance, channels: &ChannelBalance) -> PollOutcome {
        let snapshot = BalanceSnapshot::from_backend(wallet, channels);
        let same = snapshot.same_as(&self.last);
        self.last = snapshot;

        let unconfirmed = wallet.unconfirmed;
        let unconfirmed_funds = (unconfirmed.is_positive() && unconfirmed != self.last_unconfirmed)
            .then_some(unconfirmed);
        let confirmed_funds = (self.last_unconfirmed.is_positive()
            && unconfirmed == Amount::ZERO
            && wallet.confirmed.is_positive())
        .then_some(wallet.confirmed);
        self.last_unconfirmed = unconfirmed;

        if same {
            self.same_count += 1;
        } else {
            self.same_count = 0;
        }
        let next_interval = if same && self.same_count > self.stable_threshold {
            self.long
        } else {
            self.short
        };

        PollOutcome {
            snapshot,
            changed: !same,
            next_interval,
            unconfirmed_funds,
            confirmed_funds,
        }
    }
}

pub fn evaluate_setup(
    snapshot: &BalanceSnapshot,
    has_pending_channels: bool,
    settings: &Settings,
) -> (SetupNeeds, Vec<String>) {
    let needs = SetupNeeds {
        needs_funds: snapshot.confirmed == Amount::ZERO && snapshot.send == Amount::ZERO,
        needs_send_channel: snapshot.send == Amount::ZERO && !has_pending_channels,
    };

    let mut warnings = Vec::new();
    if !settings.is_restore {
        if snapshot.total < settings.min_wallet_balance {
            warnings.push(
                "Wallet balance is low -- run '/ln newaddress' and send funds to the address"
                    .to_string(),
            );
        }
        if snapshot.send < settings.min_send_balance {
            warnings.push("Send capacity is low -- run '/ln openchannel'".to_string());
        }
        if snapshot.recv < settings.min_recv_balance {
            warnings.push("Receive capacity is low -- run '/ln requestrecv'".to_string());
        }
    }
    if !warnings.is_empty() {
        warnings.insert(0, String::new());
    }
    (needs, warnings)
}

async fn fetch_balances(
    backend: &dyn PaymentBackend,
) -> Result<(WalletBalance, ChannelBalance), SessionError> {
    let wallet = backend
        .wallet_balance()
        .await
        .map_err(|err| SessionError::TransientBackend(format!("wallet balance: {err}")))?;
    let channels = backend
        .channel_balance()
        .await
        .map_err(|err| SessionError::TransientBackend(format!("channel balance: {err}")))?;
    Ok((wallet, channels))
}

pub(crate) async fn run_balance_poller(session: &Session) {
    let cancel = session.cancel_token();
    let backend = session.backend().clone();
    let short = session.settings().balance_poll_short();
    let mut tracker = BalanceTracker::new(session.settings());
    let mut interval = Duration::ZERO;
    let mut checked_setup = false;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(interval) => {}
        }

        let (wallet, channels) = match fetch_balances(backend.as_ref()).await {
            Ok(balances) => balances,
            Err(err) => {
                error!(error = %err, "balance: failed to poll balances");
                interval = interval.max(short);
                continue;
            }
        };

        let outcome = tracker.observe(&wallet, &channels);
        session.store_balances(outcome.snapshot);

        if let Some(amount) = outcome.unconfirmed_funds {
            session.notify(UiSignal::UnconfirmedFunds(amount));
        }
        if let Some(amount) = outcome.confirmed_funds {
            session.notify(UiSignal::ConfirmedFunds(amount));
        }

        if !checked_setup {
            let has_pending = match backend.pending_open_channels().await {
                Ok(pending) => pending > 0,
                Err(err) => {
                    warn!(error = %err, "balance: failed to list pending channels");
                    false
                }
            };
            let (needs, warnings) = evaluate_setup(&outcome.snapshot, has_pending, session.settings());
            session.store_setup_needs(needs);
            if !warnings.is_empty() {
                session.diag_lines(warnings);
            }
            checked_setup = true;
        }

        if outcome.changed {
            debug!(
                total = outcome.snapshot.total.0,
                recv = outcome.snapshot.recv.0,
                send = outcome.snapshot.send.0,
                "balance: changed"
            );
            session.footer_invalidate();
            session.notify(UiSignal::FooterChanged);
        }
        interval = outcome.next_interval;
    }
}

#[cfg(test)]
#[path = "tests/balance_tests.rs"]
mod tests;
