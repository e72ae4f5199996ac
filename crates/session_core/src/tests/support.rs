use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{
    domain::{GroupId, UserId, ID_LEN},
    protocol::{
        ChannelBalance, ChannelEvent, HistoryEntry, HistoryPage, RemoteUser, SendProgress,
        WalletBalance,
    },
};
use tokio::sync::mpsc;

use crate::{
    config::Settings, notify::Notifier, session::Session, window::WindowTarget, ClientLibrary,
    PaymentBackend, UiSignal,
};

pub(crate) fn uid(n: u8) -> UserId {
    UserId([n; ID_LEN])
}

pub(crate) fn gcid(n: u8) -> GroupId {
    GroupId([n; ID_LEN])
}

pub(crate) struct TestClient {
    pub(crate) local_id: UserId,
    pub(crate) local_nick: String,
    pub(crate) users: Mutex<Vec<RemoteUser>>,
    pub(crate) gcs: Mutex<HashMap<String, GroupId>>,
    pub(crate) history: Mutex<HashMap<WindowTarget, HistoryPage>>,
    pub(crate) history_fails: AtomicBool,
    pub(crate) history_delay: Mutex<Option<Duration>>,
    pub(crate) history_reads: AtomicUsize,
    pub(crate) sent_pms: Mutex<Vec<(UserId, String)>>,
    pub(crate) send_fails: AtomicBool,
    pub(crate) gc_progress: Mutex<Option<mpsc::Receiver<SendProgress>>>,
    pub(crate) server_node: Mutex<Option<String>>,
    pub(crate) onboarding: AtomicBool,
    pub(crate) queue_len: AtomicUsize,
    pub(crate) remain_offline_calls: AtomicUsize,
}

impl TestClient {
    pub(crate) fn new() -> Self {
        Self {
            local_id: uid(0xEE),
            local_nick: "me".to_string(),
            users: Mutex::new(Vec::new()),
            gcs: Mutex::new(HashMap::new()),
            history: Mutex::new(HashMap::new()),
            history_fails: AtomicBool::new(false),
            history_delay: Mutex::new(None),
            history_reads: AtomicUsize::new(0),
            sent_pms: Mutex::new(Vec::new()),
            send_fails: AtomicBool::new(false),
            gc_progress: Mutex::new(None),
            server_node: Mutex::new(Some("server-node".to_string())),
            onboarding: AtomicBool::new(false),
            queue_len: AtomicUsize::new(0),
            remain_offline_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_user(self, id: UserId, nick: &str) -> Self {
        self.users
            .lock()
            .expect("users")
            .push(RemoteUser::new(id, nick));
        self
    }

    pub(crate) fn with_gc(self, id: GroupId, name: &str) -> Self {
        self.gcs
            .lock()
            .expect("gcs")
            .insert(name.to_string(), id);
        self
    }

    pub(crate) fn set_history(&self, target: WindowTarget, entries: Vec<HistoryEntry>, as_of: DateTime<Utc>) {
        self.history
            .lock()
            .expect("history")
            .insert(target, HistoryPage { entries, as_of });
    }
}

#[async_trait]
impl ClientLibrary for TestClient {
    fn local_id(&self) -> UserId {
        self.local_id
    }

    fn local_nick(&self) -> String {
        self.local_nick.clone()
    }

    fn user_nick(&self, id: &UserId) -> Option<String> {
        self.users
            .lock()
            .expect("users")
            .iter()
            .find(|u| u.id == *id)
            .map(|u| u.nick.clone())
    }

    fn user_by_nick(&self, nick: &str) -> Option<RemoteUser> {
        self.users
            .lock()
            .expect("users")
            .iter()
            .find(|u| u.nick == nick)
            .cloned()
    }

    fn gc_alias(&self, id: &GroupId) -> Option<String> {
        self.gcs
            .lock()
            .expect("gcs")
            .iter()
            .find(|(_, gc)| *gc == id)
            .map(|(name, _)| name.clone())
    }

    fn gc_id_by_name(&self, name: &str) -> Option<GroupId> {
        self.gcs.lock().expect("gcs").get(name).copied()
    }

    fn server_ln_node(&self) -> Option<String> {
        self.server_node.lock().expect("node").clone()
    }

    fn outbound_queue_len(&self) -> usize {
        self.queue_len.load(Ordering::SeqCst)
    }

    fn onboarding_in_progress(&self) -> bool {
        self.onboarding.load(Ordering::SeqCst)
    }

    async fn read_history(&self, target: &WindowTarget, _limit: usize) -> Result<HistoryPage> {
        self.history_reads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.history_delay.lock().expect("delay");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.history_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("history db unavailable"));
        }
        Ok(self
            .history
            .lock()
            .expect("history")
            .get(target)
            .cloned()
            .unwrap_or_else(|| HistoryPage {
                entries: Vec::new(),
                as_of: DateTime::<Utc>::MIN_UTC,
            }))
    }

    async fn send_pm(&self, to: &UserId, message: &str) -> Result<()> {
        if self.send_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("user not KXd"));
        }
        self.sent_pms
            .lock()
            .expect("sent")
            .push((*to, message.to_string()));
        Ok(())
    }

    async fn send_gc_message(
        &self,
        _gc: &GroupId,
        _message: &str,
    ) -> Result<Option<mpsc::Receiver<SendProgress>>> {
        if self.send_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("gc not found"));
        }
        Ok(self.gc_progress.lock().expect("progress").take())
    }

    async fn remain_offline(&self) {
        self.remain_offline_calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct TestBackend {
    pub(crate) wallet: Mutex<VecDeque<Result<WalletBalance, String>>>,
    pub(crate) last_wallet: Mutex<WalletBalance>,
    pub(crate) channels: Mutex<ChannelBalance>,
    pub(crate) pending_channels: AtomicUsize,
    pub(crate) pending_fails: AtomicBool,
    pub(crate) route_ok: AtomicBool,
    pub(crate) route_queries: AtomicUsize,
    pub(crate) wallet_checks: Mutex<VecDeque<Result<(), String>>>,
    pub(crate) wallet_check_calls: AtomicUsize,
    pub(crate) rate: Mutex<f64>,
    pub(crate) channel_events: Mutex<Option<mpsc::Receiver<ChannelEvent>>>,
}

impl TestBackend {
    pub(crate) fn new() -> Self {
        Self {
            wallet: Mutex::new(VecDeque::new()),
            last_wallet: Mutex::new(WalletBalance::default()),
            channels: Mutex::new(ChannelBalance::default()),
            pending_channels: AtomicUsize::new(0),
            pending_fails: AtomicBool::new(false),
            route_ok: AtomicBool::new(true),
            route_queries: AtomicUsize::new(0),
            wallet_checks: Mutex::new(VecDeque::new()),
            wallet_check_calls: AtomicUsize::new(0),
            rate: Mutex::new(20.0),
            channel_events: Mutex::new(None),
        }
    }

    /// Queues wallet balance replies; once exhausted the last good one repeats.
    pub(crate) fn push_wallet(&self, reply: Result<WalletBalance, String>) {
        self.wallet.lock().expect("wallet").push_back(reply);
    }

    pub(crate) fn push_wallet_check(&self, reply: Result<(), String>) {
        self.wallet_checks.lock().expect("checks").push_back(reply);
    }
}

#[async_trait]
impl PaymentBackend for TestBackend {
    async fn wallet_balance(&self) -> Result<WalletBalance> {
        let next = self.wallet.lock().expect("wallet").pop_front();
        match next {
            Some(Ok(balance)) => {
                *self.last_wallet.lock().expect("wallet") = balance;
                Ok(balance)
            }
            Some(Err(err)) => Err(anyhow!(err)),
            None => Ok(*self.last_wallet.lock().expect("wallet")),
        }
    }

    async fn channel_balance(&self) -> Result<ChannelBalance> {
        Ok(*self.channels.lock().expect("channels"))
    }

    async fn pending_open_channels(&self) -> Result<usize> {
        if self.pending_fails.load(Ordering::SeqCst) {
            return Err(anyhow!("pending channels unavailable"));
        }
        Ok(self.pending_channels.load(Ordering::SeqCst))
    }

    async fn query_route(&self, _node: &str, _amount_matoms: u64) -> Result<()> {
        self.route_queries.fetch_add(1, Ordering::SeqCst);
        if self.route_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(anyhow!("no route"))
        }
    }

    async fn check_wallet_usable(&self, _server_node: &str) -> Result<()> {
        self.wallet_check_calls.fetch_add(1, Ordering::SeqCst);
        match self.wallet_checks.lock().expect("checks").pop_front() {
            Some(Err(err)) => Err(anyhow!(err)),
            _ => Ok(()),
        }
    }

    async fn subscribe_channel_events(&self) -> Result<mpsc::Receiver<ChannelEvent>> {
        self.channel_events
            .lock()
            .expect("events")
            .take()
            .ok_or_else(|| anyhow!("no channel event stream"))
    }

    fn exchange_rate(&self) -> f64 {
        *self.rate.lock().expect("rate")
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    signals: Mutex<Vec<UiSignal>>,
}

impl RecordingNotifier {
    pub(crate) fn signals(&self) -> Vec<UiSignal> {
        self.signals.lock().expect("signals").clone()
    }

    pub(crate) fn count(&self, signal: &UiSignal) -> usize {
        self.signals
            .lock()
            .expect("signals")
            .iter()
            .filter(|s| *s == signal)
            .count()
    }

    pub(crate) fn clear(&self) {
        self.signals.lock().expect("signals").clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, signal: UiSignal) {
        self.signals.lock().expect("signals").push(signal);
    }
}

pub(crate) struct Harness {
    pub(crate) session: Arc<Session>,
    pub(crate) client: Arc<TestClient>,
    pub(crate) backend: Arc<TestBackend>,
    pub(crate) notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub(crate) fn new(settings: Settings, client: TestClient, backend: TestBackend) -> Self {
        let client = Arc::new(client);
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::default());
        let session = Session::new(
            settings,
            client.clone(),
            backend.clone(),
            notifier.clone(),
        )
        .expect("session");
        Self {
            session,
            client,
            backend,
            notifier,
        }
    }

    pub(crate) fn default_session() -> Self {
        Self::new(Settings::default(), TestClient::new(), TestBackend::new())
    }

    pub(crate) fn diag_contains(&self, needle: &str) -> bool {
        self.session
            .diag_messages()
            .iter()
            .any(|line| line.contains(needle))
    }
}

/// Lets spawned tasks run until they block.
pub(crate) async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
