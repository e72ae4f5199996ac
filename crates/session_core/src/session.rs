use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};

use chrono::{DateTime, Local, NaiveDate, Timelike, Utc};
use shared::{
    domain::{Amount, ConnectionState, FileId, GroupId, PageSessionId, PostId, UserId},
    protocol::{OnboardState, PostSummary, RemoteFile},
};
use tokio::{runtime::Handle, time::sleep};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, info, warn};

use crate::{
    balance::{run_balance_poller, BalanceSnapshot, SetupNeeds},
    config::Settings,
    connection::ConnectionController,
    dispatcher::{Dispatcher, Notification},
    error::SessionError,
    inbound::{InboundEnvelope, InboundPipeline},
    lock,
    notify::{Notifier, UiSignal},
    payment_gate::PaymentGate,
    read,
    registry::{WindowLabel, WindowRegistry, WindowSlot},
    text,
    window::{ChatWindow, MessageRef, WindowKind, WindowTarget, DATE_FORMAT},
    write, ClientLibrary, PaymentBackend,
};

#[derive(Default)]
pub(crate) struct FeedState {
    pub(crate) posts: Vec<PostSummary>,
    pub(crate) unread: HashSet<PostId>,
}

impl FeedState {
    pub(crate) fn sort(&mut self) {
        self.posts
            .sort_by(|a, b| b.last_status_at.cmp(&a.last_status_at));
    }
}

#[derive(Default)]
pub(crate) struct ContentState {
    pub(crate) remote_files: HashMap<UserId, HashMap<FileId, RemoteFile>>,
    pub(crate) progress: HashMap<FileId, (Arc<ChatWindow>, MessageRef)>,
}

#[derive(Default)]
pub(crate) struct OnboardingStatus {
    pub(crate) state: Option<OnboardState>,
    pub(crate) error: Option<String>,
}

pub struct Session {
    settings: Settings,
    client: Arc<dyn ClientLibrary>,
    backend: Arc<dyn PaymentBackend>,
    notifier: Arc<dyn Notifier>,
    runtime: Handle,
    cancel: CancellationToken,
    tracker: TaskTracker,

    inbound: InboundPipeline,
    windows: Mutex<WindowRegistry>,
    connection: ConnectionController,
    payment_gate: PaymentGate,
    balances: RwLock<BalanceSnapshot>,
    setup_needs: RwLock<SetupNeeds>,
    diag: Mutex<Vec<String>>,
    footer: Mutex<Option<String>>,
    outbound_queue_len: Mutex<usize>,

    pub(crate) feed: Mutex<FeedState>,
    pub(crate) content: Mutex<ContentState>,
    pub(crate) gc_invites: Mutex<HashMap<String, u64>>,
    pub(crate) missing_kx: Mutex<HashMap<UserId, tokio::time::Instant>>,
    pub(crate) onboarding: Mutex<OnboardingStatus>,
}

impl Session {
    /// Builds the session on the current tokio runtime. Workers only run
    /// after [`Session::start`].
    pub fn new(
        settings: Settings,
        client: Arc<dyn ClientLibrary>,
        backend: Arc<dyn PaymentBackend>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<Self>, SessionError> {
        let runtime = Handle::try_current()
            .map_err(|err| SessionError::FatalStartup(format!("no tokio runtime: {err}")))?;
        Ok(Arc::new(Self {
            inbound: InboundPipeline::new(settings.inbound_queue_capacity),
            payment_gate: PaymentGate::new(settings.payment_gate_ttl()),
            settings,
            client,
            backend,
            notifier,
            runtime,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            windows: Mutex::new(WindowRegistry::new()),
            connection: ConnectionController::new(),
            balances: RwLock::new(BalanceSnapshot::default()),
            setup_needs: RwLock::new(SetupNeeds::default()),
            diag: Mutex::new(Vec::new()),
            footer: Mutex::new(None),
            outbound_queue_len: Mutex::new(0),
            feed: Mutex::new(FeedState::default()),
            content: Mutex::new(ContentState::default()),
            gc_invites: Mutex::new(HashMap::new()),
            missing_kx: Mutex::new(HashMap::new()),
            onboarding: Mutex::new(OnboardingStatus::default()),
        }))
    }

    pub fn start(self: &Arc<Self>) {
        info!(nick = %self.client.local_nick(), "session: starting workers");

        let session = self.clone();
        self.spawn(async move { session.inbound().run(&session).await });

        let session = self.clone();
        self.spawn(async move { run_balance_poller(&session).await });

        let session = self.clone();
        self.spawn(async move { session.track_channel_events().await });

        let session = self.clone();
        self.spawn(async move { session.track_outbound_queue().await });

        let session = self.clone();
        self.spawn(async move { session.run_clock().await });

        if !self.settings.pinned_windows.is_empty() {
            let session = self.clone();
            self.spawn(async move { session.open_pinned_windows().await });
        }
    }

    pub async fn shutdown(&self) {
        info!("session: shutting down");
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        info!("session: all workers stopped");
    }

    pub fn dispatcher(self: &Arc<Self>) -> Dispatcher {
        Dispatcher::new(self.clone())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn client(&self) -> &Arc<dyn ClientLibrary> {
        &self.client
    }

    pub(crate) fn backend(&self) -> &Arc<dyn PaymentBackend> {
        &self.backend
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn notify(&self, signal: UiSignal) {
        self.notifier.notify(signal);
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn_on(task, &self.runtime);
    }

    pub fn local_nick(&self) -> String {
        self.client.local_nick()
    }

    pub(crate) fn inbound(&self) -> &InboundPipeline {
        &self.inbound
    }

    pub fn enqueue_inbound(&self, envelope: InboundEnvelope) {
        self.inbound.enqueue(envelope);
    }

    pub fn inbound_backlog(&self) -> usize {
        self.inbound.len()
    }

    // Windows.

    pub fn windows(&self) -> Vec<Arc<ChatWindow>> {
        lock(&self.windows).windows()
    }

    pub fn find_window(&self, target: &WindowTarget) -> Option<Arc<ChatWindow>> {
        lock(&self.windows).find(target)
    }

    fn window_alias(&self, target: &WindowTarget) -> String {
        match target {
            WindowTarget::User(uid) => self
                .client
                .user_nick(uid)
                .map(|nick| text::sanitize_nick(&nick))
                .unwrap_or_else(|| uid.short_log_id()),
            WindowTarget::Group(gc) => self
                .client
                .gc_alias(gc)
                .map(|alias| text::sanitize_nick(&alias))
                .unwrap_or_else(|| gc.short_log_id()),
            WindowTarget::Page(_) => "pages".to_string(),
        }
    }

    pub async fn find_or_create_window(&self, target: WindowTarget) -> Arc<ChatWindow> {
        let (cw, created) = match self.find_window(&target) {
            Some(cw) => (cw, false),
            None => {
                let alias = self.window_alias(&target);
                let me = self.local_nick();
                let mut reg = lock(&self.windows);
                match reg.find(&target) {
                    Some(cw) => (cw, false),
                    None => {
                        let cw = Arc::new(ChatWindow::new(target, alias, me));
                        reg.insert(cw.clone());
                        (cw, true)
                    }
                }
            }
        };

        if created {
            self.footer_invalidate();
        }
        self.init_window(&cw, created).await;
        cw
    }

    async fn init_window(&self, cw: &Arc<ChatWindow>, created: bool) {
        if cw.kind() == WindowKind::Page {
            cw.init_once(|| async { Utc::now() }).await;
            return;
        }

        let target = cw.target();
        let limit = self.settings.history_load_limit;
        let load_history = self.settings.message_log_enabled;
        cw.init_once(|| async move {
            if !load_history {
                return Utc::now();
            }
            match self.client.read_history(&target, limit).await {
                Ok(page) => {
                    cw.seed_history(&page.entries);
                    page.as_of
                }
                Err(err) => {
                    warn!(alias = %cw.alias(), error = %err, "session: unable to read history");
                    cw.new_internal("Unable to read history messages");
                    DateTime::<Utc>::MIN_UTC
                }
            }
        })
        .await;

        if created {
            match target {
                WindowTarget::Group(_) => {
                    self.diag_msg(format!("Started Group Chat {}", cw.alias()))
                }
                _ => self.diag_msg(format!("Started chat with {}", cw.alias())),
            }
        }
    }

    pub fn find_or_create_page_window(&self, session_id: PageSessionId) -> Arc<ChatWindow> {
        let target = WindowTarget::Page(session_id);
        let cw = {
            let mut reg = lock(&self.windows);
            match reg.find(&target) {
                Some(cw) => {
                    reg.mark_updated(&cw, false);
                    cw
                }
                None => {
                    let cw = Arc::new(ChatWindow::new(target, format!("page {session_id}"), ""));
                    reg.insert(cw.clone());
                    cw
                }
            }
        };
        self.footer_invalidate();
        cw
    }

    fn resolve_chat_target(&self, name: &str) -> Result<WindowTarget, SessionError> {
        if let Some(user) = self.client.user_by_nick(name) {
            return Ok(WindowTarget::User(user.id));
        }
        if let Some(gc) = self.client.gc_id_by_name(name) {
            return Ok(WindowTarget::Group(gc));
        }
        Err(SessionError::UnknownTarget(name.to_string()))
    }

    pub async fn open_chat_window(&self, name: &str) -> Result<Arc<ChatWindow>, SessionError> {
        let target = self.resolve_chat_target(name)?;
        let cw = self.find_or_create_window(target).await;
        if cw.is_empty() {
            cw.new_help(format!(
                "Conversation Started {}",
                Local::now().format(DATE_FORMAT)
            ));
        }
        self.change_active_window_to(&cw);
        Ok(cw)
    }

    async fn open_pinned_windows(&self) {
        for name in &self.settings.pinned_windows {
            if self.is_shutting_down() {
                return;
            }
            match self.resolve_chat_target(name) {
                Ok(target) => {
                    self.find_or_create_window(target).await;
                }
                Err(err) => self.diag_msg(format!("Unable to open pinned window {name}: {err}")),
            }
        }
    }

    pub fn active_window(&self) -> WindowSlot {
        lock(&self.windows).active()
    }

    pub fn active_chat_window(&self) -> Option<Arc<ChatWindow>> {
        lock(&self.windows).active_window()
    }

    pub fn active_window_label(&self) -> WindowLabel {
        lock(&self.windows).label()
    }

    pub fn mark_window_updated(&self, cw: &Arc<ChatWindow>, mentioned: bool) -> bool {
        lock(&self.windows).mark_updated(cw, mentioned)
    }

    pub(crate) fn mark_special_updated(&self, slot: WindowSlot) {
        lock(&self.windows).mark_special_updated(slot);
    }

    pub fn mark_window_seen(&self, slot: WindowSlot) {
        lock(&self.windows).mark_seen(slot);
        self.footer_invalidate();
    }

    pub fn window_updated(&self, slot: WindowSlot) -> Option<bool> {
        lock(&self.windows).updated(slot)
    }

    pub fn change_active_window(&self, slot: WindowSlot) -> Result<(), SessionError> {
        let changed = lock(&self.windows).set_active(slot)?;
        self.active_window_changed(slot, changed);
        Ok(())
    }

    pub fn change_active_window_index(&self, index: i64) -> Result<(), SessionError> {
        let (slot, changed) = lock(&self.windows).set_active_index(index)?;
        self.active_window_changed(slot, changed);
        Ok(())
    }

    fn active_window_changed(&self, slot: WindowSlot, changed: bool) {
        if changed {
            self.notify(UiSignal::ActiveWindowChanged);
        }
        if slot == WindowSlot::Feed {
            self.notify(UiSignal::ShowFeedWindow);
            return;
        }
        self.footer_invalidate();
        self.notify(UiSignal::RepaintActive);
    }

    fn change_active_window_relative(&self, delta: i64) {
        let slot = lock(&self.windows).relative_slot(delta);
        if let Some(slot) = slot {
            // Cannot fail: the slot was validated under the same lock.
            let _ = self.change_active_window(slot);
        }
    }

    pub fn change_active_window_next(&self) {
        self.change_active_window_relative(1);
    }

    pub fn change_active_window_prev(&self) {
        self.change_active_window_relative(-1);
    }

    pub fn change_active_window_to_prev_active(&self) {
        let slot = lock(&self.windows).prev_active();
        if let Err(err) = self.change_active_window(slot) {
            debug!(error = %err, "session: previous window no longer exists");
        }
    }

    pub fn change_active_window_to(&self, cw: &Arc<ChatWindow>) {
        let position = lock(&self.windows).position(cw);
        if let Some(index) = position {
            if let Err(err) = self.change_active_window(WindowSlot::Chat(index)) {
                debug!(error = %err, "session: window closed before activation");
            }
        }
    }

    pub fn close_active_window(&self) -> Result<(), SessionError> {
        let closed = lock(&self.windows).close_active()?;
        debug!(index = closed, "session: closed window");
        let prev = WindowSlot::from_index(closed as i64 - 1).unwrap_or(WindowSlot::Diagnostic);
        self.change_active_window(prev)
    }

    pub(crate) fn repaint_if_active(&self, cw: &Arc<ChatWindow>) {
        let active = self.mark_window_updated(cw, false);
        self.footer_invalidate();
        if active {
            self.notify(UiSignal::RepaintActive);
        } else {
            self.notify(UiSignal::FooterChanged);
        }
    }

    // Diagnostic window.

    pub fn diag_msg(&self, msg: impl Into<String>) {
        self.diag_lines([msg.into()]);
    }

    pub fn diag_lines<I>(&self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let now = Local::now().format("%H:%M:%S ").to_string();
        {
            let mut diag = lock(&self.diag);
            for line in lines {
                diag.push(format!("{now}{line}"));
            }
        }
        self.mark_special_updated(WindowSlot::Diagnostic);
        self.footer_invalidate();
        self.notify(UiSignal::RepaintActive);
    }

    pub fn diag_messages(&self) -> Vec<String> {
        lock(&self.diag).clone()
    }

    pub fn window_help_lines<I>(&self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let active = lock(&self.windows).active();
        match active {
            WindowSlot::Log | WindowSlot::BackendLog => {
                for line in lines {
                    info!("{line}");
                }
            }
            WindowSlot::Chat(_) => match self.active_chat_window() {
                Some(cw) => cw.help_lines(lines),
                None => {
                    self.diag_lines(lines);
                    return;
                }
            },
            WindowSlot::Diagnostic | WindowSlot::Feed => {
                self.diag_lines(lines);
                return;
            }
        }
        self.notify(UiSignal::RepaintActive);
    }

    pub fn window_help_msg(&self, msg: impl Into<String>) {
        self.window_help_lines([msg.into()]);
    }

    // Footer.

    pub fn footer_invalidate(&self) {
        *lock(&self.footer) = None;
    }

    pub fn footer_is_valid(&self) -> bool {
        lock(&self.footer).is_some()
    }

    pub fn footer_view(&self) -> String {
        if let Some(footer) = lock(&self.footer).as_ref() {
            return footer.clone();
        }

        let label = self.active_window_label();
        let state = self.current_connection_state();
        let queue = *lock(&self.outbound_queue_len);
        let balances = *read(&self.balances);

        let mut footer = format!("[{state}] [{}]", label.active);
        if !label.updated.is_empty() {
            let updated: Vec<String> = label
                .updated
                .iter()
                .map(|win| {
                    if label.mentioned.contains(win) {
                        format!("{win}*")
                    } else {
                        win.clone()
                    }
                })
                .collect();
            footer.push_str(&format!(" [Act: {}]", updated.join(",")));
        }
        if queue > 0 {
            footer.push_str(&format!(" Q: {queue}"));
        }
        footer.push_str(&format!(
            " [S: {:.8} R: {:.8}]",
            balances.send.to_coins(),
            balances.recv.to_coins()
        ));

        *lock(&self.footer) = Some(footer.clone());
        footer
    }

    // Connection.

    pub fn current_connection_state(&self) -> ConnectionState {
        self.connection.current_state()
    }

    pub(crate) fn connection(&self) -> &ConnectionController {
        &self.connection
    }

    pub async fn check_server_session(
        &self,
        conn: CancellationToken,
        server_node: &str,
    ) -> Result<(), SessionError> {
        self.connection
            .check_server_session(self, &conn, server_node)
            .await
    }

    pub fn skip_next_wallet_check(&self) {
        self.connection.skip_next_wallet_check();
    }

    // Balances.

    pub(crate) fn store_balances(&self, snapshot: BalanceSnapshot) {
        *write(&self.balances) = snapshot;
    }

    pub(crate) fn store_setup_needs(&self, needs: SetupNeeds) {
        *write(&self.setup_needs) = needs;
    }

    pub fn channel_balances(&self) -> (Amount, Amount, Amount) {
        let bal = read(&self.balances);
        (bal.total, bal.recv, bal.send)
    }

    pub fn setup_needs(&self) -> SetupNeeds {
        *read(&self.setup_needs)
    }

    pub async fn can_pay_server(&self) -> bool {
        self.payment_gate
            .can_pay_server(self.client.as_ref(), self.backend.as_ref())
            .await
    }

    // Sending.

    pub async fn send_direct_message(&self, to: UserId, msg: &str) -> Result<(), SessionError> {
        let cw = self.find_or_create_window(WindowTarget::User(to)).await;
        let sent = cw.new_unsent(msg);
        self.repaint_if_active(&cw);

        if let Err(err) = self.client.send_pm(&to, msg).await {
            let err = SessionError::UserFacingOperation(format!(
                "Unable to send PM to {}: {err}",
                cw.alias()
            ));
            self.window_help_msg(err.to_string());
            return Err(err);
        }
        cw.set_sent(sent);
        self.repaint_if_active(&cw);
        Ok(())
    }

    pub async fn send_group_message(&self, gc: GroupId, msg: &str) -> Result<(), SessionError> {
        let cw = self.find_or_create_window(WindowTarget::Group(gc)).await;
        let sent = cw.new_unsent(msg);
        self.repaint_if_active(&cw);

        let progress = match self.client.send_gc_message(&gc, msg).await {
            Ok(progress) => progress,
            Err(err) => {
                let err = SessionError::UserFacingOperation(format!(
                    "Unable to send message to GC {}: {err}",
                    cw.alias()
                ));
                self.window_help_msg(err.to_string());
                return Err(err);
            }
        };

        let Some(mut progress) = progress else {
            cw.set_sent(sent);
            self.repaint_if_active(&cw);
            return Ok(());
        };

        while let Some(update) = progress.recv().await {
            if let Some(err) = &update.error {
                self.diag_msg(format!(
                    "Error sending message to GC {}: {}",
                    cw.alias(),
                    text::sanitize_content(err)
                ));
            }
            if update.total > 0 && update.sent == update.total {
                cw.set_sent(sent);
                self.repaint_if_active(&cw);
                break;
            }
        }
        Ok(())
    }

    pub fn gc_invite_id(&self, gc_name: &str) -> Option<u64> {
        lock(&self.gc_invites).get(gc_name).copied()
    }

    pub fn unread_posts(&self) -> usize {
        lock(&self.feed).unread.len()
    }

    pub fn posts(&self) -> Vec<PostSummary> {
        lock(&self.feed).posts.clone()
    }

    pub fn remote_files(&self, uid: &UserId) -> Vec<RemoteFile> {
        lock(&self.content)
            .remote_files
            .get(uid)
            .map(|files| files.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn outbound_queue_len(&self) -> usize {
        *lock(&self.outbound_queue_len)
    }

    pub fn onboarding_state(&self) -> Option<OnboardState> {
        lock(&self.onboarding).state.clone()
    }

    // Workers.

    async fn track_channel_events(self: Arc<Self>) {
        let mut events = match self.backend.subscribe_channel_events().await {
            Ok(events) => events,
            Err(err) => {
                warn!(error = %err, "session: unable to track channel events");
                return;
            }
        };
        let dispatcher = self.dispatcher();
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => dispatcher.handle(Notification::ChannelEvent(event)).await,
                    None => {
                        warn!("session: channel event stream closed");
                        break;
                    }
                },
            }
        }
    }

    async fn track_outbound_queue(self: Arc<Self>) {
        let poll = self.settings.outbound_queue_poll();
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(poll) => {}
            }
            let len = self.client.outbound_queue_len();
            let changed = {
                let mut last = lock(&self.outbound_queue_len);
                std::mem::replace(&mut *last, len) != len
            };
            if changed {
                self.footer_invalidate();
                self.notify(UiSignal::OutboundQueueChanged(len));
            }
        }
    }

    async fn run_clock(self: Arc<Self>) {
        let mut today = Local::now().date_naive();
        loop {
            let now = Local::now();
            let until_next_minute = Duration::from_secs(60 - u64::from(now.second()));
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(until_next_minute) => {}
            }
            self.notify(UiSignal::ClockTick);
            let day = Local::now().date_naive();
            if day != today {
                today = day;
                self.announce_day_change(day);
            }
        }
    }

    pub(crate) fn announce_day_change(&self, day: NaiveDate) {
        let msg = format!("Day changed to {}", day.format(DATE_FORMAT));
        for cw in self.windows() {
            cw.new_internal(msg.clone());
        }
        self.diag_msg(msg);
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
