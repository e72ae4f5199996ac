use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    domain::{Amount, GroupId, PostId, UserId},
    protocol::{
        ChannelEvent, FetchedResource, FileMetadata, GroupInvite, GroupList, GroupMessage,
        InboundPayload, OnboardState, PostListEntry, PostStatus, PostSummary, PrivateMessage,
        RemoteFile, RemoteUser, ResourceStatus,
    },
};
use tokio::time::Instant;
use tracing::debug;

use crate::{
    connection::ServerPolicy,
    inbound::InboundEnvelope,
    lock,
    notify::UiSignal,
    registry::WindowSlot,
    session::Session,
    text::{sanitize_content, sanitize_nick},
    window::WindowTarget,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PrivateMessage {
        from: RemoteUser,
        message: PrivateMessage,
        sent_at: DateTime<Utc>,
    },
    GroupMessage {
        from: RemoteUser,
        message: GroupMessage,
        sent_at: DateTime<Utc>,
    },
    PostReceived {
        from: Option<RemoteUser>,
        summary: PostSummary,
    },
    PostStatusReceived {
        from: Option<RemoteUser>,
        post: PostId,
        status: PostStatus,
    },
    RemoteSubscriptionChanged {
        user: RemoteUser,
        subscribed: bool,
    },
    RemoteSubscriptionError {
        user: RemoteUser,
        was_subscribing: bool,
        error: String,
    },
    InvoiceGenFailed {
        user: RemoteUser,
        amount: Amount,
        error: String,
    },
    LocalClientOfflineTooLong {
        since: DateTime<Utc>,
    },
    KxCompleted {
        user: RemoteUser,
        is_new: bool,
    },
    GcVersionWarning {
        user: RemoteUser,
        gc: GroupList,
        min_version: u8,
        max_version: u8,
    },
    InvitedToGc {
        user: RemoteUser,
        invite_id: u64,
        invite: GroupInvite,
    },
    GcInviteAccepted {
        user: RemoteUser,
        gc: GroupList,
    },
    JoinedGc {
        gc: GroupList,
    },
    AddedGcMembers {
        gc: GroupList,
        members: Vec<UserId>,
    },
    GcUserParted {
        gc: GroupId,
        user: UserId,
        reason: String,
        kicked: bool,
    },
    GcUpgraded {
        gc: GroupList,
        old_version: u8,
    },
    GcKilled {
        gc: GroupId,
        reason: String,
    },
    GcAdminsChanged {
        by: RemoteUser,
        gc: GroupList,
        added: Vec<UserId>,
        removed: Vec<UserId>,
    },
    KxSearchCompleted {
        user: RemoteUser,
    },
    TipAttemptProgress {
        user: RemoteUser,
        amount_matoms: i64,
        completed: bool,
        attempt: u32,
        error: Option<String>,
        will_retry: bool,
    },
    TipReceived {
        user: RemoteUser,
        amount: Amount,
    },
    Blocked {
        user: RemoteUser,
    },
    ServerSessionChanged {
        connected: bool,
        policy: ServerPolicy,
    },
    OnboardStateChanged {
        state: OnboardState,
        error: Option<String>,
    },
    ResourceFetched {
        from: Option<RemoteUser>,
        resource: FetchedResource,
    },
    HandshakeStage {
        user: RemoteUser,
        stage: String,
    },
    GcWithUnkxdMember {
        gc: GroupId,
        user: UserId,
        admin: Option<RemoteUser>,
    },
    PostsListReceived {
        user: RemoteUser,
        posts: Vec<PostListEntry>,
    },
    LocalSubscriptionChanged {
        user: RemoteUser,
        subscribed: bool,
    },
    ContentListReceived {
        user: RemoteUser,
        files: Vec<RemoteFile>,
        error: Option<String>,
    },
    FileDownloadProgress {
        user: RemoteUser,
        file: FileMetadata,
        missing_chunks: usize,
    },
    FileDownloadCompleted {
        user: RemoteUser,
        file: FileMetadata,
        disk_path: String,
    },
    TransitiveEvent {
        src: UserId,
        dst: UserId,
        event: String,
    },
    KxSuggestion {
        user: RemoteUser,
        target: RemoteUser,
    },
    ChannelEvent(ChannelEvent),
}

impl Notification {
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            Notification::PrivateMessage { .. } | Notification::GroupMessage { .. }
        )
    }

    fn into_envelope(self) -> Option<InboundEnvelope> {
        match self {
            Notification::PrivateMessage {
                from,
                message,
                sent_at,
            } => Some(InboundEnvelope::new(
                from,
                InboundPayload::Private(message),
                sent_at,
            )),
            Notification::GroupMessage {
                from,
                message,
                sent_at,
            } => Some(InboundEnvelope::new(from, InboundPayload::Group(message), sent_at)),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    session: Arc<Session>,
}

impl Dispatcher {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Entry point for the client library. Never blocks.
    pub fn deliver(&self, ntfn: Notification) {
        if ntfn.is_ordered() {
            if let Some(envelope) = ntfn.into_envelope() {
                self.session.enqueue_inbound(envelope);
            }
            return;
        }
        if self.session.is_shutting_down() {
            debug!("dispatch: dropping notification during shutdown");
            return;
        }
        let dispatcher = self.clone();
        self.session
            .spawn(async move { dispatcher.handle(ntfn).await });
    }

    pub async fn handle(&self, ntfn: Notification) {
        let s = &self.session;
        if ntfn.is_ordered() {
            if let Some(envelope) = ntfn.into_envelope() {
                s.enqueue_inbound(envelope);
            }
            return;
        }
        match ntfn {
            Notification::PrivateMessage { .. } | Notification::GroupMessage { .. } => {}
            Notification::PostReceived { from, summary } => self.post_received(from, summary),
            Notification::PostStatusReceived { from, post, status } => {
                self.post_status_received(from, post, status)
            }
            Notification::RemoteSubscriptionChanged { user, subscribed } => {
                let nick = sanitize_nick(&user.nick);
                let msg = if subscribed {
                    format!("Subscribed to {nick} posts")
                } else {
                    format!("Unsubscribed from {nick} posts")
                };
                self.user_window_or_diag(&user.id, msg);
            }
            Notification::RemoteSubscriptionError {
                user,
                was_subscribing,
                error,
            } => {
                let action = if was_subscribing {
                    "subscribe"
                } else {
                    "unsubscribe"
                };
                let msg = format!(
                    "Attempt to {action} to {} posts failed: {}",
                    sanitize_nick(&user.nick),
                    sanitize_content(&error)
                );
                self.user_window_or_diag(&user.id, msg);
            }
            Notification::InvoiceGenFailed {
                user,
                amount,
                error,
            } => s.diag_lines([
                "Unable to generate LN invoice".to_string(),
                format!(
                    "Unable to generate invoice for remote user {} to send us {amount}: {error}",
                    sanitize_nick(&user.nick)
                ),
                "More receive capacity may be obtained by opening receive channels with '/ln requestrecv'"
                    .to_string(),
            ]),
            Notification::LocalClientOfflineTooLong { since } => s.diag_msg(format!(
                "The local client has been offline since {} which is before the limit date \
                 imposed by the server message retention policy. Resetting all KXs",
                since.format("%Y-%m-%d %H:%M:%S")
            )),
            Notification::KxCompleted { user, is_new } => {
                let nick = sanitize_nick(&user.nick);
                if is_new {
                    s.diag_lines([
                        format!("Completed KX with user {nick:?} ID {}", user.id),
                        format!("Type /msg {nick} to chat"),
                    ]);
                } else {
                    s.diag_msg(format!("Reset KX with user {nick:?} ID {}", user.id));
                }
            }
            Notification::GcVersionWarning { gc, .. } => {
                let alias = s.client().gc_alias(&gc.id).unwrap_or_default();
                s.diag_lines([
                    format!(
                        "Received GC list for GC {alias:?} ({}) with unsupported GC version {}",
                        gc.id, gc.version
                    ),
                    "Please update the client software to interact in updated GCs.".to_string(),
                ]);
            }
            Notification::InvitedToGc {
                user,
                invite_id,
                invite,
            } => {
                let gc_name = sanitize_nick(&invite.name);
                let nick = sanitize_nick(&user.nick);
                lock(&s.gc_invites).insert(gc_name.clone(), invite_id);
                s.diag_msg(format!(
                    "Invited to GC {gc_name:?} ({}) by {nick:?}. Type /gc join {gc_name} to join.",
                    invite.id
                ));
                let cw = s.find_or_create_window(WindowTarget::User(user.id)).await;
                cw.new_internal(format!(
                    "{nick:?} has invited you to GC {gc_name:?} ({}). Type /gc join {gc_name} to join",
                    invite.id
                ));
                s.repaint_if_active(&cw);
            }
            Notification::GcInviteAccepted { user, gc } => {
                self.gc_line(
                    gc.id,
                    format!("User {:?} joined GC", sanitize_nick(&user.nick)),
                )
                .await
            }
            Notification::JoinedGc { gc } => {
                if let Some(name) = s.client().gc_alias(&gc.id) {
                    lock(&s.gc_invites).remove(&sanitize_nick(&name));
                }
                self.gc_line(gc.id, "Joined GC".to_string()).await;
            }
            Notification::AddedGcMembers { gc, members } => {
                let cw = s.find_or_create_window(WindowTarget::Group(gc.id)).await;
                for uid in members {
                    let msg = match s.client().user_nick(&uid) {
                        Some(nick) => {
                            format!("{} was added to this GC", sanitize_nick(&nick))
                        }
                        None => format!(
                            "Unknown user {uid} added to this GC. Waiting for user to send transitive KX request"
                        ),
                    };
                    cw.new_internal(msg);
                }
                s.repaint_if_active(&cw);
            }
            Notification::GcUserParted {
                gc,
                user,
                reason,
                kicked,
            } => {
                let msg = if user == s.client().local_id() {
                    if kicked {
                        format!("Admin kicked us! Reason: {reason:?}")
                    } else {
                        format!("Parted from GC! Reason: {reason:?}")
                    }
                } else {
                    let nick = s
                        .client()
                        .user_nick(&user)
                        .map(|n| sanitize_nick(&n))
                        .unwrap_or_else(|| user.to_string());
                    if kicked {
                        format!("Admin kicked {nick:?}! Reason: {reason:?}")
                    } else {
                        format!("User {nick:?} parted from GC. Reason: {reason:?}")
                    }
                };
                self.gc_line(gc, msg).await;
            }
            Notification::GcUpgraded { gc, old_version } => {
                self.gc_line(
                    gc.id,
                    format!(
                        "GC Upgraded from version {old_version} to version {}",
                        gc.version
                    ),
                )
                .await
            }
            Notification::GcKilled { gc, reason } => {
                self.gc_line(gc, format!("GC killed by admin. Reason: {reason:?}"))
                    .await
            }
            Notification::GcAdminsChanged {
                by,
                gc,
                added,
                removed,
            } => self.gc_admins_changed(by, gc, added, removed).await,
            Notification::KxSearchCompleted { user } => {
                s.diag_msg(format!(
                    "Completed KX search of {}",
                    sanitize_nick(&user.nick)
                ));
                s.notify(UiSignal::KxSearchCompleted(user.id));
            }
            Notification::TipAttemptProgress {
                user,
                amount_matoms,
                completed,
                attempt,
                error,
                will_retry,
            } => {
                // Intermediate attempts only go to the log.
                if will_retry {
                    debug!(attempt, "dispatch: tip attempt will be retried");
                    return;
                }
                let amount = format!("{:.8} DCR", amount_matoms as f64 / 1e11);
                let nick = sanitize_nick(&user.nick);
                if completed {
                    s.diag_msg(format!("Completed tip payment of {amount} to {nick}"));
                } else {
                    s.diag_msg(format!(
                        "Unable to complete tip payment of {amount} to {nick} after {attempt} attempts: {}",
                        error.unwrap_or_default()
                    ));
                }
            }
            Notification::TipReceived { user, amount } => {
                self.user_line(user.id, format!("Received tip of {amount}"))
                    .await
            }
            Notification::Blocked { user } => {
                self.user_line(
                    user.id,
                    "User requested us to block them from further messages".to_string(),
                )
                .await
            }
            Notification::ServerSessionChanged { connected, policy } => {
                s.connection().server_session_changed(s, connected, policy)
            }
            Notification::OnboardStateChanged { state, error } => {
                match &error {
                    Some(err) => s.diag_msg(format!(
                        "Onboarding errored at stage {}: {err}",
                        state.stage
                    )),
                    None => s.diag_msg(format!("Onboarding stage advanced to {}", state.stage)),
                }
                {
                    let mut onboarding = lock(&s.onboarding);
                    onboarding.state = Some(state);
                    onboarding.error = error;
                }
                s.notify(UiSignal::OnboardingChanged);
            }
            Notification::ResourceFetched { from, resource } => {
                self.resource_fetched(from, resource)
            }
            Notification::HandshakeStage { user, stage } => {
                let nick = sanitize_nick(&user.nick);
                match stage.as_str() {
                    // Intermediate stage.
                    "SYN" => {}
                    "SYNACK" | "ACK" => s.diag_msg(format!(
                        "Completed handshake with {nick} (due to receiving {stage})"
                    )),
                    _ => s.diag_msg(format!(
                        "Unknown handshake stage {stage:?} with user {nick} ({})",
                        user.id
                    )),
                }
            }
            Notification::GcWithUnkxdMember { gc, user, admin } => {
                self.gc_with_unkxd_member(gc, user, admin)
            }
            Notification::PostsListReceived { user, posts } => {
                let cw = s.find_or_create_window(WindowTarget::User(user.id)).await;
                let mut lines = vec![
                    String::new(),
                    format!("List of user posts ({} total)", posts.len()),
                ];
                for post in posts {
                    lines.push(format!("ID: {}", post.id));
                    lines.push(format!("Title: {}", sanitize_content(&post.title)));
                    lines.push(String::new());
                }
                cw.help_lines(lines);
                s.repaint_if_active(&cw);
            }
            Notification::LocalSubscriptionChanged { user, subscribed } => {
                let nick = sanitize_nick(&user.nick);
                let msg = if subscribed {
                    format!("{nick} subscribed to my posts")
                } else {
                    format!("{nick} unsubscribed from my posts")
                };
                self.user_window_or_diag(&user.id, msg);
            }
            Notification::ContentListReceived { user, files, error } => {
                self.content_list_received(user, files, error).await
            }
            Notification::FileDownloadProgress {
                user,
                file,
                missing_chunks,
            } => self.download_progress(user, file, missing_chunks).await,
            Notification::FileDownloadCompleted {
                user,
                file,
                disk_path,
            } => self.download_completed(user, file, disk_path).await,
            Notification::TransitiveEvent { src, dst, event } => {
                let Some(src_nick) = s.client().user_nick(&src) else {
                    s.diag_msg(format!("Unknown source {src} for transitive event {event:?}"));
                    return;
                };
                let msg = match s.client().user_nick(&dst) {
                    Some(dst_nick) => format!(
                        "Received transitive {event:?} from {src_nick:?} targeted to user {dst_nick:?}"
                    ),
                    None => format!(
                        "Received transitive {event:?} from {src_nick:?} targeted to unknown user {dst}"
                    ),
                };
                s.diag_msg(msg);
            }
            Notification::KxSuggestion { user, target } => {
                let mediator = sanitize_nick(&user.nick);
                if let Some(known) = s.client().user_nick(&target.id) {
                    s.diag_msg(format!(
                        "{mediator} suggested KXing with already known user {}",
                        sanitize_nick(&known)
                    ));
                    return;
                }
                s.diag_lines([
                    String::new(),
                    format!(
                        "{mediator} suggested KXing with {} ({:?})",
                        target.id,
                        sanitize_nick(&target.nick)
                    ),
                    format!("Type /mi {mediator} {} to request an introduction", target.id),
                ]);
            }
            Notification::ChannelEvent(event) => s.diag_msg(channel_event_line(&event)),
        }
    }

    fn user_window_or_diag(&self, uid: &UserId, msg: String) {
        let s = &self.session;
        match s.find_window(&WindowTarget::User(*uid)) {
            Some(cw) => {
                cw.new_help(msg);
                s.repaint_if_active(&cw);
            }
            None => s.diag_msg(msg),
        }
    }

    async fn user_line(&self, uid: UserId, msg: String) {
        let cw = self
            .session
            .find_or_create_window(WindowTarget::User(uid))
            .await;
        cw.new_internal(msg);
        self.session.repaint_if_active(&cw);
    }

    async fn gc_line(&self, gc: GroupId, msg: String) {
        let cw = self
            .session
            .find_or_create_window(WindowTarget::Group(gc))
            .await;
        cw.new_internal(msg);
        self.session.repaint_if_active(&cw);
    }

    fn post_received(&self, from: Option<RemoteUser>, summary: PostSummary) {
        let s = &self.session;
        if from.as_ref().is_some_and(|u| u.ignored) {
            return;
        }
        let nick = from
            .as_ref()
            .map(|u| sanitize_nick(&u.nick))
            .unwrap_or_else(|| "(no nick)".to_string());
        s.diag_msg(format!(
            "Received post {:?} ({}) from {nick:?}",
            sanitize_content(&summary.title),
            summary.id
        ));

        let post_id = summary.id;
        {
            let mut feed = lock(&s.feed);
            feed.posts.push(summary);
            feed.sort();
            feed.unread.insert(post_id);
        }
        s.mark_special_updated(WindowSlot::Feed);
        s.footer_invalidate();
        s.notify(UiSignal::FeedUpdated(post_id));
    }

    fn post_status_received(
        &self,
        from: Option<RemoteUser>,
        post: PostId,
        status: PostStatus,
    ) {
        let s = &self.session;
        let local_id = s.client().local_id();
        let post_from = from.as_ref().map(|u| u.id).unwrap_or(local_id);
        {
            let mut feed = lock(&s.feed);
            let now = Utc::now();
            for summary in feed.posts.iter_mut() {
                if summary.from == post_from && summary.id == post {
                    summary.last_status_at = now;
                }
            }
            feed.unread.insert(post);
            feed.sort();
        }

        if status.from != local_id {
            s.mark_special_updated(WindowSlot::Feed);
            s.footer_invalidate();
        }
        if from.as_ref().is_some_and(|u| u.ignored) {
            return;
        }
        s.notify(UiSignal::PostStatusUpdated(post));
    }

    async fn gc_admins_changed(
        &self,
        by: RemoteUser,
        gc: GroupList,
        added: Vec<UserId>,
        removed: Vec<UserId>,
    ) {
        let s = &self.session;
        let me = s.client().local_id();
        let describe = |uid: &UserId| {
            let nick = s.client().user_nick(uid).unwrap_or_default();
            format!("{:?} ({uid})", sanitize_nick(&nick))
        };

        let mut lines = vec![format!(
            "List of GC Admins modified by {}",
            sanitize_nick(&by.nick)
        )];
        for uid in &added {
            if *uid == me {
                lines.push("Added local client as admin".to_string());
            } else {
                lines.push(format!("Added {} as admin", describe(uid)));
            }
        }
        for uid in &removed {
            if *uid == me {
                lines.push("Removed local client as admin".to_string());
            } else {
                lines.push(format!("Removed {} as admin", describe(uid)));
            }
        }

        let cw = s.find_or_create_window(WindowTarget::Group(gc.id)).await;
        cw.help_lines(lines);
        s.repaint_if_active(&cw);
    }

    fn resource_fetched(&self, from: Option<RemoteUser>, resource: FetchedResource) {
        let s = &self.session;
        let (uid, nick) = match &from {
            Some(user) => (user.id, sanitize_nick(&user.nick)),
            None => (s.client().local_id(), "me".to_string()),
        };

        if resource.status != ResourceStatus::Ok {
            s.diag_msg(format!(
                "Error fetching resource {nick}/{}: {:?}",
                resource.path.join("/"),
                resource.status
            ));
            return;
        }

        let session_id = resource.session_id;
        let cw = s.find_or_create_page_window(session_id);
        cw.replace_page(resource);
        s.notify(UiSignal::PageFetched { session_id, uid });
        s.repaint_if_active(&cw);
    }

    fn gc_with_unkxd_member(&self, gc: GroupId, uid: UserId, admin: Option<RemoteUser>) {
        let s = &self.session;
        let interval = s.settings().missing_kx_warn_interval();
        let needs_warn = {
            let mut warned = lock(&s.missing_kx);
            let now = Instant::now();
            let due = warned
                .get(&uid)
                .map_or(true, |last| now.duration_since(*last) >= interval);
            if due {
                warned.insert(uid, now);
            }
            due
        };
        if !needs_warn {
            debug!(user = %uid.short_log_id(), "dispatch: missing KX warning suppressed");
            return;
        }

        let Some(admin) = admin else {
            s.diag_msg(format!(
                "Unable to find admin of GC {gc} to warn about unkxd user {uid}"
            ));
            return;
        };

        let alias = s
            .client()
            .gc_alias(&gc)
            .map(|a| sanitize_nick(&a))
            .unwrap_or_else(|| gc.to_string());
        s.diag_lines([
            String::new(),
            format!(
                "Messages to user {uid} in gc {alias:?} are not being sent due to user not being KXd"
            ),
            "This could happen because the KX process is still in progress or because it failed"
                .to_string(),
            "A transitive KX with this user can be attempted again by issuing the following command"
                .to_string(),
            format!("/mi {} {uid}", sanitize_nick(&admin.nick)),
        ]);
    }

    async fn content_list_received(
        &self,
        user: RemoteUser,
        files: Vec<RemoteFile>,
        error: Option<String>,
    ) {
        let s = &self.session;
        let cw = s.find_or_create_window(WindowTarget::User(user.id)).await;
        if let Some(err) = error {
            cw.new_internal(format!("Unable to list user contents: {err}"));
            s.repaint_if_active(&cw);
            return;
        }

        if !files.is_empty() {
            let mut content = lock(&s.content);
            let user_files = content.remote_files.entry(user.id).or_default();
            for file in &files {
                user_files.insert(file.id, file.clone());
            }
        }

        let rate = s.backend().exchange_rate();
        let mut lines = vec![String::new(), "Received file list".to_string()];
        for file in &files {
            let coins = file.cost.to_coins();
            lines.push(format!("ID         : {}", file.id));
            lines.push(format!("Filename   : {:?}", file.filename));
            lines.push(format!("Description: {:?}", file.description));
            lines.push(format!("Size       : {}", file.size));
            lines.push(format!(
                "Cost       : {coins:.8} DCR / {:.8} USD",
                coins * rate
            ));
            lines.push(String::new());
        }
        cw.help_lines(lines);
        s.repaint_if_active(&cw);
    }

    async fn download_progress(&self, user: RemoteUser, file: FileMetadata, missing: usize) {
        let s = &self.session;
        let cw = s.find_or_create_window(WindowTarget::User(user.id)).await;
        let total = file.chunk_count;
        let got = total.saturating_sub(missing);
        let pct = if total > 0 {
            (got * 100 / total) as f64
        } else {
            0.0
        };
        let line = format!(
            "Downloaded {got}/{total} chunks ({pct:.2}%) - {:?}",
            file.filename
        );

        {
            let mut content = lock(&s.content);
            let (progress_cw, msg) = content
                .progress
                .entry(file.id)
                .or_insert_with(|| (cw.clone(), cw.new_internal(String::new())));
            progress_cw.set_text(*msg, line);
        }
        s.repaint_if_active(&cw);
    }

    async fn download_completed(&self, user: RemoteUser, file: FileMetadata, disk_path: String) {
        let s = &self.session;
        let cw = s.find_or_create_window(WindowTarget::User(user.id)).await;
        cw.new_internal(format!("Download completed: {disk_path}"));

        let progress = lock(&s.content).progress.remove(&file.id);
        if let Some((progress_cw, msg)) = progress {
            let total = file.chunk_count;
            progress_cw.set_text(
                msg,
                format!(
                    "Downloaded {total}/{total} chunks (100.00%) - {:?}",
                    file.filename
                ),
            );
        }

        s.notify(UiSignal::DownloadCompleted(file.id));
        match s.active_chat_window() {
            Some(active) if !Arc::ptr_eq(&active, &cw) => {
                active.new_help(format!("Download completed: {disk_path}"));
                s.repaint_if_active(&active);
            }
            _ => s.repaint_if_active(&cw),
        }
    }
}

fn channel_event_line(event: &ChannelEvent) -> String {
    match event {
        ChannelEvent::Opened {
            channel_point,
            local_balance,
            remote_balance,
        } => format!(
            "LN Channel {channel_point} ({local_balance} send, {remote_balance} recv) is open"
        ),
        ChannelEvent::Closed {
            channel_point,
            settled_balance,
            time_locked_balance,
        } => format!(
            "LN Channel {channel_point} closed (settled {settled_balance}, time-locked {time_locked_balance})"
        ),
        ChannelEvent::Active { channel_point } => {
            format!("LN Channel {channel_point} became active")
        }
        ChannelEvent::Inactive { channel_point } => {
            format!("LN Channel {channel_point} became inactive")
        }
        ChannelEvent::PendingOpen { channel_point } => {
            format!("LN Channel {channel_point} is pending open")
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
