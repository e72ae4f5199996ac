use std::{future::Future, sync::Mutex};

use chrono::{DateTime, Utc};
use shared::{
    domain::{GroupId, PageSessionId, UserId},
    protocol::{FetchedResource, HistoryEntry},
};
use tokio::sync::OnceCell;

use crate::lock;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    DirectMessage,
    GroupChat,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowTarget {
    User(UserId),
    Group(GroupId),
    Page(PageSessionId),
}

impl WindowTarget {
    pub fn kind(&self) -> WindowKind {
        match self {
            WindowTarget::User(_) => WindowKind::DirectMessage,
            WindowTarget::Group(_) => WindowKind::GroupChat,
            WindowTarget::Page(_) => WindowKind::Page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Received,
    Mine,
    Internal,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub ts: DateTime<Utc>,
    pub kind: MessageKind,
    pub from: Option<String>,
    pub from_uid: Option<UserId>,
    pub text: String,
    pub sent: bool,
    pub mentioned: bool,
}

impl ChatMessage {
    fn local(kind: MessageKind, text: String) -> Self {
        Self {
            ts: Utc::now(),
            kind,
            from: None,
            from_uid: None,
            text,
            sent: true,
            mentioned: false,
        }
    }

    fn is_local(&self) -> bool {
        matches!(
            self.kind,
            MessageKind::Mine | MessageKind::Internal | MessageKind::Help
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef(usize);

#[derive(Default)]
struct WindowLog {
    messages: Vec<ChatMessage>,
    unread_idx: usize,
    page: Option<FetchedResource>,
}

impl WindowLog {
    fn append(&mut self, msg: ChatMessage) -> MessageRef {
        let advance_unread = msg.is_local() && self.unread_idx == self.messages.len();
        self.messages.push(msg);
        if advance_unread {
            self.unread_idx = self.messages.len();
        }
        MessageRef(self.messages.len() - 1)
    }

    fn append_history(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
        self.unread_idx = self.messages.len();
    }
}

pub struct ChatWindow {
    target: WindowTarget,
    alias: String,
    me: String,
    init_time: OnceCell<DateTime<Utc>>,
    log: Mutex<WindowLog>,
}

impl ChatWindow {
    pub fn new(target: WindowTarget, alias: impl Into<String>, me: impl Into<String>) -> Self {
        Self {
            target,
            alias: alias.into(),
            me: me.into(),
            init_time: OnceCell::new(),
            log: Mutex::new(WindowLog::default()),
        }
    }

    pub fn target(&self) -> WindowTarget {
        self.target
    }

    pub fn kind(&self) -> WindowKind {
        self.target.kind()
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn init_time(&self) -> Option<DateTime<Utc>> {
        self.init_time.get().copied()
    }

    /// Runs `load` the first time it is called; later and concurrent callers
    /// wait for that first load and get its result.
    pub(crate) async fn init_once<F, Fut>(&self, load: F) -> DateTime<Utc>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DateTime<Utc>>,
    {
        *self.init_time.get_or_init(load).await
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.log).messages.is_empty()
    }

    pub fn len(&self) -> usize {
        lock(&self.log).messages.len()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock(&self.log).messages.clone()
    }

    pub fn last_message(&self) -> Option<ChatMessage> {
        lock(&self.log).messages.last().cloned()
    }

    pub fn unread_idx(&self) -> usize {
        lock(&self.log).unread_idx
    }

    pub fn unread_count(&self) -> usize {
        let log = lock(&self.log);
        log.messages.len().saturating_sub(log.unread_idx)
    }

    pub fn mark_all_read(&self) {
        let mut log = lock(&self.log);
        log.unread_idx = log.messages.len();
    }

    pub(crate) fn rewind_unread(&self) {
        let mut log = lock(&self.log);
        log.unread_idx = log.unread_idx.saturating_sub(1);
    }

    pub fn new_unsent(&self, text: &str) -> MessageRef {
        let mut msg = ChatMessage::local(MessageKind::Mine, text.to_string());
        msg.from = Some(self.me.clone());
        msg.sent = false;
        lock(&self.log).append(msg)
    }

    pub fn new_internal(&self, text: impl Into<String>) -> MessageRef {
        lock(&self.log).append(ChatMessage::local(MessageKind::Internal, text.into()))
    }

    pub fn new_help(&self, text: impl Into<String>) {
        self.help_lines([text.into()]);
    }

    pub fn help_lines<I>(&self, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut log = lock(&self.log);
        for line in lines {
            log.messages
                .push(ChatMessage::local(MessageKind::Help, line));
        }
    }

    pub fn new_received(
        &self,
        from: &str,
        text: String,
        from_uid: UserId,
        ts: DateTime<Utc>,
        mentioned: bool,
    ) -> MessageRef {
        lock(&self.log).append(ChatMessage {
            ts,
            kind: MessageKind::Received,
            from: Some(from.to_string()),
            from_uid: Some(from_uid),
            text,
            sent: true,
            mentioned,
        })
    }

    pub(crate) fn seed_history(&self, entries: &[HistoryEntry]) {
        let mut log = lock(&self.log);
        let mut last_day = None;
        for entry in entries {
            let day = entry.timestamp.format(DATE_FORMAT).to_string();
            if last_day.as_ref() != Some(&day) {
                log.append_history(ChatMessage::local(
                    MessageKind::Internal,
                    format!("Day changed to {day}"),
                ));
                last_day = Some(day);
            }
            let mine = entry.from == self.me;
            log.append_history(ChatMessage {
                ts: entry.timestamp,
                kind: if mine {
                    MessageKind::Mine
                } else {
                    MessageKind::Received
                },
                from: Some(entry.from.clone()),
                from_uid: None,
                text: entry.message.clone(),
                sent: true,
                mentioned: false,
            });
        }
    }

    pub fn set_sent(&self, msg: MessageRef) {
        if let Some(m) = lock(&self.log).messages.get_mut(msg.0) {
            m.sent = true;
        }
    }

    pub(crate) fn set_text(&self, msg: MessageRef, text: String) {
        if let Some(m) = lock(&self.log).messages.get_mut(msg.0) {
            m.text = text;
        }
    }

    pub fn page(&self) -> Option<FetchedResource> {
        lock(&self.log).page.clone()
    }

    pub(crate) fn replace_page(&self, fetched: FetchedResource) {
        let mut log = lock(&self.log);
        let mut msg = ChatMessage::local(
            MessageKind::Internal,
            String::from_utf8_lossy(&fetched.data).into_owned(),
        );
        msg.from_uid = Some(fetched.uid);
        match log.messages.first_mut() {
            Some(first) => *first = msg,
            None => {
                log.messages.push(msg);
            }
        }
        log.page = Some(fetched);
    }
}

#[cfg(test)]
#[path = "tests/window_tests.rs"]
mod tests;
