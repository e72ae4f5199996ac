use std::{collections::VecDeque, future, sync::Mutex};

use chrono::{DateTime, Utc};
use shared::protocol::{InboundPayload, RemoteUser};
use tokio::{
    sync::Notify,
    time::{sleep_until, Instant},
};
use tracing::{debug, warn};

use crate::{
    lock,
    notify::UiSignal,
    session::Session,
    text,
    window::WindowTarget,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEnvelope {
    pub sender: RemoteUser,
    pub payload: InboundPayload,
    pub sent_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

impl InboundEnvelope {
    pub fn new(sender: RemoteUser, payload: InboundPayload, sent_at: DateTime<Utc>) -> Self {
        Self {
            sender,
            payload,
            sent_at,
            received_at: Utc::now(),
        }
    }

    fn target(&self) -> WindowTarget {
        match &self.payload {
            InboundPayload::Private(_) => WindowTarget::User(self.sender.id),
            InboundPayload::Group(gm) => WindowTarget::Group(gm.group_id),
        }
    }

    fn raw_message(&self) -> &str {
        match &self.payload {
            InboundPayload::Private(pm) => &pm.message,
            InboundPayload::Group(gm) => &gm.message,
        }
    }
}

#[derive(Default)]
struct QueueState {
    queue: VecDeque<InboundEnvelope>,
    dropped: usize,
}

pub struct InboundPipeline {
    capacity: usize,
    state: Mutex<QueueState>,
    wakeup: Notify,
}

impl InboundPipeline {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(QueueState::default()),
            wakeup: Notify::new(),
        }
    }

    /// Appends an envelope and wakes the consumer. When the queue is full the
    /// oldest pending envelope is dropped.
    pub fn enqueue(&self, envelope: InboundEnvelope) {
        {
            let mut state = lock(&self.state);
            if state.queue.len() >= self.capacity {
                if let Some(oldest) = state.queue.pop_front() {
                    state.dropped += 1;
                    warn!(
                        capacity = self.capacity,
                        sender = %oldest.sender.id.short_log_id(),
                        "inbound: queue full, dropping oldest message"
                    );
                }
            }
            state.queue.push_back(envelope);
        }
        self.wakeup.notify_one();
    }

    pub fn len(&self) -> usize {
        lock(&self.state).queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn drain(&self) -> (Vec<InboundEnvelope>, usize) {
        let mut state = lock(&self.state);
        let dropped = std::mem::take(&mut state.dropped);
        (state.queue.drain(..).collect(), dropped)
    }

    pub(crate) async fn run(&self, session: &Session) {
        let cancel = session.cancel_token();
        let debounce = session.settings().repaint_debounce();
        let mut repaint_at: Option<Instant> = None;
        let mut hit_active = false;

        loop {
            let deadline = repaint_at;
            let repaint_timer = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => future::pending().await,
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = repaint_timer => {
                    repaint_at = None;
                    session.footer_invalidate();
                    if hit_active {
                        session.notify(UiSignal::RepaintActive);
                    } else {
                        session.notify(UiSignal::FooterChanged);
                    }
                    hit_active = false;
                }
                _ = self.wakeup.notified() => {
                    let (batch, dropped) = self.drain();
                    if dropped > 0 {
                        session.diag_msg(format!(
                            "Dropped {dropped} inbound messages due to queue overflow"
                        ));
                    }
                    if batch.is_empty() {
                        continue;
                    }
                    debug!(count = batch.len(), "inbound: draining messages");
                    for envelope in batch {
                        hit_active |= self.process(session, envelope).await;
                    }
                    if repaint_at.is_none() {
                        repaint_at = Some(Instant::now() + debounce);
                    }
                }
            }
        }
        debug!("inbound: consumer stopped");
    }

    async fn process(&self, session: &Session, envelope: InboundEnvelope) -> bool {
        let cw = session.find_or_create_window(envelope.target()).await;
        let from_nick = text::sanitize_nick(&envelope.sender.nick);
        let content = text::clean_received(envelope.raw_message());
        let mentioned = text::has_mention(&session.local_nick(), &content);

        let init_time = cw.init_time().unwrap_or(DateTime::<Utc>::MIN_UTC);
        if envelope.received_at >= init_time || !session.settings().message_log_enabled {
            cw.new_received(
                &from_nick,
                content,
                envelope.sender.id,
                envelope.sent_at,
                mentioned,
            );
        } else {
            // Already part of the loaded history; it is just unread.
            cw.rewind_unread();
        }

        if session.settings().bell_enabled {
            let from = match envelope.payload {
                InboundPayload::Private(_) => from_nick,
                InboundPayload::Group(_) => cw.alias().to_string(),
            };
            session.notify(UiSignal::Bell { from });
        }

        session.mark_window_updated(&cw, mentioned)
    }
}

#[cfg(test)]
#[path = "tests/inbound_tests.rs"]
mod tests;
