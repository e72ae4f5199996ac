use shared::domain::{Amount, ConnectionState, FileId, PageSessionId, PostId, UserId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum UiSignal {
    RepaintActive,
    FooterChanged,
    ActiveWindowChanged,
    ShowFeedWindow,
    ConnectionChanged(ConnectionState),
    OutboundQueueChanged(usize),
    UnconfirmedFunds(Amount),
    ConfirmedFunds(Amount),
    FeedUpdated(PostId),
    PostStatusUpdated(PostId),
    OnboardingChanged,
    KxSearchCompleted(UserId),
    DownloadCompleted(FileId),
    PageFetched {
        session_id: PageSessionId,
        uid: UserId,
    },
    Bell {
        from: String,
    },
    ClockTick,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, signal: UiSignal);
}

impl Notifier for mpsc::UnboundedSender<UiSignal> {
    fn notify(&self, signal: UiSignal) {
        // The UI may have gone away during shutdown.
        let _ = self.send(signal);
    }
}

pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _signal: UiSignal) {}
}
