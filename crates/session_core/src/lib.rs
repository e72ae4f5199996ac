use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{GroupId, UserId},
    protocol::{ChannelBalance, ChannelEvent, HistoryPage, RemoteUser, SendProgress, WalletBalance},
};
use tokio::sync::mpsc;

pub mod balance;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod inbound;
pub mod notify;
pub mod payment_gate;
pub mod registry;
pub mod session;
pub mod text;
pub mod window;

pub use config::{load_settings, Settings};
pub use dispatcher::{Dispatcher, Notification};
pub use error::SessionError;
pub use inbound::InboundEnvelope;
pub use notify::{Notifier, NullNotifier, UiSignal};
pub use registry::WindowSlot;
pub use session::Session;
pub use window::{ChatWindow, WindowKind, WindowTarget};

/// Operations the session consumes from the messaging client library.
///
/// Sync accessors must be cheap lookups; every `async` method may block on the
/// network and is only ever called from a worker task.
#[async_trait]
pub trait ClientLibrary: Send + Sync {
    fn local_id(&self) -> UserId;
    fn local_nick(&self) -> String;
    fn user_nick(&self, id: &UserId) -> Option<String>;
    fn user_by_nick(&self, nick: &str) -> Option<RemoteUser>;
    fn gc_alias(&self, id: &GroupId) -> Option<String>;
    fn gc_id_by_name(&self, name: &str) -> Option<GroupId>;
    fn server_ln_node(&self) -> Option<String>;
    fn outbound_queue_len(&self) -> usize;
    fn onboarding_in_progress(&self) -> bool;

    async fn read_history(&self, target: &WindowTarget, limit: usize) -> Result<HistoryPage>;
    async fn send_pm(&self, to: &UserId, message: &str) -> Result<()>;
    async fn send_gc_message(
        &self,
        gc: &GroupId,
        message: &str,
    ) -> Result<Option<mpsc::Receiver<SendProgress>>>;
    /// Keeps the transport open but refuses to go online until it is closed.
    async fn remain_offline(&self);
}

#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn wallet_balance(&self) -> Result<WalletBalance>;
    async fn channel_balance(&self) -> Result<ChannelBalance>;
    async fn pending_open_channels(&self) -> Result<usize>;
    async fn query_route(&self, node: &str, amount_matoms: u64) -> Result<()>;
    async fn check_wallet_usable(&self, server_node: &str) -> Result<()>;
    async fn subscribe_channel_events(&self) -> Result<mpsc::Receiver<ChannelEvent>>;
    // USD per coin, zero when unknown.
    fn exchange_rate(&self) -> f64;
}

pub struct MissingClientLibrary {
    pub local_id: UserId,
    pub local_nick: String,
}

#[async_trait]
impl ClientLibrary for MissingClientLibrary {
    fn local_id(&self) -> UserId {
        self.local_id
    }

    fn local_nick(&self) -> String {
        self.local_nick.clone()
    }

    fn user_nick(&self, _id: &UserId) -> Option<String> {
        None
    }

    fn user_by_nick(&self, _nick: &str) -> Option<RemoteUser> {
        None
    }

    fn gc_alias(&self, _id: &GroupId) -> Option<String> {
        None
    }

    fn gc_id_by_name(&self, _name: &str) -> Option<GroupId> {
        None
    }

    fn server_ln_node(&self) -> Option<String> {
        None
    }

    fn outbound_queue_len(&self) -> usize {
        0
    }

    fn onboarding_in_progress(&self) -> bool {
        false
    }

    async fn read_history(&self, _target: &WindowTarget, _limit: usize) -> Result<HistoryPage> {
        Err(anyhow!("client library unavailable: no chat history"))
    }

    async fn send_pm(&self, to: &UserId, _message: &str) -> Result<()> {
        Err(anyhow!(
            "client library unavailable: cannot send PM to {}",
            to.short_log_id()
        ))
    }

    async fn send_gc_message(
        &self,
        gc: &GroupId,
        _message: &str,
    ) -> Result<Option<mpsc::Receiver<SendProgress>>> {
        Err(anyhow!(
            "client library unavailable: cannot send to GC {}",
            gc.short_log_id()
        ))
    }

    async fn remain_offline(&self) {}
}

pub struct MissingPaymentBackend;

#[async_trait]
impl PaymentBackend for MissingPaymentBackend {
    async fn wallet_balance(&self) -> Result<WalletBalance> {
        Err(anyhow!("payment backend unavailable"))
    }

    async fn channel_balance(&self) -> Result<ChannelBalance> {
        Err(anyhow!("payment backend unavailable"))
    }

    async fn pending_open_channels(&self) -> Result<usize> {
        Err(anyhow!("payment backend unavailable"))
    }

    async fn query_route(&self, node: &str, _amount_matoms: u64) -> Result<()> {
        Err(anyhow!("payment backend unavailable: no route to {node}"))
    }

    async fn check_wallet_usable(&self, _server_node: &str) -> Result<()> {
        Err(anyhow!("payment backend unavailable"))
    }

    async fn subscribe_channel_events(&self) -> Result<mpsc::Receiver<ChannelEvent>> {
        Err(anyhow!("payment backend unavailable: no channel events"))
    }

    fn exchange_rate(&self) -> f64 {
        0.0
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
