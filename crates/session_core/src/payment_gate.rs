use std::{sync::Mutex, time::Duration};

use tokio::time::Instant;
use tracing::{debug, info};

use crate::{lock, ClientLibrary, PaymentBackend};

pub const SERVER_PROBE_MATOMS: u64 = 1000;

pub struct PaymentGate {
    ttl: Duration,
    last_capable: Mutex<Option<Instant>>,
}

impl PaymentGate {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            last_capable: Mutex::new(None),
        }
    }

    pub fn is_cached(&self) -> bool {
        lock(&self.last_capable).is_some_and(|at| at.elapsed() < self.ttl)
    }

    pub async fn can_pay_server(
        &self,
        client: &dyn ClientLibrary,
        backend: &dyn PaymentBackend,
    ) -> bool {
        if self.is_cached() {
            return true;
        }

        let Some(node) = client.server_ln_node() else {
            debug!("paygate: no server node known");
            return false;
        };

        match backend.query_route(&node, SERVER_PROBE_MATOMS).await {
            Ok(()) => {
                *lock(&self.last_capable) = Some(Instant::now());
                true
            }
            Err(err) => {
                info!(node = %node, error = %err, "paygate: no route to server node");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/payment_gate_tests.rs"]
mod tests;
