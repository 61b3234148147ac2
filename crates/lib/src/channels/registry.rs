//! Transport registry: register and lookup chat transports by id.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle to a chat transport (send, stop). Injected into the dispatcher; never global.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transport id (e.g. "whatsapp").
    fn id(&self) -> &str;
    /// Stop the transport. Sends after stop fail.
    fn stop(&self);
    /// Send a text payload to a chat target (phone number or group id).
    async fn send(&self, target: &str, payload: &str) -> Result<(), String>;
}

/// Registry of transport ids to handles. Shared across the gateway.
pub struct TransportRegistry {
    inner: Arc<RwLock<HashMap<String, Arc<dyn ChatTransport>>>>,
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register under `transport.id()`, stopping any transport previously registered there.
    pub async fn register(&self, transport: Arc<dyn ChatTransport>) {
        let mut g = self.inner.write().await;
        if let Some(old) = g.insert(transport.id().to_string(), transport) {
            old.stop();
        }
    }

    pub async fn get(&self, id: &str) -> Option<Arc<dyn ChatTransport>> {
        let g = self.inner.read().await;
        g.get(id).cloned()
    }

    pub async fn ids(&self) -> Vec<String> {
        let g = self.inner.read().await;
        g.keys().cloned().collect()
    }

    /// Stop every registered transport (shutdown).
    pub async fn stop_all(&self) {
        for transport in self.inner.read().await.values() {
            transport.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Dummy {
        stopped: AtomicBool,
    }

    #[async_trait]
    impl ChatTransport for Dummy {
        fn id(&self) -> &str {
            "dummy"
        }

        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }

        async fn send(&self, _target: &str, _payload: &str) -> Result<(), String> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn re_registering_stops_previous_transport() {
        let registry = TransportRegistry::new();
        let first = Arc::new(Dummy {
            stopped: AtomicBool::new(false),
        });
        let second = Arc::new(Dummy {
            stopped: AtomicBool::new(false),
        });
        registry.register(first.clone()).await;
        registry.register(second.clone()).await;
        assert!(first.stopped.load(Ordering::SeqCst));
        assert!(!second.stopped.load(Ordering::SeqCst));
        assert_eq!(registry.ids().await, vec!["dummy".to_string()]);
        assert!(registry.get("dummy").await.is_some());

        registry.stop_all().await;
        assert!(second.stopped.load(Ordering::SeqCst));
    }
}
