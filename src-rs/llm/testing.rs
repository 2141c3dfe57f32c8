//! Scripted provider adapters for exercising the router, fallback and task
//! layers without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use super::types::{ProviderAdapter, ProviderError, ProviderErrorKind};

pub struct ScriptedAdapter {
    reply: Result<String, ProviderError>,
    calls: AtomicUsize,
    gate: Option<Mutex<Receiver<()>>>,
}

impl ScriptedAdapter {
    pub fn ok(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn failing(kind: ProviderErrorKind, message: &str) -> Self {
        Self {
            reply: Err(ProviderError::new(kind, message)),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Holds every call until the returned sender releases it (one send per
    /// call). Dropping the sender releases all pending and future calls.
    pub fn gated(mut self) -> (Self, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        self.gate = Some(Mutex::new(rx));
        (self, tx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProviderAdapter for ScriptedAdapter {
    fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            if let Ok(rx) = gate.lock() {
                let _ = rx.recv();
            }
        }
        self.reply.clone()
    }
}
