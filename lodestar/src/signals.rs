use std::sync::{Arc, Mutex};

use nanoid::nanoid;

use crate::memory::MemoryAdapter;
use crate::models::{Metadata, Signal};

const SESSION_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Per-session, append-only log of behavioral signals with fire-and-forget
/// durable persistence.
///
/// The in-memory buffer, not the store, is authoritative for same-session
/// reasoning: a signal is visible to `session_signals` the moment `track`
/// returns, while the adapter write completes (or fails and is logged) in
/// the background.
pub struct SignalLog {
    session_id: String,
    buffer: Mutex<Vec<Signal>>,
    adapter: Arc<dyn MemoryAdapter>,
}

impl SignalLog {
    pub fn new(adapter: Arc<dyn MemoryAdapter>) -> Self {
        Self {
            session_id: generate_session_id(),
            buffer: Mutex::new(Vec::new()),
            adapter,
        }
    }

    /// Record one signal: append to the session buffer synchronously, then
    /// persist through the adapter off the caller's path. A failed write is
    /// the adapter's to log; it never reaches the caller.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn track(&self, signal_type: &str, data: Metadata) -> Signal {
        let signal = Signal::new(signal_type, self.session_id.clone(), data);

        self.buffer
            .lock()
            .expect("signal buffer lock poisoned")
            .push(signal.clone());

        let adapter = Arc::clone(&self.adapter);
        let persisted = signal.clone();
        tokio::spawn(async move {
            adapter.save_signal(&persisted).await;
        });

        signal
    }

    /// The session's signals in insertion order, oldest first.
    pub fn session_signals(&self) -> Vec<Signal> {
        self.buffer
            .lock()
            .expect("signal buffer lock poisoned")
            .clone()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// A short random token, unique enough for one tab/process lifetime.
fn generate_session_id() -> String {
    format!("sess_{}", nanoid!(9, &SESSION_ALPHABET))
}
