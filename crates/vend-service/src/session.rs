//! # Session Store
//!
//! Maps each customer session to its open transaction.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   SessionStore                                                          │
//! │   Mutex<HashMap<SessionId, Arc<Mutex<Transaction>>>>                    │
//! │        │                                                                │
//! │        │ held only for lookup / insert / remove                         │
//! │        ▼                                                                │
//! │   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                │
//! │   │ session A tx │   │ session B tx │   │ session C tx │                │
//! │   │   (Mutex)    │   │   (Mutex)    │   │   (Mutex)    │                │
//! │   └──────────────┘   └──────────────┘   └──────────────┘                │
//! │                                                                         │
//! │   Two customers never wait on each other's transaction lock.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idle Sessions
//! An entry lives until its order is completed or cancelled. A customer who
//! inserts coins and walks away leaves the entry behind, so the owner calls
//! [`SessionStore::reclaim_idle`] (via `VendingService::reclaim_idle_sessions`)
//! to drop entries untouched for longer than a cutoff.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;
use vend_core::{FundsPolicy, Transaction};

/// Identifies one customer at the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        SessionId::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shared handle to one session's transaction.
pub type TransactionHandle = Arc<Mutex<Transaction>>;

#[derive(Debug)]
struct SessionEntry {
    handle: TransactionHandle,
    last_used: Instant,
}

/// Open transactions, one per session.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session's transaction, creating it on first use.
    ///
    /// The transaction id is a fresh UUID, independent of the session id.
    pub async fn get_or_create(&self, session: SessionId, policy: FundsPolicy) -> TransactionHandle {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(session).or_insert_with(|| {
            let tx = Transaction::with_policy(Uuid::new_v4().to_string(), policy);
            SessionEntry {
                handle: Arc::new(Mutex::new(tx)),
                last_used: Instant::now(),
            }
        });
        entry.last_used = Instant::now();
        entry.handle.clone()
    }

    pub async fn get(&self, session: SessionId) -> Option<TransactionHandle> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(&session).map(|entry| {
            entry.last_used = Instant::now();
            entry.handle.clone()
        })
    }

    /// Forgets the session. The transaction itself lives on while other
    /// handles to it exist.
    pub async fn remove(&self, session: SessionId) -> Option<TransactionHandle> {
        self.sessions
            .lock()
            .await
            .remove(&session)
            .map(|entry| entry.handle)
    }

    /// Removes every session not looked up for longer than `max_idle` and
    /// returns their transactions.
    pub async fn reclaim_idle(&self, max_idle: Duration) -> Vec<(SessionId, TransactionHandle)> {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        let idle: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, entry)| now.duration_since(entry.last_used) > max_idle)
            .map(|(id, _)| *id)
            .collect();

        idle.into_iter()
            .filter_map(|id| sessions.remove(&id).map(|entry| (id, entry.handle)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
