//! Call correlation: matching asynchronous replies to outstanding calls.
//!
//! Every outbound call is identified by a [`CallKey`] of message id and peer
//! address. The [`CallTable`] allocates keys and holds the single-slot reply
//! channel for each pending call. Id allocation, slot insertion, slot removal
//! and reply lookup all happen under one lock, so a reply can never arrive
//! before its slot exists and no two pending calls ever share a key.

use std::collections::HashMap;
use std::net::SocketAddr;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::wire::RawMessage;

/// Identifies one outstanding call: a message id scoped to a peer address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallKey {
    /// The id carried by the request and echoed by the response.
    pub message_id: u32,
    /// The peer the request was sent to.
    pub peer: SocketAddr,
}

impl CallKey {
    /// Creates a key for `message_id` sent to `peer`.
    #[must_use]
    pub fn new(message_id: u32, peer: SocketAddr) -> Self {
        Self { message_id, peer }
    }
}

impl std::fmt::Display for CallKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.message_id, self.peer)
    }
}

struct TableState {
    next_id: u32,
    pending: HashMap<CallKey, oneshot::Sender<RawMessage>>,
}

/// Owns the message-id counter and the pending-reply table.
pub struct CallTable {
    state: Mutex<TableState>,
}

impl std::fmt::Debug for CallTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallTable")
            .field("pending", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for CallTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CallTable {
    /// Creates an empty table with an unpredictable starting message id.
    #[must_use]
    pub fn new() -> Self {
        let (seed, _, _, _) = uuid::Uuid::new_v4().as_fields();
        Self::with_seed(seed)
    }

    /// Creates an empty table whose first allocated id is `seed + 1`.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self {
            state: Mutex::new(TableState {
                next_id: seed,
                pending: HashMap::new(),
            }),
        }
    }

    /// Allocates a fresh key for `peer` and registers its reply slot.
    ///
    /// The counter is incremented (wrapping on overflow) until the key is not
    /// already pending. The returned guard removes the slot when dropped.
    pub fn open(&self, peer: SocketAddr) -> (PendingCall<'_>, oneshot::Receiver<RawMessage>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        let mut state = self.state.lock();

        let key = loop {
            state.next_id = state.next_id.wrapping_add(1);
            let candidate = CallKey::new(state.next_id, peer);
            if !state.pending.contains_key(&candidate) {
                break candidate;
            }
        };
        state.pending.insert(key, reply_tx);

        (PendingCall { table: self, key }, reply_rx)
    }

    /// Delivers a reply payload to the call pending under `key`.
    ///
    /// The slot is taken out of the table, so at most one payload is ever
    /// delivered per call.
    ///
    /// # Errors
    ///
    /// Returns the payload back if no call is pending under `key`, or if the
    /// caller stopped waiting.
    pub fn deliver(&self, key: &CallKey, payload: RawMessage) -> Result<(), RawMessage> {
        let slot = self.state.lock().pending.remove(key);
        match slot {
            Some(reply_tx) => reply_tx.send(payload),
            None => Err(payload),
        }
    }

    /// Returns `true` if a call is pending under `key`.
    #[must_use]
    pub fn contains(&self, key: &CallKey) -> bool {
        self.state.lock().pending.contains_key(key)
    }

    /// Number of pending calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Returns `true` if no call is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every pending slot, waking their callers with a closed channel.
    pub fn clear(&self) {
        self.state.lock().pending.clear();
    }

    fn remove(&self, key: &CallKey) {
        self.state.lock().pending.remove(key);
    }
}

/// Guard for one pending call; removes the slot from the table on drop.
#[derive(Debug)]
pub struct PendingCall<'a> {
    table: &'a CallTable,
    key: CallKey,
}

impl PendingCall<'_> {
    /// The key this call was registered under.
    #[must_use]
    pub fn key(&self) -> CallKey {
        self.key
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.table.remove(&self.key);
    }
}
