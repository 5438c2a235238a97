use crate::domain::chat::ChatMessage;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

pub type SessionHandle = Arc<Mutex<Vec<ChatMessage>>>;

/// In-memory conversation transcripts keyed by session id.
///
/// Each session owns its own async mutex, so appends within one session
/// serialize while unrelated sessions never block each other. Sessions live
/// until explicitly deleted; there is no TTL or eviction.
pub struct SessionMemoryStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionMemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the transcript handle for a session, creating it if absent.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().unwrap().get(session_id) {
            return handle.clone();
        }
        let mut sessions = self.sessions.write().unwrap();
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    pub async fn append(&self, session_id: &str, message: ChatMessage) {
        let handle = self.get_or_create(session_id);
        handle.lock().await.push(message);
    }

    /// Empty the transcript but keep the session entry.
    pub async fn clear(&self, session_id: &str) {
        let handle = self.sessions.read().unwrap().get(session_id).cloned();
        if let Some(handle) = handle {
            handle.lock().await.clear();
        }
    }

    /// Remove the session entirely. A later `get_or_create` starts fresh.
    pub fn delete(&self, session_id: &str) {
        self.sessions.write().unwrap().remove(session_id);
    }

    /// Snapshot of the transcript, oldest first. An unknown session reads as
    /// an empty transcript, not an error.
    pub async fn read(&self, session_id: &str) -> Vec<ChatMessage> {
        let handle = self.sessions.read().unwrap().get(session_id).cloned();
        match handle {
            Some(handle) => handle.lock().await.clone(),
            None => Vec::new(),
        }
    }
}

impl Default for SessionMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = SessionMemoryStore::new();
        store.append("s1", ChatMessage::student("hello")).await;
        store.append("s1", ChatMessage::patient("hi")).await;
        store.append("s1", ChatMessage::student("how are you")).await;

        let transcript = store.read("s1").await;
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0].content, "hello");
        assert_eq!(transcript[1].content, "hi");
        assert_eq!(transcript[2].content, "how are you");
    }

    #[tokio::test]
    async fn test_read_unknown_session_is_empty() {
        let store = SessionMemoryStore::new();
        assert!(store.read("missing").await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_keeps_session_entry() {
        let store = SessionMemoryStore::new();
        let handle = store.get_or_create("s1");
        store.append("s1", ChatMessage::student("hello")).await;
        store.clear("s1").await;

        assert!(store.read("s1").await.is_empty());
        // Same handle is still registered after a clear.
        assert!(Arc::ptr_eq(&handle, &store.get_or_create("s1")));
    }

    #[tokio::test]
    async fn test_delete_starts_fresh() {
        let store = SessionMemoryStore::new();
        let old = store.get_or_create("s1");
        store.append("s1", ChatMessage::student("hello")).await;
        store.delete("s1");

        assert!(store.read("s1").await.is_empty());
        assert!(!Arc::ptr_eq(&old, &store.get_or_create("s1")));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionMemoryStore::new();
        store.append("s1", ChatMessage::student("first")).await;
        store.append("s2", ChatMessage::student("second")).await;

        assert_eq!(store.read("s1").await.len(), 1);
        assert_eq!(store.read("s2").await.len(), 1);
        assert_eq!(store.read("s1").await[0].content, "first");
        assert_eq!(store.read("s2").await[0].content, "second");
    }
}
