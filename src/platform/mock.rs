//! In-memory [`ChatApi`] double.
//!
//! Records every outbound message per channel and answers `user_from_id`
//! from a scripted table. Never performs network I/O.

use super::{ApiUser, ChatApi, ClientError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct MockApi {
    sent: Mutex<Vec<(String, String)>>,
    users: Mutex<HashMap<String, ApiUser>>,
    lookups: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script a user for `user_from_id`.
    pub fn add_user(&self, id: &str, username: &str) {
        self.users.lock().insert(
            id.to_string(),
            ApiUser {
                id: id.to_string(),
                username: username.to_string(),
            },
        );
    }

    /// Drain the messages sent to `channel` so far, in send order.
    pub fn poll(&self, channel: &str) -> Vec<String> {
        let mut sent = self.sent.lock();
        let (matching, rest): (Vec<_>, Vec<_>) =
            sent.drain(..).partition(|(c, _)| c == channel);
        *sent = rest;
        matching.into_iter().map(|(_, text)| text).collect()
    }

    /// Every message sent so far as `(channel, text)`, without draining.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    /// Ids passed to `user_from_id`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), ClientError> {
        self.sent.lock().push((channel.to_string(), text.to_string()));
        Ok(())
    }

    async fn user_from_id(&self, id: &str) -> Result<Option<ApiUser>, ClientError> {
        self.lookups.lock().push(id.to_string());
        Ok(self.users.lock().get(id).cloned())
    }
}
