// Session cache
//
// At most one authentication call per username for the lifetime of the
// cache. The cache is owned by the workflow that uses it; `&mut self` on
// `get_session` keeps writes single-threaded without a lock.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// An authenticated identity on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: String,
    pub user_id: String,
}

/// Exchanges credentials for a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Session>;
}

/// Username-keyed cache of sessions in front of an `Authenticator`.
pub struct SessionCache<A> {
    authenticator: A,
    sessions: HashMap<String, Session>,
}

impl<A: Authenticator> SessionCache<A> {
    pub fn new(authenticator: A) -> Self {
        Self {
            authenticator,
            sessions: HashMap::new(),
        }
    }

    /// Returns the cached session for `username`, authenticating on first use.
    ///
    /// A failed authentication leaves nothing cached, so a later call retries.
    pub async fn get_session(&mut self, username: &str, password: &str) -> Result<&Session> {
        match self.sessions.entry(username.to_string()) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                let session = self.authenticator.authenticate(username, password).await?;
                tracing::info!(username, user_id = %session.user_id, "session established");
                Ok(&*entry.insert(session))
            }
        }
    }

    /// Drops the cached session for `username`, if any.
    pub fn invalidate(&mut self, username: &str) -> Option<Session> {
        self.sessions.remove(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }
}
