//! Client icon lookup
//!
//! Group boxes of session clients are drawn with the client's own icon. The
//! session layer owns the client list and keeps updating it; the patchbay only
//! reads it when a group is created.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Read-only icon lookup used at group creation time.
pub trait ClientIconLookup {
    /// Icon name for the client owning `group_name`, or an empty string.
    fn resolve_client_icon(&self, group_name: &str) -> String;
}

impl<F> ClientIconLookup for F
where
    F: Fn(&str) -> String,
{
    fn resolve_client_icon(&self, group_name: &str) -> String {
        self(group_name)
    }
}

/// A session client as far as the patchbay cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub client_id: String,
    pub icon: String,
}

impl ClientInfo {
    /// A client owns the group named after it, or after `name.client_id`.
    pub fn owns_group(&self, group_name: &str) -> bool {
        if self.name == group_name {
            return true;
        }
        group_name
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|id| id == self.client_id)
    }
}

/// Shared, updatable list of session clients.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<Vec<ClientInfo>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client, replacing any entry with the same client id.
    pub fn upsert(&self, client: ClientInfo) {
        let mut clients = self.clients.write();
        if let Some(existing) = clients.iter_mut().find(|c| c.client_id == client.client_id) {
            *existing = client;
        } else {
            clients.push(client);
        }
    }

    pub fn remove(&self, client_id: &str) -> Option<ClientInfo> {
        let mut clients = self.clients.write();
        let index = clients.iter().position(|c| c.client_id == client_id)?;
        Some(clients.remove(index))
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

impl ClientIconLookup for ClientRegistry {
    fn resolve_client_icon(&self, group_name: &str) -> String {
        self.clients
            .read()
            .iter()
            .find(|c| c.owns_group(group_name))
            .map(|c| c.icon.clone())
            .unwrap_or_default()
    }
}
