use serde::{Deserialize, Serialize};

use crate::page::{Cursor, Page, RemoteError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Space {
    pub did: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
}

impl Space {
    pub fn label(&self) -> String {
        match self.name.as_deref().filter(|name| !name.trim().is_empty()) {
            Some(name) => format!("{name} ({})", self.did),
            None => self.did.clone(),
        }
    }

    pub fn access_label(&self) -> &str {
        self.access.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Shard {
    pub cid: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Upload {
    pub root: String,
    #[serde(default)]
    pub shards: Vec<Shard>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub inserted_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Blob {
    pub digest: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub cause: Option<String>,
    #[serde(default)]
    pub inserted_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Removed {
    pub freed_bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RateLimit {
    pub id: String,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AgentInfo {
    pub did: String,
    pub accounts: Vec<String>,
}

impl AgentInfo {
    pub fn header_line(&self) -> String {
        let accounts = if self.accounts.is_empty() {
            "(none)".to_string()
        } else {
            self.accounts.join(", ")
        };
        format!("Agent: {} | Accounts: {accounts}", self.did)
    }
}

/// Remote store collaborator. Every scoped call names its space explicitly.
pub trait StoreService: Send + Sync {
    fn agent_info(&self) -> Result<AgentInfo, RemoteError>;

    fn spaces(&self) -> Result<Vec<Space>, RemoteError>;

    fn usage(&self, space: &str) -> Result<u64, RemoteError>;

    fn rate_limits(
        &self,
        subject: &str,
        provider: Option<&str>,
    ) -> Result<Vec<RateLimit>, RemoteError>;

    fn list_uploads(
        &self,
        space: &str,
        cursor: Option<&Cursor>,
        size: usize,
    ) -> Result<Page<Upload>, RemoteError>;

    fn list_blobs(
        &self,
        space: &str,
        cursor: Option<&Cursor>,
        size: usize,
    ) -> Result<Page<Blob>, RemoteError>;

    fn remove_upload(
        &self,
        space: &str,
        root: &str,
        remove_shards: bool,
    ) -> Result<Removed, RemoteError>;

    fn remove_blob(&self, space: &str, digest: &str) -> Result<Removed, RemoteError>;

    fn blob_info(&self, space: &str, digest: &str) -> Result<Blob, RemoteError>;
}
