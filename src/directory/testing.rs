//! In-memory directory used by unit tests
use crate::{
    crypto::Address,
    directory::{
        AccessEntry, Community, CommunityDetail, CommunityId, DirectoryClient, RoleDefinition,
        RoleId,
    },
    error::{GuildError, GuildResult},
};
use async_trait::async_trait;
use serde_json::Map;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub fn role(id: RoleId) -> RoleDefinition {
    RoleDefinition {
        id,
        name: Some(format!("Role {}", id)),
        description: Some(format!("Description of role {}", id)),
        extra: Map::new(),
    }
}

pub fn access(role_id: RoleId, access: bool) -> AccessEntry {
    AccessEntry { role_id, access }
}

#[derive(Default)]
pub struct FakeDirectory {
    communities: Vec<Community>,
    details: HashMap<CommunityId, CommunityDetail>,
    access: HashMap<CommunityId, Vec<AccessEntry>>,
    failing_details: HashSet<CommunityId>,
    failing_access: HashSet<CommunityId>,
    delay: Option<Duration>,
    pub fail_catalog: AtomicBool,
    pub catalog_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub access_calls: AtomicUsize,
    pub access_addresses: Mutex<Vec<Address>>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_community(
        mut self,
        id: CommunityId,
        url_name: &str,
        name: &str,
        roles: Vec<RoleDefinition>,
    ) -> Self {
        self.communities.push(Community {
            id,
            url_name: url_name.to_string(),
        });
        self.details.insert(
            id,
            CommunityDetail {
                id,
                name: name.to_string(),
                url_name: url_name.to_string(),
                roles,
            },
        );
        self
    }

    /// Catalog entry whose detail endpoint answers `null`
    pub fn with_catalog_only(mut self, id: CommunityId, url_name: &str) -> Self {
        self.communities.push(Community {
            id,
            url_name: url_name.to_string(),
        });
        self
    }

    pub fn with_access(mut self, id: CommunityId, entries: Vec<AccessEntry>) -> Self {
        self.access.insert(id, entries);
        self
    }

    pub fn with_failing_detail(mut self, id: CommunityId) -> Self {
        self.failing_details.insert(id);
        self
    }

    pub fn with_failing_access(mut self, id: CommunityId) -> Self {
        self.failing_access.insert(id);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn upstream_calls(&self) -> usize {
        self.catalog_calls.load(Ordering::SeqCst)
            + self.detail_calls.load(Ordering::SeqCst)
            + self.access_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn fetch_communities(&self) -> GuildResult<Vec<Community>> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(GuildError::Upstream("connection refused".to_string()));
        }
        Ok(self.communities.clone())
    }

    async fn fetch_detail(&self, id: CommunityId) -> GuildResult<Option<CommunityDetail>> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        if self.failing_details.contains(&id) {
            return Err(GuildError::Upstream(format!("/guild/{} returned 500", id)));
        }
        Ok(self.details.get(&id).cloned())
    }

    async fn fetch_access(
        &self,
        id: CommunityId,
        address: &Address,
    ) -> GuildResult<Option<Vec<AccessEntry>>> {
        self.access_calls.fetch_add(1, Ordering::SeqCst);
        self.access_addresses
            .lock()
            .unwrap()
            .push(*address);
        self.pause().await;

        if self.failing_access.contains(&id) {
            return Err(GuildError::Upstream(format!(
                "/guild/access/{} timed out",
                id
            )));
        }
        Ok(self.access.get(&id).cloned())
    }
}
