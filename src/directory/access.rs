/// Access Resolver - per-address role access lookups
///
/// Access depends on off-chain and on-chain state that can change between
/// requests, so every call goes to the upstream directory.
use crate::{
    crypto::Address,
    directory::{AccessEntry, CommunityId, DirectoryClient},
    error::GuildResult,
};
use std::sync::Arc;

/// Uncached access lookups against the directory
#[derive(Clone)]
pub struct AccessResolver {
    client: Arc<dyn DirectoryClient>,
}

impl AccessResolver {
    pub fn new(client: Arc<dyn DirectoryClient>) -> Self {
        Self { client }
    }

    /// Fetch the address's access entries for one community.
    ///
    /// Returns `None` when the directory answered with an empty body.
    pub async fn get_access(
        &self,
        id: CommunityId,
        address: &Address,
    ) -> GuildResult<Option<Vec<AccessEntry>>> {
        self.client.fetch_access(id, address).await
    }
}
