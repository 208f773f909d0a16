/// Aggregation Engine
///
/// Turns a signed message into the list of communities it names, with each
/// community's roles annotated by whether the signer currently qualifies.
///
/// Failure policy: a catalog failure aborts the lookup, since no names can be
/// resolved without it. A failed detail or access fetch for one community only
/// excludes that community; the rest of the result is still returned.
use crate::{
    crypto::{recover_message_address, Address},
    directory::{
        AccessEntry, AccessResolver, Community, CommunityDetail, CommunityDirectory, CommunityId,
        RoleDefinition,
    },
    error::{GuildError, GuildResult},
    metrics,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Signed lookup request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedRequest {
    /// Whitespace-separated community url names
    pub message: String,
    /// Hex `r || s || v` personal signature over `message`
    pub signature: String,
}

/// A community the signer asked about, with per-role access
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub id: CommunityId,
    pub name: String,
    pub url_name: String,
    pub roles: Vec<RoleAccess>,
}

/// Role definition merged with the signer's access flag
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleAccess {
    #[serde(flatten)]
    pub role: RoleDefinition,
    pub access: bool,
}

/// Split a message into requested url names, keeping order and duplicates
pub fn requested_names(message: &str) -> Vec<&str> {
    message.split_whitespace().collect()
}

/// Ids of catalog entries whose url name was requested, in catalog order
pub fn resolve_ids(catalog: &[Community], names: &[&str]) -> Vec<CommunityId> {
    catalog
        .iter()
        .filter(|community| names.contains(&community.url_name.as_str()))
        .map(|community| community.id)
        .collect()
}

/// Keep the roles the directory evaluated, in definition order
pub fn merge_roles(roles: &[RoleDefinition], access: &[AccessEntry]) -> Vec<RoleAccess> {
    // First entry wins when the directory repeats a role
    let mut by_role = HashMap::with_capacity(access.len());
    for entry in access {
        by_role.entry(entry.role_id).or_insert(entry.access);
    }

    roles
        .iter()
        .filter_map(|role| {
            by_role.get(&role.id).map(|&access| {
                let mut role = role.clone();
                // The merged flag wins over any upstream field of the same name
                role.extra.remove("access");
                RoleAccess { role, access }
            })
        })
        .collect()
}

fn build_item(id: CommunityId, detail: &CommunityDetail, access: &[AccessEntry]) -> ResultItem {
    ResultItem {
        id,
        name: detail.name.clone(),
        url_name: detail.url_name.clone(),
        roles: merge_roles(&detail.roles, access),
    }
}

/// Orchestrates verification, name resolution and per-community lookups
#[derive(Clone)]
pub struct Aggregator {
    directory: Arc<CommunityDirectory>,
    access: AccessResolver,
}

impl Aggregator {
    pub fn new(directory: Arc<CommunityDirectory>, access: AccessResolver) -> Self {
        Self { directory, access }
    }

    pub fn directory(&self) -> &CommunityDirectory {
        &self.directory
    }

    /// Verify a signed request and return the communities it names
    pub async fn handle(&self, request: &SignedRequest) -> GuildResult<Vec<ResultItem>> {
        let result = self.aggregate(request).await;

        match &result {
            Ok((items, skipped)) => metrics::record_guild_lookup("success", items.len(), *skipped),
            Err(GuildError::Validation(_)) => metrics::record_guild_lookup("invalid_request", 0, 0),
            Err(GuildError::Verification(_)) => {
                metrics::record_guild_lookup("invalid_signature", 0, 0)
            }
            Err(_) => metrics::record_guild_lookup("upstream_failure", 0, 0),
        }

        result.map(|(items, _)| items)
    }

    async fn aggregate(&self, request: &SignedRequest) -> GuildResult<(Vec<ResultItem>, usize)> {
        if request.message.trim().is_empty() {
            return Err(GuildError::Validation("Message cannot be empty".to_string()));
        }

        let address = recover_message_address(&request.message, &request.signature)?;
        let names = requested_names(&request.message);

        let catalog = self.directory.list_communities().await?;
        let ids = resolve_ids(&catalog, &names);

        if ids.is_empty() {
            info!(address = %address, requested = names.len(), "no known communities requested");
            return Ok((Vec::new(), 0));
        }

        let lookups = join_all(ids.iter().map(|&id| self.lookup(id, &address))).await;

        let mut items = Vec::with_capacity(ids.len());
        let mut skipped = 0;
        for (id, outcome) in ids.iter().zip(lookups) {
            match outcome {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {
                    debug!(id, "directory returned no detail or access, skipping");
                    skipped += 1;
                }
                Err(e) => {
                    warn!(id, address = %address, error = %e, "community lookup failed, skipping");
                    skipped += 1;
                }
            }
        }

        info!(
            address = %address,
            items = items.len(),
            skipped,
            "guild lookup completed"
        );

        Ok((items, skipped))
    }

    /// Fetch detail and access for one community concurrently
    async fn lookup(&self, id: CommunityId, address: &Address) -> GuildResult<Option<ResultItem>> {
        let (detail, access) = tokio::join!(
            self.directory.get_detail(id),
            self.access.get_access(id, address)
        );

        match (detail?, access?) {
            (Some(detail), Some(access)) => Ok(Some(build_item(id, &detail, &access))),
            _ => Ok(None),
        }
    }
}
