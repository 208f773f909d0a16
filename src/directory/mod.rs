/// Community Directory System
///
/// Typed access to the upstream guild directory: the catalog of communities,
/// per-community role definitions, and per-address role access. Catalog and
/// detail lookups are cached process-wide; access lookups never are.

pub mod access;
pub mod cache;
pub mod client;
#[cfg(test)]
pub(crate) mod testing;

pub use access::AccessResolver;
pub use cache::CommunityDirectory;
pub use client::{DirectoryClientConfig, HttpDirectoryClient};

use crate::{crypto::Address, error::GuildResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Community id as assigned by the directory
pub type CommunityId = u64;

/// Role id as assigned by the directory
pub type RoleId = u64;

/// Catalog entry; only the fields used for name resolution are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Community {
    pub id: CommunityId,
    pub url_name: String,
}

/// Community detail with its role definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityDetail {
    pub id: CommunityId,
    pub name: String,
    pub url_name: String,
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,
}

/// Role definition as published by the directory.
///
/// Fields beyond the id are carried through untouched into the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub id: RoleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Access result for one role and one address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessEntry {
    pub role_id: RoleId,
    #[serde(default, deserialize_with = "null_as_false")]
    pub access: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Upstream directory backend.
///
/// `None` means the directory answered with an empty (`null`) body.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Fetch the full community catalog
    async fn fetch_communities(&self) -> GuildResult<Vec<Community>>;

    /// Fetch one community with its roles
    async fn fetch_detail(&self, id: CommunityId) -> GuildResult<Option<CommunityDetail>>;

    /// Fetch role access for an address within one community
    async fn fetch_access(
        &self,
        id: CommunityId,
        address: &Address,
    ) -> GuildResult<Option<Vec<AccessEntry>>>;
}
