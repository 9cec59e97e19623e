use sqlx::SqlitePool;
use uuid::Uuid;

use super::policy::PolicyTable;
use super::principal::{AclNode, AclResource};
use super::{Action, ResourceKind, Role};
use crate::errors::AppResult;
use crate::models::user::User;
use crate::orgs::OrgTree;

/// What a permission check is aimed at: an existing resource, or a kind plus
/// the parent it would be created under.
pub enum AuthTarget<'a> {
    Resource(&'a dyn AclResource),
    Create {
        kind: ResourceKind,
        parent: Option<&'a dyn AclResource>,
    },
}

/// The portal's single permission decision point.
///
/// Evaluation order:
/// 1. unauthenticated -> deny
/// 2. staff / superuser -> allow
/// 3. resolve the target's ACL-parent chain
/// 4. for each role the policy table requires, allow on first match
/// 5. deny
#[derive(Clone)]
pub struct AuthzEngine {
    pool: SqlitePool,
    orgs: OrgTree,
    policy: PolicyTable,
}

impl AuthzEngine {
    pub fn new(pool: SqlitePool, orgs: OrgTree, policy: PolicyTable) -> Self {
        Self { pool, orgs, policy }
    }

    pub async fn authorize(
        &self,
        user: Option<&User>,
        action: Action,
        target: AuthTarget<'_>,
    ) -> AppResult<bool> {
        let Some(user) = user else {
            return Ok(false);
        };

        if user.is_staff || user.is_superuser {
            tracing::debug!(user_id = %user.id, action = action.as_str(), "staff bypass");
            return Ok(true);
        }

        let (kind, nodes) = match target {
            AuthTarget::Resource(resource) => {
                (resource.kind(), resource.acl_parents(&self.orgs).await?)
            }
            AuthTarget::Create { kind, parent } => {
                let nodes = match parent {
                    Some(parent) => parent.acl_parents(&self.orgs).await?,
                    None => Vec::new(),
                };
                (kind, nodes)
            }
        };

        let Some(roles) = self.policy.roles(kind, action) else {
            tracing::debug!(
                user_id = %user.id,
                kind = kind.as_str(),
                action = action.as_str(),
                "no policy entry, denied"
            );
            return Ok(false);
        };

        for role in roles {
            let granted = match role {
                Role::All => true,
                Role::Author => nodes.iter().any(|node| node.owner == Some(user.id)),
                Role::Coordinator | Role::Manager => {
                    !nodes.is_empty() && self.binding_exists(user.id, *role, &nodes).await?
                }
            };
            if granted {
                tracing::debug!(
                    user_id = %user.id,
                    kind = kind.as_str(),
                    action = action.as_str(),
                    role = role.as_str(),
                    "granted"
                );
                return Ok(true);
            }
        }

        tracing::debug!(
            user_id = %user.id,
            kind = kind.as_str(),
            action = action.as_str(),
            "denied"
        );
        Ok(false)
    }

    /// One query, OR-ed across every node of the ACL chain.
    async fn binding_exists(&self, user_id: Uuid, role: Role, nodes: &[AclNode]) -> AppResult<bool> {
        let clauses = std::iter::repeat("(principal_kind = ? AND principal_id = ?)")
            .take(nodes.len())
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM representatives WHERE user_id = ? AND role = ? AND ({}))",
            clauses
        );

        let mut query = sqlx::query_scalar::<_, bool>(&sql)
            .bind(user_id)
            .bind(role.as_str());
        for node in nodes {
            query = query.bind(node.kind.as_str()).bind(node.id);
        }

        Ok(query.fetch_one(&self.pool).await?)
    }
}
