use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::principal::{AclNode, AclResource};
use crate::authz::{ResourceKind, Role};
use crate::errors::{AppError, AppResult};
use crate::orgs::OrgTree;

/// Role binding between a user and a principal (an organization, a dataset,
/// a request, ...). `user_id` is nullable: bindings are created by the invite
/// flow before the invitee has registered.
#[derive(Debug, Clone, Serialize)]
pub struct Representative {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub user_id: Option<Uuid>,
    pub principal_kind: ResourceKind,
    pub principal_id: Uuid,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRepresentative {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub user_id: Option<Uuid>,
    pub principal_kind: String,
    pub principal_id: Uuid,
    pub created: DateTime<Utc>,
}

impl TryFrom<DbRepresentative> for Representative {
    type Error = AppError;

    fn try_from(value: DbRepresentative) -> Result<Self, Self::Error> {
        let role = Role::parse(&value.role)
            .ok_or_else(|| AppError::internal(format!("unknown representative role: {}", value.role)))?;
        if !role.is_binding_role() {
            return Err(AppError::internal(format!(
                "role {} cannot be stored on a binding",
                value.role
            )));
        }
        let principal_kind = ResourceKind::parse(&value.principal_kind).ok_or_else(|| {
            AppError::internal(format!("unknown principal kind: {}", value.principal_kind))
        })?;

        Ok(Representative {
            id: value.id,
            email: value.email,
            role,
            user_id: value.user_id,
            principal_kind,
            principal_id: value.principal_id,
            created: value.created,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RepresentativeInviteRequest {
    pub email: String,
    pub role: String,
    pub principal_kind: String,
    pub principal_id: Uuid,
}

#[async_trait]
impl AclResource for Representative {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Representative
    }

    fn id(&self) -> Uuid {
        self.id
    }

    /// A binding inherits the ACL chain of whatever it is bound to, so
    /// permission checks on it cascade through the principal's hierarchy.
    async fn acl_parents(&self, orgs: &OrgTree) -> AppResult<Vec<AclNode>> {
        let mut nodes = vec![AclNode::new(ResourceKind::Representative, self.id)];
        match self.principal_kind {
            ResourceKind::Organization => {
                if let Some(org) = orgs.get(self.principal_id).await? {
                    nodes.extend(org.acl_parents(orgs).await?);
                }
            }
            kind => nodes.push(AclNode::new(kind, self.principal_id)),
        }
        Ok(nodes)
    }
}
