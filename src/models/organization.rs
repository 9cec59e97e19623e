use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::principal::{AclNode, AclResource};
use crate::authz::ResourceKind;
use crate::errors::AppResult;
use crate::orgs::OrgTree;

/// Organization node in the materialized-path hierarchy.
///
/// `path`, `depth` and `numchild` are derived columns owned by [`OrgTree`];
/// nothing else may write them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub title: String,
    pub parent_id: Option<Uuid>,
    pub path: String,
    pub depth: i64,
    pub numchild: i64,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationCreateRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationUpdateRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationMoveRequest {
    pub new_parent_id: Option<Uuid>,
}

#[async_trait]
impl AclResource for Organization {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Organization
    }

    fn id(&self) -> Uuid {
        self.id
    }

    /// Self first, then every ancestor up to the root. A coordinator bound
    /// anywhere above this node manages it and all of its other descendants.
    async fn acl_parents(&self, orgs: &OrgTree) -> AppResult<Vec<AclNode>> {
        let mut nodes = vec![AclNode::new(ResourceKind::Organization, self.id)];
        for ancestor in orgs.ancestors(self).await? {
            nodes.push(AclNode::new(ResourceKind::Organization, ancestor.id));
        }
        Ok(nodes)
    }
}
