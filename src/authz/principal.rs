use async_trait::async_trait;
use uuid::Uuid;

use super::ResourceKind;
use crate::errors::AppResult;
use crate::orgs::OrgTree;

/// One principal in an ACL-parent chain: what a role binding may be attached
/// to, plus the owner id used for structural AUTHOR checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclNode {
    pub kind: ResourceKind,
    pub id: Uuid,
    pub owner: Option<Uuid>,
}

impl AclNode {
    pub fn new(kind: ResourceKind, id: Uuid) -> Self {
        Self { kind, id, owner: None }
    }

    pub fn owned_by(kind: ResourceKind, id: Uuid, owner: Option<Uuid>) -> Self {
        Self { kind, id, owner }
    }
}

/// Anything the engine can authorize against. Each concrete resource type
/// supplies its kind, its owner (if ownership is meaningful for it) and its
/// ACL-parent chain; the default chain is the resource itself.
#[async_trait]
pub trait AclResource: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn id(&self) -> Uuid;

    fn owner(&self) -> Option<Uuid> {
        None
    }

    async fn acl_parents(&self, orgs: &OrgTree) -> AppResult<Vec<AclNode>> {
        let _ = orgs;
        Ok(vec![AclNode::owned_by(self.kind(), self.id(), self.owner())])
    }
}
