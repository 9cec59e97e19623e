use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::principal::AclResource;
use crate::authz::ResourceKind;

/// A public request for data to be opened, optionally assigned to an
/// organization once triaged.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DataRequest {
    pub id: Uuid,
    pub title: String,
    pub organization_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

#[async_trait]
impl AclResource for DataRequest {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Request
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        self.user_id
    }
}
