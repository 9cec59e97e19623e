use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::principal::AclResource;
use crate::authz::ResourceKind;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub user_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

#[async_trait]
impl AclResource for Project {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Project
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        self.user_id
    }
}
