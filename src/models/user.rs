use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::principal::AclResource;
use crate::authz::ResourceKind;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub organization_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

#[async_trait]
impl AclResource for User {
    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn id(&self) -> Uuid {
        self.id
    }

    // Users own themselves; AUTHOR on a user means "it is you".
    fn owner(&self) -> Option<Uuid> {
        Some(self.id)
    }
}
