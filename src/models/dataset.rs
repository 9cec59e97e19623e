use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::authz::principal::AclResource;
use crate::authz::ResourceKind;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dataset {
    pub id: Uuid,
    pub title: String,
    pub organization_id: Uuid,
    pub user_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetCreateRequest {
    pub title: String,
    pub organization_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DatasetUpdateRequest {
    pub title: String,
}

#[async_trait]
impl AclResource for Dataset {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Dataset
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        self.user_id
    }
}

#[derive(Debug, Deserialize)]
pub struct DistributionCreateRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct StructureCreateRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DatasetDistribution {
    pub id: Uuid,
    pub title: String,
    pub dataset_id: Uuid,
    pub user_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

#[async_trait]
impl AclResource for DatasetDistribution {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Distribution
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        self.user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DatasetStructure {
    pub id: Uuid,
    pub title: String,
    pub dataset_id: Uuid,
    pub user_id: Option<Uuid>,
    pub created: DateTime<Utc>,
}

#[async_trait]
impl AclResource for DatasetStructure {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Structure
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        self.user_id
    }
}
