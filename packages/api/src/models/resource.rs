use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// The four resource kinds served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Problem,
    Data,
    Algo,
    Model,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Problem,
        ResourceKind::Data,
        ResourceKind::Algo,
        ResourceKind::Model,
    ];

    /// Path segment and blob namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Problem => "problem",
            Self::Data => "data",
            Self::Algo => "algo",
            Self::Model => "model",
        }
    }

    /// Whether records of this kind carry a `name`.
    pub fn has_name(&self) -> bool {
        matches!(self, Self::Problem | Self::Algo)
    }

    /// Whether records of this kind carry a Markdown description blob.
    pub fn has_description(&self) -> bool {
        matches!(self, Self::Problem)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown resource kind '{s}'"))
    }
}

/// Metadata row describing one Problem, Data, Algo or Model instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResourceRecord {
    #[serde(skip)]
    pub kind: ResourceKind,
    #[schema(example = "0193a1d2-7c1e-7b4c-9e0f-3a5b6c7d8e9f")]
    pub id: Uuid,
    pub owner: Uuid,
    /// Present for problems and algorithms.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "titanic")]
    pub name: Option<String>,
    /// Byte length of the primary blob.
    #[schema(example = 666)]
    pub size: u64,
    /// Algorithm a model was trained from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algo: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Scalar changes applied by a PATCH. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub owner: Option<Uuid>,
    pub name: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.owner.is_none() && self.name.is_none()
    }

    pub fn apply(&self, record: &mut ResourceRecord) {
        if let Some(owner) = self.owner {
            record.owner = owner;
        }
        if let Some(ref name) = self.name {
            record.name = Some(name.clone());
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ResourceListResponse {
    pub items: Vec<ResourceRecord>,
    pub total: u64,
}

/// Query parameters of `POST /model`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NewModelQuery {
    /// Algorithm the uploaded model belongs to.
    pub algo: Option<String>,
    /// Owner of the model. Defaults to the algorithm's owner.
    pub owner: Option<String>,
}
