use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Employee read model. This service only needs identity, display names and
/// the linked user account (notification addressing); the full profile lives
/// in the employee module of the platform.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    pub tenant_id: u64,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    /// User account linked to this employee, if any.
    #[schema(example = 42, nullable = true)]
    pub user_id: Option<u64>,

    #[schema(example = "active")]
    pub status: String,
}

impl Employee {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}
