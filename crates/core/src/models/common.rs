use serde::{Deserialize, Serialize};

/// Portal state shared by vehicles and drivers on the Fleet platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    Active,
    Inactive,
    Suspended,
}

impl EntityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityState::Active => "active",
            EntityState::Inactive => "inactive",
            EntityState::Suspended => "suspended",
        }
    }

    /// Parse the lowercase wire/database form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(EntityState::Active),
            "inactive" => Some(EntityState::Inactive),
            "suspended" => Some(EntityState::Suspended),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
