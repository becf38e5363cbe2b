use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Operator,
    Reviewer,
    Lawyer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Operator => "operator",
            Role::Reviewer => "reviewer",
            Role::Lawyer => "lawyer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "tekshiruvchi" and "yurist" are the names the dashboards used.
        match s.to_ascii_lowercase().as_str() {
            "operator" => Ok(Role::Operator),
            "reviewer" | "tekshiruvchi" => Ok(Role::Reviewer),
            "lawyer" | "yurist" => Ok(Role::Lawyer),
            "admin" => Ok(Role::Admin),
            other => Err(crate::error::Error::validation(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// The authenticated caller of an action, built from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }
}
