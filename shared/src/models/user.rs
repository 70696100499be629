//! User account model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account roles. Admins manage products, dashboards and task assignment;
/// employees work their own tasks and record stock movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

/// A user account as exposed over the API (no credential material)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Preferred display name: full name when present, username otherwise
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut user = User {
            id: Uuid::new_v4(),
            username: "maxnalao11".to_string(),
            full_name: None,
            role: Role::Employee,
            profile_image_url: None,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(user.display_name(), "maxnalao11");
        user.full_name = Some("  ".to_string());
        assert_eq!(user.display_name(), "maxnalao11");
        user.full_name = Some("สมชาย ใจดี".to_string());
        assert_eq!(user.display_name(), "สมชาย ใจดี");
    }
}
