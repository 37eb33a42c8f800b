use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Portal roles, most privileged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    Admin,
    Editor,
    #[default]
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Editor => "Editor",
            Role::Viewer => "Viewer",
        }
    }

    /// Exact-match parse; unknown labels are `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Admin" => Some(Role::Admin),
            "Editor" => Some(Role::Editor),
            "Viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Parse with the portal's fallback: absent or unknown roles are viewers.
    pub fn resolve(label: Option<&str>) -> Self {
        label.and_then(Role::from_label).unwrap_or_default()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("forbidden: role {role} cannot {action}")]
    Forbidden { role: Role, action: &'static str },
}

/// Identity context passed to every operation that depends on who is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Session {
    pub role: Role,
}

impl Session {
    pub const TEMPLATE_ADMINS: &'static [Role] = &[Role::Admin];
    pub const UPLOADERS: &'static [Role] = &[Role::Admin, Role::Editor];

    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn require(&self, allowed: &[Role], action: &'static str) -> Result<(), AccessError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AccessError::Forbidden {
                role: self.role,
                action,
            })
        }
    }

    pub fn can_manage_templates(&self) -> bool {
        Self::TEMPLATE_ADMINS.contains(&self.role)
    }

    pub fn can_upload(&self) -> bool {
        Self::UPLOADERS.contains(&self.role)
    }
}
