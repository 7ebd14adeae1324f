//! Core data type definitions

use serde::{Deserialize, Serialize};

use crate::error::MentorlinkResult;

/// Authorization category reported by the server.
///
/// Roles drive client-side routing only; the server enforces access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Mentor,
    Subadmin,
    Superadmin,
    /// A value the client does not recognise, kept exactly as received
    Other(String),
}

impl Role {
    /// Parse a server-provided role string
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "student" => Role::Student,
            "mentor" => Role::Mentor,
            "subadmin" => Role::Subadmin,
            "superadmin" => Role::Superadmin,
            _ => Role::Other(value.to_string()),
        }
    }

    /// Wire representation
    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Subadmin => "subadmin",
            Role::Superadmin => "superadmin",
            Role::Other(value) => value,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::parse(value)
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Role::parse(&value))
    }
}

/// Roles a user may pick for themselves when signing up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignupRole {
    Student,
    Mentor,
}

impl From<SignupRole> for Role {
    fn from(role: SignupRole) -> Self {
        match role {
            SignupRole::Student => Role::Student,
            SignupRole::Mentor => Role::Mentor,
        }
    }
}

impl std::str::FromStr for SignupRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(SignupRole::Student),
            "mentor" => Ok(SignupRole::Mentor),
            _ => Err(format!("Unknown sign-up role: {} (expected student or mentor)", s)),
        }
    }
}

/// Account status assigned by the server.
///
/// Informational only: a banned account keeps its local session until the
/// server rejects the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Pending,
    Banned,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
            AccountStatus::Banned => "banned",
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "pending" => Ok(AccountStatus::Pending),
            "banned" => Ok(AccountStatus::Banned),
            _ => Err(format!("Unknown account status: {}", s)),
        }
    }
}

/// The client's record of an authenticated identity.
///
/// Either every required field is populated from a server response or there is
/// no session at all; `Session::new` refuses anything in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub display_name: String,
    pub role: Role,
    pub status: Option<AccountStatus>,
}

impl Session {
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
        role: Role,
    ) -> MentorlinkResult<Self> {
        let session = Self {
            token: token.into(),
            user_id: user_id.into(),
            display_name: display_name.into(),
            role,
            status: None,
        };
        session.validate()?;
        Ok(session)
    }

    pub fn with_status(mut self, status: Option<AccountStatus>) -> Self {
        self.status = status;
        self
    }

    /// Check that all required fields are populated
    pub fn validate(&self) -> MentorlinkResult<()> {
        let missing = [
            ("token", self.token.trim().is_empty()),
            ("_id", self.user_id.trim().is_empty()),
            ("name", self.display_name.trim().is_empty()),
            ("role", self.role.as_str().trim().is_empty()),
        ]
        .into_iter()
        .find(|(_, empty)| *empty);

        if let Some((field, _)) = missing {
            return Err(crate::validation_error!(
                format!("Session response is missing '{}'", field),
                field,
                "session"
            ));
        }
        Ok(())
    }
}

/// Destination views reachable after authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    StudentDashboard,
    MentorDashboard,
    SubadminDashboard,
    SuperadminDashboard,
    /// Generic fallback for roles without a dedicated view
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::StudentDashboard => "/student-dashboard",
            Route::MentorDashboard => "/mentor-dashboard",
            Route::SubadminDashboard => "/subadmin-dashboard",
            Route::SuperadminDashboard => "/superadmin-dashboard",
            Route::Dashboard => "/dashboard",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
