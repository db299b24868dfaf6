use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Domain Types ---

/// Role
///
/// The closed set of account classifications stored per identity in the `users`
/// collection. Determines access to role-gated pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Elder,
    Volunteer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Elder => "elder",
            Role::Volunteer => "volunteer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored role value is outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact match against the stored lowercase spelling. "Admin" is not "admin".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "elder" => Ok(Role::Elder),
            "volunteer" => Ok(Role::Volunteer),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Identity
///
/// An opaque principal handle issued by the external identity provider.
/// The core only observes identities; `id` is the key of the user's record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// AuthRequirement
///
/// The authorization annotation attached to every route. `AuthenticatedWithRole`
/// implies `Authenticated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "kind", content = "role", rename_all = "snake_case")]
#[ts(export)]
pub enum AuthRequirement {
    None,
    Authenticated,
    AuthenticatedWithRole(Role),
}

impl AuthRequirement {
    pub fn requires_identity(&self) -> bool {
        !matches!(self, AuthRequirement::None)
    }

    pub fn required_role(&self) -> Option<Role> {
        match self {
            AuthRequirement::AuthenticatedWithRole(role) => Some(*role),
            _ => None,
        }
    }
}

/// NavigationDecision
///
/// Terminal output of one guard evaluation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "decision", rename_all = "snake_case")]
#[ts(export)]
pub enum NavigationDecision {
    Proceed,
    RedirectTo { path: String },
}

impl NavigationDecision {
    pub fn redirect(path: impl Into<String>) -> Self {
        NavigationDecision::RedirectTo { path: path.into() }
    }
}

// --- Wire Schemas (HTTP shell) ---

/// RouteSummary
///
/// Public view of one Route Table entry, served at `GET /api/routes` so the web
/// client can mirror the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteSummary {
    pub path: String,
    pub name: Option<String>,
    pub component: String,
    pub requirement: AuthRequirement,
}

/// DecideRequest
///
/// Input payload for `POST /api/navigation/decide`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DecideRequest {
    #[schema(example = "/admin-panel")]
    pub target: String,
    #[schema(example = "/")]
    pub current: String,
}

/// PageDescriptor
///
/// What the page shell returns for an allowed page request. Rendering the component
/// belongs to the web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageDescriptor {
    pub path: String,
    pub name: Option<String>,
    pub component: String,
}
