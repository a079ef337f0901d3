use serde::{Deserialize, Serialize};
use std::fmt;

/// Development impersonation headers, honored only when enabled.
pub const EMAIL_HEADER: &str = "x-portal-email";
pub const ROLE_HEADER: &str = "x-portal-role";

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl Role {
    /// Strict parse, case-insensitive. `None` for anything outside the set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Some(Self::Student),
            "INSTRUCTOR" => Some(Self::Instructor),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Lenient parse used for headers and token claims: unknown values
    /// coerce to `Student`.
    pub fn parse_or_student(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Instructor => "INSTRUCTOR",
            Self::Admin => "ADMIN",
        }
    }

    /// ADMIN and INSTRUCTOR may call admin-only routes.
    pub fn is_admin_capable(self) -> bool {
        matches!(self, Self::Admin | Self::Instructor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The identity a request executes on behalf of.
///
/// The email is always trimmed, lowercased and non-empty; construction goes
/// through [`Actor::new`] (and the same check on deserialization).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ActorRepr")]
pub struct Actor {
    email: String,
    role: Role,
}

impl Actor {
    pub fn new(email: &str, role: Role) -> Option<Self> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return None;
        }
        Some(Self { email, role })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin_capable(&self) -> bool {
        self.role.is_admin_capable()
    }
}

#[derive(Deserialize)]
struct ActorRepr {
    email: String,
    #[serde(default)]
    role: String,
}

impl TryFrom<ActorRepr> for Actor {
    type Error = String;

    fn try_from(repr: ActorRepr) -> Result<Self, Self::Error> {
        Actor::new(&repr.email, Role::parse_or_student(&repr.role))
            .ok_or_else(|| "actor email must not be empty".to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
