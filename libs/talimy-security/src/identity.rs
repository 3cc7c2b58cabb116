use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// Gender of a protected student or teacher record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// Which genders a caller may act upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderScope {
    Male,
    Female,
    #[default]
    All,
}

impl GenderScope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GenderScope::Male => "male",
            GenderScope::Female => "female",
            GenderScope::All => "all",
        }
    }

    /// Whether a caller holding `self` satisfies a route that requires `required`.
    ///
    /// `All` on either side always matches.
    #[must_use]
    pub fn satisfies(self, required: GenderScope) -> bool {
        required == GenderScope::All || self == GenderScope::All || self == required
    }
}

impl fmt::Display for GenderScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown gender scope: {0}")]
pub struct ParseGenderError(String);

impl FromStr for GenderScope {
    type Err = ParseGenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(GenderScope::Male),
            "female" => Ok(GenderScope::Female),
            "all" => Ok(GenderScope::All),
            other => Err(ParseGenderError(other.to_owned())),
        }
    }
}

/// The authenticated caller of one request.
///
/// Built from a verified bearer credential and dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestIdentity {
    user_id: String,
    tenant_id: TenantId,
    roles: BTreeSet<String>,
    gender_scope: GenderScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl RequestIdentity {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        tenant_id: TenantId,
        roles: impl IntoIterator<Item = String>,
        gender_scope: GenderScope,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id,
            roles: roles
                .into_iter()
                .map(|role| role.trim().to_owned())
                .filter(|role| !role.is_empty())
                .collect(),
            gender_scope,
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    #[must_use]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[must_use]
    pub fn gender_scope(&self) -> GenderScope {
        self.gender_scope
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// True when at least one of `allowed` is held by this identity.
    #[must_use]
    pub fn has_any_role<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        allowed.iter().any(|role| self.roles.contains(role.as_ref()))
    }
}
