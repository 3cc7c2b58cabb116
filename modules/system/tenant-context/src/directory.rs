//! Slug to tenant lookup.

use std::collections::HashMap;

use async_trait::async_trait;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use talimy_errors::Fault;
use talimy_security::{TenantId, TenantSlug};
use thiserror::Error;

use crate::config::TenantEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    #[default]
    Active,
    Suspended,
    Archived,
}

/// Canonical directory entry for a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    pub id: TenantId,
    pub slug: TenantSlug,
    pub status: TenantStatus,
}

#[derive(Debug, Error)]
pub enum TenantDirectoryError {
    #[error("tenant not found: {slug}")]
    NotFound { slug: TenantSlug },

    #[error("tenant directory unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TenantDirectoryError> for Fault {
    fn from(err: TenantDirectoryError) -> Self {
        match err {
            TenantDirectoryError::NotFound { .. } => {
                Fault::http(StatusCode::NOT_FOUND, "Tenant not found")
            }
            TenantDirectoryError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "tenant directory unavailable");
                Fault::http(StatusCode::SERVICE_UNAVAILABLE, "Tenant directory unavailable")
            }
            TenantDirectoryError::Internal(detail) => Fault::Unhandled {
                message: None,
                trace: Some(detail),
            },
        }
    }
}

/// Read-only view of tenant storage.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Look a tenant up by its canonical slug.
    ///
    /// Returns the record regardless of status; callers decide what a
    /// non-active tenant means for them.
    ///
    /// # Errors
    /// - `NotFound` if no tenant carries the slug
    /// - `Unavailable` if the backing store cannot be reached
    async fn resolve_by_slug(&self, slug: &TenantSlug) -> Result<TenantRecord, TenantDirectoryError>;
}

/// Rejected static directory entry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TenantEntryError {
    #[error("tenant {id} has an empty slug")]
    EmptySlug { id: String },

    #[error("tenant {slug} has an empty id")]
    EmptyId { slug: String },

    #[error("duplicate tenant slug: {slug}")]
    DuplicateSlug { slug: String },
}

/// In-memory directory built from configuration.
#[derive(Debug, Default)]
pub struct StaticTenantDirectory {
    by_slug: HashMap<TenantSlug, TenantRecord>,
}

impl StaticTenantDirectory {
    /// # Errors
    /// `TenantEntryError` for an empty slug or id, or two entries whose slugs
    /// canonicalize to the same value.
    pub fn new(entries: &[TenantEntry]) -> Result<Self, TenantEntryError> {
        let mut by_slug = HashMap::with_capacity(entries.len());
        for entry in entries {
            let slug = TenantSlug::parse(&entry.slug).ok_or_else(|| TenantEntryError::EmptySlug {
                id: entry.id.clone(),
            })?;
            if entry.id.trim().is_empty() {
                return Err(TenantEntryError::EmptyId {
                    slug: slug.to_string(),
                });
            }
            let record = TenantRecord {
                id: TenantId::new(entry.id.trim()),
                slug: slug.clone(),
                status: entry.status,
            };
            if by_slug.insert(slug, record).is_some() {
                return Err(TenantEntryError::DuplicateSlug {
                    slug: entry.slug.trim().to_lowercase(),
                });
            }
        }
        Ok(Self { by_slug })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn resolve_by_slug(&self, slug: &TenantSlug) -> Result<TenantRecord, TenantDirectoryError> {
        self.by_slug
            .get(slug)
            .cloned()
            .ok_or_else(|| TenantDirectoryError::NotFound { slug: slug.clone() })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn entry(id: &str, slug: &str) -> TenantEntry {
        TenantEntry {
            id: id.to_owned(),
            slug: slug.to_owned(),
            status: TenantStatus::Active,
        }
    }

    #[tokio::test]
    async fn lookup_is_by_canonical_slug() {
        let dir = StaticTenantDirectory::new(&[entry("t-1", "School-7")]).unwrap();
        let record = dir
            .resolve_by_slug(&TenantSlug::parse("SCHOOL-7").unwrap())
            .await
            .unwrap();
        assert_eq!(record.id.as_str(), "t-1");
        assert_eq!(record.slug.as_str(), "school-7");
    }

    #[tokio::test]
    async fn unknown_slug_is_not_found() {
        let dir = StaticTenantDirectory::default();
        let err = dir
            .resolve_by_slug(&TenantSlug::parse("ghost").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TenantDirectoryError::NotFound { .. }));
    }

    #[test]
    fn duplicate_slugs_are_rejected() {
        let err = StaticTenantDirectory::new(&[entry("t-1", "alpha"), entry("t-2", " ALPHA ")])
            .unwrap_err();
        assert_eq!(
            err,
            TenantEntryError::DuplicateSlug {
                slug: "alpha".to_owned()
            }
        );
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(matches!(
            StaticTenantDirectory::new(&[entry("t-1", "  ")]),
            Err(TenantEntryError::EmptySlug { .. })
        ));
        assert!(matches!(
            StaticTenantDirectory::new(&[entry(" ", "alpha")]),
            Err(TenantEntryError::EmptyId { .. })
        ));
    }
}
