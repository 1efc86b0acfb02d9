//! License verdicts and the grace-window arithmetic.
//!
//! A verdict is the locally persisted result of the most recent
//! resolution, remote or fail-open. The grace window is anchored at the
//! moment the subscription was last confirmed valid, never at "now", so
//! repeated failed revalidations cannot push the cap forward.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use siteboard_types::TenantId;
use std::fmt;

/// Grace window in seconds (7 days).
pub const GRACE_PERIOD_SECS: i64 = 7 * 24 * 60 * 60;

/// Revalidation window in seconds (24 hours).
pub const REVALIDATE_AFTER_SECS: i64 = 24 * 60 * 60;

/// Identity of the licensed product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a product ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The current status of a license.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LicenseStatus {
    /// Confirmed valid by the license service.
    Valid,
    /// Temporarily valid: revalidation failed but a prior valid state
    /// exists and the grace window has not elapsed.
    Grace {
        /// When the grace window closes.
        #[serde(rename = "expiresAt")]
        expires_at: DateTime<Utc>,
    },
    /// Not licensed (confirmed inactive, or grace elapsed).
    Invalid,
    /// Not yet determined; a check may be in flight.
    Unknown,
}

impl LicenseStatus {
    /// Returns true if licensed features should be available.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Valid | Self::Grace { .. })
    }

    /// Returns the status as observed at `now`: an elapsed grace window
    /// reads as `Invalid` without any remote call.
    #[must_use]
    pub fn as_of(&self, now: DateTime<Utc>) -> Self {
        match self {
            Self::Grace { expires_at } if *expires_at <= now => Self::Invalid,
            other => *other,
        }
    }
}

/// The persisted outcome of a license resolution for one
/// (tenant, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseVerdict {
    /// The tenant the verdict applies to.
    pub tenant_id: TenantId,
    /// The licensed product.
    pub product_id: ProductId,
    /// Resolved status.
    #[serde(flatten)]
    pub status: LicenseStatus,
    /// When this verdict was produced.
    pub checked_at: DateTime<Utc>,
    /// When the subscription was last confirmed valid by the service.
    /// Anchors the grace cap.
    #[serde(default)]
    pub last_valid_at: Option<DateTime<Utc>>,
    /// Subscription-expiry hint from the service, when it sent one.
    /// Bounds the grace cap from above, never extends it.
    #[serde(default)]
    pub expiry_hint: Option<DateTime<Utc>>,
}

impl LicenseVerdict {
    /// An interim verdict for a pair that has never been resolved.
    #[must_use]
    pub fn unknown(tenant_id: TenantId, product_id: ProductId) -> Self {
        Self {
            tenant_id,
            product_id,
            status: LicenseStatus::Unknown,
            checked_at: Utc::now(),
            last_valid_at: None,
            expiry_hint: None,
        }
    }

    /// Returns true if the verdict is recent enough to skip revalidation.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now - self.checked_at < TimeDelta::seconds(REVALIDATE_AFTER_SECS)
    }

    /// Returns true if this is a grace verdict whose window has elapsed.
    #[must_use]
    pub fn grace_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, LicenseStatus::Grace { expires_at } if expires_at <= now)
    }

    /// The hard end of the grace window: seven days from the last
    /// confirmed-valid moment, bounded by the service's expiry hint.
    ///
    /// `None` when the subscription was never confirmed valid.
    #[must_use]
    pub fn grace_cap(&self) -> Option<DateTime<Utc>> {
        let anchor = self.last_valid_at?;
        let cap = anchor + TimeDelta::seconds(GRACE_PERIOD_SECS);
        Some(match self.expiry_hint {
            Some(hint) if hint < cap => hint,
            _ => cap,
        })
    }

    /// A copy of this verdict as observed at `now`, with an elapsed grace
    /// window downgraded to `Invalid`.
    #[must_use]
    pub fn as_of(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: self.status.as_of(now),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(status: LicenseStatus) -> LicenseVerdict {
        LicenseVerdict {
            tenant_id: TenantId::new("contoso"),
            product_id: ProductId::new("siteboard"),
            status,
            checked_at: Utc::now(),
            last_valid_at: None,
            expiry_hint: None,
        }
    }

    #[test]
    fn grace_cap_anchors_at_last_valid_not_now() {
        let last_valid = Utc::now() - TimeDelta::hours(25);
        let mut v = verdict(LicenseStatus::Valid);
        v.last_valid_at = Some(last_valid);

        assert_eq!(
            v.grace_cap(),
            Some(last_valid + TimeDelta::seconds(GRACE_PERIOD_SECS))
        );
    }

    #[test]
    fn expiry_hint_bounds_the_cap_from_above() {
        let last_valid = Utc::now();
        let hint = last_valid + TimeDelta::days(2);
        let mut v = verdict(LicenseStatus::Valid);
        v.last_valid_at = Some(last_valid);
        v.expiry_hint = Some(hint);

        assert_eq!(v.grace_cap(), Some(hint));
    }

    #[test]
    fn expiry_hint_never_extends_the_cap() {
        let last_valid = Utc::now();
        let mut v = verdict(LicenseStatus::Valid);
        v.last_valid_at = Some(last_valid);
        v.expiry_hint = Some(last_valid + TimeDelta::days(30));

        assert_eq!(
            v.grace_cap(),
            Some(last_valid + TimeDelta::seconds(GRACE_PERIOD_SECS))
        );
    }

    #[test]
    fn elapsed_grace_reads_as_invalid() {
        let now = Utc::now();
        let v = verdict(LicenseStatus::Grace {
            expires_at: now - TimeDelta::minutes(1),
        });
        assert_eq!(v.as_of(now).status, LicenseStatus::Invalid);
        assert!(v.grace_expired_at(now));
    }

    #[test]
    fn unexpired_grace_is_usable() {
        let now = Utc::now();
        let status = LicenseStatus::Grace {
            expires_at: now + TimeDelta::days(1),
        };
        assert!(status.is_usable());
        assert_eq!(status.as_of(now), status);
    }

    #[test]
    fn verdict_serde_roundtrip() {
        let mut v = verdict(LicenseStatus::Grace {
            expires_at: Utc::now() + TimeDelta::days(3),
        });
        v.last_valid_at = Some(Utc::now() - TimeDelta::days(4));

        let json = serde_json::to_string(&v).unwrap();
        let back: LicenseVerdict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
