//! The license validator.
//!
//! Resolution order for `get_status`:
//! 1. a persisted verdict checked within the last 24 hours (and not in
//!    elapsed grace) is returned with no remote call
//! 2. otherwise one remote check runs; concurrent callers for the same
//!    (tenant, product) attach to it instead of starting another
//! 3. a failed check resolves through the fail-open policy: prior valid
//!    state earns a grace verdict capped at seven days from the last
//!    confirmed-valid moment, anything else resolves to invalid
//!
//! Every transition persists through the store adapter; observers hear
//! about each resolution on the watch channel from [`LicenseValidator::subscribe`].

use crate::client::{LicenseService, RemoteLicenseStatus};
use crate::verdict::{LicenseStatus, LicenseVerdict, ProductId};
use chrono::{DateTime, Utc};
use siteboard_store::ScopedStore;
use siteboard_types::TenantId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Storage key for the persisted verdict of one (tenant, product) pair.
#[must_use]
pub fn storage_key(tenant_id: &TenantId, product_id: &ProductId) -> String {
    format!("license:{tenant_id}:{product_id}")
}

type CheckKey = (TenantId, ProductId);
type CheckSlot = Option<LicenseVerdict>;

/// Validates licenses with local caching, collapsing, and fail-open.
pub struct LicenseValidator {
    service: Arc<dyn LicenseService>,
    store: ScopedStore,
    inflight: Mutex<HashMap<CheckKey, watch::Receiver<CheckSlot>>>,
    resolved_tx: watch::Sender<Option<LicenseVerdict>>,
}

impl LicenseValidator {
    /// Creates a validator over a license service and a scoped store.
    #[must_use]
    pub fn new(service: Arc<dyn LicenseService>, store: ScopedStore) -> Self {
        let (resolved_tx, _) = watch::channel(None);
        Self {
            service,
            store,
            inflight: Mutex::new(HashMap::new()),
            resolved_tx,
        }
    }

    /// Subscribes to resolved verdicts.
    ///
    /// Receives every resolution produced by [`get_status`] or a
    /// background check kicked off by [`status_now`].
    ///
    /// [`get_status`]: Self::get_status
    /// [`status_now`]: Self::status_now
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<LicenseVerdict>> {
        self.resolved_tx.subscribe()
    }

    /// Returns the best immediately-available verdict without waiting on
    /// the network, scheduling a background resolution when needed.
    ///
    /// The interim verdict is the persisted one (an elapsed grace window
    /// reads as invalid), or `Unknown` for a never-resolved pair. The
    /// resolved verdict arrives on [`subscribe`](Self::subscribe).
    /// Validation never delays unrelated feature loading.
    pub fn status_now(
        self: &Arc<Self>,
        tenant_id: &TenantId,
        product_id: &ProductId,
    ) -> LicenseVerdict {
        let now = Utc::now();
        let persisted = self.persisted(tenant_id, product_id);

        if let Some(verdict) = &persisted {
            if verdict.is_fresh_at(now) && !verdict.grace_expired_at(now) {
                return verdict.clone();
            }
        }

        let this = Arc::clone(self);
        let tenant = tenant_id.clone();
        let product = product_id.clone();
        tokio::spawn(async move {
            let _ = this.get_status(&tenant, &product).await;
        });

        match persisted {
            Some(verdict) => verdict.as_of(now),
            None => LicenseVerdict::unknown(tenant_id.clone(), product_id.clone()),
        }
    }

    /// Resolves the license status for a (tenant, product) pair.
    ///
    /// Never fails outward: remote failures degrade to a grace or
    /// invalid verdict per the fail-open policy.
    pub async fn get_status(
        &self,
        tenant_id: &TenantId,
        product_id: &ProductId,
    ) -> LicenseVerdict {
        let key = (tenant_id.clone(), product_id.clone());
        loop {
            let now = Utc::now();
            // Freshness check and attach-or-claim happen under one lock,
            // and a resolving check persists before it leaves the map, so
            // a caller always sees either the fresh verdict or the
            // in-flight channel.
            let claimed = {
                let mut inflight = self.inflight.lock().await;
                if let Some(verdict) = self.persisted(tenant_id, product_id) {
                    if verdict.is_fresh_at(now) && !verdict.grace_expired_at(now) {
                        debug!(%tenant_id, %product_id, "persisted verdict is fresh, skipping remote check");
                        return verdict;
                    }
                }
                match inflight.get(&key) {
                    Some(rx) => Err(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        inflight.insert(key.clone(), rx);
                        Ok(tx)
                    }
                }
            };

            match claimed {
                Err(mut rx) => {
                    if let Some(verdict) = await_resolution(&mut rx).await {
                        return verdict;
                    }
                    // The driving caller was cancelled before publishing;
                    // drop its dead channel and try again.
                    let mut inflight = self.inflight.lock().await;
                    if inflight.get(&key).is_some_and(|cur| cur.same_channel(&rx)) {
                        inflight.remove(&key);
                    }
                }
                Ok(tx) => {
                    let verdict = self.resolve(tenant_id, product_id, now).await;

                    self.inflight.lock().await.remove(&key);
                    let _ = tx.send(Some(verdict.clone()));
                    self.resolved_tx.send_replace(Some(verdict.clone()));
                    return verdict;
                }
            }
        }
    }

    fn persisted(&self, tenant_id: &TenantId, product_id: &ProductId) -> Option<LicenseVerdict> {
        self.store.read_opt(&storage_key(tenant_id, product_id))
    }

    fn persist(&self, verdict: &LicenseVerdict) {
        self.store
            .write(&storage_key(&verdict.tenant_id, &verdict.product_id), verdict);
    }

    async fn resolve(
        &self,
        tenant_id: &TenantId,
        product_id: &ProductId,
        now: DateTime<Utc>,
    ) -> LicenseVerdict {
        let prior = self.persisted(tenant_id, product_id);

        match self.service.check(tenant_id, product_id).await {
            Ok(response) => {
                let valid = response.status == RemoteLicenseStatus::Active;
                let verdict = LicenseVerdict {
                    tenant_id: tenant_id.clone(),
                    product_id: product_id.clone(),
                    status: if valid {
                        LicenseStatus::Valid
                    } else {
                        LicenseStatus::Invalid
                    },
                    checked_at: now,
                    last_valid_at: if valid {
                        Some(now)
                    } else {
                        prior.and_then(|p| p.last_valid_at)
                    },
                    expiry_hint: response.subscription_expires_at,
                };
                info!(%tenant_id, %product_id, status = ?verdict.status, "license verdict refreshed");
                self.persist(&verdict);
                verdict
            }
            Err(err) => {
                warn!(%tenant_id, %product_id, error = %err, "license check failed, applying fail-open policy");
                let verdict = self.fail_open(prior, tenant_id, product_id, now);
                self.persist(&verdict);
                verdict
            }
        }
    }

    /// Resolves an unreachable check to a verdict.
    ///
    /// A prior usable verdict earns (or keeps) a grace verdict whose
    /// expiry is the hard cap from the last confirmed-valid moment; an
    /// elapsed window or an absent prior resolves to invalid.
    fn fail_open(
        &self,
        prior: Option<LicenseVerdict>,
        tenant_id: &TenantId,
        product_id: &ProductId,
        now: DateTime<Utc>,
    ) -> LicenseVerdict {
        let Some(prior) = prior else {
            return LicenseVerdict {
                tenant_id: tenant_id.clone(),
                product_id: product_id.clone(),
                status: LicenseStatus::Invalid,
                checked_at: now,
                last_valid_at: None,
                expiry_hint: None,
            };
        };

        let status = match (prior.status.is_usable(), prior.grace_cap()) {
            (true, Some(cap)) if now < cap => LicenseStatus::Grace { expires_at: cap },
            _ => LicenseStatus::Invalid,
        };

        LicenseVerdict {
            status,
            checked_at: now,
            ..prior
        }
    }
}

/// Waits for an in-flight check to publish its verdict.
///
/// Returns `None` when the sender was dropped before resolving.
async fn await_resolution(rx: &mut watch::Receiver<CheckSlot>) -> Option<LicenseVerdict> {
    loop {
        let current = rx.borrow_and_update().clone();
        if current.is_some() {
            return current;
        }
        rx.changed().await.ok()?;
    }
}
