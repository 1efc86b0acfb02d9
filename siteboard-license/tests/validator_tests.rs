use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use siteboard_license::{
    storage_key, LicenseCheckResponse, LicenseService, LicenseStatus, LicenseUnreachable,
    LicenseValidator, LicenseVerdict, ProductId, RemoteLicenseStatus, GRACE_PERIOD_SECS,
};
use siteboard_store::{MemoryStore, ScopedStore};
use siteboard_types::{Scope, TenantId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Responder =
    Box<dyn Fn(usize) -> Result<LicenseCheckResponse, LicenseUnreachable> + Send + Sync>;

struct MockService {
    responder: Responder,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockService {
    fn new(responder: Responder) -> Self {
        Self {
            responder,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LicenseService for MockService {
    async fn check(
        &self,
        _tenant_id: &TenantId,
        _product_id: &ProductId,
    ) -> Result<LicenseCheckResponse, LicenseUnreachable> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(call)
    }
}

fn active() -> Responder {
    Box::new(|_| {
        Ok(LicenseCheckResponse {
            status: RemoteLicenseStatus::Active,
            subscription_expires_at: None,
        })
    })
}

fn inactive() -> Responder {
    Box::new(|_| {
        Ok(LicenseCheckResponse {
            status: RemoteLicenseStatus::Inactive,
            subscription_expires_at: None,
        })
    })
}

fn unreachable() -> Responder {
    Box::new(|_| Err(LicenseUnreachable::Network("no route to host".to_string())))
}

fn tenant() -> TenantId {
    TenantId::new("contoso")
}

fn product() -> ProductId {
    ProductId::new("siteboard")
}

fn store() -> ScopedStore {
    ScopedStore::new(
        Arc::new(MemoryStore::new()),
        Scope::new("user@contoso.com", "contoso"),
    )
}

fn seed(store: &ScopedStore, verdict: &LicenseVerdict) {
    store.write(&storage_key(&verdict.tenant_id, &verdict.product_id), verdict);
}

fn valid_checked_hours_ago(hours: i64) -> LicenseVerdict {
    let checked_at = Utc::now() - TimeDelta::hours(hours);
    LicenseVerdict {
        tenant_id: tenant(),
        product_id: product(),
        status: LicenseStatus::Valid,
        checked_at,
        last_valid_at: Some(checked_at),
        expiry_hint: None,
    }
}

// ── Freshness window ────────────────────────────────────────────

#[tokio::test]
async fn fresh_valid_verdict_skips_the_remote_call() {
    let service = Arc::new(MockService::new(active()));
    let store = store();
    let persisted = valid_checked_hours_ago(23);
    seed(&store, &persisted);

    let validator = LicenseValidator::new(service.clone(), store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    assert_eq!(service.calls(), 0);
    assert_eq!(verdict, persisted);
}

#[tokio::test]
async fn fresh_invalid_verdict_is_returned_without_a_call() {
    let service = Arc::new(MockService::new(active()));
    let store = store();
    let persisted = LicenseVerdict {
        status: LicenseStatus::Invalid,
        last_valid_at: None,
        ..valid_checked_hours_ago(1)
    };
    seed(&store, &persisted);

    let validator = LicenseValidator::new(service.clone(), store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    assert_eq!(service.calls(), 0);
    assert_eq!(verdict.status, LicenseStatus::Invalid);
}

#[tokio::test]
async fn stale_verdict_triggers_revalidation() {
    let service = Arc::new(MockService::new(active()));
    let store = store();
    seed(&store, &valid_checked_hours_ago(25));

    let validator = LicenseValidator::new(service.clone(), store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    assert_eq!(service.calls(), 1);
    assert_eq!(verdict.status, LicenseStatus::Valid);
    // The 24-hour window restarts from this check.
    assert!(Utc::now() - verdict.checked_at < TimeDelta::minutes(1));
}

// ── Fail-open and the grace window ──────────────────────────────

#[tokio::test]
async fn unreachable_service_earns_grace_anchored_at_last_valid() {
    let service = Arc::new(MockService::new(unreachable()));
    let store = store();
    let persisted = valid_checked_hours_ago(25);
    let last_valid = persisted.last_valid_at.unwrap();
    seed(&store, &persisted);

    let validator = LicenseValidator::new(service.clone(), store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    assert_eq!(service.calls(), 1);
    // Expiry is exactly seven days after the last confirmed-valid
    // moment, not seven days after now.
    assert_eq!(
        verdict.status,
        LicenseStatus::Grace {
            expires_at: last_valid + TimeDelta::seconds(GRACE_PERIOD_SECS)
        }
    );
}

#[tokio::test]
async fn repeated_failures_do_not_move_the_grace_cap() {
    let service = Arc::new(MockService::new(unreachable()));
    let store = store();
    let last_valid = Utc::now() - TimeDelta::days(3);
    let cap = last_valid + TimeDelta::seconds(GRACE_PERIOD_SECS);
    seed(
        &store,
        &LicenseVerdict {
            tenant_id: tenant(),
            product_id: product(),
            status: LicenseStatus::Grace { expires_at: cap },
            checked_at: Utc::now() - TimeDelta::hours(25),
            last_valid_at: Some(last_valid),
            expiry_hint: None,
        },
    );

    let validator = LicenseValidator::new(service.clone(), store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    assert_eq!(verdict.status, LicenseStatus::Grace { expires_at: cap });
}

#[tokio::test]
async fn expired_grace_with_unreachable_service_resolves_invalid() {
    let service = Arc::new(MockService::new(unreachable()));
    let store = store();
    let last_valid = Utc::now() - TimeDelta::days(10);
    seed(
        &store,
        &LicenseVerdict {
            tenant_id: tenant(),
            product_id: product(),
            status: LicenseStatus::Grace {
                expires_at: last_valid + TimeDelta::seconds(GRACE_PERIOD_SECS),
            },
            checked_at: Utc::now() - TimeDelta::hours(2),
            last_valid_at: Some(last_valid),
            expiry_hint: None,
        },
    );

    let validator = LicenseValidator::new(service.clone(), store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    // Elapsed grace forces a revalidation attempt even though the
    // verdict is nominally fresh; the attempt fails and the window has
    // passed, so the verdict downgrades.
    assert_eq!(service.calls(), 1);
    assert_eq!(verdict.status, LicenseStatus::Invalid);
}

#[tokio::test]
async fn no_prior_verdict_with_unreachable_service_is_invalid() {
    let service = Arc::new(MockService::new(unreachable()));
    let validator = LicenseValidator::new(service.clone(), store());

    let verdict = validator.get_status(&tenant(), &product()).await;
    assert_eq!(verdict.status, LicenseStatus::Invalid);
    assert_eq!(verdict.last_valid_at, None);
}

#[tokio::test]
async fn expiry_hint_bounds_the_grace_window() {
    let service = Arc::new(MockService::new(unreachable()));
    let store = store();
    let mut persisted = valid_checked_hours_ago(25);
    let hint = persisted.last_valid_at.unwrap() + TimeDelta::days(2);
    persisted.expiry_hint = Some(hint);
    seed(&store, &persisted);

    let validator = LicenseValidator::new(service, store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    assert_eq!(verdict.status, LicenseStatus::Grace { expires_at: hint });
}

// ── Remote verdicts ─────────────────────────────────────────────

#[tokio::test]
async fn inactive_subscription_resolves_invalid_and_keeps_the_anchor() {
    let service = Arc::new(MockService::new(inactive()));
    let store = store();
    let persisted = valid_checked_hours_ago(25);
    let last_valid = persisted.last_valid_at;
    seed(&store, &persisted);

    let validator = LicenseValidator::new(service, store);
    let verdict = validator.get_status(&tenant(), &product()).await;

    assert_eq!(verdict.status, LicenseStatus::Invalid);
    // The anchor survives a confirmed-inactive verdict so a later
    // fail-open decision still knows when the license last worked.
    assert_eq!(verdict.last_valid_at, last_valid);
}

#[tokio::test]
async fn every_resolution_is_persisted() {
    let service = Arc::new(MockService::new(unreachable()));
    let store = store();
    seed(&store, &valid_checked_hours_ago(25));

    let validator = LicenseValidator::new(service, store.clone());
    let verdict = validator.get_status(&tenant(), &product()).await;

    let stored: LicenseVerdict = store
        .read_opt(&storage_key(&tenant(), &product()))
        .expect("verdict was persisted");
    assert_eq!(stored, verdict);
}

// ── Collapsing and async notification ───────────────────────────

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_check() {
    let service = Arc::new(
        MockService::new(active()).with_delay(Duration::from_millis(50)),
    );
    let validator = LicenseValidator::new(service.clone(), store());
    let (tenant, product) = (tenant(), product());

    let (a, b, c) = tokio::join!(
        validator.get_status(&tenant, &product),
        validator.get_status(&tenant, &product),
        validator.get_status(&tenant, &product),
    );

    assert_eq!(service.calls(), 1);
    assert_eq!(a, b);
    assert_eq!(a, c);
}

#[tokio::test]
async fn status_now_returns_interim_and_notifies_on_resolution() {
    let service = Arc::new(MockService::new(active()));
    let validator = Arc::new(LicenseValidator::new(service, store()));
    let mut resolutions = validator.subscribe();

    let interim = validator.status_now(&tenant(), &product());
    assert_eq!(interim.status, LicenseStatus::Unknown);

    resolutions.changed().await.unwrap();
    let resolved = resolutions.borrow().clone().expect("verdict resolved");
    assert_eq!(resolved.status, LicenseStatus::Valid);
}

#[tokio::test]
async fn status_now_downgrades_an_elapsed_grace_view() {
    let service = Arc::new(MockService::new(unreachable()));
    let store = store();
    let last_valid = Utc::now() - TimeDelta::days(10);
    seed(
        &store,
        &LicenseVerdict {
            tenant_id: tenant(),
            product_id: product(),
            status: LicenseStatus::Grace {
                expires_at: last_valid + TimeDelta::seconds(GRACE_PERIOD_SECS),
            },
            checked_at: Utc::now() - TimeDelta::hours(1),
            last_valid_at: Some(last_valid),
            expiry_hint: None,
        },
    );

    let validator = Arc::new(LicenseValidator::new(service, store));
    let interim = validator.status_now(&tenant(), &product());
    assert_eq!(interim.status, LicenseStatus::Invalid);
}

#[tokio::test]
async fn status_now_with_fresh_verdict_does_not_spawn_a_check() {
    let service = Arc::new(MockService::new(active()));
    let store = store();
    seed(&store, &valid_checked_hours_ago(1));

    let validator = Arc::new(LicenseValidator::new(service.clone(), store));
    let verdict = validator.status_now(&tenant(), &product());
    assert_eq!(verdict.status, LicenseStatus::Valid);

    // Give any (incorrectly) spawned task a chance to run.
    tokio::task::yield_now().await;
    assert_eq!(service.calls(), 0);
}
