//! License validation for Siteboard.
//!
//! This module handles:
//! - Remote license checks keyed by tenant and product
//! - Local persistence of the last-known-good verdict
//! - A 24-hour revalidation window and a 7-day grace window
//!
//! # Design Principles
//!
//! - **Fail-open**: an unreachable license service never locks the user
//!   out; a previously valid subscription keeps working for up to seven
//!   days from the moment it was last confirmed valid
//! - **Never blocking**: validation resolves asynchronously and never
//!   delays unrelated feature loading
//! - **Explicit states**: license status is a tagged enum, not a boolean,
//!   so the grace edge cases stay visible and testable
//! - **No personal data**: the remote check carries tenant and product
//!   identifiers only

mod client;
mod error;
mod validator;
mod verdict;

pub use client::{HttpLicenseClient, LicenseCheckResponse, LicenseConfig, LicenseService, RemoteLicenseStatus};
pub use error::LicenseUnreachable;
pub use validator::{storage_key, LicenseValidator};
pub use verdict::{
    LicenseStatus, LicenseVerdict, ProductId, GRACE_PERIOD_SECS, REVALIDATE_AFTER_SECS,
};
