// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Retry delay after a failed reconcile.
//!
//! No attempt counter is kept. The delay is derived from the status written by
//! the previous attempt: twice the time that actually passed since it. Because
//! the status is persisted, the doubling survives operator restarts.

use crate::types::{SopsSecretStatus, SyncStatus};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use std::time::Duration;

/// First retry after a success, or on the first failure ever observed
pub const BASE_RETRY: Duration = Duration::from_secs(1);
/// Upper bound on any computed delay
pub const MAX_RETRY: Duration = Duration::from_secs(6 * 60 * 60);

/// Delay before retrying a failure observed at `now`.
///
/// `previous` is the status as it was before this failure was recorded.
pub fn next_retry_delay(previous: Option<&SopsSecretStatus>, now: DateTime<Utc>) -> Duration {
    let Some(previous) = previous else {
        return BASE_RETRY;
    };
    let Some(last_update) = previous.last_update() else {
        return BASE_RETRY;
    };
    if previous.status == SyncStatus::Success {
        return BASE_RETRY;
    }

    let last_update = last_update
        .duration_trunc(TimeDelta::seconds(1))
        .unwrap_or(last_update);
    match (now - last_update).to_std() {
        Ok(interval) if !interval.is_zero() => interval.saturating_mul(2).min(MAX_RETRY),
        // Clock skew or two writes within the same second; never requeue with zero delay
        _ => BASE_RETRY,
    }
}
