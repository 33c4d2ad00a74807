//! # Quota Policy
//!
//! Pure subscription/quota rules. The *decision* logic lives here; the
//! atomic daily-counter reservation lives in the database layer.
//!
//! ## Plans
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Free    : 10 detector calls per day, counter resets at midnight    │
//! │  Monthly : unmetered while the subscription is active               │
//! │  Yearly  : unmetered while the subscription is active               │
//! │                                                                     │
//! │  A lapsed paid plan falls back to the free daily limit rather       │
//! │  than locking the user out.                                         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::DEFAULT_DAILY_SCAN_LIMIT;

// =============================================================================
// Plan
// =============================================================================

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Metered: limited detector calls per day.
    Free,
    /// Paid, unmetered while active.
    Monthly,
    /// Paid, unmetered while active.
    Yearly,
}

impl Default for Plan {
    fn default() -> Self {
        Plan::Free
    }
}

impl Plan {
    /// Whether detector calls on this plan count against a daily limit.
    #[inline]
    pub const fn is_metered(&self) -> bool {
        matches!(self, Plan::Free)
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Snapshot of a user's subscription state.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub owner_id: String,
    pub plan: Plan,

    /// Daily detector-call allowance for metered plans.
    pub daily_scan_limit: i64,

    /// Calls consumed on `counter_date`.
    pub scans_today: i64,

    /// Day the counter belongs to; a later "today" means the counter is stale.
    #[ts(as = "String")]
    pub counter_date: NaiveDate,

    pub is_active: bool,

    /// Paid plans only; `None` on free.
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Subscription {
    /// A fresh free-tier subscription for `owner_id`.
    pub fn free(owner_id: impl Into<String>, today: NaiveDate) -> Self {
        Subscription {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            plan: Plan::Free,
            daily_scan_limit: DEFAULT_DAILY_SCAN_LIMIT,
            scans_today: 0,
            counter_date: today,
            is_active: true,
            expires_at: None,
        }
    }

    /// Whether the plan is currently in force.
    ///
    /// Free is always in force; paid plans need an unexpired `expires_at`
    /// and the active flag.
    pub fn is_plan_active(&self, now: DateTime<Utc>) -> bool {
        match self.plan {
            Plan::Free => true,
            Plan::Monthly | Plan::Yearly => {
                self.is_active && self.expires_at.map(|end| now < end).unwrap_or(false)
            }
        }
    }

    /// Whether this plan is currently unmetered (active paid plan).
    pub fn is_unmetered(&self, now: DateTime<Utc>) -> bool {
        !self.plan.is_metered() && self.is_plan_active(now)
    }

    /// Whether one more detector call would be allowed today.
    ///
    /// Day rollover implicitly grants: a stale `counter_date` means the
    /// counter has not been reset yet and will be before the reservation.
    pub fn may_scan(&self, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        if self.counter_date != today {
            return true;
        }
        if self.is_unmetered(now) {
            return true;
        }
        self.scans_today < self.daily_scan_limit
    }

    /// Remaining calls today; `None` means unmetered.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.is_unmetered(now) {
            return None;
        }
        if self.counter_date != now.date_naive() {
            return Some(self.daily_scan_limit);
        }
        Some((self.daily_scan_limit - self.scans_today).max(0))
    }
}

// =============================================================================
// Quota Decision
// =============================================================================

/// Outcome of a check-and-reserve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", tag = "decision")]
pub enum QuotaDecision {
    /// The call may proceed; `remaining` is `None` for unmetered plans.
    Allowed { remaining: Option<i64> },
    /// The call must not proceed.
    Denied { reason: DeniedReason },
}

/// Why a detector call was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeniedReason {
    /// The free daily allowance is exhausted.
    DailyLimitReached,
    /// The subscription row is flagged inactive.
    SubscriptionInactive,
}

// =============================================================================
// Unit Tests
// =============================================================================
