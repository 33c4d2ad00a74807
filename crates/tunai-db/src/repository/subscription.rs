//! # Subscription Repository
//!
//! Plan storage and the atomic daily-quota reservation.
//!
//! ## Check-and-Reserve
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  check_and_reserve(owner, now)                                      │
//! │       │                                                             │
//! │       ├── 1. ensure a free-tier row exists                          │
//! │       │                                                             │
//! │       ├── 2. day rollover: reset a stale counter to today           │
//! │       │                                                             │
//! │       ├── 3. unmetered (active paid plan)? → Allowed, no counting   │
//! │       │                                                             │
//! │       └── 4. conditional increment:                                 │
//! │              UPDATE ... SET scans_today = scans_today + 1           │
//! │              WHERE scans_today < daily_scan_limit                   │
//! │              rows_affected = 0  →  Denied(DailyLimitReached)        │
//! │                                                                     │
//! │  Step 4 is one guarded UPDATE, so two concurrent reservations       │
//! │  can never both consume the same remaining slot.                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tunai_core::{DeniedReason, Plan, QuotaDecision, Subscription};

/// Raw subscriptions row.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: String,
    owner_id: String,
    plan: Plan,
    daily_scan_limit: i64,
    scans_today: i64,
    counter_date: NaiveDate,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: row.id,
            owner_id: row.owner_id,
            plan: row.plan,
            daily_scan_limit: row.daily_scan_limit,
            scans_today: row.scans_today,
            counter_date: row.counter_date,
            is_active: row.is_active,
            expires_at: row.expires_at,
        }
    }
}

/// Repository for subscription database operations.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: SqlitePool,
}

impl SubscriptionRepository {
    /// Creates a new SubscriptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SubscriptionRepository { pool }
    }

    /// Fetches a subscription by owner.
    pub async fn get_by_owner(&self, owner_id: &str) -> DbResult<Option<Subscription>> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            "SELECT id, owner_id, plan, daily_scan_limit, scans_today, \
                    counter_date, is_active, expires_at \
             FROM subscriptions WHERE owner_id = ?1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Subscription::from))
    }

    /// Inserts a free-tier subscription for `owner_id` unless one exists.
    pub async fn ensure_exists(&self, owner_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        let fresh = Subscription::free(owner_id, now.date_naive());

        sqlx::query(
            "INSERT INTO subscriptions \
             (id, owner_id, plan, daily_scan_limit, scans_today, counter_date, \
              is_active, expires_at, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9) \
             ON CONFLICT(owner_id) DO NOTHING",
        )
        .bind(&fresh.id)
        .bind(&fresh.owner_id)
        .bind(fresh.plan)
        .bind(fresh.daily_scan_limit)
        .bind(fresh.scans_today)
        .bind(fresh.counter_date)
        .bind(fresh.is_active)
        .bind(fresh.expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upgrades (or downgrades) an owner's plan.
    pub async fn set_plan(
        &self,
        owner_id: &str,
        plan: Plan,
        expires_at: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        let now = Utc::now();
        self.ensure_exists(owner_id, now).await?;

        let result = sqlx::query(
            "UPDATE subscriptions SET plan = ?2, expires_at = ?3, is_active = 1, updated_at = ?4 \
             WHERE owner_id = ?1",
        )
        .bind(owner_id)
        .bind(plan)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Subscription", owner_id));
        }

        debug!(owner = %owner_id, ?plan, "Plan updated");
        Ok(())
    }

    /// Decides whether one more detector call is allowed and, for metered
    /// plans, consumes one slot of today's allowance.
    ///
    /// See the module docs for the step-by-step breakdown. The increment
    /// is a single guarded UPDATE, which is what makes concurrent
    /// reservations safe.
    pub async fn check_and_reserve(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<QuotaDecision> {
        let today = now.date_naive();

        self.ensure_exists(owner_id, now).await?;

        // Day rollover: a stale counter belongs to a previous day
        sqlx::query(
            "UPDATE subscriptions SET scans_today = 0, counter_date = ?2, updated_at = ?3 \
             WHERE owner_id = ?1 AND counter_date <> ?2",
        )
        .bind(owner_id)
        .bind(today)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let subscription = self
            .get_by_owner(owner_id)
            .await?
            .ok_or_else(|| DbError::not_found("Subscription", owner_id))?;

        if !subscription.is_active {
            debug!(owner = %owner_id, "Scan denied: subscription inactive");
            return Ok(QuotaDecision::Denied {
                reason: DeniedReason::SubscriptionInactive,
            });
        }

        if subscription.is_unmetered(now) {
            return Ok(QuotaDecision::Allowed { remaining: None });
        }

        let result = sqlx::query(
            "UPDATE subscriptions SET scans_today = scans_today + 1, updated_at = ?2 \
             WHERE owner_id = ?1 AND scans_today < daily_scan_limit",
        )
        .bind(owner_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(owner = %owner_id, "Scan denied: daily limit reached");
            return Ok(QuotaDecision::Denied {
                reason: DeniedReason::DailyLimitReached,
            });
        }

        let remaining = self.remaining_scans(owner_id, now).await?;
        Ok(QuotaDecision::Allowed { remaining })
    }

    /// Remaining calls today for response enrichment; `None` = unmetered.
    pub async fn remaining_scans(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<i64>> {
        let subscription = self
            .get_by_owner(owner_id)
            .await?
            .ok_or_else(|| DbError::not_found("Subscription", owner_id))?;

        Ok(subscription.remaining(now))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
