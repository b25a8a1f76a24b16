//! Growth stats for the admin dashboard.
//!
//! Totals plus six monthly buckets, computed from the locally mirrored
//! tables - the webhook flow keeps subscriptions and invoices current, so
//! no provider round-trip is needed here.

use std::collections::HashMap;

use axum::extract::State;
use chrono::Utc;
use serde::Serialize;

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::Json;
use crate::util::{last_months, month_label, month_start_n_months_ago};

const STATS_MONTHS: u32 = 6;

#[derive(Debug, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthAmount {
    pub month: String,
    pub amount_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct CountStats {
    pub total: i64,
    pub by_month: Vec<MonthCount>,
}

#[derive(Debug, Serialize)]
pub struct RevenueStats {
    pub total_cents: i64,
    pub by_month: Vec<MonthAmount>,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub users: CountStats,
    pub subscriptions: CountStats,
    pub revenue: RevenueStats,
}

fn bucket_counts(timestamps: &[i64], months: &[String]) -> Vec<MonthCount> {
    let mut buckets: HashMap<String, i64> = HashMap::new();
    for ts in timestamps {
        *buckets.entry(month_label(*ts)).or_default() += 1;
    }
    months
        .iter()
        .map(|m| MonthCount {
            month: m.clone(),
            count: buckets.get(m).copied().unwrap_or(0),
        })
        .collect()
}

fn bucket_amounts(rows: &[(i64, i64)], months: &[String]) -> Vec<MonthAmount> {
    let mut buckets: HashMap<String, i64> = HashMap::new();
    for (ts, amount) in rows {
        *buckets.entry(month_label(*ts)).or_default() += amount;
    }
    months
        .iter()
        .map(|m| MonthAmount {
            month: m.clone(),
            amount_cents: buckets.get(m).copied().unwrap_or(0),
        })
        .collect()
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<AdminStats>> {
    let now = Utc::now().timestamp();
    let since = month_start_n_months_ago(now, STATS_MONTHS - 1);
    let months = last_months(now, STATS_MONTHS);

    let conn = state.db.get()?;

    let account_times = queries::account_created_since(&conn, since)?;
    let subscription_times = queries::subscription_created_since(&conn, since)?;
    let invoice_rows = queries::paid_invoices_since(&conn, since)?;

    Ok(Json(AdminStats {
        users: CountStats {
            total: queries::count_accounts(&conn)?,
            by_month: bucket_counts(&account_times, &months),
        },
        subscriptions: CountStats {
            total: queries::count_subscriptions(&conn)?,
            by_month: bucket_counts(&subscription_times, &months),
        },
        revenue: RevenueStats {
            total_cents: queries::total_paid_revenue(&conn)?,
            by_month: bucket_amounts(&invoice_rows, &months),
        },
    }))
}
