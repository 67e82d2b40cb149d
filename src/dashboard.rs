//! Summary overview for the landing screen.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::{decode_list, decode_one, AdminBackend, ApiError, DashboardSection};
use crate::models::{DashboardStats, SubjectRevenue};
use crate::purchases::{resolve_names, sort_newest_first, PurchaseRow};

pub const DASHBOARD_FAILED_MESSAGE: &str = "Failed to fetch dashboard data";
pub const RECENT_PURCHASES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub board_stats: Value,
    pub popular_resources: Value,
    pub subject_revenue: Vec<SubjectRevenue>,
    pub recent_purchases: Vec<PurchaseRow>,
    pub fetched_at: DateTime<Utc>,
}

/// Runs the five section fetches concurrently. Any one failing fails the
/// overview. Name lookups for recent purchases are best effort.
pub async fn fetch_overview(backend: &dyn AdminBackend) -> Result<DashboardOverview, ApiError> {
    let (stats, board_stats, popular_resources, subject_revenue, mut purchases) = futures::try_join!(
        backend.dashboard_section(DashboardSection::Stats),
        backend.dashboard_section(DashboardSection::BoardStats),
        backend.dashboard_section(DashboardSection::PopularResources),
        backend.dashboard_section(DashboardSection::SubjectRevenue),
        backend.list_purchases(None),
    )?;

    let stats: DashboardStats = decode_one(Some(stats))?;
    let subject_revenue: Vec<SubjectRevenue> = decode_list(Some(subject_revenue))?;

    sort_newest_first(&mut purchases);
    purchases.truncate(RECENT_PURCHASES);
    let recent_purchases = match resolve_names(backend, purchases.clone()).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "purchase name lookup failed; showing ids");
            purchases
                .into_iter()
                .map(|purchase| PurchaseRow {
                    purchase,
                    user_name: None,
                    standard_name: None,
                })
                .collect()
        }
    };

    Ok(DashboardOverview {
        stats,
        board_stats,
        popular_resources,
        subject_revenue,
        recent_purchases,
        fetched_at: Utc::now(),
    })
}

/// Last good overview plus whether periodic refresh is on. A failed refresh
/// keeps the previous snapshot.
#[derive(Debug, Default)]
pub struct DashboardState {
    snapshot: Option<DashboardOverview>,
    watching: bool,
}

impl DashboardState {
    pub fn snapshot(&self) -> Option<&DashboardOverview> {
        self.snapshot.as_ref()
    }

    pub fn watching(&self) -> bool {
        self.watching
    }

    pub fn set_watching(&mut self, on: bool) {
        self.watching = on;
    }

    pub async fn refresh(&mut self, backend: &dyn AdminBackend) -> Result<&DashboardOverview, ApiError> {
        let overview = fetch_overview(backend).await?;
        info!(
            purchases = overview.recent_purchases.len(),
            "dashboard refreshed"
        );
        Ok(self.snapshot.insert(overview))
    }
}
