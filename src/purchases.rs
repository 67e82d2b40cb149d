use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::api::{AdminBackend, ApiError};
use crate::models::{NamedRecord, PaymentStatus, Purchase, PurchaseType, Reference};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    pub total_purchases: usize,
    pub completed_purchases: usize,
    pub pending_purchases: usize,
    /// Sum of `amount` over COMPLETED purchases only.
    pub total_revenue: f64,
}

pub fn summarize(purchases: &[Purchase]) -> PurchaseSummary {
    let mut out = PurchaseSummary {
        total_purchases: purchases.len(),
        ..PurchaseSummary::default()
    };
    for p in purchases {
        match p.payment_status {
            PaymentStatus::Completed => {
                out.completed_purchases += 1;
                out.total_revenue += p.amount;
            }
            PaymentStatus::Pending => out.pending_purchases += 1,
            PaymentStatus::Failed => {}
        }
    }
    out
}

pub fn sort_newest_first(purchases: &mut [Purchase]) {
    purchases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Listing of one purchase type, newest first, with its stats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseTab {
    pub purchase_type: PurchaseType,
    pub purchases: Vec<Purchase>,
    pub summary: PurchaseSummary,
}

impl PurchaseTab {
    pub fn new(purchase_type: PurchaseType, mut purchases: Vec<Purchase>) -> Self {
        sort_newest_first(&mut purchases);
        let summary = summarize(&purchases);
        Self {
            purchase_type,
            purchases,
            summary,
        }
    }
}

/// Subject and standard tabs are fetched together; either failing fails both.
pub async fn load_tabs(
    backend: &dyn AdminBackend,
) -> Result<(PurchaseTab, PurchaseTab), ApiError> {
    let (subjects, standards) = futures::try_join!(
        backend.list_purchases(Some(PurchaseType::Subject)),
        backend.list_purchases(Some(PurchaseType::Standard)),
    )?;
    Ok((
        PurchaseTab::new(PurchaseType::Subject, subjects),
        PurchaseTab::new(PurchaseType::Standard, standards),
    ))
}

/// A purchase with human names for its user and standard. Populated
/// references already carry them; bare ids are looked up in one batch each.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRow {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub user_name: Option<String>,
    pub standard_name: Option<String>,
}

fn bare_ids<'a>(refs: impl Iterator<Item = &'a Reference>) -> Vec<String> {
    refs.filter(|r| r.label().is_none())
        .map(|r| r.id().to_string())
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn index(records: Vec<NamedRecord>) -> HashMap<String, String> {
    records.into_iter().map(|r| (r.id, r.name)).collect()
}

fn name_of(reference: &Reference, lookup: &HashMap<String, String>) -> Option<String> {
    reference
        .label()
        .map(str::to_string)
        .or_else(|| lookup.get(reference.id()).cloned())
}

pub async fn resolve_names(
    backend: &dyn AdminBackend,
    purchases: Vec<Purchase>,
) -> Result<Vec<PurchaseRow>, ApiError> {
    let user_ids = bare_ids(purchases.iter().map(|p| &p.user));
    let standard_ids = bare_ids(purchases.iter().filter_map(|p| p.standard.as_ref()));
    let (users, standards) = futures::try_join!(
        backend.lookup_users(&user_ids),
        backend.lookup_standards(&standard_ids),
    )?;
    let (users, standards) = (index(users), index(standards));

    Ok(purchases
        .into_iter()
        .map(|purchase| PurchaseRow {
            user_name: name_of(&purchase.user, &users),
            standard_name: purchase
                .standard
                .as_ref()
                .and_then(|s| name_of(s, &standards)),
            purchase,
        })
        .collect())
}
