use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AdminConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceKind {
    Pdf,
    Video,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Pdf => "PDF",
            ResourceKind::Video => "VIDEO",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PDF" => Some(ResourceKind::Pdf),
            "VIDEO" => Some(ResourceKind::Video),
            _ => None,
        }
    }
}

/// A foreign key the backend sends either as a bare id or as a populated
/// document, depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Populated(RefDoc),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RefDoc {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Reference {
    pub fn id(&self) -> &str {
        match self {
            Reference::Id(id) => id,
            Reference::Populated(doc) => &doc.id,
        }
    }

    /// Human label if the document was populated.
    pub fn label(&self) -> Option<&str> {
        match self {
            Reference::Id(_) => None,
            Reference::Populated(doc) => doc.name.as_deref().or(doc.grade.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub total_standards: Option<u64>,
    #[serde(default)]
    pub total_subjects: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standard {
    #[serde(rename = "_id")]
    pub id: String,
    pub grade: String,
    #[serde(default)]
    pub board: Option<Reference>,
    #[serde(default)]
    pub board_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub total_subjects: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub standard: Option<Reference>,
    #[serde(default)]
    pub standard_name: Option<String>,
    #[serde(default)]
    pub board_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default)]
    pub board: Option<Reference>,
    #[serde(default)]
    pub standard: Option<Reference>,
    #[serde(default)]
    pub subject: Option<Reference>,
    #[serde(default)]
    pub board_id: Option<String>,
    #[serde(default)]
    pub standard_id: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub size: Option<serde_json::Value>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// Hierarchy ids for the edit flow. Explicit `*Id` fields win over the
    /// reference fields.
    pub fn hierarchy(&self) -> (Option<String>, Option<String>, Option<String>) {
        let pick = |explicit: &Option<String>, reference: &Option<Reference>| {
            explicit
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| reference.as_ref().map(|r| r.id().to_string()))
                .filter(|s| !s.is_empty())
        };
        (
            pick(&self.board_id, &self.board),
            pick(&self.standard_id, &self.standard),
            pick(&self.subject_id, &self.subject),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PurchaseType {
    Standard,
    Subject,
}

impl PurchaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseType::Standard => "STANDARD",
            PurchaseType::Subject => "SUBJECT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(PaymentStatus::Pending),
            "COMPLETED" => Some(PaymentStatus::Completed),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: Reference,
    pub purchase_type: PurchaseType,
    #[serde(default)]
    pub standard: Option<Reference>,
    #[serde(default)]
    pub subject: Option<Reference>,
    pub amount: f64,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, alias = "grade")]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub students: StudentGrowth,
    #[serde(default)]
    pub resources: Vec<ResourceTally>,
    #[serde(default)]
    pub revenue: RevenueGrowth,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentGrowth {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub monthly_growth: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTally {
    #[serde(rename = "_id")]
    pub kind: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueGrowth {
    #[serde(default)]
    pub monthly: f64,
    #[serde(default)]
    pub growth: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRevenue {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub student_count: u64,
    #[serde(default)]
    pub subject: Vec<serde_json::Value>,
}

/// Fills the derived `imageUrl` of entities that carry an uploaded image.
pub trait WithImageUrl {
    fn fill_image_url(&mut self, cfg: &AdminConfig);
}

macro_rules! impl_with_image_url {
    ($($ty:ty),*) => {
        $(impl WithImageUrl for $ty {
            fn fill_image_url(&mut self, cfg: &AdminConfig) {
                self.image_url = self
                    .image
                    .as_deref()
                    .filter(|p| !p.is_empty())
                    .map(|p| cfg.asset_url(p));
            }
        })*
    };
}

impl_with_image_url!(Board, Standard, Subject);
