//! REST backend seam. Handlers only see [`AdminBackend`]; the daemon wires in
//! [`HttpBackend`], tests wire in a fake.

mod http;
#[cfg(test)]
pub mod fake;
#[cfg(test)]
pub mod stub_http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    Board, NamedRecord, PaymentStatus, Purchase, PurchaseType, Resource, ResourceKind, Standard,
    Student, Subject,
};
use crate::validate::LocalFile;

pub use http::HttpBackend;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! status: {status}{}", status_detail(.message))]
    Status { status: u16, message: Option<String> },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("invalid response format: {0}")]
    Decode(String),
    #[error("cannot read upload {path}: {reason}")]
    Upload { path: String, reason: String },
}

fn status_detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardSection {
    Stats,
    BoardStats,
    PopularResources,
    SubjectRevenue,
}

impl DashboardSection {
    pub fn path(self) -> &'static str {
        match self {
            DashboardSection::Stats => "dashboard/stats",
            DashboardSection::BoardStats => "dashboard/board-stats",
            DashboardSection::PopularResources => "dashboard/popular-resources",
            DashboardSection::SubjectRevenue => "dashboard/subject-revenue",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardInput {
    pub name: String,
    pub image: Option<LocalFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardInput {
    pub grade: String,
    pub price: f64,
    pub board_id: String,
    pub image: Option<LocalFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectInput {
    pub name: String,
    pub price: f64,
    pub image: Option<LocalFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentInput {
    pub name: String,
    pub email: String,
    /// Required on create; on update only sent when present.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceFilter {
    pub board_id: Option<String>,
    pub standard_id: Option<String>,
    pub subject_id: Option<String>,
}

impl ResourceFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(v) = self.board_id.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("boardId", v));
        }
        if let Some(v) = self.standard_id.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("standardId", v));
        }
        if let Some(v) = self.subject_id.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("subjectId", v));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadContent {
    Pdf(LocalFile),
    /// `duration` is already rendered as `MM:00`.
    Video { url: String, duration: String },
}

/// One validated draft, ready to become a multipart create request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUpload {
    pub seq: u32,
    pub board_id: String,
    pub standard_id: String,
    pub subject_id: String,
    pub name: String,
    pub description: String,
    pub thumbnail: LocalFile,
    pub content: UploadContent,
}

impl ResourceUpload {
    pub fn kind(&self) -> ResourceKind {
        match self.content {
            UploadContent::Pdf(_) => ResourceKind::Pdf,
            UploadContent::Video { .. } => ResourceKind::Video,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePatch {
    pub name: String,
    pub description: String,
    pub kind: ResourceKind,
    pub board_id: String,
    pub standard_id: String,
    pub subject_id: String,
    pub file: Option<LocalFile>,
    pub video_url: Option<String>,
    pub thumbnail: Option<LocalFile>,
}

#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn list_boards(&self) -> Result<Vec<Board>, ApiError>;
    async fn create_board(&self, input: &BoardInput) -> Result<Option<Board>, ApiError>;
    async fn update_board(&self, id: &str, input: &BoardInput) -> Result<Option<Board>, ApiError>;
    async fn delete_board(&self, id: &str) -> Result<(), ApiError>;

    async fn list_standards(&self, board_id: &str) -> Result<Vec<Standard>, ApiError>;
    async fn get_standard(&self, id: &str) -> Result<Standard, ApiError>;
    async fn create_standard(
        &self,
        board_id: &str,
        input: &StandardInput,
    ) -> Result<Option<Standard>, ApiError>;
    async fn update_standard(
        &self,
        id: &str,
        input: &StandardInput,
    ) -> Result<Option<Standard>, ApiError>;
    async fn delete_standard(&self, id: &str) -> Result<(), ApiError>;

    async fn list_subjects(&self, standard_id: &str) -> Result<Vec<Subject>, ApiError>;
    async fn create_subject(
        &self,
        standard_id: &str,
        input: &SubjectInput,
    ) -> Result<Option<Subject>, ApiError>;
    async fn update_subject(
        &self,
        id: &str,
        input: &SubjectInput,
    ) -> Result<Option<Subject>, ApiError>;
    async fn delete_subject(&self, id: &str) -> Result<(), ApiError>;

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ApiError>;
    async fn get_resource(&self, id: &str) -> Result<Resource, ApiError>;
    /// Returns the created resource id when the backend echoes one.
    async fn create_resource(&self, upload: &ResourceUpload) -> Result<Option<String>, ApiError>;
    async fn update_resource(&self, id: &str, patch: &ResourcePatch) -> Result<(), ApiError>;
    async fn delete_resource(&self, id: &str) -> Result<(), ApiError>;

    async fn list_students(&self) -> Result<Vec<Student>, ApiError>;
    async fn get_student(&self, id: &str) -> Result<Student, ApiError>;
    async fn create_student(&self, input: &StudentInput) -> Result<Option<Student>, ApiError>;
    async fn update_student(
        &self,
        id: &str,
        input: &StudentInput,
    ) -> Result<Option<Student>, ApiError>;
    async fn delete_student(&self, id: &str) -> Result<(), ApiError>;

    async fn list_purchases(&self, kind: Option<PurchaseType>) -> Result<Vec<Purchase>, ApiError>;
    async fn user_purchases(&self, user_id: &str) -> Result<Vec<Purchase>, ApiError>;
    async fn update_purchase_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), ApiError>;
    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<NamedRecord>, ApiError>;
    async fn lookup_standards(&self, ids: &[String]) -> Result<Vec<NamedRecord>, ApiError>;

    async fn dashboard_section(&self, section: DashboardSection) -> Result<Value, ApiError>;
}

/// Strips the `{success, data, error}` wrapper. Bodies without a `success`
/// key are taken as bare data.
pub fn unwrap_envelope(body: Value) -> Result<Option<Value>, ApiError> {
    let Some(obj) = body.as_object() else {
        return Ok(Some(body));
    };
    let Some(success) = obj.get("success") else {
        return Ok(Some(body));
    };
    if success.as_bool() != Some(true) {
        let reason = obj
            .get("error")
            .or_else(|| obj.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("request rejected")
            .to_string();
        return Err(ApiError::Rejected(reason));
    }
    Ok(obj.get("data").filter(|v| !v.is_null()).cloned())
}

pub fn decode_list<T: DeserializeOwned>(data: Option<Value>) -> Result<Vec<T>, ApiError> {
    match data {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(|e| ApiError::Decode(e.to_string())))
            .collect(),
        Some(other) => Err(ApiError::Decode(format!(
            "expected a list, got {}",
            json_kind(&other)
        ))),
    }
}

pub fn decode_one<T: DeserializeOwned>(data: Option<Value>) -> Result<T, ApiError> {
    let data = data.ok_or_else(|| ApiError::Decode("missing data".to_string()))?;
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}

pub fn decode_optional<T: DeserializeOwned>(data: Option<Value>) -> Option<T> {
    data.and_then(|v| serde_json::from_value(v).ok())
}

/// Created-resource responses come back either as the document or wrapped in
/// another `data` layer.
pub fn created_id(data: Option<&Value>) -> Option<String> {
    let data = data?;
    data.get("_id")
        .or_else(|| data.get("data").and_then(|d| d.get("_id")))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
