use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    AdminBackend, ApiError, BoardInput, DashboardSection, ResourceFilter, ResourcePatch,
    ResourceUpload, StandardInput, StudentInput, SubjectInput,
};
use crate::models::{
    Board, NamedRecord, PaymentStatus, Purchase, PurchaseType, Reference, Resource, Standard,
    Student, Subject,
};

/// In-memory backend for unit tests. Failure switches are keyed by the
/// operation name (`"boards"`, `"standards"`, `"subjects"`, `"purchases"`,
/// `"students"` or a dashboard path).
#[derive(Default)]
pub struct FakeBackend {
    pub boards: Mutex<Vec<Board>>,
    pub standards: Mutex<HashMap<String, Vec<Standard>>>,
    pub subjects: Mutex<HashMap<String, Vec<Subject>>>,
    pub resources: Mutex<Vec<Resource>>,
    pub students: Mutex<Vec<Student>>,
    pub purchases: Mutex<Vec<Purchase>>,
    pub dashboard: Mutex<HashMap<&'static str, Value>>,
    pub uploads: Mutex<Vec<ResourceUpload>>,
    pub patches: Mutex<Vec<(String, ResourcePatch)>>,
    pub deleted: Mutex<Vec<String>>,
    pub status_updates: Mutex<Vec<(String, PaymentStatus)>>,
    pub failing: Mutex<HashSet<&'static str>>,
    /// Uploads whose draft title is listed here are rejected server-side.
    pub reject_upload_names: Mutex<HashSet<String>>,
    pub calls: AtomicU64,
}

pub fn board(id: &str, name: &str) -> Board {
    Board {
        id: id.to_string(),
        name: name.to_string(),
        image: None,
        image_url: None,
        total_standards: None,
        total_subjects: None,
    }
}

pub fn standard(id: &str, grade: &str, board_id: &str) -> Standard {
    Standard {
        id: id.to_string(),
        grade: grade.to_string(),
        board: Some(Reference::Id(board_id.to_string())),
        board_name: None,
        price: Some(999.0),
        image: None,
        image_url: None,
        total_subjects: None,
    }
}

pub fn subject(id: &str, name: &str, standard_id: &str) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        standard: Some(Reference::Id(standard_id.to_string())),
        standard_name: None,
        board_name: None,
        price: Some(199.0),
        image: None,
        image_url: None,
    }
}

impl FakeBackend {
    /// Two boards; b1 has standards s1/s2, b2 has s3; s1 has two subjects, s3 one.
    pub fn with_catalog() -> Self {
        let fake = Self::default();
        *fake.boards.lock().unwrap() = vec![board("b1", "CBSE"), board("b2", "ICSE")];
        fake.standards.lock().unwrap().extend([
            (
                "b1".to_string(),
                vec![standard("s1", "10", "b1"), standard("s2", "12", "b1")],
            ),
            ("b2".to_string(), vec![standard("s3", "9", "b2")]),
        ]);
        fake.subjects.lock().unwrap().extend([
            (
                "s1".to_string(),
                vec![subject("sub1", "Maths", "s1"), subject("sub2", "Physics", "s1")],
            ),
            ("s3".to_string(), vec![subject("sub3", "Biology", "s3")]),
        ]);
        fake
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, op: &'static str) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(op) {
            return Err(ApiError::Status {
                status: 500,
                message: Some(format!("{op} unavailable")),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AdminBackend for FakeBackend {
    async fn list_boards(&self) -> Result<Vec<Board>, ApiError> {
        self.enter("boards")?;
        Ok(self.boards.lock().unwrap().clone())
    }

    async fn create_board(&self, input: &BoardInput) -> Result<Option<Board>, ApiError> {
        self.enter("boards")?;
        let mut boards = self.boards.lock().unwrap();
        let created = board(&format!("b{}", boards.len() + 1), &input.name);
        boards.push(created.clone());
        Ok(Some(created))
    }

    async fn update_board(&self, id: &str, input: &BoardInput) -> Result<Option<Board>, ApiError> {
        self.enter("boards")?;
        let mut boards = self.boards.lock().unwrap();
        let found = boards.iter_mut().find(|b| b.id == id).ok_or(ApiError::Status {
            status: 404,
            message: Some("Board not found".into()),
        })?;
        found.name = input.name.clone();
        Ok(Some(found.clone()))
    }

    async fn delete_board(&self, id: &str) -> Result<(), ApiError> {
        self.enter("boards")?;
        self.boards.lock().unwrap().retain(|b| b.id != id);
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn list_standards(&self, board_id: &str) -> Result<Vec<Standard>, ApiError> {
        self.enter("standards")?;
        Ok(self
            .standards
            .lock()
            .unwrap()
            .get(board_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_standard(&self, id: &str) -> Result<Standard, ApiError> {
        self.enter("standards")?;
        self.standards
            .lock()
            .unwrap()
            .values()
            .flatten()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: None,
            })
    }

    async fn create_standard(
        &self,
        board_id: &str,
        input: &StandardInput,
    ) -> Result<Option<Standard>, ApiError> {
        self.enter("standards")?;
        let mut all = self.standards.lock().unwrap();
        let list = all.entry(board_id.to_string()).or_default();
        let created = standard(&format!("{board_id}-s{}", list.len() + 1), &input.grade, board_id);
        list.push(created.clone());
        Ok(Some(created))
    }

    async fn update_standard(
        &self,
        id: &str,
        input: &StandardInput,
    ) -> Result<Option<Standard>, ApiError> {
        self.enter("standards")?;
        let mut out = standard(id, &input.grade, &input.board_id);
        out.price = Some(input.price);
        Ok(Some(out))
    }

    async fn delete_standard(&self, id: &str) -> Result<(), ApiError> {
        self.enter("standards")?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn list_subjects(&self, standard_id: &str) -> Result<Vec<Subject>, ApiError> {
        self.enter("subjects")?;
        Ok(self
            .subjects
            .lock()
            .unwrap()
            .get(standard_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_subject(
        &self,
        standard_id: &str,
        input: &SubjectInput,
    ) -> Result<Option<Subject>, ApiError> {
        self.enter("subjects")?;
        let mut out = subject("new-subject", &input.name, standard_id);
        out.price = Some(input.price);
        Ok(Some(out))
    }

    async fn update_subject(
        &self,
        id: &str,
        input: &SubjectInput,
    ) -> Result<Option<Subject>, ApiError> {
        self.enter("subjects")?;
        Ok(Some(subject(id, &input.name, "")))
    }

    async fn delete_subject(&self, id: &str) -> Result<(), ApiError> {
        self.enter("subjects")?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ApiError> {
        self.enter("resources")?;
        let matches = |want: &Option<String>, have: Option<String>| {
            want.as_ref().map(|w| have.as_ref() == Some(w)).unwrap_or(true)
        };
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                let (b, s, sub) = r.hierarchy();
                matches(&filter.board_id, b)
                    && matches(&filter.standard_id, s)
                    && matches(&filter.subject_id, sub)
            })
            .cloned()
            .collect())
    }

    async fn get_resource(&self, id: &str) -> Result<Resource, ApiError> {
        self.enter("resources")?;
        self.resources
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: Some("Resource not found".into()),
            })
    }

    async fn create_resource(&self, upload: &ResourceUpload) -> Result<Option<String>, ApiError> {
        self.enter("upload")?;
        // Let sibling uploads interleave so fan-out is actually concurrent.
        tokio::task::yield_now().await;
        if self.reject_upload_names.lock().unwrap().contains(&upload.name) {
            return Err(ApiError::Rejected(format!("{} rejected", upload.name)));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(upload.clone());
        Ok(Some(format!("r{}", uploads.len())))
    }

    async fn update_resource(&self, id: &str, patch: &ResourcePatch) -> Result<(), ApiError> {
        self.enter("resources")?;
        self.patches
            .lock()
            .unwrap()
            .push((id.to_string(), patch.clone()));
        Ok(())
    }

    async fn delete_resource(&self, id: &str) -> Result<(), ApiError> {
        self.enter("resources")?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn list_students(&self) -> Result<Vec<Student>, ApiError> {
        self.enter("students")?;
        Ok(self
            .students
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.role == "student")
            .cloned()
            .collect())
    }

    async fn get_student(&self, id: &str) -> Result<Student, ApiError> {
        self.enter("students")?;
        self.students
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: None,
            })
    }

    async fn create_student(&self, input: &StudentInput) -> Result<Option<Student>, ApiError> {
        self.enter("students")?;
        let mut students = self.students.lock().unwrap();
        let created = Student {
            id: format!("u{}", students.len() + 1),
            name: input.name.clone(),
            email: input.email.clone(),
            role: "student".into(),
        };
        students.push(created.clone());
        Ok(Some(created))
    }

    async fn update_student(
        &self,
        id: &str,
        input: &StudentInput,
    ) -> Result<Option<Student>, ApiError> {
        self.enter("students")?;
        Ok(Some(Student {
            id: id.to_string(),
            name: input.name.clone(),
            email: input.email.clone(),
            role: "student".into(),
        }))
    }

    async fn delete_student(&self, id: &str) -> Result<(), ApiError> {
        self.enter("students")?;
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }

    async fn list_purchases(&self, kind: Option<PurchaseType>) -> Result<Vec<Purchase>, ApiError> {
        self.enter("purchases")?;
        Ok(self
            .purchases
            .lock()
            .unwrap()
            .iter()
            .filter(|p| kind.map(|k| p.purchase_type == k).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn user_purchases(&self, user_id: &str) -> Result<Vec<Purchase>, ApiError> {
        self.enter("purchases")?;
        Ok(self
            .purchases
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user.id() == user_id)
            .cloned()
            .collect())
    }

    async fn update_purchase_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), ApiError> {
        self.enter("purchases")?;
        self.status_updates
            .lock()
            .unwrap()
            .push((id.to_string(), status));
        Ok(())
    }

    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<NamedRecord>, ApiError> {
        self.enter("users")?;
        Ok(ids
            .iter()
            .map(|id| NamedRecord {
                id: id.clone(),
                name: format!("User {id}"),
            })
            .collect())
    }

    async fn lookup_standards(&self, ids: &[String]) -> Result<Vec<NamedRecord>, ApiError> {
        self.enter("standards")?;
        Ok(ids
            .iter()
            .map(|id| NamedRecord {
                id: id.clone(),
                name: format!("Grade {id}"),
            })
            .collect())
    }

    async fn dashboard_section(&self, section: DashboardSection) -> Result<Value, ApiError> {
        self.enter(section.path())?;
        Ok(self
            .dashboard
            .lock()
            .unwrap()
            .get(section.path())
            .cloned()
            .unwrap_or_else(|| match section {
                DashboardSection::Stats => json!({}),
                _ => json!([]),
            }))
    }
}
