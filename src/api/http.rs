use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{
    created_id, decode_list, decode_one, decode_optional, unwrap_envelope, AdminBackend,
    ApiError, BoardInput, DashboardSection, ResourceFilter, ResourcePatch, ResourceUpload,
    StandardInput, StudentInput, SubjectInput, UploadContent,
};
use crate::config::AdminConfig;
use crate::models::{
    Board, NamedRecord, PaymentStatus, Purchase, PurchaseType, Resource, Standard, Student,
    Subject, WithImageUrl,
};
use crate::validate::LocalFile;

/// reqwest-backed client for the `/admin` REST API.
pub struct HttpBackend {
    cfg: AdminConfig,
    client: Client,
}

impl HttpBackend {
    pub fn new(cfg: AdminConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(cfg.http_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { cfg, client })
    }

    fn url(&self, path: &str) -> String {
        self.cfg.admin_url(path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Option<Value>, ApiError> {
        let resp = req
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let body: Option<Value> = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        if !status.is_success() {
            let message = body.as_ref().and_then(|b| {
                b.get("message")
                    .or_else(|| b.get("error"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            });
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        match body {
            Some(v) => unwrap_envelope(v),
            None if bytes.is_empty() => Ok(None),
            None => Err(ApiError::Decode("response is not JSON".to_string())),
        }
    }

    async fn get(&self, path: &str) -> Result<Option<Value>, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        self.send(self.client.get(url)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!(%url, "DELETE");
        self.send(self.client.delete(url)).await.map(|_| ())
    }

    fn fill_images<T: WithImageUrl>(&self, mut items: Vec<T>) -> Vec<T> {
        for item in &mut items {
            item.fill_image_url(&self.cfg);
        }
        items
    }

    fn fill_image<T: WithImageUrl>(&self, item: Option<T>) -> Option<T> {
        item.map(|mut v| {
            v.fill_image_url(&self.cfg);
            v
        })
    }
}

async fn file_part(file: &LocalFile) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|e| ApiError::Upload {
            path: file.path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    Part::bytes(bytes)
        .file_name(file.file_name.clone())
        .mime_str(&file.mime)
        .map_err(|e| ApiError::Upload {
            path: file.path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })
}

async fn with_image(form: Form, image: Option<&LocalFile>) -> Result<Form, ApiError> {
    match image {
        Some(file) => Ok(form.part("image", file_part(file).await?)),
        None => Ok(form),
    }
}

pub(crate) async fn resource_form(upload: &ResourceUpload) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("subject_id", upload.subject_id.clone())
        .text("board", upload.board_id.clone())
        .text("standard", upload.standard_id.clone())
        .text("type", upload.kind().as_str())
        .text("name", upload.name.clone())
        .text("description", upload.description.clone());
    form = match &upload.content {
        UploadContent::Pdf(file) => form.part("file", file_part(file).await?),
        UploadContent::Video { url, duration } => form
            .text("videoUrl", url.clone())
            .text("duration", duration.clone()),
    };
    Ok(form.part("thumbnail", file_part(&upload.thumbnail).await?))
}

async fn patch_form(patch: &ResourcePatch) -> Result<Form, ApiError> {
    let mut form = Form::new()
        .text("name", patch.name.clone())
        .text("description", patch.description.clone())
        .text("type", patch.kind.as_str())
        .text("boardId", patch.board_id.clone())
        .text("standardId", patch.standard_id.clone())
        .text("subjectId", patch.subject_id.clone());
    if let Some(file) = &patch.file {
        form = form.part("file", file_part(file).await?);
    }
    if let Some(url) = &patch.video_url {
        form = form.text("videoUrl", url.clone());
    }
    if let Some(thumb) = &patch.thumbnail {
        form = form.part("thumbnail", file_part(thumb).await?);
    }
    Ok(form)
}

#[async_trait]
impl AdminBackend for HttpBackend {
    async fn list_boards(&self) -> Result<Vec<Board>, ApiError> {
        let data = self.get("boards").await?;
        Ok(self.fill_images(decode_list(data)?))
    }

    async fn create_board(&self, input: &BoardInput) -> Result<Option<Board>, ApiError> {
        let form = with_image(Form::new().text("name", input.name.clone()), input.image.as_ref())
            .await?;
        let data = self
            .send(self.client.post(self.url("boards")).multipart(form))
            .await?;
        Ok(self.fill_image(decode_optional(data)))
    }

    async fn update_board(&self, id: &str, input: &BoardInput) -> Result<Option<Board>, ApiError> {
        let form = with_image(Form::new().text("name", input.name.clone()), input.image.as_ref())
            .await?;
        let data = self
            .send(
                self.client
                    .patch(self.url(&format!("boards/{id}")))
                    .multipart(form),
            )
            .await?;
        Ok(self.fill_image(decode_optional(data)))
    }

    async fn delete_board(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("boards/{id}")).await
    }

    async fn list_standards(&self, board_id: &str) -> Result<Vec<Standard>, ApiError> {
        let data = self.get(&format!("boards/{board_id}/standards")).await?;
        Ok(self.fill_images(decode_list(data)?))
    }

    async fn get_standard(&self, id: &str) -> Result<Standard, ApiError> {
        let data = self.get(&format!("standards/{id}")).await?;
        let mut standard: Standard = decode_one(data)?;
        standard.fill_image_url(&self.cfg);
        Ok(standard)
    }

    async fn create_standard(
        &self,
        board_id: &str,
        input: &StandardInput,
    ) -> Result<Option<Standard>, ApiError> {
        let form = Form::new()
            .text("grade", input.grade.clone())
            .text("price", input.price.to_string())
            .text("boardId", input.board_id.clone());
        let form = with_image(form, input.image.as_ref()).await?;
        let data = self
            .send(
                self.client
                    .post(self.url(&format!("boards/{board_id}/standards")))
                    .multipart(form),
            )
            .await?;
        Ok(self.fill_image(decode_optional(data)))
    }

    async fn update_standard(
        &self,
        id: &str,
        input: &StandardInput,
    ) -> Result<Option<Standard>, ApiError> {
        let form = Form::new()
            .text("grade", input.grade.clone())
            .text("price", input.price.to_string())
            .text("boardId", input.board_id.clone());
        let form = with_image(form, input.image.as_ref()).await?;
        let data = self
            .send(
                self.client
                    .patch(self.url(&format!("standards/{id}")))
                    .multipart(form),
            )
            .await?;
        Ok(self.fill_image(decode_optional(data)))
    }

    async fn delete_standard(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("standards/{id}")).await
    }

    async fn list_subjects(&self, standard_id: &str) -> Result<Vec<Subject>, ApiError> {
        let data = self.get(&format!("standards/{standard_id}/subjects")).await?;
        Ok(self.fill_images(decode_list(data)?))
    }

    async fn create_subject(
        &self,
        standard_id: &str,
        input: &SubjectInput,
    ) -> Result<Option<Subject>, ApiError> {
        let form = Form::new()
            .text("name", input.name.clone())
            .text("price", input.price.to_string());
        let form = with_image(form, input.image.as_ref()).await?;
        let data = self
            .send(
                self.client
                    .post(self.url(&format!("standards/{standard_id}/subjects")))
                    .multipart(form),
            )
            .await?;
        Ok(self.fill_image(decode_optional(data)))
    }

    async fn update_subject(
        &self,
        id: &str,
        input: &SubjectInput,
    ) -> Result<Option<Subject>, ApiError> {
        let form = Form::new()
            .text("name", input.name.clone())
            .text("price", input.price.to_string());
        let form = with_image(form, input.image.as_ref()).await?;
        let data = self
            .send(
                self.client
                    .patch(self.url(&format!("subjects/{id}")))
                    .multipart(form),
            )
            .await?;
        Ok(self.fill_image(decode_optional(data)))
    }

    async fn delete_subject(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("subjects/{id}")).await
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, ApiError> {
        let url = self.url("resources");
        debug!(%url, filter = ?filter, "GET");
        let data = self
            .send(self.client.get(url).query(&filter.query_pairs()))
            .await?;
        decode_list(data)
    }

    async fn get_resource(&self, id: &str) -> Result<Resource, ApiError> {
        decode_one(self.get(&format!("resources/{id}")).await?)
    }

    #[instrument(name = "create_resource", skip(self, upload), fields(seq = upload.seq, kind = upload.kind().as_str()))]
    async fn create_resource(&self, upload: &ResourceUpload) -> Result<Option<String>, ApiError> {
        let form = resource_form(upload).await?;
        let data = self
            .send(
                self.client
                    .post(self.url(&upload.subject_id))
                    .multipart(form),
            )
            .await?;
        Ok(created_id(data.as_ref()))
    }

    async fn update_resource(&self, id: &str, patch: &ResourcePatch) -> Result<(), ApiError> {
        let form = patch_form(patch).await?;
        self.send(self.client.put(self.url(id)).multipart(form))
            .await
            .map(|_| ())
    }

    async fn delete_resource(&self, id: &str) -> Result<(), ApiError> {
        self.delete(id).await
    }

    async fn list_students(&self) -> Result<Vec<Student>, ApiError> {
        let users: Vec<Student> = decode_list(self.get("user").await?)?;
        Ok(users.into_iter().filter(|u| u.role == "student").collect())
    }

    async fn get_student(&self, id: &str) -> Result<Student, ApiError> {
        decode_one(self.get(&format!("user/{id}")).await?)
    }

    async fn create_student(&self, input: &StudentInput) -> Result<Option<Student>, ApiError> {
        let body = json!({
            "name": input.name,
            "email": input.email,
            "password": input.password.clone().unwrap_or_default(),
            "role": "student",
        });
        let data = self
            .send(self.client.post(self.url("user")).json(&body))
            .await?;
        Ok(decode_optional(data))
    }

    async fn update_student(
        &self,
        id: &str,
        input: &StudentInput,
    ) -> Result<Option<Student>, ApiError> {
        let mut body = json!({ "name": input.name, "email": input.email });
        if let Some(password) = input.password.as_deref().filter(|p| !p.is_empty()) {
            body["password"] = json!(password);
        }
        let data = self
            .send(self.client.put(self.url(&format!("user/{id}"))).json(&body))
            .await?;
        Ok(decode_optional(data))
    }

    async fn delete_student(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("user/{id}")).await
    }

    async fn list_purchases(&self, kind: Option<PurchaseType>) -> Result<Vec<Purchase>, ApiError> {
        let mut req = self.client.get(self.url("purchases"));
        if let Some(kind) = kind {
            req = req.query(&[("type", kind.as_str())]);
        }
        decode_list(self.send(req).await?)
    }

    async fn user_purchases(&self, user_id: &str) -> Result<Vec<Purchase>, ApiError> {
        decode_list(self.get(&format!("purchases/user/{user_id}")).await?)
    }

    async fn update_purchase_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> Result<(), ApiError> {
        self.send(
            self.client
                .put(self.url(&format!("purchases/{id}/status")))
                .json(&json!({ "status": status.as_str() })),
        )
        .await
        .map(|_| ())
    }

    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<NamedRecord>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let data = self
            .send(
                self.client
                    .post(self.url("users"))
                    .json(&json!({ "userIds": ids })),
            )
            .await?;
        decode_list(data)
    }

    async fn lookup_standards(&self, ids: &[String]) -> Result<Vec<NamedRecord>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let data = self
            .send(
                self.client
                    .post(self.url("standards"))
                    .json(&json!({ "standardIds": ids })),
            )
            .await?;
        decode_list(data)
    }

    async fn dashboard_section(&self, section: DashboardSection) -> Result<Value, ApiError> {
        Ok(self.get(section.path()).await?.unwrap_or(Value::Null))
    }
}
