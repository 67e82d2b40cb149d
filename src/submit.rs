//! Turns drafts into backend create/update calls.

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::api::{AdminBackend, ResourcePatch, ResourceUpload, UploadContent};
use crate::drafts::{Draft, DraftBatch, DraftPayload, DraftStatus};
use crate::models::ResourceKind;
use crate::validate::{
    format_duration, parse_duration_minutes, validate_pdf, validate_thumbnail, validate_video_url,
    LocalFile, ValidationError,
};

pub const BATCH_FAILED_MESSAGE: &str = "Some resources failed to upload";
pub const BATCH_OK_MESSAGE: &str = "Resources created successfully";

/// Board, standard and subject ids of a complete cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub board_id: String,
    pub standard_id: String,
    pub subject_id: String,
}

impl Selection {
    pub fn from_parts(
        board_id: Option<&str>,
        standard_id: Option<&str>,
        subject_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let pick = |v: Option<&str>| v.map(str::trim).filter(|v| !v.is_empty()).map(String::from);
        match (pick(board_id), pick(standard_id), pick(subject_id)) {
            (Some(board_id), Some(standard_id), Some(subject_id)) => Ok(Self {
                board_id,
                standard_id,
                subject_id,
            }),
            _ => Err(ValidationError::IncompleteSelection),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// Ids the backend echoed for the uploads that went through. They are not
    /// rolled back when a sibling fails.
    pub created_ids: Vec<String>,
    pub succeeded: Vec<u32>,
    pub failed: Vec<u32>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SubmitError {
    #[error("{source}")]
    Invalid {
        seq: Option<u32>,
        source: ValidationError,
    },
    #[error("Some resources failed to upload")]
    Partial(BatchOutcome),
}

fn validate_draft(selection: &Selection, draft: &Draft) -> Result<ResourceUpload, ValidationError> {
    let name = draft.title.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    let content = match &draft.payload {
        DraftPayload::Pdf { file } => {
            let file = file.as_ref().ok_or(ValidationError::MissingPdf)?;
            validate_pdf(file)?;
            UploadContent::Pdf(file.clone())
        }
        DraftPayload::Video {
            video_url,
            duration,
        } => {
            validate_video_url(video_url)?;
            let minutes = parse_duration_minutes(duration)?;
            UploadContent::Video {
                url: video_url.trim().to_string(),
                duration: format_duration(minutes),
            }
        }
    };
    let thumbnail = draft
        .thumbnail
        .as_ref()
        .ok_or(ValidationError::MissingThumbnail)?;
    validate_thumbnail(thumbnail)?;

    Ok(ResourceUpload {
        seq: draft.seq,
        board_id: selection.board_id.clone(),
        standard_id: selection.standard_id.clone(),
        subject_id: selection.subject_id.clone(),
        name: name.to_string(),
        description: draft.description.trim().to_string(),
        thumbnail: thumbnail.clone(),
        content,
    })
}

/// Validates every draft before anything is sent. The first invalid draft
/// aborts the whole batch.
pub fn validate_batch(
    selection: &Selection,
    drafts: &[Draft],
) -> Result<Vec<ResourceUpload>, SubmitError> {
    drafts
        .iter()
        .map(|draft| {
            validate_draft(selection, draft).map_err(|source| SubmitError::Invalid {
                seq: Some(draft.seq),
                source,
            })
        })
        .collect()
}

/// Issues one create per upload, all at once, and waits for every one of
/// them to settle.
pub async fn upload_all(backend: &dyn AdminBackend, uploads: &[ResourceUpload]) -> BatchOutcome {
    let results = join_all(uploads.iter().map(|u| backend.create_resource(u))).await;
    let mut outcome = BatchOutcome::default();
    for (upload, result) in uploads.iter().zip(results) {
        match result {
            Ok(id) => {
                info!(seq = upload.seq, id = ?id, "resource created");
                outcome.succeeded.push(upload.seq);
                outcome.created_ids.extend(id);
            }
            Err(e) => {
                error!(seq = upload.seq, error = %e, "resource upload failed");
                outcome.failed.push(upload.seq);
            }
        }
    }
    outcome
}

/// Full create flow over the active draft batch. Draft statuses are updated
/// along the way so the shell can show which items went through.
pub async fn submit_drafts(
    backend: &dyn AdminBackend,
    selection: Result<Selection, ValidationError>,
    batch: &mut DraftBatch,
) -> Result<BatchOutcome, SubmitError> {
    let selection = selection.map_err(|source| SubmitError::Invalid { seq: None, source })?;

    batch.set_all_status(DraftStatus::Validating);
    let uploads = match validate_batch(&selection, batch.drafts()) {
        Ok(v) => v,
        Err(e) => {
            batch.set_all_status(DraftStatus::Filled);
            if let SubmitError::Invalid { seq: Some(seq), .. } = &e {
                batch.set_status(*seq, DraftStatus::Failed);
            }
            warn!(error = %e, "draft batch rejected before upload");
            return Err(e);
        }
    };

    batch.set_all_status(DraftStatus::Submitting);
    let outcome = upload_all(backend, &uploads).await;
    for seq in &outcome.succeeded {
        batch.set_status(*seq, DraftStatus::Succeeded);
    }
    for seq in &outcome.failed {
        batch.set_status(*seq, DraftStatus::Failed);
    }

    if outcome.is_success() {
        Ok(outcome)
    } else {
        Err(SubmitError::Partial(outcome))
    }
}

/// Raw edit-form values for an existing resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEdit {
    pub name: String,
    pub description: String,
    pub kind: ResourceKind,
    pub board_id: Option<String>,
    pub standard_id: Option<String>,
    pub subject_id: Option<String>,
    pub file: Option<LocalFile>,
    pub video_url: Option<String>,
    pub thumbnail: Option<LocalFile>,
}

pub fn build_patch(edit: ResourceEdit) -> Result<ResourcePatch, ValidationError> {
    let selection = Selection::from_parts(
        edit.board_id.as_deref(),
        edit.standard_id.as_deref(),
        edit.subject_id.as_deref(),
    )?;
    let name = edit.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    let video_url = edit
        .video_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    if let Some(url) = &video_url {
        validate_video_url(url)?;
    }
    if let Some(file) = &edit.file {
        validate_pdf(file)?;
    }
    if let Some(thumb) = &edit.thumbnail {
        validate_thumbnail(thumb)?;
    }
    Ok(ResourcePatch {
        name: name.to_string(),
        description: edit.description.trim().to_string(),
        kind: edit.kind,
        board_id: selection.board_id,
        standard_id: selection.standard_id,
        subject_id: selection.subject_id,
        file: edit.file,
        video_url,
        thumbnail: edit.thumbnail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::drafts::DraftField;
    use crate::preview::PreviewStore;
    use std::path::PathBuf;

    fn selection() -> Result<Selection, ValidationError> {
        Selection::from_parts(Some("b1"), Some("s1"), Some("sub1"))
    }

    fn file(name: &str, mime: &str, size: u64) -> LocalFile {
        LocalFile {
            path: PathBuf::from(format!("/nonexistent/{name}")),
            file_name: name.to_string(),
            mime: mime.to_string(),
            size,
        }
    }

    fn previews() -> PreviewStore {
        PreviewStore::new(std::env::temp_dir().join(format!(
            "eduadmind-submit-{}",
            uuid::Uuid::new_v4()
        )))
    }

    /// Fills a PDF draft completely. The thumbnail path does not exist, so no
    /// preview is created, which is fine for submission.
    fn fill_pdf(batch: &mut DraftBatch, seq: u32, title: &str, previews: &mut PreviewStore) {
        batch.update(seq, DraftField::Title(title.into())).expect("title");
        batch
            .set_pdf(seq, file("notes.pdf", "application/pdf", 2048))
            .expect("pdf");
        batch
            .set_thumbnail(seq, file("cover.png", "image/png", 1024), previews)
            .expect("thumb");
    }

    #[tokio::test]
    async fn pdf_draft_without_file_fails_before_any_network_call() {
        let fake = FakeBackend::with_catalog();
        let mut previews = previews();
        let mut batch = DraftBatch::new(ResourceKind::Pdf);
        let seq = batch.drafts()[0].seq;
        batch.update(seq, DraftField::Title("Notes".into())).expect("title");
        batch
            .set_thumbnail(seq, file("cover.png", "image/png", 1024), &mut previews)
            .expect("thumb");

        let err = submit_drafts(&fake, selection(), &mut batch).await.unwrap_err();
        assert_eq!(
            err,
            SubmitError::Invalid {
                seq: Some(seq),
                source: ValidationError::MissingPdf
            }
        );
        assert_eq!(fake.call_count(), 0);
        assert_eq!(batch.get(seq).map(|d| d.status), Some(DraftStatus::Failed));
    }

    #[tokio::test]
    async fn incomplete_selection_is_a_single_message() {
        let fake = FakeBackend::default();
        let mut previews = previews();
        let mut batch = DraftBatch::new(ResourceKind::Pdf);
        let seq = batch.drafts()[0].seq;
        fill_pdf(&mut batch, seq, "Notes", &mut previews);

        let err = submit_drafts(
            &fake,
            Selection::from_parts(Some("b1"), None, Some("sub1")),
            &mut batch,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Please select board, standard and subject");
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn one_bad_draft_blocks_the_whole_batch() {
        let fake = FakeBackend::default();
        let mut previews = previews();
        let mut batch = DraftBatch::new(ResourceKind::Pdf);
        let first = batch.drafts()[0].seq;
        fill_pdf(&mut batch, first, "Good", &mut previews);
        let second = batch.append();
        batch
            .set_pdf(second, file("x.pdf", "application/pdf", 10))
            .expect("pdf");

        let err = submit_drafts(&fake, selection(), &mut batch).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Invalid {
                seq: Some(s),
                source: ValidationError::MissingTitle
            } if s == second
        ));
        assert_eq!(fake.call_count(), 0);
        assert_eq!(batch.get(first).map(|d| d.status), Some(DraftStatus::Filled));
    }

    #[tokio::test]
    async fn video_duration_is_sent_as_minutes_and_zero_seconds() {
        let fake = FakeBackend::default();
        let mut previews = previews();
        let mut batch = DraftBatch::new(ResourceKind::Video);
        let seq = batch.drafts()[0].seq;
        batch.update(seq, DraftField::Title("Lecture".into())).expect("title");
        batch
            .update(seq, DraftField::VideoUrl("https://youtu.be/abc".into()))
            .expect("url");
        batch
            .update(seq, DraftField::Duration("45".into()))
            .expect("duration");
        batch
            .set_thumbnail(seq, file("t.jpg", "image/jpeg", 10), &mut previews)
            .expect("thumb");

        let outcome = submit_drafts(&fake, selection(), &mut batch)
            .await
            .expect("submit");
        assert_eq!(outcome.created_ids, vec!["r1".to_string()]);
        let uploads = fake.uploads.lock().unwrap();
        assert_eq!(
            uploads[0].content,
            UploadContent::Video {
                url: "https://youtu.be/abc".into(),
                duration: "45:00".into()
            }
        );
        assert_eq!(uploads[0].subject_id, "sub1");
        assert_eq!(batch.get(seq).map(|d| d.status), Some(DraftStatus::Succeeded));
    }

    #[tokio::test]
    async fn partial_failure_reports_batch_failed_with_created_ids() {
        let fake = FakeBackend::default();
        fake.reject_upload_names.lock().unwrap().insert("B".into());
        let mut previews = previews();
        let mut batch = DraftBatch::new(ResourceKind::Pdf);
        let a = batch.drafts()[0].seq;
        let b = batch.append();
        let c = batch.append();
        for (seq, title) in [(a, "A"), (b, "B"), (c, "C")] {
            fill_pdf(&mut batch, seq, title, &mut previews);
        }

        let err = submit_drafts(&fake, selection(), &mut batch).await.unwrap_err();
        assert_eq!(err.to_string(), BATCH_FAILED_MESSAGE);
        let SubmitError::Partial(outcome) = err else {
            panic!("expected partial failure");
        };
        assert_eq!(outcome.created_ids.len(), 2);
        assert_eq!(outcome.failed, vec![b]);
        assert_eq!(fake.call_count(), 3);
        assert_eq!(batch.get(b).map(|d| d.status), Some(DraftStatus::Failed));
        assert_eq!(batch.get(c).map(|d| d.status), Some(DraftStatus::Succeeded));
    }

    #[test]
    fn patch_requires_identity_and_checks_present_values() {
        let edit = ResourceEdit {
            name: " Algebra ".into(),
            description: "notes".into(),
            kind: ResourceKind::Video,
            board_id: Some("b1".into()),
            standard_id: Some("s1".into()),
            subject_id: Some("sub1".into()),
            file: None,
            video_url: Some("https://vimeo.com/1".into()),
            thumbnail: None,
        };
        assert_eq!(
            build_patch(edit.clone()),
            Err(ValidationError::InvalidVideoUrl)
        );

        let ok = build_patch(ResourceEdit {
            video_url: Some("  ".into()),
            ..edit.clone()
        })
        .expect("patch");
        assert_eq!(ok.name, "Algebra");
        assert_eq!(ok.video_url, None);

        assert_eq!(
            build_patch(ResourceEdit {
                subject_id: None,
                ..edit
            }),
            Err(ValidationError::IncompleteSelection)
        );
    }
}
