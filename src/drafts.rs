use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::models::ResourceKind;
use crate::preview::{PreviewHandle, PreviewStore};
use crate::validate::{digits_only, validate_pdf, validate_thumbnail, LocalFile, ValidationError};

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("At least one resource is required")]
    LastDraft,
    #[error("no draft with seq {0}")]
    UnknownDraft(u32),
    #[error("draft {seq} is not a {expected} resource")]
    WrongKind { seq: u32, expected: &'static str },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftStatus {
    Empty,
    Filled,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum DraftPayload {
    Pdf {
        file: Option<LocalFile>,
    },
    #[serde(rename_all = "camelCase")]
    Video { video_url: String, duration: String },
}

impl DraftPayload {
    fn blank(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Pdf => DraftPayload::Pdf { file: None },
            ResourceKind::Video => DraftPayload::Video {
                video_url: String::new(),
                duration: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub seq: u32,
    pub title: String,
    pub description: String,
    pub payload: DraftPayload,
    pub thumbnail: Option<LocalFile>,
    pub preview: Option<PreviewHandle>,
    pub status: DraftStatus,
}

impl Draft {
    fn blank(seq: u32, kind: ResourceKind) -> Self {
        Self {
            seq,
            title: String::new(),
            description: String::new(),
            payload: DraftPayload::blank(kind),
            thumbnail: None,
            preview: None,
            status: DraftStatus::Empty,
        }
    }
}

/// One text field of a draft, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Title(String),
    Description(String),
    VideoUrl(String),
    Duration(String),
}

impl DraftField {
    pub fn parse(field: &str, value: String) -> Option<Self> {
        match field {
            "title" => Some(DraftField::Title(value)),
            "description" => Some(DraftField::Description(value)),
            "videoUrl" => Some(DraftField::VideoUrl(value)),
            "duration" => Some(DraftField::Duration(value)),
            _ => None,
        }
    }
}

/// Ordered drafts of one resource kind. Seqs come from a counter that only
/// moves forward, so a removed draft's seq is never handed out again.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftBatch {
    kind: ResourceKind,
    drafts: Vec<Draft>,
    #[serde(skip)]
    next_seq: u32,
}

impl DraftBatch {
    pub fn new(kind: ResourceKind) -> Self {
        let mut batch = Self {
            kind,
            drafts: Vec::new(),
            next_seq: 1,
        };
        batch.append();
        batch
    }

    pub fn drafts(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn get(&self, seq: u32) -> Option<&Draft> {
        self.drafts.iter().find(|d| d.seq == seq)
    }

    fn get_mut(&mut self, seq: u32) -> Result<&mut Draft, DraftError> {
        self.drafts
            .iter_mut()
            .find(|d| d.seq == seq)
            .ok_or(DraftError::UnknownDraft(seq))
    }

    pub fn append(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.drafts.push(Draft::blank(seq, self.kind));
        seq
    }

    pub fn remove(&mut self, seq: u32, previews: &mut PreviewStore) -> Result<(), DraftError> {
        let idx = self
            .drafts
            .iter()
            .position(|d| d.seq == seq)
            .ok_or(DraftError::UnknownDraft(seq))?;
        if self.drafts.len() == 1 {
            return Err(DraftError::LastDraft);
        }
        let removed = self.drafts.remove(idx);
        if let Some(handle) = &removed.preview {
            previews.release(handle);
        }
        Ok(())
    }

    pub fn update(&mut self, seq: u32, field: DraftField) -> Result<(), DraftError> {
        let draft = self.get_mut(seq)?;
        match (field, &mut draft.payload) {
            (DraftField::Title(v), _) => draft.title = v,
            (DraftField::Description(v), _) => draft.description = v,
            (DraftField::VideoUrl(v), DraftPayload::Video { video_url, .. }) => *video_url = v,
            (DraftField::Duration(v), DraftPayload::Video { duration, .. }) => {
                *duration = digits_only(&v)
            }
            (DraftField::VideoUrl(_) | DraftField::Duration(_), DraftPayload::Pdf { .. }) => {
                return Err(DraftError::WrongKind {
                    seq,
                    expected: ResourceKind::Video.as_str(),
                });
            }
        }
        self.touch(seq);
        Ok(())
    }

    /// Replaces the thumbnail. The old preview is released before the new one
    /// is created. A preview that cannot be written is logged and left out;
    /// the thumbnail itself is still kept for upload.
    pub fn set_thumbnail(
        &mut self,
        seq: u32,
        file: LocalFile,
        previews: &mut PreviewStore,
    ) -> Result<Option<PreviewHandle>, DraftError> {
        validate_thumbnail(&file)?;
        let draft = self.get_mut(seq)?;
        if let Some(old) = draft.preview.take() {
            previews.release(&old);
        }
        let preview = match previews.create(&file) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(seq, error = %format!("{e:#}"), "thumbnail preview unavailable");
                None
            }
        };
        draft.thumbnail = Some(file);
        draft.preview = preview.clone();
        self.touch(seq);
        Ok(preview)
    }

    pub fn set_pdf(&mut self, seq: u32, file: LocalFile) -> Result<(), DraftError> {
        validate_pdf(&file)?;
        let draft = self.get_mut(seq)?;
        match &mut draft.payload {
            DraftPayload::Pdf { file: slot } => *slot = Some(file),
            DraftPayload::Video { .. } => {
                return Err(DraftError::WrongKind {
                    seq,
                    expected: ResourceKind::Pdf.as_str(),
                })
            }
        }
        self.touch(seq);
        Ok(())
    }

    pub fn set_status(&mut self, seq: u32, status: DraftStatus) {
        if let Ok(draft) = self.get_mut(seq) {
            draft.status = status;
        }
    }

    pub fn set_all_status(&mut self, status: DraftStatus) {
        for draft in &mut self.drafts {
            draft.status = status;
        }
    }

    fn touch(&mut self, seq: u32) {
        self.set_status(seq, DraftStatus::Filled);
    }

    fn discard(&mut self, previews: &mut PreviewStore) {
        for draft in self.drafts.drain(..) {
            if let Some(handle) = &draft.preview {
                previews.release(handle);
            }
        }
        self.append();
    }
}

/// Both draft batches of the create screen. Switching `kind` keeps the other
/// batch intact.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceForm {
    kind: ResourceKind,
    pdf: DraftBatch,
    video: DraftBatch,
}

impl Default for ResourceForm {
    fn default() -> Self {
        Self {
            kind: ResourceKind::Pdf,
            pdf: DraftBatch::new(ResourceKind::Pdf),
            video: DraftBatch::new(ResourceKind::Video),
        }
    }
}

impl ResourceForm {
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ResourceKind) {
        self.kind = kind;
    }

    pub fn active(&self) -> &DraftBatch {
        match self.kind {
            ResourceKind::Pdf => &self.pdf,
            ResourceKind::Video => &self.video,
        }
    }

    pub fn active_mut(&mut self) -> &mut DraftBatch {
        match self.kind {
            ResourceKind::Pdf => &mut self.pdf,
            ResourceKind::Video => &mut self.video,
        }
    }

    /// Releases every preview of both batches and starts over with one blank
    /// draft each.
    pub fn discard(&mut self, previews: &mut PreviewStore) {
        self.pdf.discard(previews);
        self.video.discard(previews);
    }
}
