//! Board → Standard → Subject selection state.
//!
//! [`SelectionCascade::apply`] is a pure reducer: it never performs I/O. The
//! caller runs the returned [`CascadeEffect`]s (list fetches, notifications)
//! and feeds the fetch results back in as `*Loaded` events.

use serde::Serialize;

use crate::models::{Board, Standard, Subject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Boards,
    Standards,
    Subjects,
}

impl Level {
    pub fn plural(self) -> &'static str {
        match self {
            Level::Boards => "boards",
            Level::Standards => "standards",
            Level::Subjects => "subjects",
        }
    }
}

/// Failed list loads only carry a short reason; the full error is logged by
/// whoever ran the fetch.
pub type Loaded<T> = Result<Vec<T>, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum CascadeEvent {
    BoardSelected(Option<String>),
    StandardSelected(Option<String>),
    SubjectSelected(Option<String>),
    BoardsLoaded(Loaded<Board>),
    StandardsLoaded {
        board_id: String,
        result: Loaded<Standard>,
    },
    SubjectsLoaded {
        standard_id: String,
        result: Loaded<Subject>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeEffect {
    FetchStandards(String),
    FetchSubjects(String),
    Notify(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCascade {
    board_id: Option<String>,
    standard_id: Option<String>,
    subject_id: Option<String>,
    boards: Vec<Board>,
    standards: Vec<Standard>,
    subjects: Vec<Subject>,
}

fn present(id: Option<String>) -> Option<String> {
    id.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl SelectionCascade {
    pub fn board_id(&self) -> Option<&str> {
        self.board_id.as_deref()
    }

    pub fn standard_id(&self) -> Option<&str> {
        self.standard_id.as_deref()
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    #[cfg(test)]
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    #[cfg(test)]
    pub fn standards(&self) -> &[Standard] {
        &self.standards
    }

    #[cfg(test)]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// All three ids, or `None` if any level is unselected.
    #[cfg(test)]
    pub fn complete(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.board_id.as_deref()?,
            self.standard_id.as_deref()?,
            self.subject_id.as_deref()?,
        ))
    }

    pub fn apply(&mut self, event: CascadeEvent) -> Vec<CascadeEffect> {
        match event {
            CascadeEvent::BoardSelected(id) => {
                self.board_id = present(id);
                self.standard_id = None;
                self.subject_id = None;
                self.standards.clear();
                self.subjects.clear();
                self.board_id
                    .clone()
                    .map(CascadeEffect::FetchStandards)
                    .into_iter()
                    .collect()
            }
            CascadeEvent::StandardSelected(id) => {
                self.standard_id = present(id);
                self.subject_id = None;
                self.subjects.clear();
                self.standard_id
                    .clone()
                    .map(CascadeEffect::FetchSubjects)
                    .into_iter()
                    .collect()
            }
            CascadeEvent::SubjectSelected(id) => {
                self.subject_id = present(id);
                Vec::new()
            }
            CascadeEvent::BoardsLoaded(result) => {
                Self::load(&mut self.boards, result, Level::Boards)
            }
            CascadeEvent::StandardsLoaded { board_id, result } => {
                if self.board_id.as_deref() != Some(board_id.as_str()) {
                    return Vec::new();
                }
                Self::load(&mut self.standards, result, Level::Standards)
            }
            CascadeEvent::SubjectsLoaded {
                standard_id,
                result,
            } => {
                if self.standard_id.as_deref() != Some(standard_id.as_str()) {
                    return Vec::new();
                }
                Self::load(&mut self.subjects, result, Level::Subjects)
            }
        }
    }

    fn load<T>(slot: &mut Vec<T>, result: Loaded<T>, level: Level) -> Vec<CascadeEffect> {
        match result {
            Ok(items) => {
                *slot = items;
                Vec::new()
            }
            Err(_) => {
                slot.clear();
                vec![CascadeEffect::Notify(format!(
                    "Failed to fetch {}",
                    level.plural()
                ))]
            }
        }
    }

    /// Edit flow: replay board, standard and subject in order. Returns the
    /// effects of every step; the caller must run them in sequence.
    pub fn restore(
        &mut self,
        board_id: Option<String>,
        standard_id: Option<String>,
        subject_id: Option<String>,
    ) -> Vec<CascadeEffect> {
        let mut effects = self.apply(CascadeEvent::BoardSelected(board_id));
        effects.extend(self.apply(CascadeEvent::StandardSelected(standard_id)));
        effects.extend(self.apply(CascadeEvent::SubjectSelected(subject_id)));
        effects
    }

    /// Clears selections and child lists; the boards list stays loaded.
    pub fn reset(&mut self) {
        self.apply(CascadeEvent::BoardSelected(None));
    }
}
