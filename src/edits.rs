//! Pending row edits and their translation into single-cell writes.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::a1;
use crate::error::EditError;
use crate::record::{self, Field, Status};
use crate::sheets::CellUpdate;

/// A new value for one editable field.
///
/// Read-only fields have no variant, so an edit that exists is an edit
/// that may be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Status(Status),
    JobSearchFeedback(String),
    ApplyUsingOriginalResume(bool),
    AdditionalComments(String),
}

impl FieldEdit {
    pub fn field(&self) -> Field {
        match self {
            FieldEdit::Status(_) => Field::Status,
            FieldEdit::JobSearchFeedback(_) => Field::JobSearchFeedback,
            FieldEdit::ApplyUsingOriginalResume(_) => Field::ApplyUsingOriginalResume,
            FieldEdit::AdditionalComments(_) => Field::AdditionalComments,
        }
    }

    /// The literal string written to the sheet.
    pub fn sheet_value(&self) -> String {
        match self {
            FieldEdit::Status(status) => status.label().to_string(),
            FieldEdit::JobSearchFeedback(text) | FieldEdit::AdditionalComments(text) => {
                text.clone()
            }
            FieldEdit::ApplyUsingOriginalResume(flag) => record::bool_to_sheet(*flag).to_string(),
        }
    }

    /// Parse a JSON value for `field`, rejecting read-only fields.
    pub fn parse(field: Field, value: &Value) -> Result<FieldEdit, EditError> {
        let invalid = |reason: &str| EditError::InvalidValue {
            field: field.name().to_string(),
            reason: reason.to_string(),
        };

        match field {
            Field::Status => {
                let label = value.as_str().ok_or_else(|| invalid("expected a string"))?;
                let status = label.parse::<Status>().map_err(|e| invalid(&e))?;
                Ok(FieldEdit::Status(status))
            }
            Field::ApplyUsingOriginalResume => {
                let flag = match value {
                    Value::Bool(flag) => *flag,
                    Value::String(s) if s.eq_ignore_ascii_case("true") => true,
                    Value::String(s) if s.eq_ignore_ascii_case("false") => false,
                    _ => return Err(invalid("expected true or false")),
                };
                Ok(FieldEdit::ApplyUsingOriginalResume(flag))
            }
            Field::JobSearchFeedback | Field::AdditionalComments => {
                let text = value
                    .as_str()
                    .ok_or_else(|| invalid("expected a string"))?
                    .to_string();
                Ok(if field == Field::JobSearchFeedback {
                    FieldEdit::JobSearchFeedback(text)
                } else {
                    FieldEdit::AdditionalComments(text)
                })
            }
            read_only => Err(EditError::ReadOnlyField(read_only.name().to_string())),
        }
    }
}

/// Fields of one row changed since the last successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub id: String,
    pub status: Option<Status>,
    pub job_search_feedback: Option<String>,
    pub apply_using_original_resume: Option<bool>,
    pub additional_comments: Option<String>,
}

impl PendingEdit {
    pub fn new(id: impl Into<String>) -> Self {
        PendingEdit {
            id: id.into(),
            status: None,
            job_search_feedback: None,
            apply_using_original_resume: None,
            additional_comments: None,
        }
    }

    /// Record `edit`, replacing any earlier value for the same field.
    pub fn apply(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Status(status) => self.status = Some(status),
            FieldEdit::JobSearchFeedback(text) => self.job_search_feedback = Some(text),
            FieldEdit::ApplyUsingOriginalResume(flag) => {
                self.apply_using_original_resume = Some(flag)
            }
            FieldEdit::AdditionalComments(text) => self.additional_comments = Some(text),
        }
    }

    /// Changed fields in column order.
    pub fn changes(&self) -> Vec<FieldEdit> {
        let mut changes = Vec::new();
        if let Some(status) = self.status {
            changes.push(FieldEdit::Status(status));
        }
        if let Some(text) = &self.job_search_feedback {
            changes.push(FieldEdit::JobSearchFeedback(text.clone()));
        }
        if let Some(flag) = self.apply_using_original_resume {
            changes.push(FieldEdit::ApplyUsingOriginalResume(flag));
        }
        if let Some(text) = &self.additional_comments {
            changes.push(FieldEdit::AdditionalComments(text.clone()));
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.job_search_feedback.is_none()
            && self.apply_using_original_resume.is_none()
            && self.additional_comments.is_none()
    }

    fn clear_field(&mut self, field: Field) {
        match field {
            Field::Status => self.status = None,
            Field::JobSearchFeedback => self.job_search_feedback = None,
            Field::ApplyUsingOriginalResume => self.apply_using_original_resume = None,
            Field::AdditionalComments => self.additional_comments = None,
            _ => {}
        }
    }

    /// Build an entry from a JSON object such as
    /// `{ "id": "3", "status": "Approved" }` keyed by `row_id`.
    pub fn from_json(row_id: &str, entry: &Map<String, Value>) -> Result<Self, EditError> {
        let mut pending = PendingEdit::new(row_id);
        for (key, value) in entry {
            let field =
                Field::from_name(key).ok_or_else(|| EditError::UnknownField(key.clone()))?;
            if field == Field::Id {
                let found = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                if found != row_id {
                    return Err(EditError::MismatchedId {
                        expected: row_id.to_string(),
                        found,
                    });
                }
                continue;
            }
            pending.apply(FieldEdit::parse(field, value)?);
        }
        Ok(pending)
    }
}

/// Map of row id to that row's pending edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditAccumulator {
    rows: BTreeMap<String, PendingEdit>,
}

impl EditAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, row_id: &str, edit: FieldEdit) {
        self.rows
            .entry(row_id.to_string())
            .or_insert_with(|| PendingEdit::new(row_id))
            .apply(edit);
    }

    /// Merge a whole entry, field by field.
    pub fn insert(&mut self, pending: PendingEdit) {
        let id = pending.id.clone();
        for change in pending.changes() {
            self.record(&id, change);
        }
    }

    pub fn get(&self, row_id: &str) -> Option<&PendingEdit> {
        self.rows.get(row_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingEdit> {
        self.rows.values()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows with at least one pending change.
    pub fn dirty_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Drop every change that `saved` wrote, keeping fields edited again
    /// since with a different value.
    pub fn settle(&mut self, saved: &EditAccumulator) {
        for sent in saved.iter() {
            let Some(current) = self.rows.get_mut(&sent.id) else {
                continue;
            };
            let current_changes = current.changes();
            for change in sent.changes() {
                if current_changes.contains(&change) {
                    current.clear_field(change.field());
                }
            }
            if current.is_empty() {
                self.rows.remove(&sent.id);
            }
        }
    }

    /// Parse a JSON object of `{ "<row id>": { field: value, ... } }`.
    pub fn from_json(edits: &Map<String, Value>) -> Result<Self, EditError> {
        let mut accumulator = EditAccumulator::new();
        for (row_id, entry) in edits {
            let entry = entry.as_object().ok_or_else(|| EditError::InvalidValue {
                field: row_id.clone(),
                reason: "expected an object of field edits".to_string(),
            })?;
            accumulator.insert(PendingEdit::from_json(row_id, entry)?);
        }
        Ok(accumulator)
    }

    /// One instruction per changed field per row, addressed at
    /// `<sheet>!<column><id + 1>`.
    pub fn derive_updates(&self, sheet_name: &str) -> Result<Vec<CellUpdate>, EditError> {
        let mut updates = Vec::new();
        for pending in self.rows.values() {
            let row = record::sheet_row_for_id(&pending.id)
                .ok_or_else(|| EditError::UnaddressableRow(pending.id.clone()))?;
            for change in pending.changes() {
                let col = change.field().column_index() as u32 + 1;
                updates.push(CellUpdate::new(
                    a1::cell_range(sheet_name, col, row),
                    change.sheet_value(),
                ));
            }
        }
        Ok(updates)
    }
}
