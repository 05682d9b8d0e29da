//! Client-side view of the dashboard tab.
//!
//! A [`DashboardSession`] owns one snapshot of the rows and the edits made
//! to it since the last successful save. It talks to the read and
//! bulk-update endpoints through a [`DashboardBackend`].
//!
//! Save protocol:
//! - Clean: nothing pending, save disabled
//! - Dirty: pending edits, save enabled
//! - Saving: a bulk update is in flight; edits are still accepted but a
//!   second save is refused
//!
//! A successful save settles the pending edits and refetches once. A failed
//! save leaves them untouched and does not refetch.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::DashboardSettings;
use crate::edits::{EditAccumulator, FieldEdit};
use crate::error::{DashboardError, EditError};
use crate::record::{self, Field, JobApplication};
use crate::sheets::CellUpdate;

/// Transport used by a session to reach the read and bulk-update endpoints.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    async fn fetch_values(&self, sheet_id: &str, range: &str)
    -> Result<Vec<Vec<String>>, DashboardError>;

    async fn bulk_update(&self, sheet_id: &str, updates: &[CellUpdate])
    -> Result<(), DashboardError>;
}

#[derive(Debug, Deserialize)]
struct ValuesBody {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// [`DashboardBackend`] over HTTP against a running dashboard server.
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpBackend {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body: Option<ErrorBody> = response.json().await.ok();
    body.and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| format!("server returned {}", status))
}

#[async_trait]
impl DashboardBackend for HttpBackend {
    async fn fetch_values(
        &self,
        sheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, DashboardError> {
        let response = self
            .http
            .get(format!("{}/api/sheets", self.base_url))
            .query(&[("sheetId", sheet_id), ("range", range)])
            .send()
            .await
            .map_err(|e| DashboardError::RemoteRead(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DashboardError::RemoteRead(error_message(response).await));
        }

        let body: ValuesBody = response
            .json()
            .await
            .map_err(|e| DashboardError::RemoteRead(e.to_string()))?;
        Ok(body.values)
    }

    async fn bulk_update(
        &self,
        sheet_id: &str,
        updates: &[CellUpdate],
    ) -> Result<(), DashboardError> {
        let response = self
            .http
            .post(format!("{}/api/bulk-update", self.base_url))
            .json(&serde_json::json!({ "sheetId": sheet_id, "updates": updates }))
            .send()
            .await
            .map_err(|e| DashboardError::RemoteWrite(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DashboardError::RemoteWrite(error_message(response).await));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Clean,
    Dirty,
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was pending; no request was made.
    NothingToSave,
    Saved { cells: usize },
}

/// Instructions handed out by [`DashboardSession::begin_save`].
#[derive(Debug)]
pub struct SaveTicket {
    updates: Vec<CellUpdate>,
}

impl SaveTicket {
    pub fn updates(&self) -> &[CellUpdate] {
        &self.updates
    }
}

pub struct DashboardSession<B> {
    backend: B,
    sheet_id: String,
    sheet_name: String,
    range: String,
    rows: Vec<JobApplication>,
    pending: EditAccumulator,
    in_flight: Option<EditAccumulator>,
}

impl<B: DashboardBackend> DashboardSession<B> {
    pub fn new(backend: B, settings: &DashboardSettings) -> Self {
        DashboardSession {
            backend,
            sheet_id: settings.sheet_id.clone(),
            sheet_name: settings.sheet_name.clone(),
            range: settings.read_range(),
            rows: Vec::new(),
            pending: EditAccumulator::new(),
            in_flight: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetch the tab and replace the row snapshot. On failure the previous
    /// snapshot stays in place.
    pub async fn load(&mut self) -> Result<usize, DashboardError> {
        let values = self
            .backend
            .fetch_values(&self.sheet_id, &self.range)
            .await
            .inspect_err(|e| log::error!("Error fetching data: {}", e))?;

        let mut rows = record::records_from_values(&values);
        // edits made while a save was in flight are still pending
        for pending in self.pending.iter() {
            if let Some(row) = rows.iter_mut().find(|r| r.id == pending.id) {
                for change in pending.changes() {
                    apply_to_row(row, &change);
                }
            }
        }

        log::debug!("Loaded {} rows from {}", rows.len(), self.range);
        self.rows = rows;
        Ok(self.rows.len())
    }

    pub fn rows(&self) -> &[JobApplication] {
        &self.rows
    }

    pub fn row(&self, id: &str) -> Option<&JobApplication> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn pending(&self) -> &EditAccumulator {
        &self.pending
    }

    pub fn state(&self) -> SaveState {
        if self.in_flight.is_some() {
            SaveState::Saving
        } else if self.pending.is_empty() {
            SaveState::Clean
        } else {
            SaveState::Dirty
        }
    }

    pub fn can_save(&self) -> bool {
        self.state() == SaveState::Dirty
    }

    pub fn save_label(&self) -> String {
        format!("Save Changes ({})", self.pending.dirty_rows())
    }

    /// Apply an edit to a row. Returns `Ok(false)` when the value equals
    /// what the row already shows.
    pub fn edit(&mut self, row_id: &str, edit: FieldEdit) -> Result<bool, EditError> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == row_id)
            .ok_or_else(|| EditError::UnknownRow(row_id.to_string()))?;

        if row.sheet_row().is_none() {
            return Err(EditError::UnaddressableRow(row_id.to_string()));
        }
        if row.cell_value(edit.field()) == edit.sheet_value() {
            return Ok(false);
        }

        apply_to_row(row, &edit);
        self.pending.record(row_id, edit);
        Ok(true)
    }

    /// Edit addressed by wire field name, as a grid widget would report it.
    pub fn edit_field(&mut self, row_id: &str, field: &str, value: &Value) -> Result<bool, EditError> {
        let field = Field::from_name(field).ok_or_else(|| EditError::UnknownField(field.to_string()))?;
        let edit = FieldEdit::parse(field, value)?;
        self.edit(row_id, edit)
    }

    /// Snapshot the pending edits as instructions and enter Saving.
    /// Returns `None` when nothing is pending.
    pub fn begin_save(&mut self) -> Result<Option<SaveTicket>, DashboardError> {
        if self.in_flight.is_some() {
            return Err(DashboardError::SaveInProgress);
        }
        if self.pending.is_empty() {
            log::debug!("No updates to save");
            return Ok(None);
        }

        let updates = self.pending.derive_updates(&self.sheet_name)?;
        self.in_flight = Some(self.pending.clone());
        Ok(Some(SaveTicket { updates }))
    }

    /// Resolve a save started with [`begin_save`](Self::begin_save).
    pub async fn complete_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), DashboardError>,
    ) -> Result<SaveOutcome, DashboardError> {
        let sent = self.in_flight.take().unwrap_or_default();

        if let Err(e) = result {
            log::error!("Error during save: {}", e);
            return Err(e);
        }

        self.pending.settle(&sent);
        log::info!("Saved {} cell(s), refreshing data", ticket.updates.len());
        self.load().await?;

        Ok(SaveOutcome::Saved {
            cells: ticket.updates.len(),
        })
    }

    /// Push every pending edit through the bulk-update endpoint.
    pub async fn save(&mut self) -> Result<SaveOutcome, DashboardError> {
        let Some(ticket) = self.begin_save()? else {
            return Ok(SaveOutcome::NothingToSave);
        };
        let result = self.backend.bulk_update(&self.sheet_id, ticket.updates()).await;
        self.complete_save(ticket, result).await
    }
}

fn apply_to_row(row: &mut JobApplication, edit: &FieldEdit) {
    match edit {
        FieldEdit::Status(status) => row.status = Some(*status),
        FieldEdit::JobSearchFeedback(text) => row.job_search_feedback = text.clone(),
        FieldEdit::ApplyUsingOriginalResume(flag) => row.apply_using_original_resume = *flag,
        FieldEdit::AdditionalComments(text) => row.additional_comments = text.clone(),
    }
}
