//! Concurrent dispatch of independent single-cell writes.
//!
//! Every instruction is issued at once and the batch resolves only after all
//! of them have finished. The report keeps one result per instruction, in
//! input order; the caller decides how to treat partial failure.

use futures_util::future::join_all;

use crate::error::SheetsError;
use crate::sheets::{CellUpdate, SheetsApi};

#[derive(Debug)]
pub struct InstructionResult {
    pub update: CellUpdate,
    pub outcome: Result<(), SheetsError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    results: Vec<InstructionResult>,
}

impl BatchReport {
    pub fn results(&self) -> &[InstructionResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &InstructionResult> {
        self.results.iter().filter(|r| r.outcome.is_err())
    }

    /// Collapse to a single outcome: the number of writes if all landed,
    /// otherwise the first failure in input order. Writes that already
    /// succeeded are not rolled back.
    pub fn into_all_or_nothing(self) -> Result<usize, SheetsError> {
        let total = self.results.len();
        let failures = self.results.iter().filter(|r| r.outcome.is_err()).count();
        if failures > 0 {
            log::warn!(
                "Batch of {} writes had {} failure(s); {} already applied",
                total,
                failures,
                total - failures
            );
        }

        for result in self.results {
            result.outcome?;
        }
        Ok(total)
    }
}

/// Issue every update against `sheet_id` concurrently and wait for all.
pub async fn run_batch(api: &dyn SheetsApi, sheet_id: &str, updates: Vec<CellUpdate>) -> BatchReport {
    let writes = updates.into_iter().map(|update| async move {
        let outcome = api.update_value(sheet_id, &update.range, &update.value).await;
        if let Err(e) = &outcome {
            log::error!("Write to {} failed: {}", update.range, e);
        }
        InstructionResult { update, outcome }
    });

    BatchReport {
        results: join_all(writes).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records writes; fails any range listed in `failing`.
    struct RecordingSheets {
        writes: Mutex<Vec<CellUpdate>>,
        failing: Vec<String>,
    }

    impl RecordingSheets {
        fn new(failing: &[&str]) -> Self {
            RecordingSheets {
                writes: Mutex::new(Vec::new()),
                failing: failing.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl SheetsApi for RecordingSheets {
        async fn get_values(&self, _: &str, _: &str) -> Result<Vec<Vec<String>>, SheetsError> {
            Ok(Vec::new())
        }

        async fn update_value(&self, _: &str, range: &str, value: &str) -> Result<(), SheetsError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.failing.iter().any(|f| f == range) {
                return Err(SheetsError::Api {
                    status: 429,
                    message: format!("Quota exceeded writing {}", range),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push(CellUpdate::new(range, value));
            Ok(())
        }
    }

    fn updates() -> Vec<CellUpdate> {
        vec![
            CellUpdate::new("Sheet2!G4", "Approved"),
            CellUpdate::new("Sheet2!H4", "ok"),
            CellUpdate::new("Sheet2!I7", "TRUE"),
        ]
    }

    #[tokio::test]
    async fn all_writes_land_and_report_in_input_order() {
        let api = RecordingSheets::new(&[]);
        let report = run_batch(&api, "sheet", updates()).await;

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 3);
        let ranges: Vec<&str> = report.results().iter().map(|r| r.update.range.as_str()).collect();
        assert_eq!(ranges, vec!["Sheet2!G4", "Sheet2!H4", "Sheet2!I7"]);
        assert_eq!(report.into_all_or_nothing().unwrap(), 3);
        assert_eq!(api.writes.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn one_failure_fails_the_batch_without_rollback() {
        let api = RecordingSheets::new(&["Sheet2!H4"]);
        let report = run_batch(&api, "sheet", updates()).await;

        assert_eq!(report.succeeded(), 2);
        let failed: Vec<&str> = report.failed().map(|r| r.update.range.as_str()).collect();
        assert_eq!(failed, vec!["Sheet2!H4"]);

        let err = report.into_all_or_nothing().unwrap_err();
        assert_eq!(err.to_string(), "Quota exceeded writing Sheet2!H4");
        // the other two stay written
        assert_eq!(api.writes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let api = RecordingSheets::new(&[]);
        let report = run_batch(&api, "sheet", Vec::new()).await;
        assert!(report.is_empty());
        assert_eq!(report.into_all_or_nothing().unwrap(), 0);
        assert!(api.writes.lock().unwrap().is_empty());
    }
}
