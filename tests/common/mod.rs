#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use sheet_dashboard::a1::A1Range;
use sheet_dashboard::config::DashboardSettings;
use sheet_dashboard::{SheetsApi, SheetsError};

pub const SHEET_ID: &str = "test-sheet-id";
pub const SHEET_NAME: &str = "Sheet2";

/// In-memory spreadsheet behaving like the Sheets API for the calls the
/// dashboard makes: trailing empty cells and rows are trimmed on read.
pub struct MemorySheets {
    sheet_id: String,
    tabs: Mutex<HashMap<String, Vec<Vec<String>>>>,
    failing: Mutex<HashSet<String>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemorySheets {
    pub fn new(sheet_id: &str) -> Self {
        MemorySheets {
            sheet_id: sheet_id.to_string(),
            tabs: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    /// The job tab used across tests: header plus rows with ids 1..=3.
    pub fn with_jobs() -> Self {
        let sheets = MemorySheets::new(SHEET_ID);
        sheets.set_tab(
            SHEET_NAME,
            vec![
                row(&[
                    "ID",
                    "Date",
                    "Original Resume",
                    "Job Profile",
                    "Job Details",
                    "Company Name",
                    "Status",
                    "Job Search Feedback",
                    "Apply using original resume",
                    "Tailored Resume",
                    "Additional Comments",
                ]),
                row(&[
                    "1",
                    "2024-05-01",
                    "https://resumes/1",
                    "https://jobs/1",
                    "Backend engineer",
                    "Acme",
                    "Awaiting approval",
                    "",
                    "FALSE",
                ]),
                row(&[
                    "2",
                    "2024-05-02",
                    "https://resumes/2",
                    "https://jobs/2",
                    "Data engineer",
                    "Globex",
                    "Applied",
                    "fine",
                    "TRUE",
                    "https://tailored/2",
                    "note",
                ]),
                row(&[
                    "3",
                    "2024-05-03",
                    "https://resumes/3",
                    "https://jobs/3",
                    "SRE",
                    "Initech",
                    "Awaiting approval",
                ]),
            ],
        );
        sheets
    }

    pub fn set_tab(&self, name: &str, grid: Vec<Vec<String>>) {
        self.tabs.lock().unwrap().insert(name.to_string(), grid);
    }

    pub fn fail_range(&self, range: &str) {
        self.failing.lock().unwrap().insert(range.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Cell by tab and A1 name, empty when unset.
    pub fn cell(&self, tab: &str, name: &str) -> String {
        let parsed = A1Range::parse(name).expect("valid cell name");
        let row = parsed.start.row.expect("cell has a row") as usize;
        let col = parsed.start.col as usize;
        self.tabs
            .lock()
            .unwrap()
            .get(tab)
            .and_then(|grid| grid.get(row - 1))
            .and_then(|r| r.get(col - 1))
            .cloned()
            .unwrap_or_default()
    }

    fn check_id(&self, sheet_id: &str) -> Result<(), SheetsError> {
        if sheet_id == self.sheet_id {
            Ok(())
        } else {
            Err(SheetsError::Api {
                status: 404,
                message: "Requested entity was not found.".to_string(),
            })
        }
    }

    fn parse(&self, range: &str) -> Result<(String, A1Range), SheetsError> {
        let unparseable = || SheetsError::Api {
            status: 400,
            message: format!("Unable to parse range: {}", range),
        };
        let parsed = A1Range::parse(range).ok_or_else(unparseable)?;
        let tab = parsed.sheet.clone().ok_or_else(unparseable)?;
        if !self.tabs.lock().unwrap().contains_key(&tab) {
            return Err(unparseable());
        }
        Ok((tab, parsed))
    }
}

#[async_trait]
impl SheetsApi for MemorySheets {
    async fn get_values(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_id(sheet_id)?;
        let (tab, parsed) = self.parse(range)?;

        let tabs = self.tabs.lock().unwrap();
        let grid = &tabs[&tab];

        let first_row = parsed.start.row.unwrap_or(1) as usize;
        let last_row = parsed
            .end
            .and_then(|end| end.row)
            .map(|r| r as usize)
            .unwrap_or(grid.len());
        let first_col = parsed.start.col as usize;
        let last_col = parsed.end.map(|end| end.col).unwrap_or(parsed.start.col) as usize;

        let mut values: Vec<Vec<String>> = (first_row..=last_row.min(grid.len()))
            .map(|r| {
                let source = &grid[r - 1];
                let mut cells: Vec<String> = (first_col..=last_col)
                    .map(|c| source.get(c - 1).cloned().unwrap_or_default())
                    .collect();
                while cells.last().is_some_and(|c| c.is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();
        while values.last().is_some_and(|r| r.is_empty()) {
            values.pop();
        }
        Ok(values)
    }

    async fn update_value(&self, sheet_id: &str, range: &str, value: &str) -> Result<(), SheetsError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_id(sheet_id)?;
        if self.failing.lock().unwrap().contains(range) {
            return Err(SheetsError::Api {
                status: 503,
                message: format!("The service is currently unavailable ({})", range),
            });
        }
        let (tab, parsed) = self.parse(range)?;
        let row = parsed.start.row.ok_or_else(|| SheetsError::Api {
            status: 400,
            message: format!("Range {} is not a single cell", range),
        })? as usize;
        let col = parsed.start.col as usize;

        let mut tabs = self.tabs.lock().unwrap();
        let grid = tabs.get_mut(&tab).expect("tab checked above");
        if grid.len() < row {
            grid.resize(row, Vec::new());
        }
        let cells = &mut grid[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        Ok(())
    }
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

pub fn dashboard_settings() -> DashboardSettings {
    DashboardSettings {
        sheet_id: SHEET_ID.to_string(),
        sheet_name: SHEET_NAME.to_string(),
        range: None,
    }
}
