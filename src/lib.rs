/*!
# Sheet Dashboard

A small internal dashboard for reviewing job applications stored in a Google
Sheets tab. The spreadsheet is the datastore; this crate proxies reads and
writes to it and implements the edit-tracking and batch-save protocol the
dashboard page relies on.

## Architecture

### Spreadsheet proxy
- **sheets**: the `SheetsApi` trait plus a Google Sheets v4 client
  authenticated as a service account (signed JWT exchanged for a bearer
  token)
- **batch**: concurrent fan-out of single-cell writes, joined on all, with a
  per-instruction result list

### HTTP layer
- **app**: axum router and handlers
  - `GET /api/sheets?sheetId&range` - raw cell matrix
  - `POST /api/sheets` - write one cell
  - `POST /api/bulk-update` - write many cells, all-or-nothing reporting
  - `GET /api/dashboard/rows`, `POST /api/dashboard/save` - the configured
    dashboard tab, mapped through the fixed column schema
  - `GET /` - the dashboard page

### Dashboard model
- **record**: the positional column schema (`A..K`) and the typed row record
- **edits**: pending edits per row (last write wins) and their translation
  into `(range, value)` instructions
- **dashboard**: the view session state machine (Clean / Dirty / Saving)

### Support
- **a1**: A1-notation helpers
- **config**: TOML + environment configuration
- **error**: error types for every layer

## Limitations

- Column order is fixed; reordering the sheet without updating
  `record::Field` writes to the wrong cells.
- A failed batch is not rolled back: writes that landed stay written.
- No retries, timeouts or conflict detection between sessions.
*/

pub mod a1;
pub mod app;
pub mod batch;
pub mod config;
pub mod dashboard;
pub mod edits;
pub mod error;
pub mod record;
pub mod sheets;

pub use config::AppConfig;
pub use dashboard::{DashboardBackend, DashboardSession, HttpBackend, SaveOutcome, SaveState};
pub use edits::{EditAccumulator, FieldEdit, PendingEdit};
pub use error::{ApiError, DashboardError, EditError, SheetsError};
pub use record::{Field, JobApplication, Status};
pub use sheets::{CellUpdate, SheetsApi};
