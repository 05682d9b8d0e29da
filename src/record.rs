//! Positional sheet schema and the typed row record built from it.
//!
//! The dashboard tab is laid out as columns `A..K`, with the header on row 1
//! and data from row 2. Both the read mapping and save derivation go through
//! [`Field`], so this is the only place the column order is written down.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::a1;

/// First sheet row holding data; row 1 is the header.
pub const FIRST_DATA_ROW: u32 = 2;

/// Columns of the dashboard tab, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    Date,
    OriginalResumeUrl,
    JobProfileUrl,
    JobDetails,
    CompanyName,
    Status,
    JobSearchFeedback,
    ApplyUsingOriginalResume,
    TailoredResumeUrl,
    AdditionalComments,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Id,
        Field::Date,
        Field::OriginalResumeUrl,
        Field::JobProfileUrl,
        Field::JobDetails,
        Field::CompanyName,
        Field::Status,
        Field::JobSearchFeedback,
        Field::ApplyUsingOriginalResume,
        Field::TailoredResumeUrl,
        Field::AdditionalComments,
    ];

    pub const EDITABLE: [Field; 4] = [
        Field::Status,
        Field::JobSearchFeedback,
        Field::ApplyUsingOriginalResume,
        Field::AdditionalComments,
    ];

    /// 0-based position of the field within a fetched row.
    pub fn column_index(self) -> usize {
        match self {
            Field::Id => 0,
            Field::Date => 1,
            Field::OriginalResumeUrl => 2,
            Field::JobProfileUrl => 3,
            Field::JobDetails => 4,
            Field::CompanyName => 5,
            Field::Status => 6,
            Field::JobSearchFeedback => 7,
            Field::ApplyUsingOriginalResume => 8,
            Field::TailoredResumeUrl => 9,
            Field::AdditionalComments => 10,
        }
    }

    /// Sheet column letter, e.g. `G` for [`Field::Status`].
    pub fn column_letter(self) -> String {
        a1::col_to_letter(self.column_index() as u32 + 1)
    }

    pub fn is_editable(self) -> bool {
        Self::EDITABLE.contains(&self)
    }

    /// Wire name used in JSON payloads.
    pub fn name(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Date => "date",
            Field::OriginalResumeUrl => "originalResumeUrl",
            Field::JobProfileUrl => "jobProfileUrl",
            Field::JobDetails => "jobDetails",
            Field::CompanyName => "companyName",
            Field::Status => "status",
            Field::JobSearchFeedback => "jobSearchFeedback",
            Field::ApplyUsingOriginalResume => "applyUsingOriginalResume",
            Field::TailoredResumeUrl => "tailoredResumeUrl",
            Field::AdditionalComments => "additionalComments",
        }
    }

    /// Look up a field by wire name. The snake_case spelling is accepted too.
    pub fn from_name(name: &str) -> Option<Field> {
        let compact: String = name.chars().filter(|c| *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(&compact))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Range covering every schema column from the first data row down.
pub fn default_read_range(sheet_name: &str) -> String {
    a1::column_span(
        sheet_name,
        1,
        Field::ALL.len() as u32,
        FIRST_DATA_ROW,
    )
}

/// Application status as stored in column G.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Approved,
    #[serde(rename = "Awaiting approval")]
    AwaitingApproval,
    Rejected,
    Applied,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Approved,
        Status::AwaitingApproval,
        Status::Rejected,
        Status::Applied,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::Approved => "Approved",
            Status::AwaitingApproval => "Awaiting approval",
            Status::Rejected => "Rejected",
            Status::Applied => "Applied",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s.trim())
            .ok_or_else(|| format!("'{}' is not one of the known statuses", s))
    }
}

/// Literal encoding of booleans in the sheet.
pub fn bool_to_sheet(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

/// One job application, i.e. one data row of the tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub date: String,
    pub original_resume_url: String,
    pub job_profile_url: String,
    pub job_details: String,
    pub company_name: String,
    pub status: Option<Status>,
    pub job_search_feedback: String,
    pub apply_using_original_resume: bool,
    pub tailored_resume_url: String,
    pub additional_comments: String,
}

impl JobApplication {
    /// Build a record from one fetched row. Missing trailing cells read as
    /// empty; `index` is the row's position among non-empty rows and only
    /// feeds the fallback id.
    pub fn from_row(index: usize, row: &[String]) -> Self {
        let cell = |field: Field| -> String {
            row.get(field.column_index()).cloned().unwrap_or_default()
        };

        let id = match cell(Field::Id) {
            id if id.is_empty() => format!("row-{}", index),
            id => id,
        };

        let raw_status = cell(Field::Status);
        let status = if raw_status.trim().is_empty() {
            None
        } else {
            match raw_status.parse::<Status>() {
                Ok(status) => Some(status),
                Err(e) => {
                    log::warn!("Row {}: {}", id, e);
                    None
                }
            }
        };

        JobApplication {
            date: cell(Field::Date),
            original_resume_url: cell(Field::OriginalResumeUrl),
            job_profile_url: cell(Field::JobProfileUrl),
            job_details: cell(Field::JobDetails),
            company_name: cell(Field::CompanyName),
            status,
            job_search_feedback: cell(Field::JobSearchFeedback),
            apply_using_original_resume: cell(Field::ApplyUsingOriginalResume) == "TRUE",
            tailored_resume_url: cell(Field::TailoredResumeUrl),
            additional_comments: cell(Field::AdditionalComments),
            id,
        }
    }

    /// 1-based sheet row this record is written back to (`id + 1`).
    pub fn sheet_row(&self) -> Option<u32> {
        sheet_row_for_id(&self.id)
    }

    /// Value of `field` as it is encoded in the sheet.
    pub fn cell_value(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.clone(),
            Field::Date => self.date.clone(),
            Field::OriginalResumeUrl => self.original_resume_url.clone(),
            Field::JobProfileUrl => self.job_profile_url.clone(),
            Field::JobDetails => self.job_details.clone(),
            Field::CompanyName => self.company_name.clone(),
            Field::Status => self.status.map(|s| s.label().to_string()).unwrap_or_default(),
            Field::JobSearchFeedback => self.job_search_feedback.clone(),
            Field::ApplyUsingOriginalResume => {
                bool_to_sheet(self.apply_using_original_resume).to_string()
            }
            Field::TailoredResumeUrl => self.tailored_resume_url.clone(),
            Field::AdditionalComments => self.additional_comments.clone(),
        }
    }
}

/// Row ids are 0-based offsets from the header row.
pub fn sheet_row_for_id(id: &str) -> Option<u32> {
    id.trim().parse::<u32>().ok()?.checked_add(1)
}

/// Map a fetched matrix to records, skipping rows with no cells at all.
pub fn records_from_values(values: &[Vec<String>]) -> Vec<JobApplication> {
    values
        .iter()
        .filter(|row| !row.is_empty())
        .enumerate()
        .map(|(index, row)| JobApplication::from_row(index, row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn columns_follow_the_fixed_schema() {
        let letters: Vec<String> = Field::ALL.iter().map(|f| f.column_letter()).collect();
        assert_eq!(
            letters,
            vec!["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K"]
        );
        assert_eq!(Field::Status.column_letter(), "G");
        assert_eq!(Field::JobSearchFeedback.column_letter(), "H");
        assert_eq!(Field::ApplyUsingOriginalResume.column_letter(), "I");
        assert_eq!(Field::AdditionalComments.column_letter(), "K");
    }

    #[test]
    fn only_four_fields_are_editable() {
        let editable: Vec<Field> = Field::ALL.into_iter().filter(|f| f.is_editable()).collect();
        assert_eq!(editable.len(), 4);
        for field in [
            Field::Id,
            Field::Date,
            Field::OriginalResumeUrl,
            Field::JobProfileUrl,
            Field::CompanyName,
            Field::TailoredResumeUrl,
        ] {
            assert!(!field.is_editable(), "{} should be read-only", field);
        }
    }

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("job_search_feedback"), Some(Field::JobSearchFeedback));
        assert_eq!(Field::from_name("salary"), None);
    }

    #[test]
    fn default_range_spans_all_columns() {
        assert_eq!(default_read_range("Sheet2"), "Sheet2!A2:K");
    }

    #[test]
    fn full_row_is_mapped_positionally() {
        let record = JobApplication::from_row(
            0,
            &row(&[
                "3",
                "2024-05-01",
                "https://resume/orig",
                "https://jobs/1",
                "Backend role",
                "Acme",
                "Awaiting approval",
                "looks good",
                "TRUE",
                "https://resume/tailored",
                "follow up",
            ]),
        );

        assert_eq!(record.id, "3");
        assert_eq!(record.date, "2024-05-01");
        assert_eq!(record.original_resume_url, "https://resume/orig");
        assert_eq!(record.job_profile_url, "https://jobs/1");
        assert_eq!(record.job_details, "Backend role");
        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.status, Some(Status::AwaitingApproval));
        assert_eq!(record.job_search_feedback, "looks good");
        assert!(record.apply_using_original_resume);
        assert_eq!(record.tailored_resume_url, "https://resume/tailored");
        assert_eq!(record.additional_comments, "follow up");
        assert_eq!(record.sheet_row(), Some(4));
    }

    #[test]
    fn short_rows_default_missing_cells() {
        let record = JobApplication::from_row(0, &row(&["7", "2024-05-02"]));
        assert_eq!(record.company_name, "");
        assert_eq!(record.status, None);
        assert!(!record.apply_using_original_resume);
        assert_eq!(record.additional_comments, "");
    }

    #[test]
    fn only_literal_true_is_true() {
        for raw in ["true", "yes", "1", "FALSE", ""] {
            let mut cells = vec![String::new(); 9];
            cells[0] = "1".into();
            cells[8] = raw.into();
            assert!(!JobApplication::from_row(0, &cells).apply_using_original_resume);
        }
    }

    #[test]
    fn unknown_status_reads_as_none() {
        let record = JobApplication::from_row(0, &row(&["1", "", "", "", "", "", "Ghosted"]));
        assert_eq!(record.status, None);
    }

    #[test]
    fn empty_rows_are_dropped_and_fallback_ids_use_position() {
        let values = vec![
            row(&["1", "d1"]),
            vec![],
            row(&["", "d2"]),
            row(&["4", "d3"]),
        ];
        let records = records_from_values(&values);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[1].id, "row-1");
        assert_eq!(records[1].sheet_row(), None);
        assert_eq!(records[2].id, "4");
    }

    #[test]
    fn status_labels_parse() {
        for status in Status::ALL {
            assert_eq!(status.label().parse::<Status>(), Ok(status));
        }
        assert!("approved".parse::<Status>().is_err());
    }

    #[test]
    fn cell_values_use_sheet_encoding() {
        let mut record = JobApplication::from_row(0, &row(&["2"]));
        assert_eq!(record.cell_value(Field::ApplyUsingOriginalResume), "FALSE");
        assert_eq!(record.cell_value(Field::Status), "");
        record.apply_using_original_resume = true;
        record.status = Some(Status::Rejected);
        assert_eq!(record.cell_value(Field::ApplyUsingOriginalResume), "TRUE");
        assert_eq!(record.cell_value(Field::Status), "Rejected");
    }

    #[test]
    fn records_serialize_with_wire_names() {
        let record = JobApplication::from_row(
            0,
            &row(&["5", "", "", "", "", "Acme", "Awaiting approval", "", "TRUE"]),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "5");
        assert_eq!(json["companyName"], "Acme");
        assert_eq!(json["status"], "Awaiting approval");
        assert_eq!(json["applyUsingOriginalResume"], true);
        assert_eq!(json["tailoredResumeUrl"], "");
    }
}
