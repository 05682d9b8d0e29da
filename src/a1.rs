//! A1-notation helpers: column letters, cell names and tab-qualified ranges.

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    static ref PLAIN_SHEET_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref CELL_NAME: Regex = Regex::new(r"^([A-Za-z]+)([0-9]*)$").unwrap();
}

/// Convert a 1-based column number to its letters (1 -> A, 27 -> AA).
pub fn col_to_letter(col: u32) -> String {
    let mut col = col;
    let mut result = String::new();
    while col > 0 {
        col -= 1;
        result.push(((col % 26) as u8 + b'A') as char);
        col /= 26;
    }
    result.chars().rev().collect()
}

/// Convert column letters to a 1-based column number. Case-insensitive.
pub fn letter_to_col(letters: &str) -> Option<u32> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    letters.chars().try_fold(0u32, |acc, c| {
        let digit = (c.to_ascii_uppercase() as u32) - ('A' as u32) + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// Format a cell name such as `G4`.
pub fn cell_name(col: u32, row: u32) -> String {
    format!("{}{}", col_to_letter(col), row)
}

/// Quote a tab name when A1 notation requires it.
///
/// Names that are plain identifiers and cannot be mistaken for a cell
/// reference are returned unchanged; everything else is wrapped in single
/// quotes with embedded quotes doubled.
pub fn quote_sheet_name(name: &str) -> Cow<'_, str> {
    if PLAIN_SHEET_NAME.is_match(name) && !looks_like_cell(name) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("'{}'", name.replace('\'', "''")))
    }
}

fn looks_like_cell(name: &str) -> bool {
    // columns stop at XFD, so longer letter runs ("Sheet2") are plain names
    CELL_NAME
        .captures(name)
        .is_some_and(|caps| caps[1].len() <= 3)
}

/// Range addressing one cell on a tab, e.g. `Sheet2!G4`.
pub fn cell_range(sheet: &str, col: u32, row: u32) -> String {
    format!("{}!{}", quote_sheet_name(sheet), cell_name(col, row))
}

/// Open-ended column span starting at a row, e.g. `Sheet2!A2:K`.
pub fn column_span(sheet: &str, first_col: u32, last_col: u32, first_row: u32) -> String {
    format!(
        "{}!{}:{}",
        quote_sheet_name(sheet),
        cell_name(first_col, first_row),
        col_to_letter(last_col)
    )
}

/// One corner of a range. `row` is `None` for whole-column references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub col: u32,
    pub row: Option<u32>,
}

/// A parsed range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: Option<String>,
    pub start: CellRef,
    pub end: Option<CellRef>,
}

impl A1Range {
    /// Parse `[sheet!]A1[:B2]`. Row-only ranges (`1:5`) are not supported.
    pub fn parse(range: &str) -> Option<A1Range> {
        let (sheet, cells) = match range.rfind('!') {
            Some(pos) => (Some(unquote_sheet_name(&range[..pos])?), &range[pos + 1..]),
            None => (None, range),
        };

        let mut parts = cells.split(':');
        let start = parse_cell_ref(parts.next()?)?;
        let end = match parts.next() {
            Some(part) => Some(parse_cell_ref(part)?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(A1Range { sheet, start, end })
    }
}

fn parse_cell_ref(cell: &str) -> Option<CellRef> {
    let caps = CELL_NAME.captures(cell)?;
    let col = letter_to_col(&caps[1])?;
    let row = match &caps[2] {
        "" => None,
        digits => match digits.parse::<u32>().ok()? {
            0 => return None,
            row => Some(row),
        },
    };
    Some(CellRef { col, row })
}

fn unquote_sheet_name(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    if let Some(inner) = name.strip_prefix('\'') {
        let inner = inner.strip_suffix('\'')?;
        return Some(inner.replace("''", "'"));
    }
    Some(name.to_string())
}
