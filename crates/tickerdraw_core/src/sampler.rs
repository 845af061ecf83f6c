//! Pick a random ticker code out of a spreadsheet.
//!
//! Only a fixed window of one column on the first sheet is read. The window
//! is not clamped to the sheet's extent; a short sheet just yields fewer
//! candidates.

use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use chrono::NaiveTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tickerdraw_error::{DrawError, Result};
use tracing::debug;

/// Zero-based index of column B.
pub const DEFAULT_COLUMN: u32 = 1;
/// Zero-based index of spreadsheet row 2. Row 1 is a header.
pub const DEFAULT_FIRST_ROW: u32 = 1;
/// Zero-based index of spreadsheet row 3846.
pub const DEFAULT_LAST_ROW: u32 = 3845;

/// Cells considered when drawing a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    pub column: u32,
    /// Inclusive.
    pub first_row: u32,
    /// Inclusive.
    pub last_row: u32,
}

impl Default for SampleWindow {
    fn default() -> Self {
        SampleWindow {
            column: DEFAULT_COLUMN,
            first_row: DEFAULT_FIRST_ROW,
            last_row: DEFAULT_LAST_ROW,
        }
    }
}

/// Generator for a single invocation, seeded from the wall clock.
pub fn invocation_rng() -> StdRng {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    StdRng::seed_from_u64(seed)
}

/// Collect the non-empty cells of the window on the first sheet, in row order.
pub fn candidate_codes(buf: &[u8], window: &SampleWindow) -> Result<Vec<String>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(buf)).map_err(DrawError::parse)?;

    let sheet_names = workbook.sheet_names();
    let first_sheet = match sheet_names.first() {
        Some(name) => name,
        None => return Ok(Vec::new()),
    };

    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(DrawError::parse)?;
    debug!(sheet = %first_sheet, start = ?range.start(), end = ?range.end(), "read first sheet");

    Ok(cells_in_window(&range, window))
}

fn cells_in_window(range: &Range<Data>, window: &SampleWindow) -> Vec<String> {
    let mut values = Vec::new();
    for row in window.first_row..=window.last_row {
        match range.get_value((row, window.column)) {
            None | Some(Data::Empty) => continue,
            Some(cell) => {
                let value = cell_text(cell);
                if !value.is_empty() {
                    values.push(value);
                }
            }
        }
    }
    values
}

/// Text of a cell as shown in the sheet.
///
/// Date cells are stored as serial numbers; they are rendered as the date
/// instead. Midnight times are dropped.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) if dt.is_datetime() => match dt.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::MIN => dt.date().to_string(),
            Some(dt) => dt.to_string(),
            None => cell.to_string(),
        },
        _ => cell.to_string(),
    }
}

/// Draw one code uniformly at random from the window.
pub fn sample_code<R>(buf: &[u8], window: &SampleWindow, rng: &mut R) -> Result<String>
where
    R: Rng,
{
    let mut candidates = candidate_codes(buf, window)?;
    if candidates.is_empty() {
        return Err(DrawError::EmptyRange {
            column: window.column,
            first_row: window.first_row,
            last_row: window.last_row,
        });
    }
    debug!(candidates = candidates.len(), "drawing code");

    let idx = rng.random_range(0..candidates.len());
    Ok(candidates.swap_remove(idx))
}
