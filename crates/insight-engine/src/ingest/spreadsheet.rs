//! Excel workbook ingestion via calamine.
//!
//! The first row of the selected sheet is the header. Blank header cells become
//! `Unnamed: <i>` and repeated names get `.1`, `.2` suffixes. Each column takes
//! the narrowest type that fits all of its non-empty cells: integers become
//! Int64, any mix of numbers Float64, booleans Boolean, everything else String.

use super::{FileFormat, FormatLoader, LoadOptions};
use crate::error::{AnalyticsError, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Which worksheet to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Zero-based sheet position.
    Index(usize),
    /// Sheet name.
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl FromStr for SheetSelector {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().parse::<usize>() {
            Ok(index) => Ok(Self::Index(index)),
            Err(_) if !s.trim().is_empty() => Ok(Self::Name(s.trim().to_string())),
            Err(_) => Err(AnalyticsError::InvalidArgument(
                "sheet selector must not be empty".to_string(),
            )),
        }
    }
}

/// `.xlsx` / `.xls` workbooks.
pub struct SpreadsheetLoader;

impl FormatLoader for SpreadsheetLoader {
    fn format(&self) -> FileFormat {
        FileFormat::Spreadsheet
    }

    fn load(&self, path: &Path, options: &LoadOptions) -> Result<DataFrame> {
        let mut workbook = open_workbook_auto(path)?;
        let range = match &options.sheet {
            SheetSelector::Index(index) => workbook.worksheet_range_at(*index).ok_or_else(|| {
                AnalyticsError::InvalidArgument(format!(
                    "workbook has no sheet at index {}",
                    index
                ))
            })??,
            SheetSelector::Name(name) => {
                if !workbook.sheet_names().iter().any(|s| s == name) {
                    return Err(AnalyticsError::InvalidArgument(format!(
                        "workbook has no sheet named '{}'",
                        name
                    )));
                }
                workbook.worksheet_range(name)?
            }
        };
        debug!("Read sheet {:?} with size {:?}", options.sheet, range.get_size());
        range_to_dataframe(&range)
    }
}

/// Convert a worksheet range (header row first) into a DataFrame.
pub(crate) fn range_to_dataframe(range: &Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.collect();
    let empty = Data::Empty;

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&empty))
                .collect();
            build_column(name, &cells)
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

/// Header labels with blanks named by position and repeats suffixed.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut used = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let raw = match cell {
                Data::Empty => String::new(),
                other => other.to_string().trim().to_string(),
            };
            let base = if raw.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                raw
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while used.contains(&name) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Integer,
    Float,
    Boolean,
    Text,
}

fn cell_kind(cell: &Data) -> Option<CellKind> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(_) => Some(CellKind::Integer),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(CellKind::Integer)
        }
        Data::Float(_) => Some(CellKind::Float),
        Data::Bool(_) => Some(CellKind::Boolean),
        _ => Some(CellKind::Text),
    }
}

fn column_kind(cells: &[&Data]) -> CellKind {
    let mut kinds = cells.iter().filter_map(|c| cell_kind(c));
    let Some(first) = kinds.next() else {
        return CellKind::Float;
    };
    kinds.fold(first, |acc, kind| match (acc, kind) {
        (a, b) if a == b => a,
        (CellKind::Integer, CellKind::Float) | (CellKind::Float, CellKind::Integer) => {
            CellKind::Float
        }
        _ => CellKind::Text,
    })
}

fn build_column(name: &str, cells: &[&Data]) -> Column {
    match column_kind(cells) {
        CellKind::Integer => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        CellKind::Boolean => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        CellKind::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Empty | Data::Error(_) => None,
                    Data::DateTime(dt) => Some(dt.as_f64().to_string()),
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name.into(), values)
        }
    }
}
