use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use slog::{Logger, debug, warn};
use thiserror::Error;

use erp_contract_common::entities::{ActivityId, TrackerRow};
use erp_contract_common::logging::LoggerExtensions;

use crate::UNIQUE_CODE_COLUMN;

/// Error raised when reading a tracker workbook.
#[derive(Debug, Error)]
pub enum TrackerReadError {
    /// The workbook could not be opened or its first sheet could not be read.
    #[error("could not read tracker workbook '{}'", path.display())]
    Workbook {
        /// Path of the workbook
        path: PathBuf,
        /// Underlying error
        #[source]
        source: calamine::Error,
    },

    /// The workbook has no worksheet.
    #[error("tracker workbook '{}' has no worksheet", path.display())]
    NoWorksheet {
        /// Path of the workbook
        path: PathBuf,
    },

    /// The header row of the first sheet has no activity id column.
    #[error("tracker has no '{column}' column")]
    MissingColumn {
        /// Expected header
        column: &'static str,
    },
}

/// Rows of the first sheet of the activity tracker workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityTracker {
    rows: Vec<TrackerRow>,
}

impl ActivityTracker {
    /// Read the first sheet of a workbook (xlsx, xlsm, xls or ods).
    pub fn from_file(path: &Path, logger: &Logger) -> Result<Self, TrackerReadError> {
        let logger = logger.new_with_component_name::<Self>();
        let workbook_error = |source| TrackerReadError::Workbook {
            path: path.to_path_buf(),
            source,
        };

        debug!(logger, "Reading tracker workbook"; "path" => %path.display());
        let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| TrackerReadError::NoWorksheet {
                path: path.to_path_buf(),
            })?
            .map_err(workbook_error)?;

        let mut rows = range.rows();
        let header = rows.next().unwrap_or_default();
        let tracker = Self::from_rows(header, rows, &logger)?;
        debug!(logger, "Tracker read"; "rows" => tracker.rows.len());

        Ok(tracker)
    }

    /// Build from a header row and the data rows that follow it.
    ///
    /// Rows with an empty activity id cell are skipped.
    pub fn from_rows<'a, I>(
        header: &[Data],
        rows: I,
        logger: &Logger,
    ) -> Result<Self, TrackerReadError>
    where
        I: IntoIterator<Item = &'a [Data]>,
    {
        let headers: Vec<String> = header.iter().map(cell_text).collect();
        let id_column = headers
            .iter()
            .position(|h| h == UNIQUE_CODE_COLUMN)
            .ok_or(TrackerReadError::MissingColumn {
                column: UNIQUE_CODE_COLUMN,
            })?;

        let mut tracker_rows = Vec::new();
        for (index, row) in rows.into_iter().enumerate() {
            // +1 for the header, +1 as worksheet rows are 1-based
            let row_number = index + 2;
            let Some(activity_id) = row
                .get(id_column)
                .and_then(|cell| ActivityId::new(cell_text(cell)).ok())
            else {
                debug!(logger, "Skipping row without activity id"; "row" => row_number);
                continue;
            };

            let columns: BTreeMap<String, String> = headers
                .iter()
                .zip(row.iter())
                .enumerate()
                .filter(|(column, (header, _))| *column != id_column && !header.is_empty())
                .map(|(_, (header, cell))| (header.clone(), cell_text(cell)))
                .filter(|(_, value)| !value.is_empty())
                .collect();

            tracker_rows.push(TrackerRow {
                row_number,
                activity_id,
                columns,
            });
        }

        let tracker = Self { rows: tracker_rows };
        tracker.warn_duplicates(logger);

        Ok(tracker)
    }

    /// Rows in worksheet order
    pub fn rows(&self) -> &[TrackerRow] {
        &self.rows
    }

    /// Set of the activity ids of the tracker
    pub fn activity_ids(&self) -> BTreeSet<ActivityId> {
        self.rows.iter().map(|row| row.activity_id.clone()).collect()
    }

    fn warn_duplicates(&self, logger: &Logger) {
        let mut seen = BTreeSet::new();
        for row in &self.rows {
            if !seen.insert(&row.activity_id) {
                warn!(logger, "Activity id listed on several tracker rows";
                    "activity_id" => %row.activity_id, "row" => row.row_number
                );
            }
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        _ => cell.to_string().trim().to_string(),
    }
}
