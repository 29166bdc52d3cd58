use std::collections::BTreeMap;

use crate::entities::ActivityId;

/// One row of the activity tracker spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRow {
    /// 1-based row number in the worksheet (the header being row 1)
    pub row_number: usize,

    /// Value of the `Unique Code` column
    pub activity_id: ActivityId,

    /// Other non-empty cells of the row, keyed by their column header
    pub columns: BTreeMap<String, String>,
}
