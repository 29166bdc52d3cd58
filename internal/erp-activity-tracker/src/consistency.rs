use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::Serialize;

use erp_contract_common::entities::ActivityId;

/// Result of the comparison between the tracker and the OpenAPI activity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Tracker ids that no OpenAPI operation is annotated with
    #[serde(rename = "missingInApi")]
    pub missing_in_api: Vec<ActivityId>,

    /// OpenAPI ids that the tracker does not list
    #[serde(rename = "missingInTracker")]
    pub missing_in_tracker: Vec<ActivityId>,
}

impl ConsistencyReport {
    /// Both sides list exactly the same ids.
    ///
    /// A drift in a single direction is still an inconsistency.
    pub fn is_consistent(&self) -> bool {
        self.missing_in_api.is_empty() && self.missing_in_tracker.is_empty()
    }
}

impl Display for ConsistencyReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_consistent() {
            return write!(f, "Tracker and OpenAPI activity ids are consistent.");
        }

        writeln!(f, "Tracker and OpenAPI activity ids are inconsistent.")?;
        writeln!(f, "Missing in OpenAPI: {}", display_ids(&self.missing_in_api))?;
        write!(f, "Missing in tracker: {}", display_ids(&self.missing_in_tracker))
    }
}

fn display_ids(ids: &[ActivityId]) -> String {
    let ids = ids.iter().map(ActivityId::as_str).collect::<Vec<_>>();
    format!("[{}]", ids.join(", "))
}

/// Compare the tracker ids `T` with the OpenAPI ids `A`:
/// `missing_in_api = T − A` and `missing_in_tracker = A − T`.
///
/// Neither input is modified; the output lists are sorted.
pub fn check_consistency(
    tracker_ids: &BTreeSet<ActivityId>,
    api_ids: &BTreeSet<ActivityId>,
) -> ConsistencyReport {
    ConsistencyReport {
        missing_in_api: tracker_ids.difference(api_ids).cloned().collect(),
        missing_in_tracker: api_ids.difference(tracker_ids).cloned().collect(),
    }
}
