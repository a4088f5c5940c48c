use log::{debug, warn};

use crate::AggregateResult;
use crate::error::{QueryError, QueryResult};

/// Check a finished run: if every page failed, return `AllPagesFailed`; otherwise log the
/// pages that were skipped and hand back the aggregate.
/// Call after the pool has drained.
pub fn check_for_total_failure(result: AggregateResult) -> QueryResult<AggregateResult> {
    let failed = result.failures.len();
    if result.pages_total > 0 && failed == result.pages_total {
        return Err(QueryError::AllPagesFailed {
            errors: result.failures,
        });
    }
    if failed > 0 {
        warn!(
            "Skipped {} of {} pages due to fetch errors; results are partial",
            failed, result.pages_total
        );
        for err in &result.failures {
            debug!("  skipped: {}", err);
        }
    }
    Ok(result)
}
