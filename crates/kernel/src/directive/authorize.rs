//! Include whitelisting.
//!
//! Requested includes must be in the policy's permitted set and may go at most
//! one relationship deep (`"author.profile"` is fine, `"a.b.c"` is not).

use std::collections::HashSet;

use tracing::warn;

use crate::error::{AppError, AppResult};

/// Maximum number of `.` separators in a requested include.
pub const MAX_INCLUDE_DOTS: usize = 1;

/// Check requested includes against the permitted set and the depth limit.
///
/// Both checks run before failing. The error lists every offending include as
/// `include=<path>`, permission violations first, then depth violations; a
/// path failing both checks is named once.
pub fn authorize_includes<S: AsRef<str>>(
    requested: &[S],
    permitted: &HashSet<String>,
) -> AppResult<()> {
    let requested: Vec<&str> = requested.iter().map(|path| path.as_ref()).collect();
    let illegal = requested
        .iter()
        .filter(|path| !permitted.contains(**path));
    let too_deep = requested
        .iter()
        .filter(|path| path.matches('.').count() > MAX_INCLUDE_DOTS);

    let mut offending: Vec<String> = Vec::new();
    for path in illegal.chain(too_deep) {
        let entry = format!("include={path}");
        if !offending.contains(&entry) {
            offending.push(entry);
        }
    }

    if offending.is_empty() {
        return Ok(());
    }

    warn!(includes = ?offending, "rejected unpermitted includes");
    Err(AppError::UnpermittedInclude(offending))
}
