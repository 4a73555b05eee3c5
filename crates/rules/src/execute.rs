//! The resolve -> applicability -> execute path.
//!
//! Inline dispatch and background job resumption both end up here, so a rule
//! behaves the same whichever way it was reached.

use std::panic::{AssertUnwindSafe, catch_unwind};

use docrules_core::{DocumentHandle, RuleId};
use tracing::{debug, warn};

use crate::outcome::{RuleOutcome, SkipReason};
use crate::registry::RuleRegistry;
use crate::rule::RuleError;

/// Run one rule on one document.
///
/// - unknown identifier: warning, `Skipped(RuleNotFound)`
/// - rule declines the document: debug, `Skipped(NotApplicable)`; `execute`
///   is not called
/// - otherwise `execute`; its error is returned for the caller's isolation
///   boundary to log and record
///
/// A panic in `is_applicable` or `execute` is caught and returned as
/// [`RuleError::Panicked`]. Writes the rule staged before panicking stay in
/// the session; callers decide whether to save.
pub fn execute_rule(
    registry: &dyn RuleRegistry,
    document: &DocumentHandle<'_>,
    rule_id: &RuleId,
) -> Result<RuleOutcome, RuleError> {
    let Some(rule) = registry.resolve(rule_id) else {
        warn!(
            rule_id = %rule_id,
            document = %document.path(),
            "unable to look up document rule; skipping execution"
        );
        return Ok(RuleOutcome::skipped(SkipReason::RuleNotFound));
    };

    let run = catch_unwind(AssertUnwindSafe(|| -> Result<RuleOutcome, RuleError> {
        if !rule.is_applicable(document) {
            debug!(
                rule_id = %rule_id,
                document = %document.path(),
                "rule is not applicable on document; skipping"
            );
            return Ok(RuleOutcome::skipped(SkipReason::NotApplicable));
        }

        rule.execute(document)?;
        Ok(RuleOutcome::Succeeded)
    }));

    run.unwrap_or_else(|payload| Err(RuleError::panicked(payload.as_ref())))
}
