//! Document rule contracts.
//!
//! A document rule is a pluggable unit of work (convert, notify, tag, ...)
//! executed against a document when its identifier is configured on the
//! document's parent folder. This crate holds the contract every rule
//! satisfies, the registry that resolves identifiers to live rules, and the
//! single execution path shared by inline dispatch and background jobs.

pub mod execute;
pub mod outcome;
pub mod registry;
pub mod request;
pub mod rule;

pub use execute::execute_rule;
pub use outcome::{RuleOutcome, SkipReason};
pub use registry::{RuleRegistry, StaticRuleRegistry};
pub use request::{ExecutionMode, RuleExecutionRequest};
pub use rule::{DocumentRule, RuleError};
