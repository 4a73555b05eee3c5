//! Infrastructure layer: rule dispatch, background jobs, configuration.

pub mod config;
pub mod jobs;
pub mod rule_dispatcher;

pub use config::{ConfigError, DispatchConfig, DocRulesConfig, ExecutorSettings};
pub use rule_dispatcher::{DispatchReport, RuleDispatch, RuleDispatcher, configured_rule_ids};
