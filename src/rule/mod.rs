pub mod access;
pub mod firewall;
pub mod ids;
pub mod model;
pub mod parser;
pub mod predicate;

// Re-export main types and functions
pub use model::{EvalOrder, ParsedRule, RuleType, SecurityRule, StructuredRule};
pub use parser::{ParsedBatch, RuleFailure, parse_batch, parse_record, parse_rule, parse_rule_named};
pub use predicate::Relation;
