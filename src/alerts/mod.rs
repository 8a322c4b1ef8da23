pub mod conditions;
pub mod engine;
pub mod rules;

pub use conditions::{AlertConditions, Operator};
pub use engine::{AlertEngine, DataSnapshot, RenotifyPolicy};
pub use rules::{AlertRules, RuleUpdate};
