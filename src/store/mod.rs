pub mod rule_store;

pub use rule_store::{load_rules, save_rules, StoreError};
