/// Rule files: a JSON list of `FilterRule`s.
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::ValidationError;
use crate::model::enums::ScriptKind;
use crate::model::rule::FilterRule;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed rule file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Rule '{rule}' is invalid: {source}")]
    Invalid {
        rule: String,
        #[source]
        source: ValidationError,
    },
}

pub fn load_rules(path: &Path) -> Result<Vec<FilterRule>, StoreError> {
    let data = fs::read_to_string(path)?;
    let rules: Vec<FilterRule> = serde_json::from_str(&data)?;
    debug!(path = %path.display(), count = rules.len(), "loaded rules");
    Ok(rules)
}

pub fn save_rules(path: &Path, rules: &[FilterRule]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(rules)?;
    fs::write(path, data)?;
    debug!(path = %path.display(), count = rules.len(), "saved rules");
    Ok(())
}

/// Validates every rule, stopping at the first invalid one.
pub fn validate_rules(rules: &mut [FilterRule], script: ScriptKind) -> Result<(), StoreError> {
    for rule in rules.iter_mut() {
        rule.validate(script).map_err(|source| StoreError::Invalid {
            rule: rule.name.clone(),
            source,
        })?;
    }
    Ok(())
}
