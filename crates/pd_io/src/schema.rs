//! JSON Schema (draft 2020-12) check for run configurations.
//!
//! The schema ships inside the crate; nothing is resolved over the network.
//! Without the `schemaval` feature validation is a no-op.

use serde_json::Value;

use crate::IoResult;

/// Raw schema text, as embedded at build time.
pub const RUN_CONFIG_SCHEMA: &str = include_str!("../schemas/run_config.schema.json");

#[cfg(feature = "schemaval")]
pub fn validate_run_config(instance: &Value) -> IoResult<()> {
    use crate::IoError;

    let schema: Value = serde_json::from_str(RUN_CONFIG_SCHEMA)?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| IoError::Schema(vec![format!("schema does not compile: {e}")]))?;

    let errors: Vec<String> = validator.iter_errors(instance).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(violations = errors.len(), "run configuration failed schema validation");
        Err(IoError::Schema(errors))
    }
}

#[cfg(not(feature = "schemaval"))]
pub fn validate_run_config(_instance: &Value) -> IoResult<()> {
    Ok(())
}
