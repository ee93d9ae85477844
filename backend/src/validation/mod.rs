//! JSON Schema validation for pipeline options.
//!
//! Options arrive as JSON from the CLI (`--options FILE`) or the HTTP
//! `options` form field. They are checked against a draft 7 schema before
//! deserialization, so a typo like `"decimal_place"` or an out-of-range font
//! size is reported instead of silently falling back to a default.
//!
//! # Embedded Schema
//!
//! `schemas/pipeline-options.json` is embedded at compile time.
//!
//! # Example
//!
//! ```rust,ignore
//! use psmtable::validation::parse_options;
//!
//! let options = parse_options(r#"{ "formatting": { "decimal_places": 3 } }"#)?;
//! assert_eq!(options.formatting.decimal_places, 3);
//!
//! assert!(parse_options(r#"{ "formatting": { "decimal_places": 9 } }"#).is_err());
//! ```

use serde_json::Value;

use crate::error::OptionsError;
use crate::models::PipelineOptions;

const OPTIONS_SCHEMA: &str = include_str!("../../schemas/pipeline-options.json");

/// Validate `data` against `schema`.
///
/// Returns every violation, not just the first.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The embedded options schema.
pub fn options_schema() -> Result<Value, OptionsError> {
    Ok(serde_json::from_str(OPTIONS_SCHEMA)?)
}

/// Validate an options document against the embedded schema.
pub fn validate_options(data: &Value) -> Result<(), Vec<String>> {
    let schema = options_schema().map_err(|e| vec![e.to_string()])?;
    validate(&schema, data)
}

/// Validate then deserialize an options value.
pub fn options_from_value(value: Value) -> Result<PipelineOptions, OptionsError> {
    validate_options(&value).map_err(OptionsError::Schema)?;
    Ok(serde_json::from_value(value)?)
}

/// Parse, validate and deserialize options JSON. Blank input means defaults.
pub fn parse_options(json: &str) -> Result<PipelineOptions, OptionsError> {
    if json.trim().is_empty() {
        return Ok(PipelineOptions::default());
    }
    let value: Value = serde_json::from_str(json)?;
    options_from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractMode, StylePreset};
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = serde_json::to_value(PipelineOptions::default()).unwrap();
        assert!(validate_options(&defaults).is_ok());
    }

    #[test]
    fn test_blank_means_defaults() {
        assert_eq!(parse_options("  ").unwrap(), PipelineOptions::default());
        assert_eq!(parse_options("{}").unwrap(), PipelineOptions::default());
    }

    #[test]
    fn test_partial_options() {
        let options = parse_options(
            r#"{
                "extract": { "skip_rows": 9 },
                "formatting": { "style_preset": "lancet", "decimal_places": 3 },
                "significance": null
            }"#,
        )
        .unwrap();

        assert_eq!(options.extract, ExtractMode::SkipRows(9));
        assert_eq!(options.formatting.style_preset, StylePreset::Lancet);
        assert_eq!(options.formatting.decimal_places, 3);
        assert!(options.significance.is_none());
    }

    #[test]
    fn test_schema_violations_listed() {
        let result = options_from_value(json!({
            "formatting": { "decimal_places": 9, "font_size": "big" },
            "unknown": true
        }));

        match result {
            Err(OptionsError::Schema(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected schema errors, got {:?}", other),
        }
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(parse_options("{ nope"), Err(OptionsError::Json(_))));
    }

    #[test]
    fn test_extract_mode_is_exclusive() {
        let both = json!({ "extract": { "skip_rows": 2, "marker": "Characteristic" } });
        assert!(validate_options(&both).is_err());
    }
}
