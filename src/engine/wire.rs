//! Adapter for the shapes an engine binding may use for its transformation
//! result. Some bindings hand back each history step as a record
//! (`{"rule": "...", "words": [...]}`), others as a positional pair
//! (`["rule", [...]]`). Both end up as [`TransformationResult`] here and
//! nowhere else.

use serde::Deserialize;

use crate::errors::EngineError;
use crate::types::{TransformationResult, TransformationStep, Word};

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WireStep {
    Record {
        #[serde(alias = "rule_label")]
        rule: String,
        #[serde(alias = "words_after")]
        words: Vec<Word>,
    },
    Pair(String, Vec<Word>),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct WireTransformation {
    #[serde(default)]
    pub history: Vec<WireStep>,
    pub output: Vec<Word>,
}

impl From<WireStep> for TransformationStep {
    fn from(step: WireStep) -> Self {
        let (rule_label, words_after) = match step {
            WireStep::Record { rule, words } => (rule, words),
            WireStep::Pair(rule, words) => (rule, words),
        };
        TransformationStep {
            rule_label,
            words_after,
        }
    }
}

impl From<WireTransformation> for TransformationResult {
    fn from(wire: WireTransformation) -> Self {
        TransformationResult {
            history: wire.history.into_iter().map(TransformationStep::from).collect(),
            output: wire.output,
        }
    }
}

pub fn transformation_from_value(value: serde_json::Value) -> Result<TransformationResult, EngineError> {
    serde_json::from_value::<WireTransformation>(value)
        .map(TransformationResult::from)
        .map_err(|e| EngineError::Transformation(format!("Unreadable transformation result: {}", e)))
}

pub fn transformation_from_json(json: &str) -> Result<TransformationResult, EngineError> {
    serde_json::from_str::<WireTransformation>(json)
        .map(TransformationResult::from)
        .map_err(|e| EngineError::Transformation(format!("Unreadable transformation result: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> TransformationResult {
        TransformationResult {
            history: vec![TransformationStep {
                rule_label: "lenition".into(),
                words_after: vec!["kado".into(), "pira".into()],
            }],
            output: vec!["kado".into(), "pira".into()],
        }
    }

    #[test]
    fn record_steps() {
        let json = r#"{"history":[{"rule":"lenition","words":["kado","pira"]}],"output":["kado","pira"]}"#;
        assert_eq!(transformation_from_json(json), Ok(expected()));
    }

    #[test]
    fn record_steps_accept_long_field_names() {
        let json = r#"{"history":[{"rule_label":"lenition","words_after":["kado","pira"]}],"output":["kado","pira"]}"#;
        assert_eq!(transformation_from_json(json), Ok(expected()));
    }

    #[test]
    fn positional_steps() {
        let json = r#"{"history":[["lenition",["kado","pira"]]],"output":["kado","pira"]}"#;
        assert_eq!(transformation_from_json(json), Ok(expected()));
    }

    #[test]
    fn missing_history_means_no_rules() {
        let value = serde_json::json!({ "output": ["kato"] });
        let result = transformation_from_value(value).unwrap();
        assert!(result.history.is_empty());
        assert_eq!(result.output, vec!["kato".to_string()]);
    }

    #[test]
    fn malformed_steps_are_transformation_errors() {
        let json = r#"{"history":[42],"output":[]}"#;
        assert!(matches!(
            transformation_from_json(json),
            Err(EngineError::Transformation(_))
        ));
    }
}
