use tracing::debug;

use crate::errors::EngineContractError;
use crate::types::{TransformationResult, Word};

/// State of one word right after one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepState {
    pub current: Word,
    /// True when this rule (not an earlier one) altered the word.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciledRow {
    pub steps: Vec<StepState>,
    /// Always displayed, whatever the last rule did.
    pub final_form: Word,
}

/// Per word, per rule: the form after the rule and whether the rule changed it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciledMatrix {
    pub rows: Vec<ReconciledRow>,
}

impl ReconciledMatrix {
    pub fn changed(&self, word: usize, step: usize) -> Option<bool> {
        self.rows
            .get(word)
            .and_then(|row| row.steps.get(step))
            .map(|state| state.changed)
    }
}

/// Rebuilds, for every word and rule, whether that rule changed the word
/// compared to the state just before it.
///
/// Fails when the engine broke the alignment of its lists: a step or the
/// output with the wrong length, or an output differing from the last step.
pub fn reconcile(
    original_words: &[Word],
    result: &TransformationResult,
) -> Result<ReconciledMatrix, EngineContractError> {
    check_alignment(original_words, result)?;

    let rows = original_words
        .iter()
        .enumerate()
        .map(|(i, original)| {
            let mut previous = original;
            let steps = result
                .history
                .iter()
                .map(|step| {
                    let current = &step.words_after[i];
                    let state = StepState {
                        current: current.clone(),
                        changed: previous != current,
                    };
                    previous = current;
                    state
                })
                .collect();
            ReconciledRow {
                steps,
                final_form: result.output[i].clone(),
            }
        })
        .collect();

    debug!(
        words = original_words.len(),
        steps = result.history.len(),
        "history reconciled"
    );
    Ok(ReconciledMatrix { rows })
}

fn check_alignment(
    original_words: &[Word],
    result: &TransformationResult,
) -> Result<(), EngineContractError> {
    let expected = original_words.len();

    if result.output.len() != expected {
        return Err(EngineContractError::OutputLength {
            expected,
            actual: result.output.len(),
        });
    }

    for (step, transformation) in result.history.iter().enumerate() {
        if transformation.words_after.len() != expected {
            return Err(EngineContractError::StepLength {
                step,
                rule: transformation.rule_label.clone(),
                expected,
                actual: transformation.words_after.len(),
            });
        }
    }

    if let Some(last) = result.history.last() {
        let mismatch = last
            .words_after
            .iter()
            .zip(&result.output)
            .position(|(last, output)| last != output);
        if let Some(index) = mismatch {
            return Err(EngineContractError::FinalMismatch {
                index,
                output: result.output[index].clone(),
                last: last.words_after[index].clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransformationStep;

    fn words(list: &[&str]) -> Vec<Word> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn step(rule: &str, after: &[&str]) -> TransformationStep {
        TransformationStep {
            rule_label: rule.to_string(),
            words_after: words(after),
        }
    }

    #[test]
    fn compares_against_previous_step_not_original() {
        let original = words(&["kato"]);
        let result = TransformationResult {
            history: vec![
                step("lenition", &["kado"]),
                step("noop", &["kado"]),
                step("apocope", &["kad"]),
            ],
            output: words(&["kad"]),
        };
        let matrix = reconcile(&original, &result).unwrap();
        let flags: Vec<bool> = matrix.rows[0].steps.iter().map(|s| s.changed).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_eq!(matrix.rows[0].final_form, "kad");
    }

    #[test]
    fn change_then_revert_is_two_changes() {
        let original = words(&["pira"]);
        let result = TransformationResult {
            history: vec![step("a", &["pila"]), step("b", &["pira"])],
            output: words(&["pira"]),
        };
        let matrix = reconcile(&original, &result).unwrap();
        assert_eq!(matrix.changed(0, 0), Some(true));
        assert_eq!(matrix.changed(0, 1), Some(true));
    }

    #[test]
    fn equality_is_exact() {
        let original = words(&["Kato"]);
        let result = TransformationResult {
            history: vec![step("lower", &["kato"])],
            output: words(&["kato"]),
        };
        assert_eq!(reconcile(&original, &result).unwrap().changed(0, 0), Some(true));
    }

    #[test]
    fn empty_history_keeps_final_form() {
        let original = words(&["kato", "pira"]);
        let result = TransformationResult::untouched(&original);
        let matrix = reconcile(&original, &result).unwrap();
        assert!(matrix.rows.iter().all(|row| row.steps.is_empty()));
        assert_eq!(matrix.rows[1].final_form, "pira");
    }

    #[test]
    fn short_step_is_a_contract_error() {
        let original = words(&["kato", "pira"]);
        let result = TransformationResult {
            history: vec![step("lenition", &["kado"])],
            output: words(&["kado", "pira"]),
        };
        assert_eq!(
            reconcile(&original, &result),
            Err(EngineContractError::StepLength {
                step: 0,
                rule: "lenition".into(),
                expected: 2,
                actual: 1,
            })
        );
    }

    #[test]
    fn long_output_is_a_contract_error() {
        let original = words(&["kato"]);
        let result = TransformationResult {
            history: vec![],
            output: words(&["kato", "extra"]),
        };
        assert_eq!(
            reconcile(&original, &result),
            Err(EngineContractError::OutputLength {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn output_must_mirror_last_step() {
        let original = words(&["kato", "pira"]);
        let result = TransformationResult {
            history: vec![step("lenition", &["kado", "pira"])],
            output: words(&["kado", "pila"]),
        };
        assert!(matches!(
            reconcile(&original, &result),
            Err(EngineContractError::FinalMismatch { index: 1, .. })
        ));
    }
}
