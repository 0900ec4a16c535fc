use tracing::debug;

use super::reconciler::ReconciledMatrix;
use crate::errors::{EngineContractError, EngineError, RequestError};
use crate::types::display::{FINAL_HEADING, IPA_HEADING, WORDS_HEADING};
use crate::types::{DisplayCell, DisplayTable, TransformationResult, Word};

/// Headings: "Words", one per applied rule (repeats kept), "Final", "IPA".
pub fn headings(result: &TransformationResult) -> Vec<String> {
    let mut headings = Vec::with_capacity(result.history.len() + 3);
    headings.push(WORDS_HEADING.to_string());
    headings.extend(result.rule_labels().map(str::to_string));
    headings.push(FINAL_HEADING.to_string());
    headings.push(IPA_HEADING.to_string());
    headings
}

/// Turns a reconciled history into the table shown to the user.
///
/// `ipa_lookup` is asked once per word for the transcription of its final
/// form. The first failure aborts the whole build; no partial table is
/// returned.
pub fn build<F>(
    original_words: &[Word],
    result: &TransformationResult,
    reconciled: &ReconciledMatrix,
    mut ipa_lookup: F,
) -> Result<DisplayTable, RequestError>
where
    F: FnMut(&str) -> Result<String, EngineError>,
{
    if reconciled.rows.len() != original_words.len() {
        return Err(EngineContractError::RowCount {
            expected: original_words.len(),
            actual: reconciled.rows.len(),
        }
        .into());
    }

    let headings = headings(result);
    let mut rows = Vec::with_capacity(original_words.len());
    for (index, (word, row)) in original_words.iter().zip(&reconciled.rows).enumerate() {
        let mut cells = Vec::with_capacity(headings.len());
        cells.push(DisplayCell::Word(word.clone()));
        cells.extend(row.steps.iter().map(|state| {
            if state.changed {
                DisplayCell::Changed(state.current.clone())
            } else {
                DisplayCell::Unchanged
            }
        }));
        cells.push(DisplayCell::Final(row.final_form.clone()));
        cells.push(DisplayCell::Ipa(ipa_lookup(&row.final_form)?));

        if cells.len() != headings.len() {
            return Err(EngineContractError::RowWidth {
                row: index,
                expected: headings.len(),
                actual: cells.len(),
            }
            .into());
        }
        rows.push(cells);
    }

    debug!(columns = headings.len(), rows = rows.len(), "table built");
    Ok(DisplayTable { headings, rows })
}
