//! One generation request from form input to rendered table.

use std::num::NonZeroUsize;

use tracing::{info, warn};

use crate::engine::{SoundEngine, SoundSystem};
use crate::errors::{RequestError, UserInputError};
use crate::history::{reconciler, table_builder};
use crate::types::display::escape_html;
use crate::types::{DisplayTable, RepartitionPolicy, TransformationResult, Word};

/// Raw values as the user typed or picked them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestForm {
    pub rules_source: String,
    pub word_count: String,
    /// Label of the checked repartition selector, if any.
    pub repartition: Option<String>,
}

/// A request that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub rules_source: String,
    pub word_count: NonZeroUsize,
    pub policy: RepartitionPolicy,
}

impl RequestForm {
    pub fn validate(&self) -> Result<GenerationRequest, UserInputError> {
        let word_count = parse_word_count(&self.word_count)?;
        let policy = match self.repartition.as_deref() {
            None => return Err(UserInputError::MissingRepartition),
            Some(label) => RepartitionPolicy::from_label(label)
                .ok_or_else(|| UserInputError::UnknownRepartition(label.to_string()))?,
        };
        Ok(GenerationRequest {
            rules_source: self.rules_source.clone(),
            word_count,
            policy,
        })
    }
}

/// Largest word count a single request may ask for.
pub const MAX_WORD_COUNT: usize = 10_000;

pub fn parse_word_count(raw: &str) -> Result<NonZeroUsize, UserInputError> {
    let count: i128 = raw
        .trim()
        .parse()
        .map_err(|_| UserInputError::InvalidWordCount(raw.to_string()))?;
    if count <= 0 {
        return Err(UserInputError::NonPositiveWordCount);
    }
    usize::try_from(count)
        .ok()
        .filter(|count| *count <= MAX_WORD_COUNT)
        .and_then(NonZeroUsize::new)
        .ok_or(UserInputError::TooManyWords {
            max: MAX_WORD_COUNT,
        })
}

/// Everything a finished request leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub words: Vec<Word>,
    pub result: TransformationResult,
    pub table: DisplayTable,
}

/// Parse, generate, transform, reconcile, build. The parsed system is
/// released whichever stage stops the run.
pub fn run_request<E: SoundEngine>(
    engine: &E,
    request: &GenerationRequest,
) -> Result<Generation, RequestError> {
    let mut system = engine.acquire(&request.rules_source)?;
    let words = system.generate_words(request.word_count, request.policy)?;
    info!(words = words.len(), policy = %request.policy, "words generated");
    let result = system.apply_transformations(&words)?;
    let table = tabulate(&*system, &words, &result)?;
    Ok(Generation {
        words,
        result,
        table,
    })
}

/// Same pipeline for words the user already has.
pub fn run_on_words<E: SoundEngine>(
    engine: &E,
    rules_source: &str,
    words: &[Word],
) -> Result<Generation, RequestError> {
    let mut system = engine.acquire(rules_source)?;
    let result = system.apply_transformations(words)?;
    let table = tabulate(&*system, words, &result)?;
    Ok(Generation {
        words: words.to_vec(),
        result,
        table,
    })
}

/// Reconciles a finished transformation and builds its table.
pub fn tabulate<S: SoundSystem>(
    system: &S,
    words: &[Word],
    result: &TransformationResult,
) -> Result<DisplayTable, RequestError> {
    let reconciled = reconciler::reconcile(words, result)?;
    table_builder::build(words, result, &reconciled, |word| system.to_ipa(word))
}

/// What the page currently shows: at most one table and one error message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultView {
    table: Option<DisplayTable>,
    error: Option<String>,
}

impl ResultView {
    pub fn table(&self) -> Option<&DisplayTable> {
        self.table.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Error text split where it should break lines.
    pub fn error_lines(&self) -> Vec<&str> {
        self.error.as_deref().map(|e| e.lines().collect()).unwrap_or_default()
    }

    pub fn error_html(&self) -> Option<String> {
        self.error
            .as_deref()
            .map(|e| escape_html(e).replace('\n', "<br/>"))
    }

    pub fn clear(&mut self) {
        self.table = None;
        self.error = None;
    }

    /// Handles one click on "Generate". The previous table and message are
    /// gone before the engine is called.
    pub fn submit<E: SoundEngine>(&mut self, engine: &E, form: &RequestForm) -> Result<(), RequestError> {
        self.clear();
        let outcome = form
            .validate()
            .map_err(RequestError::from)
            .and_then(|request| run_request(engine, &request));
        match outcome {
            Ok(generation) => {
                self.table = Some(generation.table);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "generation request failed");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(count: &str, repartition: Option<&str>) -> RequestForm {
        RequestForm {
            rules_source: String::new(),
            word_count: count.to_string(),
            repartition: repartition.map(str::to_string),
        }
    }

    #[test]
    fn word_count_must_be_a_positive_integer() {
        assert_eq!(parse_word_count(" 12 ").map(NonZeroUsize::get), Ok(12));
        assert_eq!(
            parse_word_count("abc"),
            Err(UserInputError::InvalidWordCount("abc".into()))
        );
        assert_eq!(parse_word_count("0"), Err(UserInputError::NonPositiveWordCount));
        assert_eq!(parse_word_count("-3"), Err(UserInputError::NonPositiveWordCount));
        assert!(matches!(parse_word_count("2.5"), Err(UserInputError::InvalidWordCount(_))));
        assert!(matches!(parse_word_count(""), Err(UserInputError::InvalidWordCount(_))));
        assert!(matches!(parse_word_count("-"), Err(UserInputError::InvalidWordCount(_))));
    }

    #[test]
    fn word_count_is_bounded() {
        assert_eq!(
            parse_word_count(&MAX_WORD_COUNT.to_string()).map(NonZeroUsize::get),
            Ok(MAX_WORD_COUNT)
        );
        let too_many = UserInputError::TooManyWords {
            max: MAX_WORD_COUNT,
        };
        assert_eq!(parse_word_count("10001"), Err(too_many.clone()));
        assert_eq!(parse_word_count("9223372036854775807"), Err(too_many.clone()));
        assert_eq!(parse_word_count("99999999999999999999"), Err(too_many));
    }

    #[test]
    fn repartition_must_be_selected_and_known() {
        assert_eq!(form("3", None).validate(), Err(UserInputError::MissingRepartition));
        assert_eq!(
            form("3", Some("Sometimes")).validate(),
            Err(UserInputError::UnknownRepartition("Sometimes".into()))
        );
        assert_eq!(
            form("3", Some("Rare")).validate().map(|r| r.policy),
            Ok(RepartitionPolicy::Rare)
        );
    }

    #[test]
    fn error_html_breaks_every_line() {
        let view = ResultView {
            table: None,
            error: Some("line 1\nline 2\nline <3>".into()),
        };
        assert_eq!(view.error_html().as_deref(), Some("line 1<br/>line 2<br/>line &lt;3&gt;"));
        assert_eq!(view.error_lines(), vec!["line 1", "line 2", "line <3>"]);
    }
}
