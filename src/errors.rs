use thiserror::Error;

/// Bad form input. Caught before the engine is ever touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UserInputError {
    #[error("Number of words must be a whole number, got '{0}'")]
    InvalidWordCount(String),

    #[error("Number of words must be greater than zero")]
    NonPositiveWordCount,

    #[error("Number of words must be at most {max}")]
    TooManyWords { max: usize },

    #[error("Select a monosyllable repartition")]
    MissingRepartition,

    #[error("Unknown monosyllable repartition '{0}'")]
    UnknownRepartition(String),
}

/// Failures raised by the sound engine itself. The message is the engine's
/// own text and is shown to the user as is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Generation(String),

    #[error("{0}")]
    Transformation(String),

    #[error("{0}")]
    Transcription(String),
}

/// The engine answered, but the answer breaks the alignment guarantees the
/// history table relies on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineContractError {
    #[error("Rule step {step} ('{rule}') holds {actual} words, expected {expected}")]
    StepLength {
        step: usize,
        rule: String,
        expected: usize,
        actual: usize,
    },

    #[error("Transformation output holds {actual} words, expected {expected}")]
    OutputLength { expected: usize, actual: usize },

    #[error("Final form '{output}' of word {index} differs from last rule result '{last}'")]
    FinalMismatch {
        index: usize,
        output: String,
        last: String,
    },

    #[error("Row {row} holds {actual} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Reconciled history holds {actual} rows, expected {expected}")]
    RowCount { expected: usize, actual: usize },
}

/// Everything that can end a generation request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    UserInput(#[from] UserInputError),

    #[error(transparent)]
    Contract(#[from] EngineContractError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_messages_pass_through_verbatim() {
        let err: RequestError = EngineError::Parse("line 3: unexpected '='\nexpected a class".into()).into();
        assert_eq!(err.to_string(), "line 3: unexpected '='\nexpected a class");
    }

    #[test]
    fn contract_errors_name_the_offending_step() {
        let err = EngineContractError::StepLength {
            step: 1,
            rule: "lenition".into(),
            expected: 2,
            actual: 1,
        };
        assert!(err.to_string().contains("step 1 ('lenition')"));
    }
}
