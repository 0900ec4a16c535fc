// Declare all modules that are part of this library
pub mod config;
pub mod errors;
pub mod types {
    pub mod display;
    pub mod transformation;

    pub use display::{DisplayCell, DisplayTable};
    pub use transformation::{RepartitionPolicy, TransformationResult, TransformationStep, Word};
}
pub mod engine;
pub mod history {
    pub mod reconciler;
    pub mod table_builder;
}
pub mod orchestrator;
pub mod render;
pub mod transcript_io;
pub mod batch;

pub use engine::{SoundEngine, SoundSystem, SystemHandle};
pub use errors::{EngineContractError, EngineError, RequestError, UserInputError};
pub use orchestrator::{RequestForm, ResultView};
