//! Boundary with the sound engine.
//!
//! The engine parses a rule description into a [`SoundSystem`], samples words
//! from it, runs the sound-change rules and transcribes words to IPA. The rest
//! of the crate only talks to it through these two traits.

pub mod reference;
pub mod wire;

use std::num::NonZeroUsize;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::errors::EngineError;
use crate::types::{RepartitionPolicy, TransformationResult, Word};

pub trait SoundEngine {
    type System: SoundSystem;

    fn parse(&self, source: &str) -> Result<Self::System, EngineError>;

    /// Parses and wraps the system so it is released on every exit path.
    fn acquire(&self, source: &str) -> Result<SystemHandle<Self::System>, EngineError> {
        self.parse(source).map(SystemHandle::new)
    }
}

pub trait SoundSystem {
    fn generate_words(
        &mut self,
        count: NonZeroUsize,
        policy: RepartitionPolicy,
    ) -> Result<Vec<Word>, EngineError>;

    fn apply_transformations(&mut self, words: &[Word]) -> Result<TransformationResult, EngineError>;

    fn to_ipa(&self, word: &str) -> Result<String, EngineError>;

    /// Frees engine-owned resources. Must be idempotent.
    fn release(&mut self);
}

/// Owns a parsed system and releases it exactly once when dropped.
pub struct SystemHandle<S: SoundSystem> {
    system: S,
}

impl<S: SoundSystem> SystemHandle<S> {
    pub fn new(system: S) -> Self {
        SystemHandle { system }
    }
}

impl<S: SoundSystem> Deref for SystemHandle<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.system
    }
}

impl<S: SoundSystem> DerefMut for SystemHandle<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.system
    }
}

impl<S: SoundSystem> Drop for SystemHandle<S> {
    fn drop(&mut self) {
        debug!("releasing sound system");
        self.system.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counting {
        releases: Rc<Cell<usize>>,
    }

    impl SoundSystem for Counting {
        fn generate_words(
            &mut self,
            _count: NonZeroUsize,
            _policy: RepartitionPolicy,
        ) -> Result<Vec<Word>, EngineError> {
            Err(EngineError::Generation("no syllables".into()))
        }

        fn apply_transformations(
            &mut self,
            words: &[Word],
        ) -> Result<TransformationResult, EngineError> {
            Ok(TransformationResult::untouched(words))
        }

        fn to_ipa(&self, word: &str) -> Result<String, EngineError> {
            Ok(word.to_string())
        }

        fn release(&mut self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    #[test]
    fn handle_releases_on_drop() {
        let releases = Rc::new(Cell::new(0));
        {
            let _handle = SystemHandle::new(Counting {
                releases: Rc::clone(&releases),
            });
        }
        assert_eq!(releases.get(), 1);
    }

    #[test]
    fn handle_releases_when_a_call_fails() {
        let releases = Rc::new(Cell::new(0));
        let attempt = || -> Result<Vec<Word>, EngineError> {
            let mut handle = SystemHandle::new(Counting {
                releases: Rc::clone(&releases),
            });
            let count = NonZeroUsize::new(3).ok_or(EngineError::Generation("zero".into()))?;
            handle.generate_words(count, RepartitionPolicy::Never)
        };
        assert!(attempt().is_err());
        assert_eq!(releases.get(), 1);
    }
}
