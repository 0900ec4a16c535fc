//! Small built-in engine reading a TOML rule file.
//!
//! ```toml
//! syllables = ["CV", "CVC?"]
//! strict_ipa = false
//!
//! [classes]
//! C = ["p", "t", "k", "ch"]
//! V = ["a", "i", "o"]
//!
//! [weights]
//! a = 3.0
//!
//! [ipa]
//! ch = "tʃ"
//!
//! [[rules]]
//! name = "lenition"
//! pattern = "t"
//! replacement = "d"
//! ```

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use super::{SoundEngine, SoundSystem};
use crate::errors::EngineError;
use crate::types::{RepartitionPolicy, TransformationResult, TransformationStep, Word};

#[derive(Deserialize, Debug, Default)]
struct RuleFile {
    #[serde(default)]
    syllables: Vec<String>,
    #[serde(default)]
    strict_ipa: bool,
    #[serde(default)]
    classes: HashMap<String, Vec<String>>,
    #[serde(default)]
    weights: HashMap<String, f64>,
    #[serde(default)]
    ipa: HashMap<String, String>,
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Deserialize, Debug)]
struct RuleEntry {
    name: String,
    pattern: String,
    #[serde(default)]
    replacement: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Slot {
    class: char,
    optional: bool,
}

#[derive(Debug)]
struct CompiledRule {
    name: String,
    regex: Regex,
    replacement: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceEngine {
    seed: Option<u64>,
}

impl ReferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic word generation, mostly for tests.
    pub fn with_seed(seed: u64) -> Self {
        ReferenceEngine { seed: Some(seed) }
    }
}

impl SoundEngine for ReferenceEngine {
    type System = ReferenceSystem;

    fn parse(&self, source: &str) -> Result<ReferenceSystem, EngineError> {
        let file: RuleFile = toml::from_str(source).map_err(|e| EngineError::Parse(e.to_string()))?;
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        ReferenceSystem::compile(file, rng)
    }
}

#[derive(Debug)]
pub struct ReferenceSystem {
    classes: HashMap<char, Vec<(String, f64)>>,
    syllables: Vec<Vec<Slot>>,
    /// Longest spelling first.
    ipa: Vec<(String, String)>,
    strict_ipa: bool,
    rules: Vec<CompiledRule>,
    rng: StdRng,
    released: bool,
}

impl ReferenceSystem {
    fn compile(file: RuleFile, rng: StdRng) -> Result<Self, EngineError> {
        let mut classes = HashMap::new();
        for (name, letters) in &file.classes {
            let class = class_letter(name)?;
            if letters.is_empty() {
                return Err(EngineError::Parse(format!("Class {} has no letters", name)));
            }
            classes.insert(class, weigh(letters, &file.weights));
        }

        let syllables = file
            .syllables
            .iter()
            .map(|pattern| compile_syllable(pattern, &classes))
            .collect::<Result<Vec<_>, _>>()?;

        let mut ipa = Vec::with_capacity(file.ipa.len());
        for (spelling, sound) in file.ipa {
            if spelling.is_empty() {
                return Err(EngineError::Parse("IPA table has an empty spelling".to_string()));
            }
            ipa.push((spelling, sound));
        }
        ipa.sort_by(|(a, _), (b, _)| b.chars().count().cmp(&a.chars().count()).then_with(|| a.cmp(b)));

        let rules = file
            .rules
            .into_iter()
            .map(|entry| {
                Regex::new(&entry.pattern)
                    .map(|regex| CompiledRule {
                        name: entry.name.clone(),
                        regex,
                        replacement: entry.replacement,
                    })
                    .map_err(|e| EngineError::Parse(format!("Rule '{}': {}", entry.name, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            classes = classes.len(),
            syllables = syllables.len(),
            rules = rules.len(),
            "sound system compiled"
        );

        Ok(ReferenceSystem {
            classes,
            syllables,
            ipa,
            strict_ipa: file.strict_ipa,
            rules,
            rng,
            released: false,
        })
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name.as_str()).collect()
    }

    fn ensure_live(&self) -> Result<(), EngineError> {
        if self.released {
            Err(EngineError::Transformation("Sound system was already released".to_string()))
        } else {
            Ok(())
        }
    }

    fn syllable(&mut self) -> Result<String, EngineError> {
        let drop = syllable_drop(self.syllables.len());
        let index = power_law(&mut self.rng, self.syllables.len(), drop);
        let mut syllable = String::new();
        for slot in self.syllables[index].clone() {
            if slot.optional && !self.rng.gen::<bool>() {
                continue;
            }
            let letters = self
                .classes
                .get(&slot.class)
                .ok_or_else(|| EngineError::Generation(format!("Unknown class {}", slot.class)))?;
            let (letter, _) = letters
                .choose_weighted(&mut self.rng, |(_, weight)| *weight)
                .map_err(|e| EngineError::Generation(format!("Class {}: {}", slot.class, e)))?;
            syllable.push_str(letter);
        }
        Ok(syllable)
    }
}

impl SoundSystem for ReferenceSystem {
    fn generate_words(
        &mut self,
        count: NonZeroUsize,
        policy: RepartitionPolicy,
    ) -> Result<Vec<Word>, EngineError> {
        if self.released {
            return Err(EngineError::Generation("Sound system was already released".to_string()));
        }
        if self.syllables.is_empty() {
            return Err(EngineError::Generation("No syllable patterns defined".to_string()));
        }

        let share = policy.mono_syllable_share();
        let mut words: Vec<Word> = Vec::new();
        let mut seen: HashSet<Word> = HashSet::new();
        for _ in 0..count.get() {
            let mut number_of_syllables = 1;
            if share < 1.0 && self.rng.gen::<f32>() >= share {
                number_of_syllables += 1 + power_law(&mut self.rng, 4, 0.5);
            }
            let mut word = String::new();
            for _ in 0..number_of_syllables {
                word.push_str(&self.syllable()?);
            }
            // Duplicates are dropped, so fewer words than asked may come back.
            if !word.is_empty() && seen.insert(word.clone()) {
                words.push(word);
            }
        }

        if words.is_empty() {
            return Err(EngineError::Generation("Every generated word was empty".to_string()));
        }
        debug!(requested = count.get(), generated = words.len(), %policy, "words generated");
        Ok(words)
    }

    fn apply_transformations(&mut self, words: &[Word]) -> Result<TransformationResult, EngineError> {
        self.ensure_live()?;
        let mut current: Vec<Word> = words.to_vec();
        let mut history = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let next: Vec<Word> = current
                .iter()
                .map(|word| rule.regex.replace_all(word, rule.replacement.as_str()).into_owned())
                .collect();
            if let Some(index) = next.iter().position(|word| word.is_empty()) {
                return Err(EngineError::Transformation(format!(
                    "Rule '{}' erased the word '{}'",
                    rule.name, current[index]
                )));
            }
            debug!(rule = %rule.name, "rule applied");
            history.push(TransformationStep {
                rule_label: rule.name.clone(),
                words_after: next.clone(),
            });
            current = next;
        }
        Ok(TransformationResult {
            history,
            output: current,
        })
    }

    fn to_ipa(&self, word: &str) -> Result<String, EngineError> {
        let mut result = String::new();
        let mut rest = word;
        while let Some(c) = rest.chars().next() {
            match self.ipa.iter().find(|(spelling, _)| rest.starts_with(spelling.as_str())) {
                Some((spelling, sound)) => {
                    result.push_str(sound);
                    rest = &rest[spelling.len()..];
                }
                None if self.strict_ipa => {
                    return Err(EngineError::Transcription(format!(
                        "No IPA for '{}' in '{}'",
                        c, word
                    )));
                }
                None => {
                    result.push(c);
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        Ok(result)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.rules.clear();
            self.syllables.clear();
            info!("sound system released");
        }
    }
}

fn class_letter(name: &str) -> Result<char, EngineError> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_uppercase() => Ok(c),
        _ => Err(EngineError::Parse(format!(
            "Class name '{}' must be a single uppercase letter",
            name
        ))),
    }
}

fn compile_syllable(pattern: &str, classes: &HashMap<char, Vec<(String, f64)>>) -> Result<Vec<Slot>, EngineError> {
    let mut slots: Vec<Slot> = Vec::new();
    for c in pattern.chars() {
        match c {
            '?' => match slots.last_mut() {
                Some(slot) => slot.optional = true,
                None => {
                    return Err(EngineError::Parse(format!(
                        "Syllable '{}' starts with '?'",
                        pattern
                    )))
                }
            },
            c if classes.contains_key(&c) => slots.push(Slot {
                class: c,
                optional: false,
            }),
            c => {
                return Err(EngineError::Parse(format!(
                    "Syllable '{}' uses undefined class '{}'",
                    pattern, c
                )))
            }
        }
    }
    if slots.is_empty() {
        return Err(EngineError::Parse("Empty syllable pattern".to_string()));
    }
    Ok(slots)
}

/// Explicit weights win; otherwise letters fall off Gusein-Zade style in
/// the order they are listed.
fn weigh(letters: &[String], weights: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let size = letters.len();
    letters
        .iter()
        .enumerate()
        .map(|(position, letter)| {
            let weight = weights
                .get(letter)
                .copied()
                .unwrap_or_else(|| gusein_zade(position, size));
            (letter.clone(), weight)
        })
        .collect()
}

fn gusein_zade(position: usize, size: usize) -> f64 {
    (((size + 1) as f64).ln() - ((position + 1) as f64).ln()) / size as f64
}

fn power_law<R: Rng>(rng: &mut R, max: usize, percentage: f32) -> usize {
    let mut result = 0;
    while rng.gen::<f32>() >= percentage {
        result = (result + 1) % max;
    }
    result
}

fn syllable_drop(number_of_syllables: usize) -> f32 {
    if number_of_syllables < 9 {
        0.6 - (number_of_syllables as f32) * 0.05
    } else {
        0.12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
syllables = ["CV"]

[classes]
C = ["k", "t", "p"]
V = ["a", "o", "i"]

[ipa]
k = "k"
ch = "tʃ"

[[rules]]
name = "lenition"
pattern = "t"
replacement = "d"

[[rules]]
name = "palatalization"
pattern = "ki"
replacement = "chi"
"#;

    fn system() -> ReferenceSystem {
        ReferenceEngine::with_seed(7).parse(RULES).unwrap()
    }

    fn count(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn rules_keep_file_order() {
        assert_eq!(system().rule_names(), vec!["lenition", "palatalization"]);
    }

    #[test]
    fn history_records_every_rule() {
        let words: Vec<Word> = vec!["kato".into(), "kipa".into()];
        let result = system().apply_transformations(&words).unwrap();
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.history[0].words_after, vec!["kado", "kipa"]);
        assert_eq!(result.history[1].words_after, vec!["kado", "chipa"]);
        assert_eq!(result.output, vec!["kado", "chipa"]);
    }

    #[test]
    fn erasing_rule_is_a_transformation_error() {
        let source = "syllables = [\"V\"]\n[classes]\nV = [\"a\"]\n[[rules]]\nname = \"drop\"\npattern = \"a\"\n";
        let mut system = ReferenceEngine::new().parse(source).unwrap();
        let err = system.apply_transformations(&["a".to_string()]).unwrap_err();
        assert_eq!(err, EngineError::Transformation("Rule 'drop' erased the word 'a'".into()));
    }

    #[test]
    fn always_generates_monosyllables() {
        let words = system().generate_words(count(20), RepartitionPolicy::Always).unwrap();
        assert!(!words.is_empty() && words.len() <= 20);
        assert!(words.iter().all(|word| word.chars().count() == 2));
    }

    #[test]
    fn never_generates_polysyllables() {
        let words = system().generate_words(count(20), RepartitionPolicy::Never).unwrap();
        assert!(words.iter().all(|word| word.chars().count() >= 4));
    }

    #[test]
    fn generated_words_are_distinct() {
        let words = system().generate_words(count(50), RepartitionPolicy::Frequent).unwrap();
        let mut sorted = words.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), words.len());
    }

    #[test]
    fn ipa_prefers_longest_spelling() {
        assert_eq!(system().to_ipa("chika").unwrap(), "tʃika");
    }

    #[test]
    fn strict_ipa_rejects_unknown_letters() {
        let source = "strict_ipa = true\n[ipa]\na = \"ɑ\"\n";
        let system = ReferenceEngine::new().parse(source).unwrap();
        assert_eq!(system.to_ipa("aa").unwrap(), "ɑɑ");
        assert!(matches!(system.to_ipa("ab"), Err(EngineError::Transcription(_))));
    }

    #[test]
    fn parse_errors() {
        let engine = ReferenceEngine::new();
        assert!(matches!(engine.parse("syllables = ["), Err(EngineError::Parse(_))));
        assert!(matches!(
            engine.parse("syllables = [\"CX\"]\n[classes]\nC = [\"k\"]\n"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            engine.parse("[[rules]]\nname = \"bad\"\npattern = \"(\"\n"),
            Err(EngineError::Parse(_))
        ));
        assert!(matches!(
            engine.parse("[classes]\ncons = [\"k\"]\n"),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn no_syllables_is_a_generation_error() {
        let mut system = ReferenceEngine::new().parse("").unwrap();
        assert!(matches!(
            system.generate_words(count(3), RepartitionPolicy::Rare),
            Err(EngineError::Generation(_))
        ));
    }

    #[test]
    fn release_is_idempotent() {
        let mut system = system();
        system.release();
        system.release();
        assert!(system.apply_transformations(&["kato".to_string()]).is_err());
    }
}
