//! Norvig-style spelling correction
//!
//! Candidate generation walks the ladder: the word itself if known, then
//! known words one edit away, then two edits away, then the word itself
//! as a last resort. Candidates are ranked by model frequency.

use crate::{CorrectorError, ModelStore, WordModel};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Spelling correction interface
pub trait Corrector: Send + Sync {
    /// Return candidate corrections for a word, best first
    ///
    /// A word that is already known returns itself as the sole candidate.
    fn correct(&self, word: &str) -> Vec<String>;

    /// Add a word to the dictionary and persist the model
    fn add_word(&self, word: &str) -> Result<(), CorrectorError>;
}

/// Corrector based on edit-distance candidate generation
pub struct NorvigCorrector {
    model: RwLock<WordModel>,
    store: Arc<dyn ModelStore>,
}

impl NorvigCorrector {
    /// Create a corrector over a loaded model and its storage backend
    pub fn new(model: WordModel, store: Arc<dyn ModelStore>) -> Self {
        Self {
            model: RwLock::new(model),
            store,
        }
    }

    /// Load the model from the store and build a corrector over it
    pub fn from_store(store: Arc<dyn ModelStore>) -> Result<Self, CorrectorError> {
        let model = store.load()?;
        Ok(Self::new(model, store))
    }

    /// All strings one edit away from `word`
    ///
    /// Edits are deletions, adjacent transpositions, single-letter
    /// replacements and insertions, drawn from the model's alphabet.
    /// Operates on characters, not bytes, so accented letters survive.
    fn edits1(word: &str, alphabet: &[char]) -> HashSet<String> {
        let chars: Vec<char> = word.chars().collect();
        let mut edits = HashSet::new();

        for i in 0..=chars.len() {
            let (left, right) = chars.split_at(i);

            // Deletion
            if !right.is_empty() {
                edits.insert(collect(left, &right[1..], &[]));
            }

            // Transposition of the two characters after the split
            if right.len() > 1 {
                edits.insert(collect(left, &[right[1], right[0]], &right[2..]));
            }

            for &c in alphabet {
                // Replacement
                if !right.is_empty() {
                    edits.insert(collect(left, &[c], &right[1..]));
                }
                // Insertion
                edits.insert(collect(left, &[c], right));
            }
        }

        edits
    }

    /// The subset of `words` present in the model
    fn known<'a>(
        model: &WordModel,
        words: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        let mut found: Vec<String> = words
            .into_iter()
            .filter(|w| model.contains(w))
            .map(String::from)
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Candidate corrections, unranked
    fn candidates(model: &WordModel, word: &str) -> Vec<String> {
        let direct = Self::known(model, [word]);
        if !direct.is_empty() {
            return direct;
        }

        let edits1 = Self::edits1(word, model.alphabet());
        let known1 = Self::known(model, edits1.iter().map(String::as_str));
        if !known1.is_empty() {
            return known1;
        }

        let mut known2: HashSet<String> = HashSet::new();
        for e1 in &edits1 {
            for e2 in Self::edits1(e1, model.alphabet()) {
                if model.contains(&e2) {
                    known2.insert(e2);
                }
            }
        }
        if !known2.is_empty() {
            let mut found: Vec<String> = known2.into_iter().collect();
            found.sort_unstable();
            return found;
        }

        vec![word.to_string()]
    }
}

/// Concatenate character slices into a String
fn collect(a: &[char], b: &[char], c: &[char]) -> String {
    a.iter().chain(b).chain(c).collect()
}

impl Corrector for NorvigCorrector {
    fn correct(&self, word: &str) -> Vec<String> {
        let model = self.model.read();
        let mut candidates = Self::candidates(&model, word);

        // Highest frequency first; the sort above makes ties deterministic
        candidates.sort_by(|a, b| {
            model
                .frequency(b)
                .unwrap_or(0)
                .cmp(&model.frequency(a).unwrap_or(0))
        });

        candidates
    }

    fn add_word(&self, word: &str) -> Result<(), CorrectorError> {
        let mut model = self.model.write();
        model.add_word(word);
        self.store.save(&model)?;

        tracing::info!(word = %word, "Word added to dictionary");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory store for tests
    struct MemoryStore {
        saved: Mutex<Option<WordModel>>,
    }

    impl MemoryStore {
        fn shared() -> Arc<Self> {
            Arc::new(Self {
                saved: Mutex::new(None),
            })
        }
    }

    impl ModelStore for MemoryStore {
        fn load(&self) -> Result<WordModel, CorrectorError> {
            Ok(WordModel::default())
        }

        fn save(&self, model: &WordModel) -> Result<(), CorrectorError> {
            *self.saved.lock().unwrap() = Some(model.clone());
            Ok(())
        }
    }

    fn corrector() -> NorvigCorrector {
        let model = WordModel::new(HashMap::from([
            ("hola".to_string(), 100),
            ("bola".to_string(), 10),
            ("sola".to_string(), 1),
            ("mundo".to_string(), 50),
        ]));
        NorvigCorrector::new(model, MemoryStore::shared())
    }

    #[test]
    fn test_known_word_returns_itself() {
        let c = corrector();
        assert_eq!(c.correct("hola"), vec!["hola".to_string()]);
    }

    #[test]
    fn test_single_edit_typo() {
        let c = corrector();
        let candidates = c.correct("hhola");
        assert_eq!(candidates[0], "hola");
    }

    #[test]
    fn test_candidates_ranked_by_frequency() {
        let c = corrector();
        // One edit away from hola (100), bola (10) and sola (1)
        let candidates = c.correct("qola");
        assert_eq!(candidates[0], "hola");
        assert!(candidates.contains(&"bola".to_string()));
        let hola_pos = candidates.iter().position(|w| w == "hola").unwrap();
        let sola_pos = candidates.iter().position(|w| w == "sola").unwrap();
        assert!(hola_pos < sola_pos);
    }

    #[test]
    fn test_two_edit_typo() {
        let c = corrector();
        let candidates = c.correct("mandao");
        assert_eq!(candidates[0], "mundo");
    }

    #[test]
    fn test_unknown_word_falls_back_to_itself() {
        let c = corrector();
        assert_eq!(c.correct("xyzzyq"), vec!["xyzzyq".to_string()]);
    }

    #[test]
    fn test_edits1_shapes() {
        let alphabet = ['a', 'b'];
        let edits = NorvigCorrector::edits1("ab", &alphabet);
        // Deletions
        assert!(edits.contains("a"));
        assert!(edits.contains("b"));
        // Transposition
        assert!(edits.contains("ba"));
        // Insertion
        assert!(edits.contains("aab"));
        assert!(edits.contains("abb"));
        // Replacement
        assert!(edits.contains("bb"));
    }

    #[test]
    fn test_edits1_handles_accents() {
        let alphabet = ['o', 'ó', 's'];
        let edits = NorvigCorrector::edits1("cancion", &alphabet);
        assert!(edits.contains("canción"));
    }

    #[test]
    fn test_add_word_persists() {
        let store = MemoryStore::shared();
        let c = NorvigCorrector::new(WordModel::default(), store.clone());

        c.add_word("nueva").unwrap();
        assert_eq!(c.correct("nueva"), vec!["nueva".to_string()]);

        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.as_ref().unwrap().frequency("nueva"), Some(1));
    }
}
