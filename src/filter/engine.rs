//! Sensitive-word filtering over the trie.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::RwLock;

use crate::filter::trie::Trie;

/// The authoritative word list and its compiled trie.
///
/// Invariant: `trie` always reflects exactly `words`. Both are replaced
/// together under the same write lock, so readers never observe a
/// half-rebuilt state.
struct Inner {
    words: BTreeSet<String>,
    trie: Trie,
}

/// Thread-safe sensitive-word matcher and filter.
///
/// Mutation holds the write lock for the full rebuild; every scan holds
/// the read lock for the entire pass.
pub struct WordFilter {
    inner: RwLock<Inner>,
    replacement: String,
}

impl WordFilter {
    /// Create a filter from an initial word list and a replacement token.
    ///
    /// Words are case-folded; empty entries are dropped.
    pub fn new<I, S>(words: I, replacement: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: BTreeSet<String> = words
            .into_iter()
            .map(|w| fold(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        let trie = Trie::from_words(words.iter().map(|w| w.as_str()));
        Self {
            inner: RwLock::new(Inner { words, trie }),
            replacement: replacement.into(),
        }
    }

    /// The configured replacement token.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Insert words into the list and the trie. Idempotent for words
    /// already present.
    pub fn add_words<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.write().expect("word filter lock poisoned");
        for word in words {
            let folded = fold(word.as_ref());
            if folded.is_empty() {
                continue;
            }
            if inner.words.insert(folded.clone()) {
                inner.trie.insert(&folded);
            }
        }
    }

    /// Remove words from the list and rebuild the trie wholesale from the
    /// remaining words. No partial node deletion: a full rebuild cannot
    /// leave orphaned branches behind.
    pub fn remove_words<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.write().expect("word filter lock poisoned");
        let mut changed = false;
        for word in words {
            changed |= inner.words.remove(&fold(word.as_ref()));
        }
        if changed {
            inner.trie = Trie::from_words(inner.words.iter().map(|w| w.as_str()));
        }
    }

    /// Number of loaded words.
    pub fn word_count(&self) -> usize {
        self.inner.read().expect("word filter lock poisoned").words.len()
    }

    /// True iff any loaded word occurs as a contiguous case-folded
    /// substring of `text`.
    pub fn contains(&self, text: &str) -> bool {
        let inner = self.inner.read().expect("word filter lock poisoned");
        let folded: Vec<char> = fold_chars(text);
        (0..folded.len()).any(|i| inner.trie.longest_match_at(&folded, i).is_some())
    }

    /// All matched words in order of first occurrence, each reported once.
    pub fn find_all(&self, text: &str) -> Vec<String> {
        let inner = self.inner.read().expect("word filter lock poisoned");
        let folded: Vec<char> = fold_chars(text);

        let mut found = Vec::new();
        let mut seen = HashSet::new();
        let mut i = 0;
        while i < folded.len() {
            match inner.trie.longest_match_at(&folded, i) {
                Some(len) => {
                    let word: String = folded[i..i + len].iter().collect();
                    if seen.insert(word.clone()) {
                        found.push(word);
                    }
                    // Jump past the whole match. A second banned term that
                    // begins inside this span is deliberately not detected;
                    // downstream output depends on this exact behavior.
                    i += len;
                }
                None => i += 1,
            }
        }
        found
    }

    /// Replace every maximal leftmost match with the replacement token.
    pub fn filter(&self, text: &str) -> String {
        let inner = self.inner.read().expect("word filter lock poisoned");
        let original: Vec<char> = text.chars().collect();
        let folded: Vec<char> = fold_chars(text);

        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while i < folded.len() {
            match inner.trie.longest_match_at(&folded, i) {
                Some(len) => {
                    out.push_str(&self.replacement);
                    i += len;
                }
                None => {
                    out.push(original[i]);
                    i += 1;
                }
            }
        }
        out
    }
}

/// Case-fold a word or text for matching.
fn fold(s: &str) -> String {
    fold_chars(s).into_iter().collect()
}

/// Per-character case folding, keeping a 1:1 mapping with the original
/// code points so filter output indices stay aligned.
fn fold_chars(s: &str) -> Vec<char> {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}
