//! Arena-based prefix tree over code points.
//!
//! Nodes live contiguously in a `Vec` and reference children by index,
//! with the root at index 0. No per-node heap pointers, no cycles.

use std::collections::HashMap;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, u32>,
    terminal: bool,
}

/// A character-indexed search structure over a word set.
///
/// Pure data structure: no locking, no I/O. Callers that share a `Trie`
/// across threads wrap it in a lock (see [`crate::filter::WordFilter`]).
#[derive(Debug)]
pub struct Trie {
    nodes: Vec<Node>,
}

impl Trie {
    /// Create an empty trie containing only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Build a trie from an iterator of already case-folded words.
    pub fn from_words<'a, I>(words: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut trie = Self::new();
        for word in words {
            trie.insert(word);
        }
        trie
    }

    /// Insert a word. Empty words are ignored; re-inserting an existing
    /// word is a no-op.
    pub fn insert(&mut self, word: &str) {
        if word.is_empty() {
            return;
        }
        let mut idx = 0usize;
        for ch in word.chars() {
            idx = match self.nodes[idx].children.get(&ch) {
                Some(&child) => child as usize,
                None => {
                    let child = self.nodes.len() as u32;
                    self.nodes.push(Node::default());
                    self.nodes[idx].children.insert(ch, child);
                    child as usize
                }
            };
        }
        self.nodes[idx].terminal = true;
    }

    /// Length (in code points) of the longest word starting at `start`
    /// in `chars`, or `None` if no word matches there.
    ///
    /// Walks one chain of child links, recording the deepest terminal
    /// node seen, so overlapping words sharing a prefix resolve to the
    /// longest candidate.
    pub fn longest_match_at(&self, chars: &[char], start: usize) -> Option<usize> {
        let mut idx = 0usize;
        let mut best: Option<usize> = None;
        for (offset, ch) in chars[start..].iter().enumerate() {
            match self.nodes[idx].children.get(ch) {
                Some(&child) => {
                    idx = child as usize;
                    if self.nodes[idx].terminal {
                        best = Some(offset + 1);
                    }
                }
                None => break,
            }
        }
        best
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn empty_trie_matches_nothing() {
        let trie = Trie::new();
        assert_eq!(trie.longest_match_at(&chars("anything"), 0), None);
        assert_eq!(trie.node_count(), 1);
    }

    #[test]
    fn longest_match_wins_over_shared_prefix() {
        let trie = Trie::from_words(["ab", "abc"]);
        let text = chars("abcd");
        assert_eq!(trie.longest_match_at(&text, 0), Some(3));
    }

    #[test]
    fn shorter_word_matches_when_longer_breaks_off() {
        let trie = Trie::from_words(["ab", "abc"]);
        let text = chars("abx");
        assert_eq!(trie.longest_match_at(&text, 0), Some(2));
    }

    #[test]
    fn match_at_interior_position() {
        let trie = Trie::from_words(["bad"]);
        let text = chars("xbady");
        assert_eq!(trie.longest_match_at(&text, 0), None);
        assert_eq!(trie.longest_match_at(&text, 1), Some(3));
    }

    #[test]
    fn reinsert_is_idempotent() {
        let mut trie = Trie::from_words(["spam"]);
        let before = trie.node_count();
        trie.insert("spam");
        assert_eq!(trie.node_count(), before);
    }

    #[test]
    fn empty_word_is_ignored() {
        let mut trie = Trie::new();
        trie.insert("");
        assert_eq!(trie.node_count(), 1);
        assert_eq!(trie.longest_match_at(&chars("a"), 0), None);
    }

    #[test]
    fn multibyte_code_points() {
        let trie = Trie::from_words(["危险"]);
        let text = chars("这很危险啊");
        assert_eq!(trie.longest_match_at(&text, 2), Some(2));
    }
}
