//! In-memory prefix tree over the vocabulary.
//!
//! Nodes live in a single arena and refer to each other by index. Each node
//! keeps its children as a vector sorted by code point, which gives both
//! binary-search lookup and ascending enumeration order for suggestions.
//!
//! The trie is built once and then only read: every query takes `&self` and
//! keeps its working state on the stack, so a loaded trie can be shared
//! between threads behind an `Arc` without locking.

use crate::error::{VocabError, VocabResult};
use crate::utils::is_normalized;

/// Index of a node in the arena
pub type NodeId = u32;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    /// Sorted by code point
    children: Vec<(char, NodeId)>,
    terminal: bool,
}

impl Node {
    #[inline]
    fn child(&self, ch: char) -> Option<NodeId> {
        self.children
            .binary_search_by_key(&ch, |&(c, _)| c)
            .ok()
            .map(|i| self.children[i].1)
    }
}

/// Prefix tree of case-folded words.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<Node>,
    word_count: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            word_count: 0,
        }
    }

    /// Insert a word. Re-inserting an existing word changes nothing.
    ///
    /// `word` must already be folded and alphabetic-only (see
    /// [`Tokenizer`](crate::utils::Tokenizer)); use [`Trie::try_insert`] for
    /// unchecked input.
    pub fn insert(&mut self, word: &str) {
        debug_assert!(is_normalized(word), "not a normalized word: {word:?}");

        let mut current = ROOT;
        for ch in word.chars() {
            let slot = self.nodes[current as usize]
                .children
                .binary_search_by_key(&ch, |&(c, _)| c);
            current = match slot {
                Ok(i) => self.nodes[current as usize].children[i].1,
                Err(i) => {
                    let id = self.nodes.len() as NodeId;
                    self.nodes.push(Node::default());
                    self.nodes[current as usize].children.insert(i, (ch, id));
                    id
                }
            };
        }

        let node = &mut self.nodes[current as usize];
        if !node.terminal {
            node.terminal = true;
            self.word_count += 1;
        }
    }

    /// Validating variant of [`Trie::insert`]
    pub fn try_insert(&mut self, word: &str) -> VocabResult<()> {
        if word.is_empty() || !is_normalized(word) {
            return Err(VocabError::PreconditionViolation {
                text: word.to_string(),
            });
        }
        self.insert(word);
        Ok(())
    }

    /// Exact membership
    pub fn contains(&self, word: &str) -> bool {
        self.find(word)
            .map(|id| self.nodes[id as usize].terminal)
            .unwrap_or(false)
    }

    /// True if at least one word starts with `prefix`
    pub fn has_prefix(&self, prefix: &str) -> bool {
        match self.find(prefix) {
            // Every non-root node lies on the path of some word
            Some(ROOT) => self.word_count > 0,
            Some(_) => true,
            None => false,
        }
    }

    /// Up to `max_results` words starting with `prefix`.
    ///
    /// Words come out in depth-first pre-order with children visited in
    /// ascending code-point order, so shorter words precede their extensions.
    /// The walk stops as soon as the bound is reached.
    pub fn suggest(&self, prefix: &str, max_results: usize) -> Vec<String> {
        self.collect(prefix, max_results).0
    }

    /// Returns the suggestions plus the number of nodes visited
    fn collect(&self, prefix: &str, max_results: usize) -> (Vec<String>, usize) {
        if max_results == 0 {
            return (Vec::new(), 0);
        }
        let Some(start) = self.find(prefix) else {
            return (Vec::new(), 0);
        };

        let mut results = Vec::with_capacity(max_results.min(self.word_count));
        let mut word = String::from(prefix);
        let mut visited = 0usize;

        // (node, length of `word` before this node's char, char leading here)
        let mut stack: Vec<(NodeId, usize, Option<char>)> = vec![(start, word.len(), None)];

        while let Some((id, parent_len, ch)) = stack.pop() {
            word.truncate(parent_len);
            if let Some(ch) = ch {
                word.push(ch);
            }
            visited += 1;

            let node = &self.nodes[id as usize];
            if node.terminal {
                results.push(word.clone());
                if results.len() == max_results {
                    break;
                }
            }

            let len = word.len();
            for &(c, child) in node.children.iter().rev() {
                stack.push((child, len, Some(c)));
            }
        }

        (results, visited)
    }

    /// Node reached by consuming `prefix`, if any
    fn find(&self, prefix: &str) -> Option<NodeId> {
        let mut current = ROOT;
        for ch in prefix.chars() {
            current = self.nodes[current as usize].child(ch)?;
        }
        Some(current)
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.word_count
    }

    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Approximate heap footprint in bytes
    pub fn memory_bytes(&self) -> usize {
        let edges: usize = self.nodes.iter().map(|n| n.children.capacity()).sum();
        self.nodes.capacity() * std::mem::size_of::<Node>()
            + edges * std::mem::size_of::<(char, NodeId)>()
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AsRef<str>> Extend<S> for Trie {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for Trie {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut trie = Trie::new();
        trie.extend(iter);
        trie
    }
}
