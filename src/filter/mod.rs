//! Sensitive-word matching subsystem.
//!
//! # Data Flow
//! ```text
//! word list (config, admin updates)
//!     → trie.rs (arena-based prefix tree, index-addressed nodes)
//!     → engine.rs (WordFilter: contains / find_all / filter)
//!     → content guard (mutating requests only)
//! ```
//!
//! # Design Decisions
//! - Greedy longest match at each start position, then jump past the span
//! - Removal rebuilds the trie wholesale; no partial node deletion
//! - One RwLock around list + trie so scans never see a half rebuild

pub mod engine;
pub mod trie;

pub use engine::WordFilter;
pub use trie::Trie;
