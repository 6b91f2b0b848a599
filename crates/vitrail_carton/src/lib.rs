//! Carton - The artist's toolbox for Vitrail.
//!
//! This crate provides the foundational utilities shared by every Vitrail crate,
//! much like a carton (artist's portfolio case) holds all the essential tools and
//! materials an artist needs for their work.
//!
//! # Example
//!
//! ```
//! use vitrail_carton::{class_tokens, FxHashMap, String};
//!
//! let tokens = class_tokens("todo  done ");
//! assert_eq!(tokens, vec![String::from("todo"), String::from("done")]);
//!
//! let mut counts: FxHashMap<String, usize> = FxHashMap::default();
//! counts.insert(String::from("click"), 1);
//! assert_eq!(counts.len(), 1);
//! ```

pub mod general;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;
pub use compact_str::CompactString as String;

// Re-export smallvec for stack-optimized collections
pub use smallvec::SmallVec;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::FxHashMap;

// Re-export shared utilities
pub use general::*;
