//! Structural pattern matching over near-syntax.
//!
//! Anchors are regular expressions over declaration headers (`struct Name {`,
//! `impl Trait for Name {`, `use module::{`). A match opens a brace-balanced
//! [`Region`]; sub-patterns are then captured inside that region only, so
//! fields inserted by earlier runs never shift what a later step looks at.
//!
//! All patterns go through the `regex` crate, which guarantees linear-time
//! matching. The brace scanner is a single forward pass.

pub mod anchor;
pub mod errors;
pub mod region;
pub mod scanner;

pub use anchor::{Anchor, PatternKind};
pub use errors::MatchError;
pub use region::{Capture, Region};
