//! Shared types for the Reef compiler.
//!
//! Currently this crate holds source-position tracking: byte-offset
//! [`Span`]s and the [`LineIndex`] used to convert offsets to line/column
//! pairs for error reporting.
//!
//! [`Span`]: span::Span
//! [`LineIndex`]: span::LineIndex

pub mod span;

pub use span::{LineIndex, Span};
