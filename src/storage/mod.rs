//! Storage Module
//!
//! Crash-safe replacement of file contents.
//!
//! ## Write Path
//! ```text
//!   bytes ──► temp/<uuid>.tmp ──fsync──► rename ──► chats/<id>.chat.json
//!                  │                        │
//!            failure: removed        failure: removed,
//!                                    target untouched
//! ```
//!
//! A reader of the target path sees either the old complete file or the
//! new complete file, never a mixture.

mod atomic;

pub use atomic::AtomicWriter;
