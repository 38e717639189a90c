// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Context Engine Error Types
 * Recoverable error taxonomy for the context detection engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use thiserror::Error;

/// Errors raised inside the context engine.
///
/// None of these ever cross the public `get_context` boundary: the engine
/// degrades to a partial context list instead of unwinding. They exist so
/// the internal layers (codec, tokenizer) can report precisely what went
/// wrong and the driver can log it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// A detector-token span could not be hex/UTF-8 decoded. The span is
    /// skipped and analysis continues with the remaining document.
    #[error("detector span desync: {reason} in segment {segment:?}")]
    CodecDesync { segment: String, reason: String },

    /// The tokenizer hit input it cannot make progress on. Everything
    /// tokenized before this offset stands; the rest of the document is
    /// not scanned.
    #[error("malformed markup at byte offset {offset}")]
    MalformedMarkup { offset: usize },
}

pub type Result<T> = std::result::Result<T, ContextError>;
