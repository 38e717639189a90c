// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Konteksti
 * HTML/JavaScript/CSS injection context detection engine
 *
 * Given a raw HTML document and the boundary marker pair a scanner
 * injected into a request, find every syntactic position where the marked
 * payload reappears, classify the surrounding markup/script/style context,
 * and answer two questions per position: can injected content break out of
 * its context, and is the position already executable.
 *
 * The engine is a pure function over text. No network, no files, no shared
 * mutable state; independent calls are safe from any number of worker
 * threads.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod boundary;
pub mod context;
pub mod errors;
pub mod normalize;
pub mod str_utils;
pub mod tokenizer;

pub use boundary::{decode, Boundary, DecodedText, DETECTOR_TOKEN};
pub use context::{
    get_context, resolve_quote, Context, ContextKind, ContextSummary, DelimiterKind,
    JS_EVENT_ATTRIBUTES, URI_SINK_ATTRIBUTES,
};
pub use context::css::get_css_context;
pub use context::js::get_js_context;
pub use errors::ContextError;
