// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Splits an assistant reply into renderable pieces: fenced code blocks and
//! prose, and within prose, `**bold**` spans.
//!
//! Only these two constructs are recognised.  Everything else is passed
//! through verbatim as normal text.

mod inline;
mod segment;

pub use inline::{fragments, split_lines, Fragment};
pub use segment::{segment, Segment, DEFAULT_LANGUAGE};
