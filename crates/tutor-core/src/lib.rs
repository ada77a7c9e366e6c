// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod turn;
mod error;
mod events;
mod store;
#[cfg(test)]
mod tests;

pub use turn::{find_pair, nth_user_turn, turn_short_preview, Sender, Turn};
pub use error::{Outcome, StoreError};
pub use events::ConversationEvent;
pub use store::ConversationStore;
