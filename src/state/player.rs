//! Per-seat player record.
//!
//! Round progress is tracked with three independent flags. [`RoundState`]
//! is a read-only view derived from them.
//!
//! # Round Diagram
//!
//! ```text
//! ┌──────────┐  ready   ┌─────────┐  draw   ┌──────────┐
//! │ Waiting  │─────────▶│  Dealt  │────────▶│  Acting  │
//! └──────────┘          └────┬────┘         └────┬─────┘
//!      ▲                     │ blackjack         │ bust / 21
//!      │                     ▼                   ▼
//!      │ rematch       ┌──────────────────────────────┐
//!      └───────────────│          Concluded           │
//!                      └──────────────────────────────┘
//! ```

use std::fmt;

use super::card::{self, Card};

/// Hard ceiling on cards held by one player.
pub const MAX_HAND_SIZE: usize = 12;

/// Where a player is within the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Seated, initial hand not dealt yet
    Waiting,
    /// Initial two cards dealt
    Dealt,
    /// Drawn at least one extra card
    Acting,
    /// Outcome sent, waiting for a rematch
    Concluded,
}

impl RoundState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Dealt => "dealt",
            Self::Acting => "acting",
            Self::Concluded => "concluded",
        }
    }
}

impl fmt::Display for RoundState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seated player.
#[derive(Debug, Clone)]
pub struct Player {
    /// Display name ("Player 1", "Player 2")
    pub name: String,

    /// Cards in draw order
    hand: Vec<Card>,

    /// Initial hand has been dealt
    pub ready: bool,

    /// An outcome has been sent this round
    pub turn_done: bool,

    /// Asked for a rematch
    pub wants_rematch: bool,

    /// When the seat was taken
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hand: Vec::with_capacity(MAX_HAND_SIZE),
            ready: false,
            turn_done: false,
            wants_rematch: false,
            joined_at: chrono::Utc::now(),
        }
    }

    /// Append cards, dropping any beyond [`MAX_HAND_SIZE`].
    pub fn add_cards(&mut self, cards: &[Card]) {
        for card in cards {
            if self.has_reached_limit() {
                tracing::debug!(player = %self.name, card = %card, "hand full, card discarded");
                continue;
            }
            self.hand.push(*card);
        }
    }

    /// Clear the hand and all flags.
    pub fn reset(&mut self) {
        self.hand.clear();
        self.ready = false;
        self.turn_done = false;
        self.wants_rematch = false;
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn total(&self) -> u8 {
        card::hand_total(&self.hand)
    }

    pub fn is_blackjack(&self) -> bool {
        card::is_blackjack(&self.hand)
    }

    pub fn has_reached_limit(&self) -> bool {
        self.hand.len() >= MAX_HAND_SIZE
    }

    pub fn round_state(&self) -> RoundState {
        if !self.ready {
            RoundState::Waiting
        } else if self.turn_done {
            RoundState::Concluded
        } else if self.hand.len() <= 2 {
            RoundState::Dealt
        } else {
            RoundState::Acting
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "hand": self.hand,
            "total": self.total(),
            "state": self.round_state().as_str(),
            "wants_rematch": self.wants_rematch,
            "joined_at": self.joined_at
        })
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.hand.iter().map(|c| card::format_card(*c)).collect();
        write!(
            f,
            "name = {} | hand = [{}] | total = {} | blackjack = {} | ready = {} | turn_done = {}",
            self.name,
            names.join(", "),
            self.total(),
            self.is_blackjack(),
            self.ready,
            self.turn_done
        )
    }
}
