//! Requests and events exchanged with clients.
//!
//! Both directions are closed enums tagged by `action`, so adding a request
//! kind forces every dispatcher to handle it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::card::Card;

/// Message sent with `deck_exhausted`.
pub const DECK_EXHAUSTED_MESSAGE: &str = "Not enough cards left in the deck";

/// Message sent with `connection_rejected`.
pub const SESSION_FULL_MESSAGE: &str = "Maximum number of players reached";

/// An inbound request from a seated player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Deal the initial two cards
    Ready,
    /// Draw one more card
    DrawCard,
    /// Vote to start a new round
    Rematch,
}

/// How a round ended for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Blackjack,
    Defeat,
    Victory,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blackjack => "Blackjack",
            Self::Defeat => "Defeat",
            Self::Victory => "Victory",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound event for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Initial hand; empty when the session resets
    InitialHand { cards: Vec<Card> },
    CardDealt { card: Card },
    DeckExhausted { message: String },
    RoundResult { result: Outcome },
    ConnectionRejected { message: String },
    ConnectionAccepted { name: String },
    SessionReset,
}

impl ServerEvent {
    pub fn deck_exhausted() -> Self {
        Self::DeckExhausted {
            message: DECK_EXHAUSTED_MESSAGE.to_string(),
        }
    }

    pub fn session_full() -> Self {
        Self::ConnectionRejected {
            message: SESSION_FULL_MESSAGE.to_string(),
        }
    }

    pub fn empty_hand() -> Self {
        Self::InitialHand { cards: Vec::new() }
    }

    /// Wire tag, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::InitialHand { .. } => "initial_hand",
            Self::CardDealt { .. } => "card_dealt",
            Self::DeckExhausted { .. } => "deck_exhausted",
            Self::RoundResult { .. } => "round_result",
            Self::ConnectionRejected { .. } => "connection_rejected",
            Self::ConnectionAccepted { .. } => "connection_accepted",
            Self::SessionReset => "session_reset",
        }
    }
}

/// An event addressed to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound<C> {
    pub to: C,
    pub event: ServerEvent,
}

impl<C> Outbound<C> {
    pub fn new(to: C, event: ServerEvent) -> Self {
        Self { to, event }
    }
}
