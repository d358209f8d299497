//! Game state for a two-player blackjack table.
//!
//! - `card` - card identifiers and scoring rules
//! - `deck` - the shuffled draw pile
//! - `player` - per-seat hand and round flags
//! - `protocol` - inbound requests and outbound events
//! - `session` - the state machine tying them together
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Session<C>                         │
//! │                                                          │
//! │  ┌──────────────┐   ┌────────────────────────────────┐   │
//! │  │     Deck     │   │  conn → Player (at most two)   │   │
//! │  │ 52 shuffled  │   │  hand, ready, turn_done,       │   │
//! │  │ card ids     │   │  wants_rematch                 │   │
//! │  └──────────────┘   └────────────────────────────────┘   │
//! │                                                          │
//! │  ClientRequest ──▶ handle() ──▶ Vec<Outbound<C>>         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here performs I/O. The transport decodes requests, calls into
//! the session under a lock and delivers the returned events afterwards.

pub mod card;
pub mod deck;
pub mod player;
pub mod protocol;
pub mod session;

pub use card::{card_value, format_card, hand_total, is_blackjack, Card, InvalidCard, DECK_SIZE};
pub use deck::Deck;
pub use player::{Player, RoundState, MAX_HAND_SIZE};
pub use protocol::{ClientRequest, Outbound, Outcome, ServerEvent};
pub use session::{Admission, Session, SessionError, INITIAL_HAND_SIZE, MAX_PLAYERS};
