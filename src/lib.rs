//! Blackjack Duel
//!
//! A two-player networked blackjack coordinator.
//!
//! # Overview
//!
//! - **Session State Machine** - Seats two connections, deals from a shared
//!   deck, scores hands and synchronises rematches.
//!
//! - **Scoring** - Card values, soft-ace totals and natural blackjack
//!   detection over plain card identifiers.
//!
//! - **WebSocket Server** - Accepts connections, decodes JSON requests and
//!   delivers the session's events back to each peer.
//!
//! # Design Principles
//!
//! 1. **State is transport agnostic** - `Session` is generic over the
//!    connection handle and returns events instead of sending them.
//!
//! 2. **Closed message sets** - Requests and events are enums, dispatched
//!    with exhaustive matches.
//!
//! 3. **Exhaustion is not an error** - Running out of cards is reported to
//!    the client as an event; only a full session refuses a connection.
//!
//! # Example
//!
//! ```rust
//! use blackjack_duel::state::{ClientRequest, Deck, ServerEvent, Session};
//!
//! let mut session: Session<u32> = Session::with_deck(Deck::with_seed(7));
//!
//! session.add_player(1).unwrap();
//! session.add_player(2).unwrap();
//! assert!(session.add_player(3).is_err());
//!
//! let events = session.handle(&1, ClientRequest::Ready);
//! assert!(matches!(
//!     events[0].event,
//!     ServerEvent::InitialHand { .. } | ServerEvent::RoundResult { .. }
//! ));
//! ```

pub mod server;
pub mod state;

pub use state::*;
