//! Two-seat blackjack session.
//!
//! The session owns the deck and both player records. Every operation
//! mutates state synchronously and returns the events to deliver, so the
//! caller can release its lock before doing any I/O.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;
use tracing::{debug, info};

use super::card::{Card, BLACKJACK_TOTAL};
use super::deck::Deck;
use super::player::Player;
use super::protocol::{ClientRequest, Outbound, Outcome, ServerEvent};

/// Seats per session.
pub const MAX_PLAYERS: usize = 2;

/// Cards dealt on `ready`.
pub const INITIAL_HAND_SIZE: usize = 2;

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session is full ({capacity} players)")]
    SessionFull { capacity: usize },
    #[error("connection is not seated in this session")]
    UnknownPlayer,
}

/// Result of a successful admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub name: String,
    /// False when the connection already held a seat
    pub created: bool,
}

/// Session state, keyed by the transport's connection handle.
#[derive(Debug)]
pub struct Session<C> {
    deck: Deck,
    players: HashMap<C, Player>,
    /// Seat order, used to keep fan-out deterministic
    seats: Vec<C>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl<C> Session<C>
where
    C: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self::with_deck(Deck::new())
    }

    pub fn with_deck(deck: Deck) -> Self {
        Self {
            deck,
            players: HashMap::with_capacity(MAX_PLAYERS),
            seats: Vec::with_capacity(MAX_PLAYERS),
            created_at: chrono::Utc::now(),
        }
    }

    /// Seat a connection.
    ///
    /// Re-admitting a seated connection succeeds without creating a slot.
    pub fn add_player(&mut self, conn: C) -> Result<Admission, SessionError> {
        if let Some(player) = self.players.get(&conn) {
            return Ok(Admission {
                name: player.name.clone(),
                created: false,
            });
        }

        if self.is_full() {
            return Err(SessionError::SessionFull {
                capacity: MAX_PLAYERS,
            });
        }

        let name = format!("Player {}", self.players.len() + 1);
        info!(?conn, player = %name, "player seated");

        self.players.insert(conn.clone(), Player::new(name.clone()));
        self.seats.push(conn);

        Ok(Admission {
            name,
            created: true,
        })
    }

    /// Seat a connection and build its `connection_accepted` event.
    pub fn accept(&mut self, conn: C) -> Result<Vec<Outbound<C>>, SessionError> {
        let admission = self.add_player(conn.clone())?;
        Ok(vec![Outbound::new(
            conn,
            ServerEvent::ConnectionAccepted {
                name: admission.name,
            },
        )])
    }

    /// Event sent to a refused connection before it is closed.
    pub fn reject_event() -> ServerEvent {
        ServerEvent::session_full()
    }

    /// Drop a connection's seat. The other player is left untouched.
    pub fn remove_player(&mut self, conn: &C) -> Option<Player> {
        let player = self.players.remove(conn)?;
        self.seats.retain(|seat| seat != conn);
        info!(?conn, player = %player.name, "player left");
        Some(player)
    }

    /// Route a request. Requests from unseated connections produce nothing.
    pub fn handle(&mut self, conn: &C, request: ClientRequest) -> Vec<Outbound<C>> {
        let result = match request {
            ClientRequest::Ready => self.ready(conn),
            ClientRequest::DrawCard => self.draw(conn),
            ClientRequest::Rematch => self.rematch(conn),
        };

        match result {
            Ok(outbound) => outbound,
            Err(err) => {
                debug!(?conn, ?request, %err, "request ignored");
                Vec::new()
            }
        }
    }

    /// Deal the initial hand.
    pub fn ready(&mut self, conn: &C) -> Result<Vec<Outbound<C>>, SessionError> {
        let player = self
            .players
            .get_mut(conn)
            .ok_or(SessionError::UnknownPlayer)?;

        let cards = self.deck.draw(INITIAL_HAND_SIZE);
        if cards.is_empty() {
            info!(player = %player.name, remaining = self.deck.size(), "deck exhausted on deal");
            return Ok(vec![Outbound::new(conn.clone(), ServerEvent::deck_exhausted())]);
        }

        player.add_cards(&cards);
        player.ready = true;
        debug!(%player, "initial hand");

        if player.is_blackjack() {
            info!(player = %player.name, "blackjack on deal");
            player.turn_done = true;
            return Ok(vec![Outbound::new(
                conn.clone(),
                ServerEvent::RoundResult {
                    result: Outcome::Blackjack,
                },
            )]);
        }

        info!(player = %player.name, cards = ?card_names(&cards), "initial hand dealt");
        Ok(vec![Outbound::new(
            conn.clone(),
            ServerEvent::InitialHand { cards },
        )])
    }

    /// Draw one card and check for bust or 21.
    pub fn draw(&mut self, conn: &C) -> Result<Vec<Outbound<C>>, SessionError> {
        let player = self
            .players
            .get_mut(conn)
            .ok_or(SessionError::UnknownPlayer)?;

        if player.has_reached_limit() {
            debug!(player = %player.name, "hand at limit, draw ignored");
            return Ok(Vec::new());
        }

        let Some(card) = self.deck.draw(1).pop() else {
            info!(player = %player.name, "deck exhausted on draw");
            return Ok(vec![Outbound::new(conn.clone(), ServerEvent::deck_exhausted())]);
        };

        player.add_cards(&[card]);
        info!(player = %player.name, card = %card, "card drawn");
        debug!(%player, "hand after draw");

        let mut outbound = vec![Outbound::new(conn.clone(), ServerEvent::CardDealt { card })];

        let total = player.total();
        let outcome = if total > BLACKJACK_TOTAL {
            Some(Outcome::Defeat)
        } else if total == BLACKJACK_TOTAL {
            // Reaching 21 by drawing reports the same tag as a natural.
            Some(Outcome::Blackjack)
        } else {
            None
        };

        if let Some(result) = outcome {
            info!(player = %player.name, total, %result, "round concluded");
            player.turn_done = true;
            outbound.push(Outbound::new(conn.clone(), ServerEvent::RoundResult { result }));
        }

        Ok(outbound)
    }

    /// Record a rematch vote; resets once both seated players have voted.
    pub fn rematch(&mut self, conn: &C) -> Result<Vec<Outbound<C>>, SessionError> {
        let player = self
            .players
            .get_mut(conn)
            .ok_or(SessionError::UnknownPlayer)?;

        player.wants_rematch = true;
        info!(player = %player.name, "rematch requested");

        if !self.all_wants_rematch() {
            return Ok(Vec::new());
        }

        info!("all players want a rematch, starting a new round");
        self.reset();

        let outbound = self
            .seats
            .iter()
            .flat_map(|seat| {
                [
                    Outbound::new(seat.clone(), ServerEvent::empty_hand()),
                    Outbound::new(seat.clone(), ServerEvent::SessionReset),
                ]
            })
            .collect();

        Ok(outbound)
    }

    /// Clear every player and reshuffle. Seats are kept.
    pub fn reset(&mut self) {
        for player in self.players.values_mut() {
            player.reset();
        }
        self.deck.reinitialize();
        info!(players = self.players.len(), deck = self.deck.size(), "session reset");
    }

    pub fn all_wants_rematch(&self) -> bool {
        self.players.len() == MAX_PLAYERS && self.players.values().all(|p| p.wants_rematch)
    }

    pub fn all_turns_done(&self) -> bool {
        self.players.len() == MAX_PLAYERS && self.players.values().all(|p| p.turn_done)
    }

    pub fn player(&self, conn: &C) -> Option<&Player> {
        self.players.get(conn)
    }

    pub fn has_player(&self, conn: &C) -> bool {
        self.players.contains_key(conn)
    }

    /// Seated players in seat order.
    pub fn players(&self) -> impl Iterator<Item = (&C, &Player)> {
        self.seats
            .iter()
            .filter_map(|seat| self.players.get(seat).map(|p| (seat, p)))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut Deck {
        &mut self.deck
    }

    pub fn to_json(&self) -> serde_json::Value {
        let players: Vec<serde_json::Value> = self.players().map(|(_, p)| p.to_json()).collect();
        serde_json::json!({
            "players": players,
            "deck_size": self.deck.size(),
            "created_at": self.created_at
        })
    }
}

impl<C> Default for Session<C>
where
    C: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

fn card_names(cards: &[Card]) -> Vec<String> {
    cards.iter().map(|c| c.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::card::DECK_SIZE;
    use crate::state::player::RoundState;
    use pretty_assertions::assert_eq;

    type TestSession = Session<u32>;

    fn session() -> TestSession {
        Session::with_deck(Deck::with_seed(42))
    }

    fn seated() -> TestSession {
        let mut session = session();
        session.add_player(1).unwrap();
        session.add_player(2).unwrap();
        session
    }

    fn events(outbound: &[Outbound<u32>]) -> Vec<(u32, &'static str)> {
        outbound.iter().map(|o| (o.to, o.event.action())).collect()
    }

    #[test]
    fn test_admission_names() {
        let mut session = session();
        let first = session.add_player(10).unwrap();
        let second = session.add_player(20).unwrap();

        assert_eq!(first, Admission { name: "Player 1".to_string(), created: true });
        assert_eq!(second, Admission { name: "Player 2".to_string(), created: true });
        assert!(session.is_full());
    }

    #[test]
    fn test_readmission_is_idempotent() {
        let mut session = session();
        session.add_player(1).unwrap();
        let again = session.add_player(1).unwrap();

        assert_eq!(again, Admission { name: "Player 1".to_string(), created: false });
        assert_eq!(session.player_count(), 1);
    }

    #[test]
    fn test_third_player_rejected() {
        let mut session = seated();
        let result = session.add_player(3);

        assert_eq!(result, Err(SessionError::SessionFull { capacity: MAX_PLAYERS }));
        assert_eq!(session.player_count(), 2);
        assert!(!session.has_player(&3));
        assert_eq!(session.player(&1).unwrap().name, "Player 1");
        assert_eq!(session.player(&2).unwrap().name, "Player 2");

        // seated players can still re-admit when full
        assert!(session.add_player(2).is_ok());
    }

    #[test]
    fn test_accept_emits_name() {
        let mut session = session();
        let outbound = session.accept(5).unwrap();
        assert_eq!(
            outbound,
            vec![Outbound::new(5, ServerEvent::ConnectionAccepted { name: "Player 1".to_string() })]
        );
    }

    #[test]
    fn test_ready_deals_two_cards() {
        let mut session = seated();
        let outbound = session.handle(&1, ClientRequest::Ready);

        let player = session.player(&1).unwrap();
        assert!(player.ready);
        assert_eq!(player.hand().len(), INITIAL_HAND_SIZE);
        assert_eq!(session.deck().size(), DECK_SIZE - 2);

        assert_eq!(
            outbound,
            vec![Outbound::new(1, ServerEvent::InitialHand { cards: player.hand().to_vec() })]
        );
        assert!(!player.is_blackjack());
        assert!(!player.turn_done);
        assert_eq!(player.round_state(), RoundState::Dealt);
    }

    #[test]
    fn test_blackjack_on_deal() {
        let ace = Card::new(0).unwrap();
        let king = Card::new(12).unwrap();
        let mut session = Session::with_deck(Deck::stacked(&[ace, king]));
        session.add_player(1).unwrap();
        session.add_player(2).unwrap();

        let outbound = session.handle(&1, ClientRequest::Ready);

        // a natural skips the initial hand event
        assert_eq!(
            outbound,
            vec![Outbound::new(1, ServerEvent::RoundResult { result: Outcome::Blackjack })]
        );
        let player = session.player(&1).unwrap();
        assert_eq!(player.hand(), &[ace, king]);
        assert!(player.ready);
        assert!(player.turn_done);
        assert_eq!(player.round_state(), RoundState::Concluded);
        assert_eq!(session.deck().size(), DECK_SIZE - 2);
        assert!(!session.all_turns_done());
    }

    #[test]
    fn test_ready_with_one_card_left() {
        let mut session = seated();
        session.deck_mut().draw(DECK_SIZE - 1);

        let outbound = session.handle(&1, ClientRequest::Ready);

        assert_eq!(outbound, vec![Outbound::new(1, ServerEvent::deck_exhausted())]);
        let player = session.player(&1).unwrap();
        assert!(player.hand().is_empty());
        assert!(!player.ready);
        assert_eq!(session.deck().size(), 1);
    }

    #[test]
    fn test_draw_emits_card() {
        let mut session = seated();
        let top = *session.deck().cards().last().unwrap();

        let outbound = session.handle(&2, ClientRequest::DrawCard);

        assert_eq!(outbound[0], Outbound::new(2, ServerEvent::CardDealt { card: top }));
        assert_eq!(session.player(&2).unwrap().hand(), &[top]);
    }

    #[test]
    fn test_draw_on_empty_deck() {
        let mut session = seated();
        session.deck_mut().draw(DECK_SIZE);

        let outbound = session.handle(&1, ClientRequest::DrawCard);

        assert_eq!(outbound, vec![Outbound::new(1, ServerEvent::deck_exhausted())]);
        assert!(session.player(&1).unwrap().hand().is_empty());
    }

    #[test]
    fn test_draw_at_hand_limit_is_silent() {
        let mut session = seated();
        for _ in 0..crate::state::player::MAX_HAND_SIZE {
            session.handle(&1, ClientRequest::DrawCard);
        }
        let remaining = session.deck().size();

        let outbound = session.handle(&1, ClientRequest::DrawCard);

        assert!(outbound.is_empty());
        assert_eq!(session.deck().size(), remaining);
    }

    #[test]
    fn test_draw_until_bust() {
        let mut session = seated();
        loop {
            let outbound = session.handle(&1, ClientRequest::DrawCard);
            let total = session.player(&1).unwrap().total();
            match total {
                t if t > 21 => {
                    assert_eq!(
                        outbound.last().unwrap().event,
                        ServerEvent::RoundResult { result: Outcome::Defeat }
                    );
                    break;
                }
                21 => {
                    assert_eq!(
                        outbound.last().unwrap().event,
                        ServerEvent::RoundResult { result: Outcome::Blackjack }
                    );
                    break;
                }
                _ => assert_eq!(events(&outbound), vec![(1, "card_dealt")]),
            }
        }
        assert!(session.player(&1).unwrap().turn_done);
    }

    #[test]
    fn test_requests_from_unknown_connection() {
        let mut session = seated();
        assert!(session.handle(&9, ClientRequest::Ready).is_empty());
        assert!(session.handle(&9, ClientRequest::DrawCard).is_empty());
        assert!(session.handle(&9, ClientRequest::Rematch).is_empty());
        assert_eq!(session.ready(&9), Err(SessionError::UnknownPlayer));
        assert_eq!(session.deck().size(), DECK_SIZE);
    }

    #[test]
    fn test_single_rematch_waits() {
        let mut session = seated();
        session.handle(&1, ClientRequest::Ready);

        let outbound = session.handle(&1, ClientRequest::Rematch);

        assert!(outbound.is_empty());
        assert!(session.player(&1).unwrap().wants_rematch);
        assert!(!session.player(&2).unwrap().wants_rematch);
        assert_eq!(session.deck().size(), DECK_SIZE - 2);
    }

    #[test]
    fn test_both_rematch_resets() {
        let mut session = seated();
        session.handle(&1, ClientRequest::Ready);
        session.handle(&2, ClientRequest::Ready);
        session.handle(&2, ClientRequest::DrawCard);

        session.handle(&2, ClientRequest::Rematch);
        let outbound = session.handle(&1, ClientRequest::Rematch);

        assert_eq!(
            outbound,
            vec![
                Outbound::new(1, ServerEvent::empty_hand()),
                Outbound::new(1, ServerEvent::SessionReset),
                Outbound::new(2, ServerEvent::empty_hand()),
                Outbound::new(2, ServerEvent::SessionReset),
            ]
        );
        assert_eq!(session.deck().size(), DECK_SIZE);
        for (_, player) in session.players() {
            assert!(player.hand().is_empty());
            assert!(!player.ready);
            assert!(!player.turn_done);
            assert!(!player.wants_rematch);
        }
        assert_eq!(session.player_count(), 2);
    }

    #[test]
    fn test_rematch_needs_two_players() {
        let mut session = seated();
        session.handle(&2, ClientRequest::Rematch);
        session.remove_player(&2);

        let outbound = session.handle(&1, ClientRequest::Rematch);

        assert!(outbound.is_empty());
        assert!(session.player(&1).unwrap().wants_rematch);
    }

    #[test]
    fn test_removal_leaves_other_player() {
        let mut session = seated();
        session.handle(&1, ClientRequest::Ready);
        session.handle(&2, ClientRequest::Ready);

        let removed = session.remove_player(&2).unwrap();

        assert_eq!(removed.name, "Player 2");
        assert_eq!(session.player_count(), 1);
        assert!(session.player(&1).unwrap().ready);
        assert_eq!(session.deck().size(), DECK_SIZE - 4);
        assert!(session.remove_player(&2).is_none());
    }

    #[test]
    fn test_seat_reopens_after_removal() {
        let mut session = seated();
        session.remove_player(&1);

        let admission = session.add_player(3).unwrap();

        // names follow the current seat count
        assert_eq!(admission.name, "Player 2");
        assert_eq!(session.player_count(), 2);
        let names: Vec<&str> = session.players().map(|(_, p)| p.name.as_str()).collect();
        assert_eq!(names, vec!["Player 2", "Player 2"]);
    }

    #[test]
    fn test_all_turns_done() {
        let mut session = seated();
        assert!(!session.all_turns_done());
        for conn in [1, 2] {
            while !session.player(&conn).unwrap().turn_done {
                session.handle(&conn, ClientRequest::DrawCard);
            }
        }
        assert!(session.all_turns_done());
    }

    #[test]
    fn test_to_json() {
        let session = seated();
        let json = session.to_json();
        assert_eq!(json["deck_size"], 52);
        assert_eq!(json["players"][0]["name"], "Player 1");
        assert_eq!(json["players"][1]["state"], "waiting");
    }
}
