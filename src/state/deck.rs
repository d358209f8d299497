//! The shared draw pile.
//!
//! Holds the undealt cards in a shuffled order. Cards are drawn from the
//! back of the sequence, so a draw is a truncate and never reuses an
//! identifier until [`Deck::reinitialize`] restores all 52.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::card::{Card, DECK_SIZE};

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
    rng: StdRng,
}

impl Deck {
    /// Create a freshly shuffled deck seeded from entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a deck with a reproducible shuffle sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let mut deck = Self {
            cards: Vec::with_capacity(DECK_SIZE),
            rng,
        };
        deck.reinitialize();
        deck
    }

    /// Replace the contents with all 52 cards in a new random order.
    pub fn reinitialize(&mut self) {
        self.cards.clear();
        self.cards.extend(Card::all());
        self.cards.shuffle(&mut self.rng);
        tracing::debug!(size = self.cards.len(), "deck reshuffled");
    }

    /// Remove `n` cards from the top.
    ///
    /// Returns an empty vector and leaves the deck untouched when fewer than
    /// `n` cards remain; callers treat that as exhaustion, never as a
    /// partial draw.
    pub fn draw(&mut self, n: usize) -> Vec<Card> {
        if self.cards.len() < n {
            tracing::debug!(requested = n, remaining = self.cards.len(), "not enough cards to draw");
            return Vec::new();
        }
        let at = self.cards.len() - n;
        self.cards.split_off(at)
    }

    pub fn size(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Remaining cards, next to be drawn last.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Full deck arranged so that `draw(top.len())` returns `top` as given.
    #[cfg(test)]
    pub(crate) fn stacked(top: &[Card]) -> Self {
        let mut deck = Self::with_seed(0);
        deck.cards.retain(|card| !top.contains(card));
        deck.cards.extend_from_slice(top);
        deck
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}
