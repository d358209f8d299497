//! Card identifiers and scoring.
//!
//! A card is an integer in `[0, 52)`. The rank is `id % 13` (0 = ace,
//! 1..=8 = two through nine, 9..=12 = ten, jack, queen, king) and the suit
//! is `id / 13`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of distinct cards in a deck.
pub const DECK_SIZE: usize = 52;

/// Cards per suit.
pub const RANKS_PER_SUIT: u8 = 13;

/// Best possible hand total.
pub const BLACKJACK_TOTAL: u8 = 21;

const ACE_HIGH: u8 = 11;
const FACE_VALUE: u8 = 10;

const RANK_NAMES: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];
const SUIT_SYMBOLS: [&str; 4] = ["♣", "♥", "♠", "♦"];

/// A single card identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("card id {0} is outside 0..52")]
pub struct InvalidCard(pub u8);

impl Card {
    /// Build a card, returning `None` outside `[0, 52)`.
    pub fn new(id: u8) -> Option<Self> {
        if (id as usize) < DECK_SIZE {
            Some(Self(id))
        } else {
            None
        }
    }

    pub fn id(self) -> u8 {
        self.0
    }

    pub fn rank(self) -> u8 {
        self.0 % RANKS_PER_SUIT
    }

    pub fn suit(self) -> u8 {
        self.0 / RANKS_PER_SUIT
    }

    pub fn is_ace(self) -> bool {
        self.rank() == 0
    }

    /// Point value with the ace counted high.
    pub fn value(self) -> u8 {
        card_value(self)
    }

    /// Every card in identifier order.
    pub fn all() -> impl Iterator<Item = Card> {
        (0..DECK_SIZE as u8).map(Card)
    }
}

impl TryFrom<u8> for Card {
    type Error = InvalidCard;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Card::new(id).ok_or(InvalidCard(id))
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            RANK_NAMES[self.rank() as usize],
            SUIT_SYMBOLS[self.suit() as usize % SUIT_SYMBOLS.len()]
        )
    }
}

/// Point value of a card: ace 11, ten and faces 10, otherwise rank + 1.
pub fn card_value(card: Card) -> u8 {
    match card.rank() {
        0 => ACE_HIGH,
        rank if rank >= 9 => FACE_VALUE,
        rank => rank + 1,
    }
}

/// Best total for a hand, softening aces from 11 to 1 while over 21.
pub fn hand_total(hand: &[Card]) -> u8 {
    let mut total: u32 = hand.iter().map(|c| card_value(*c) as u32).sum();
    let mut soft_aces = hand.iter().filter(|c| c.is_ace()).count();

    while total > BLACKJACK_TOTAL as u32 && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }

    // At most 12 cards are ever held, so this cannot saturate in play.
    total.min(u8::MAX as u32) as u8
}

/// A natural: exactly an ace and a ten-value card.
pub fn is_blackjack(hand: &[Card]) -> bool {
    if hand.len() != 2 {
        return false;
    }
    let mut values = [card_value(hand[0]), card_value(hand[1])];
    values.sort_unstable_by(|a, b| b.cmp(a));
    values == [ACE_HIGH, FACE_VALUE]
}

/// Human-readable card name, e.g. `K ♣`.
pub fn format_card(card: Card) -> String {
    card.to_string()
}
