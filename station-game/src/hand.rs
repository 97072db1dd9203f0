//! The player's hand of Action cards and the overflow choice.
use serde::{Deserialize, Serialize};

use crate::data::CardId;

/// Secondary state entered when a drawn Action card finds the hand full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "card", rename_all = "snake_case")]
pub enum OverflowChoice {
    #[default]
    Idle,
    ChoosingOverflow(CardId),
}

/// Outcome of replacing a hand slot with the overflow card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub index: usize,
    pub removed: CardId,
    pub inserted: CardId,
}

/// Ordered Action cards plus at most one pending overflow card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandState {
    cards: Vec<CardId>,
    capacity: usize,
    overflow: OverflowChoice,
}

impl HandState {
    /// Empty hand. Capacity is at least one card.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cards: Vec::new(),
            capacity: capacity.max(1),
            overflow: OverflowChoice::Idle,
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cards.len() >= self.capacity
    }

    #[must_use]
    pub fn contains(&self, card: &CardId) -> bool {
        self.cards.contains(card)
    }

    #[must_use]
    pub const fn overflow(&self) -> &OverflowChoice {
        &self.overflow
    }

    #[must_use]
    pub const fn is_choosing_overflow(&self) -> bool {
        matches!(self.overflow, OverflowChoice::ChoosingOverflow(_))
    }

    #[must_use]
    pub const fn pending_overflow(&self) -> Option<&CardId> {
        match &self.overflow {
            OverflowChoice::ChoosingOverflow(card) => Some(card),
            OverflowChoice::Idle => None,
        }
    }

    /// Append a card, or hand it back when the hand is full.
    ///
    /// # Errors
    ///
    /// Returns the card unchanged when there is no free slot.
    pub fn add(&mut self, card: CardId) -> Result<(), CardId> {
        if self.is_full() {
            return Err(card);
        }
        self.cards.push(card);
        Ok(())
    }

    /// Park a drawn card until the player replaces a slot or discards it.
    /// Returns false when a choice is already pending.
    pub fn start_overflow(&mut self, card: CardId) -> bool {
        if self.is_choosing_overflow() {
            return false;
        }
        self.overflow = OverflowChoice::ChoosingOverflow(card);
        true
    }

    /// Remove the first copy of `card`.
    pub fn remove(&mut self, card: &CardId) -> bool {
        let Some(idx) = self.cards.iter().position(|held| held == card) else {
            return false;
        };
        self.cards.remove(idx);
        true
    }

    /// Put the overflow card into slot `index`, dropping what was there.
    pub fn replace(&mut self, index: usize) -> Option<Replacement> {
        let inserted = self.pending_overflow()?.clone();
        let slot = self.cards.get_mut(index)?;
        let removed = std::mem::replace(slot, inserted.clone());
        self.overflow = OverflowChoice::Idle;
        Some(Replacement {
            index,
            removed,
            inserted,
        })
    }

    /// Throw the overflow card away, keeping the hand as is.
    pub fn discard_overflow(&mut self) -> Option<CardId> {
        match std::mem::take(&mut self.overflow) {
            OverflowChoice::ChoosingOverflow(card) => Some(card),
            OverflowChoice::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_hand() -> HandState {
        let mut hand = HandState::new(3);
        for id in ["a", "b", "c"] {
            hand.add(CardId::new(id)).unwrap();
        }
        hand
    }

    #[test]
    fn add_refuses_when_full() {
        let mut hand = full_hand();
        assert!(hand.is_full());
        assert_eq!(hand.add(CardId::new("d")), Err(CardId::new("d")));
        assert_eq!(hand.cards().len(), 3);
    }

    #[test]
    fn replace_swaps_slot_and_clears_choice() {
        let mut hand = full_hand();
        assert!(hand.start_overflow(CardId::new("d")));
        assert!(!hand.start_overflow(CardId::new("e")));
        assert!(hand.replace(7).is_none(), "index out of range keeps the choice");
        assert!(hand.is_choosing_overflow());

        let replacement = hand.replace(1).unwrap();
        assert_eq!(replacement.removed, CardId::new("b"));
        assert_eq!(hand.cards()[1], CardId::new("d"));
        assert_eq!(hand.overflow(), &OverflowChoice::Idle);
        assert!(hand.replace(0).is_none());
    }

    #[test]
    fn discard_keeps_hand() {
        let mut hand = full_hand();
        hand.start_overflow(CardId::new("d"));
        assert_eq!(hand.discard_overflow(), Some(CardId::new("d")));
        assert_eq!(hand.discard_overflow(), None);
        assert_eq!(
            hand.cards(),
            &[CardId::new("a"), CardId::new("b"), CardId::new("c")]
        );
    }

    #[test]
    fn remove_takes_first_copy() {
        let mut hand = HandState::new(5);
        hand.add(CardId::new("x")).unwrap();
        hand.add(CardId::new("y")).unwrap();
        hand.add(CardId::new("x")).unwrap();
        assert!(hand.remove(&CardId::new("x")));
        assert_eq!(hand.cards(), &[CardId::new("y"), CardId::new("x")]);
        assert!(!hand.remove(&CardId::new("z")));
        assert_eq!(HandState::new(0).capacity(), 1);
    }
}
