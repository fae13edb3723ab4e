//! Ownership records linking users to the cards they have drawn.

use chrono::{DateTime, Utc};

use super::card::Card;

/// Experience added to an owned card each time it is drawn again.
pub const DUPLICATE_EXPERIENCE: i32 = 10;

/// A card in a user's collection.
///
/// At most one record exists per `(user_id, card_id)` pair. Drawing a card
/// the user already owns bumps `experience` instead of adding a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedCard {
    pub id: i64,
    pub user_id: i64,
    pub card_id: i64,
    pub level: i32,
    pub experience: i32,
    pub obtained_at: DateTime<Utc>,
}

impl OwnedCard {
    /// Applies the duplicate-draw experience bonus.
    pub fn absorb_duplicate(&mut self) {
        self.experience += DUPLICATE_EXPERIENCE;
    }
}

/// Input data for the first draw of a card by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOwnedCard {
    pub user_id: i64,
    pub card_id: i64,
}

/// An owned card joined with its catalog entry.
#[derive(Debug, Clone)]
pub struct CollectionEntry {
    pub owned: OwnedCard,
    pub card: Card,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_duplicate_adds_fixed_experience() {
        let mut owned = OwnedCard {
            id: 3,
            user_id: 1,
            card_id: 42,
            level: 1,
            experience: 0,
            obtained_at: Utc::now(),
        };

        owned.absorb_duplicate();
        owned.absorb_duplicate();

        assert_eq!(owned.experience, 20);
        assert_eq!(owned.level, 1);
    }
}
