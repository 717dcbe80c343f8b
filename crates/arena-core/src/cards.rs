use serde::{Deserialize, Serialize};

use crate::errors::CardError;

/// A card as submitted by the client, before any runtime state is attached.
///
/// Stats are floats on the wire: critical hits multiply attack by 1.5, so
/// fractional damage and hit points are part of the game's arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardSpec {
    pub id: u64,
    pub attack: f64,
    pub defence: f64,
    /// Energy required to attack with this card.
    pub energy: f64,
    /// Maximum hit points.
    pub hp: f64,
}

impl CardSpec {
    /// Validate the stat ranges: attack/defence/energy must be finite and
    /// non-negative, hp finite and strictly positive.
    pub fn validate(&self) -> Result<(), CardError> {
        for (field, value) in [
            ("attack", self.attack),
            ("defence", self.defence),
            ("energy", self.energy),
        ] {
            if !value.is_finite() {
                return Err(CardError::NotFinite { id: self.id, field });
            }
            if value < 0.0 {
                return Err(CardError::Negative { id: self.id, field });
            }
        }
        if !self.hp.is_finite() {
            return Err(CardError::NotFinite { id: self.id, field: "hp" });
        }
        if self.hp <= 0.0 {
            return Err(CardError::NonPositiveHp { id: self.id });
        }
        Ok(())
    }
}

/// A card inside an ongoing battle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: u64,
    pub attack: f64,
    pub defence: f64,
    pub energy: f64,
    pub hp: f64,
    pub current_hp: f64,
    pub current_energy: f64,
}

impl Card {
    pub fn from_spec(spec: &CardSpec) -> Self {
        Self {
            id: spec.id,
            attack: spec.attack,
            defence: spec.defence,
            energy: spec.energy,
            hp: spec.hp,
            current_hp: spec.hp,
            current_energy: spec.energy,
        }
    }
}

/// An ordered collection of cards owned by one side of one battle.
///
/// A card whose hit points reach zero is removed outright; the deck never
/// retains a zero-hp entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck(Vec<Card>);

impl Deck {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a deck from validated specs. Every spec must already have passed
    /// `CardSpec::validate`; callers reject the whole submission otherwise.
    pub fn from_specs(specs: &[CardSpec]) -> Self {
        Self(specs.iter().map(Card::from_spec).collect())
    }

    pub fn get(&self, card_id: u64) -> Option<&Card> {
        self.0.iter().find(|c| c.id == card_id)
    }

    pub fn get_mut(&mut self, card_id: u64) -> Option<&mut Card> {
        self.0.iter_mut().find(|c| c.id == card_id)
    }

    /// Remove a card by id, returning it if present.
    pub fn remove(&mut self, card_id: u64) -> Option<Card> {
        let idx = self.0.iter().position(|c| c.id == card_id)?;
        Some(self.0.remove(idx))
    }

    pub fn ids(&self) -> Vec<u64> {
        self.0.iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
