use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use arena_core::{ActionError, CardSpec, Deck, MatchId, PlayerId, SubmitError};

/// Energy budget granted to a player at the start of each of their turns.
pub const TURN_ENERGY: f64 = 100.0;

/// Lifecycle of a battle. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    AwaitingDecks,
    InProgress,
    Finished,
}

/// Result of a deck submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeckStatus {
    /// The other deck is still missing; keep waiting.
    Waiting,
    /// Both decks are in; the battle has started.
    Ready { first_turn: PlayerId },
}

/// `damage = max(attack × multiplier − defence, 0)`, multiplier 1.0 or 1.5.
pub fn compute_damage(attack: f64, defence: f64, multiplier: f64) -> f64 {
    (attack * multiplier - defence).max(0.0)
}

#[derive(Debug)]
struct Side {
    player: PlayerId,
    deck: Deck,
    /// Energy left in the current turn. Filled when the turn is granted, so a
    /// player who never held the turn cannot attack with a costed card.
    energy: f64,
}

/// One match between exactly two participants. Owns both decks; neither deck
/// outlives the battle.
#[derive(Debug)]
pub struct Battle {
    id: MatchId,
    sides: [Side; 2],
    phase: BattlePhase,
    turn: Option<PlayerId>,
    rng: StdRng,
}

impl Battle {
    pub fn new(a: PlayerId, b: PlayerId) -> Self {
        Self::with_rng(a, b, StdRng::from_entropy())
    }

    /// Deterministic variant for tests.
    pub fn seeded(a: PlayerId, b: PlayerId, seed: u64) -> Self {
        Self::with_rng(a, b, StdRng::seed_from_u64(seed))
    }

    fn with_rng(a: PlayerId, b: PlayerId, rng: StdRng) -> Self {
        debug_assert_ne!(a, b, "a battle needs two distinct participants");
        Self {
            id: MatchId::new(),
            sides: [
                Side { player: a, deck: Deck::new(), energy: 0.0 },
                Side { player: b, deck: Deck::new(), energy: 0.0 },
            ],
            phase: BattlePhase::AwaitingDecks,
            turn: None,
            rng,
        }
    }

    pub fn id(&self) -> &MatchId {
        &self.id
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn participants(&self) -> (PlayerId, PlayerId) {
        (self.sides[0].player, self.sides[1].player)
    }

    pub fn is_participant(&self, player: PlayerId) -> bool {
        self.side_index(player).is_some()
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        let idx = self.side_index(player)?;
        Some(self.sides[1 - idx].player)
    }

    /// Who currently holds the turn, once the battle has started.
    pub fn turn_holder(&self) -> Option<PlayerId> {
        self.turn
    }

    pub fn deck_card_ids(&self, player: PlayerId) -> Option<Vec<u64>> {
        let idx = self.side_index(player)?;
        Some(self.sides[idx].deck.ids())
    }

    pub fn energy_remaining(&self, player: PlayerId) -> Option<f64> {
        let idx = self.side_index(player)?;
        Some(self.sides[idx].energy)
    }

    fn side_index(&self, player: PlayerId) -> Option<usize> {
        self.sides.iter().position(|s| s.player == player)
    }

    /// Store a participant's deck. The whole submission is rejected if any
    /// card is invalid; the previously stored deck is left untouched.
    /// Re-submission before the battle starts overwrites wholesale.
    ///
    /// The battle starts the moment both decks are non-empty: a fair coin
    /// flip picks the first turn holder and fills their energy pool.
    pub fn submit_deck(
        &mut self,
        player: PlayerId,
        specs: &[CardSpec],
    ) -> Result<DeckStatus, SubmitError> {
        if self.phase != BattlePhase::AwaitingDecks {
            return Err(SubmitError::AlreadyStarted);
        }
        for spec in specs {
            spec.validate()?;
        }
        let idx = self
            .side_index(player)
            .ok_or(SubmitError::NotInBattle(player))?;
        self.sides[idx].deck = Deck::from_specs(specs);

        if self.sides.iter().any(|s| s.deck.is_empty()) {
            return Ok(DeckStatus::Waiting);
        }
        self.phase = BattlePhase::InProgress;
        let first_idx = usize::from(self.rng.gen_bool(0.5));
        self.sides[first_idx].energy = TURN_ENERGY;
        let first_turn = self.sides[first_idx].player;
        self.turn = Some(first_turn);
        Ok(DeckStatus::Ready { first_turn })
    }

    /// Resolve one attack. On success returns the damage dealt; the target
    /// card is removed outright when the damage would bring it to zero or
    /// below, otherwise its hit points are reduced.
    pub fn resolve_action(
        &mut self,
        actor: PlayerId,
        card_id: u64,
        target_id: u64,
    ) -> Result<f64, ActionError> {
        let actor_idx = self
            .side_index(actor)
            .ok_or(ActionError::ActorDeckNotFound)?;
        let target_player = self
            .opponent_of(actor)
            .ok_or(ActionError::TargetDeckNotFound)?;
        let target_idx = self
            .side_index(target_player)
            .ok_or(ActionError::TargetDeckNotFound)?;

        let (attack, cost) = {
            let card = self.sides[actor_idx]
                .deck
                .get(card_id)
                .ok_or(ActionError::ActorCardNotFound)?;
            (card.attack, card.energy)
        };
        let (defence, target_hp) = {
            let target = self.sides[target_idx]
                .deck
                .get(target_id)
                .ok_or(ActionError::TargetCardNotFound)?;
            (target.defence, target.current_hp)
        };
        if self.sides[actor_idx].energy < cost {
            return Err(ActionError::InsufficientEnergy);
        }

        let multiplier = if self.rng.gen_bool(0.5) { 1.5 } else { 1.0 };
        let damage = compute_damage(attack, defence, multiplier);
        self.sides[actor_idx].energy -= cost;

        if target_hp - damage <= 0.0 {
            self.sides[target_idx].deck.remove(target_id);
        } else if let Some(target) = self.sides[target_idx].deck.get_mut(target_id) {
            target.current_hp -= damage;
        }
        Ok(damage)
    }

    /// Pass the turn to the opponent and refill their energy pool. Returns
    /// the new turn holder, or `None` when `player` is not a participant of
    /// an in-progress battle.
    pub fn end_turn(&mut self, player: PlayerId) -> Option<PlayerId> {
        if self.phase != BattlePhase::InProgress {
            return None;
        }
        let next = self.opponent_of(player)?;
        let idx = self.side_index(next)?;
        self.sides[idx].energy = TURN_ENERGY;
        self.turn = Some(next);
        Some(next)
    }

    /// Detect a terminal state: the winner is the participant whose deck is
    /// still non-empty once the other's has emptied. Reports the winner
    /// exactly once; the battle moves to `Finished` and later calls return
    /// `None`.
    pub fn check_outcome(&mut self) -> Option<PlayerId> {
        if self.phase != BattlePhase::InProgress {
            return None;
        }
        let winner = if self.sides[0].deck.is_empty() {
            self.sides[1].player
        } else if self.sides[1].deck.is_empty() {
            self.sides[0].player
        } else {
            return None;
        };
        self.phase = BattlePhase::Finished;
        self.turn = None;
        Some(winner)
    }
}
