use arena_core::{ActionError, CardSpec, DirectoryError, MatchmakingError, PlayerId, SubmitError};

use crate::battle::{Battle, DeckStatus};
use crate::directory::SessionDirectory;
use crate::matchmaker::Matchmaker;

/// A battle that just reached its terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletedBattle {
    pub winner: PlayerId,
    pub loser: PlayerId,
}

/// Composes the matchmaking queue and the session directory into the game
/// operations the dispatcher calls. Explicitly constructed and handed to the
/// dispatcher at startup; there is no ambient instance.
#[derive(Debug, Default)]
pub struct GameCoordinator {
    matchmaker: Matchmaker,
    directory: SessionDirectory,
}

impl GameCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matchmaking entry point: pair `id` with a waiting opponent, or queue
    /// them. A participant already queued or already mid-battle is rejected.
    pub fn process_waiting_player(
        &mut self,
        id: PlayerId,
    ) -> Result<Option<PlayerId>, MatchmakingError> {
        if self.directory.contains(id) {
            return Err(MatchmakingError::AlreadyInBattle(id));
        }
        let Some(opponent) = self.matchmaker.enqueue_or_match(id)? else {
            tracing::info!(user = %id, "waiting for an opponent");
            return Ok(None);
        };
        match self.directory.attach(Battle::new(id, opponent)) {
            Ok(match_id) => {
                tracing::info!(user = %id, opponent = %opponent, %match_id, "battle created");
                Ok(Some(opponent))
            }
            Err(DirectoryError::AlreadyInSession(p)) => {
                Err(MatchmakingError::AlreadyInBattle(p))
            }
        }
    }

    /// Store a deck for `id`'s current battle.
    pub fn submit_deck(
        &mut self,
        id: PlayerId,
        cards: &[CardSpec],
    ) -> Result<DeckStatus, SubmitError> {
        let battle = self
            .directory
            .find_mut(id)
            .ok_or(SubmitError::NotInBattle(id))?;
        battle.submit_deck(id, cards)
    }

    /// Resolve one attack inside `actor`'s current battle.
    pub fn resolve_action(
        &mut self,
        actor: PlayerId,
        card_id: u64,
        target_id: u64,
    ) -> Result<f64, ActionError> {
        let battle = self
            .directory
            .find_mut(actor)
            .ok_or(ActionError::ActorDeckNotFound)?;
        battle.resolve_action(actor, card_id, target_id)
    }

    /// Check whether `id`'s battle just ended. A terminal battle is detached
    /// from the directory, freeing both participants for new matchmaking.
    pub fn check_outcome(&mut self, id: PlayerId) -> Option<CompletedBattle> {
        let battle = self.directory.find_mut(id)?;
        let winner = battle.check_outcome()?;
        let loser = battle.opponent_of(winner)?;
        self.directory.detach_by_participant(winner);
        tracing::info!(winner = %winner, loser = %loser, "battle finished");
        Some(CompletedBattle { winner, loser })
    }

    /// Pass the turn; returns the new holder.
    pub fn end_turn(&mut self, id: PlayerId) -> Option<PlayerId> {
        self.directory.find_mut(id)?.end_turn(id)
    }

    pub fn is_fighting(&self, id: PlayerId) -> bool {
        self.directory.contains(id)
    }

    pub fn opponent_of(&self, id: PlayerId) -> Option<PlayerId> {
        self.directory.find(id)?.opponent_of(id)
    }

    /// Card ids of `id`'s own deck, for the opponent-reveal at battle start.
    pub fn deck_ids(&self, id: PlayerId) -> Option<Vec<u64>> {
        self.directory.find(id)?.deck_card_ids(id)
    }

    /// Teardown for a vanished connection: drop any queue entry and detach
    /// any active battle. Returns the opponent owed a forfeit notification.
    pub fn handle_disconnect(&mut self, id: PlayerId) -> Option<PlayerId> {
        self.matchmaker.remove(id);
        let battle = self.directory.detach_by_participant(id)?;
        let opponent = battle.opponent_of(id);
        tracing::info!(user = %id, "battle forfeited by disconnect");
        opponent
    }

    pub fn waiting_count(&self) -> usize {
        self.matchmaker.len()
    }

    pub fn active_battles(&self) -> usize {
        self.directory.len()
    }
}
