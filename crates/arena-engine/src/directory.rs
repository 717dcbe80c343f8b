use std::collections::HashMap;

use arena_core::{DirectoryError, MatchId, PlayerId};

use crate::battle::Battle;

/// Maps each participant to the battle it currently belongs to. Both
/// participants of a battle resolve to the same session; attach and detach
/// always touch both mappings together.
#[derive(Debug, Default)]
pub struct SessionDirectory {
    battles: HashMap<MatchId, Battle>,
    by_player: HashMap<PlayerId, MatchId>,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record both participants of `battle`. Fails as a whole if either
    /// participant already has a session; no partial mapping is left behind.
    pub fn attach(&mut self, battle: Battle) -> Result<MatchId, DirectoryError> {
        let (a, b) = battle.participants();
        for player in [a, b] {
            if self.by_player.contains_key(&player) {
                return Err(DirectoryError::AlreadyInSession(player));
            }
        }
        let id = battle.id().clone();
        self.by_player.insert(a, id.clone());
        self.by_player.insert(b, id.clone());
        self.battles.insert(id.clone(), battle);
        Ok(id)
    }

    pub fn find(&self, player: PlayerId) -> Option<&Battle> {
        let id = self.by_player.get(&player)?;
        self.battles.get(id)
    }

    pub fn find_mut(&mut self, player: PlayerId) -> Option<&mut Battle> {
        let id = self.by_player.get(&player)?;
        self.battles.get_mut(id)
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.by_player.contains_key(&player)
    }

    /// Remove the session `player` belongs to, dropping the mappings of both
    /// participants, and hand the battle back so the caller can notify the
    /// opponent.
    pub fn detach_by_participant(&mut self, player: PlayerId) -> Option<Battle> {
        let id = self.by_player.remove(&player)?;
        let battle = self.battles.remove(&id)?;
        let (a, b) = battle.participants();
        self.by_player.remove(&a);
        self.by_player.remove(&b);
        Some(battle)
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }
}
