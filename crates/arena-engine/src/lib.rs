pub mod battle;
pub mod chat;
pub mod coordinator;
pub mod directory;
pub mod matchmaker;

pub use battle::{compute_damage, Battle, BattlePhase, DeckStatus, TURN_ENERGY};
pub use chat::ChatStore;
pub use coordinator::{CompletedBattle, GameCoordinator};
pub use directory::SessionDirectory;
pub use matchmaker::Matchmaker;
