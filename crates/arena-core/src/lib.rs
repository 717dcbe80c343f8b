pub mod cards;
pub mod errors;
pub mod events;
pub mod ids;

pub use cards::{Card, CardSpec, Deck};
pub use errors::{ActionError, CardError, ChatError, DirectoryError, MatchmakingError, SubmitError};
pub use events::{ChatMessage, ClientEvent, GameResult, PresenceUser, ServerEvent};
pub use ids::{MatchId, PlayerId};
