use crate::ids::PlayerId;

/// Failure kinds for battle action resolution, checked in this order.
///
/// The negative codes are the wire codes carried by `ACTION_FAILED`; the
/// display strings are the messages clients already know how to render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("User deck could not be found.")]
    ActorDeckNotFound,
    #[error("Enemy deck could not be found.")]
    TargetDeckNotFound,
    #[error("The card could not be found.")]
    ActorCardNotFound,
    #[error("The target card could not be found.")]
    TargetCardNotFound,
    #[error("Not enough energy left this turn to attack with this card.")]
    InsufficientEnergy,
}

impl ActionError {
    pub fn code(&self) -> i32 {
        match self {
            Self::ActorDeckNotFound => -1,
            Self::TargetDeckNotFound => -2,
            Self::ActorCardNotFound => -3,
            Self::TargetCardNotFound => -4,
            Self::InsufficientEnergy => -5,
        }
    }

    /// Short classification string for logging/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ActorDeckNotFound => "actor_deck_not_found",
            Self::TargetDeckNotFound => "target_deck_not_found",
            Self::ActorCardNotFound => "actor_card_not_found",
            Self::TargetCardNotFound => "target_card_not_found",
            Self::InsufficientEnergy => "insufficient_energy",
        }
    }
}

/// A single invalid card fails the whole deck submission.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum CardError {
    #[error("card {id}: {field} must be a finite number")]
    NotFinite { id: u64, field: &'static str },
    #[error("card {id}: {field} must not be negative")]
    Negative { id: u64, field: &'static str },
    #[error("card {id}: hp must be strictly positive")]
    NonPositiveHp { id: u64 },
}

/// Deck submission failures.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    InvalidCard(#[from] CardError),
    #[error("user {0} has no active battle")]
    NotInBattle(PlayerId),
    #[error("the battle has already started")]
    AlreadyStarted,
}

impl SubmitError {
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidCard(_) => -6,
            Self::NotInBattle(_) => -7,
            Self::AlreadyStarted => -8,
        }
    }
}

/// Matchmaking invariant violations. Rejected, never silently overwritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("user {0} is already waiting for an opponent")]
    AlreadyQueued(PlayerId),
    #[error("user {0} is already in a battle")]
    AlreadyInBattle(PlayerId),
}

impl MatchmakingError {
    pub fn code(&self) -> i32 {
        match self {
            Self::AlreadyQueued(_) => -10,
            Self::AlreadyInBattle(_) => -11,
        }
    }
}

/// Session directory invariant violations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("user {0} is already attached to a session")]
    AlreadyInSession(PlayerId),
}

/// Chat failures, reported to the sender only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("You cannot select yourself as the receiver.")]
    SelfSelection,
    #[error("The user you are trying to contact is not connected.")]
    ReceiverNotConnected,
    #[error("The user you are trying to reach is not online.")]
    ReceiverOffline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_error_codes_match_wire_protocol() {
        assert_eq!(ActionError::ActorDeckNotFound.code(), -1);
        assert_eq!(ActionError::TargetDeckNotFound.code(), -2);
        assert_eq!(ActionError::ActorCardNotFound.code(), -3);
        assert_eq!(ActionError::TargetCardNotFound.code(), -4);
        assert_eq!(ActionError::InsufficientEnergy.code(), -5);
    }

    #[test]
    fn action_error_messages_are_client_facing() {
        assert_eq!(
            ActionError::ActorDeckNotFound.to_string(),
            "User deck could not be found."
        );
        assert_eq!(
            ActionError::TargetCardNotFound.to_string(),
            "The target card could not be found."
        );
    }

    #[test]
    fn submit_error_wraps_card_error() {
        let err: SubmitError = CardError::NonPositiveHp { id: 9 }.into();
        assert_eq!(err.code(), -6);
        assert_eq!(err.to_string(), "card 9: hp must be strictly positive");
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(ActionError::InsufficientEnergy.kind(), "insufficient_energy");
        assert_eq!(ActionError::ActorCardNotFound.kind(), "actor_card_not_found");
    }
}
