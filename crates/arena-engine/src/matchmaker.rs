use arena_core::{MatchmakingError, PlayerId};

/// The queue of players waiting for an opponent.
///
/// Dequeue order is most-recently-enqueued first: the newest waiters pair with
/// each other before older ones. This mirrors the behavior players already
/// see; switching to FIFO would silently change who gets matched.
#[derive(Debug, Default)]
pub struct Matchmaker {
    waiting: Vec<PlayerId>,
}

impl Matchmaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop a waiting opponent for `id`, or enqueue `id` if nobody is waiting.
    ///
    /// An identity already in the queue is rejected, never enqueued twice.
    pub fn enqueue_or_match(&mut self, id: PlayerId) -> Result<Option<PlayerId>, MatchmakingError> {
        if self.waiting.contains(&id) {
            return Err(MatchmakingError::AlreadyQueued(id));
        }
        match self.waiting.pop() {
            Some(opponent) => Ok(Some(opponent)),
            None => {
                self.waiting.push(id);
                Ok(None)
            }
        }
    }

    /// Drop a waiting identity, e.g. when its connection goes away. Returns
    /// whether the identity was actually queued.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|w| *w != id);
        self.waiting.len() != before
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.waiting.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(n: u64) -> PlayerId {
        PlayerId::new(n)
    }

    #[test]
    fn first_player_waits() {
        let mut mm = Matchmaker::new();
        assert_eq!(mm.enqueue_or_match(p(1)), Ok(None));
        assert!(mm.contains(p(1)));
        assert_eq!(mm.len(), 1);
    }

    #[test]
    fn second_player_matches_the_waiter() {
        let mut mm = Matchmaker::new();
        mm.enqueue_or_match(p(1)).unwrap();
        assert_eq!(mm.enqueue_or_match(p(2)), Ok(Some(p(1))));
        assert!(mm.is_empty());
    }

    #[test]
    fn newest_waiter_is_popped_first() {
        let mut mm = Matchmaker::new();
        mm.enqueue_or_match(p(1)).unwrap();
        // 2 matches 1, so 3 and 4 can both wait
        assert_eq!(mm.enqueue_or_match(p(2)), Ok(Some(p(1))));
        mm.enqueue_or_match(p(3)).unwrap();
        // nobody popped 3 yet; 4 goes behind and 5 gets the newest waiter
        assert_eq!(mm.enqueue_or_match(p(4)), Ok(Some(p(3))));
        mm.enqueue_or_match(p(5)).unwrap();
        mm.enqueue_or_match(p(6)).unwrap();
        assert_eq!(mm.enqueue_or_match(p(7)), Ok(Some(p(6))));
        assert_eq!(mm.enqueue_or_match(p(8)), Ok(Some(p(5))));
    }

    #[test]
    fn duplicate_enqueue_is_rejected() {
        let mut mm = Matchmaker::new();
        mm.enqueue_or_match(p(1)).unwrap();
        assert_eq!(
            mm.enqueue_or_match(p(1)),
            Err(MatchmakingError::AlreadyQueued(p(1)))
        );
        assert_eq!(mm.len(), 1);
    }

    #[test]
    fn remove_drops_a_waiter() {
        let mut mm = Matchmaker::new();
        mm.enqueue_or_match(p(1)).unwrap();
        assert!(mm.remove(p(1)));
        assert!(!mm.remove(p(1)));
        assert!(mm.is_empty());
        // 2 now waits instead of matching a ghost
        assert_eq!(mm.enqueue_or_match(p(2)), Ok(None));
    }
}
