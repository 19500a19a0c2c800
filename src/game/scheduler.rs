use rand::{seq::SliceRandom, Rng};

use crate::error::GameError;

/// Where the game currently stands in its turn rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    /// Waiting for a player of the current team to open a round
    Active,
    RoundOpen,
    /// A full circle has been played, waiting for "new circle" or "finish"
    AwaitingCircleDecision,
}

/// Kind of round-start a validated request is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartKind {
    /// The first round of a game, the turn order is not drawn yet
    FirstRound,
    NextRound,
}

/// What happens after a round closes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    NextTeam(String),
    CircleComplete,
}

/// Turn rotation state machine.
///
/// Holds the team order drawn at game start and a cursor pointing at the team
/// whose player may open the next round. The cursor is always a valid index
/// while the game is running.
#[derive(Debug)]
pub struct TurnScheduler {
    phase: Phase,
    order: Vec<String>,
    index: usize,
}

impl Default for TurnScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self {
            phase: Phase::NotStarted,
            order: Vec::new(),
            index: 0,
        }
    }

    /// Check whether a player of `requester_team` may open a round now
    pub fn authorize(&self, requester_team: Option<&str>) -> Result<StartKind, GameError> {
        match self.phase {
            Phase::RoundOpen => return Err(GameError::RoundInProgress),
            Phase::AwaitingCircleDecision => return Err(GameError::CircleDecisionPending),
            Phase::NotStarted | Phase::Active => {}
        }

        let team = requester_team.ok_or(GameError::NotInTeam)?;

        if self.phase == Phase::NotStarted {
            return Ok(StartKind::FirstRound);
        }

        match self.current_team() {
            Some(expected) if expected == team => Ok(StartKind::NextRound),
            Some(expected) => Err(GameError::NotYourTurn {
                expected: expected.to_string(),
            }),
            None => Err(GameError::NotConfigured),
        }
    }

    /// Draw the turn order for a new game.
    ///
    /// The order is shuffled, then `first_team` (the team that requested the
    /// first round) is moved to the head so the cursor names the team that
    /// is actually playing.
    pub fn begin<R: Rng + ?Sized>(&mut self, teams: Vec<String>, first_team: &str, rng: &mut R) {
        self.order = teams;
        self.order.shuffle(rng);
        if let Some(pos) = self.order.iter().position(|t| t == first_team) {
            let team = self.order.remove(pos);
            self.order.insert(0, team);
        }
        self.index = 0;
        self.phase = Phase::Active;
    }

    pub fn open_round(&mut self) {
        self.phase = Phase::RoundOpen;
    }

    /// Move the cursor after a round. Completing the last team of the order
    /// rewinds the cursor and waits for a circle decision.
    pub fn round_closed(&mut self) -> Advance {
        if self.order.is_empty() {
            self.phase = Phase::NotStarted;
            return Advance::CircleComplete;
        }

        if self.index + 1 >= self.order.len() {
            self.index = 0;
            self.phase = Phase::AwaitingCircleDecision;
            Advance::CircleComplete
        } else {
            self.index += 1;
            self.phase = Phase::Active;
            Advance::NextTeam(self.order[self.index].clone())
        }
    }

    /// Start another circle. Returns the team expected to play first, or
    /// `None` when no circle decision is pending.
    pub fn new_circle(&mut self) -> Option<&str> {
        if self.phase != Phase::AwaitingCircleDecision {
            return None;
        }
        self.index = 0;
        self.phase = Phase::Active;
        self.current_team()
    }

    pub fn current_team(&self) -> Option<&str> {
        self.order.get(self.index).map(String::as_str)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        self.phase != Phase::NotStarted
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn teams(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("T{}", i)).collect()
    }

    fn started(n: usize, first: &str) -> TurnScheduler {
        let mut scheduler = TurnScheduler::new();
        scheduler.begin(teams(n), first, &mut StdRng::seed_from_u64(42));
        scheduler
    }

    #[test]
    fn test_first_start_is_exempt_from_turn_check() {
        let scheduler = TurnScheduler::new();
        assert_eq!(scheduler.authorize(Some("T1")), Ok(StartKind::FirstRound));
        assert_eq!(scheduler.authorize(None), Err(GameError::NotInTeam));
    }

    #[test]
    fn test_begin_puts_requesting_team_first() {
        for seed in 0..20 {
            let mut scheduler = TurnScheduler::new();
            scheduler.begin(teams(5), "T3", &mut StdRng::seed_from_u64(seed));

            assert_eq!(scheduler.phase(), Phase::Active);
            assert_eq!(scheduler.index(), 0);
            assert_eq!(scheduler.current_team(), Some("T3"));

            let mut sorted = scheduler.order().to_vec();
            sorted.sort();
            assert_eq!(sorted, teams(5));
        }
    }

    #[test]
    fn test_only_current_team_may_start() {
        let scheduler = started(3, "T0");
        let expected = scheduler.current_team().unwrap().to_string();

        assert_eq!(
            scheduler.authorize(Some(expected.as_str())),
            Ok(StartKind::NextRound)
        );
        let other = scheduler.order()[1].clone();
        assert_eq!(
            scheduler.authorize(Some(other.as_str())),
            Err(GameError::NotYourTurn { expected })
        );
    }

    #[test]
    fn test_open_round_blocks_new_starts() {
        let mut scheduler = started(2, "T0");
        scheduler.open_round();
        assert_eq!(
            scheduler.authorize(Some("T0")),
            Err(GameError::RoundInProgress)
        );
    }

    #[test]
    fn test_circle_completes_when_index_reaches_team_count() {
        for n in 2..=10 {
            let mut scheduler = started(n, "T0");

            for i in 0..n - 1 {
                scheduler.open_round();
                let next = scheduler.order()[i + 1].clone();
                assert_eq!(scheduler.round_closed(), Advance::NextTeam(next));
                assert_eq!(scheduler.index(), i + 1);
                assert_eq!(scheduler.phase(), Phase::Active);
            }

            scheduler.open_round();
            assert_eq!(scheduler.round_closed(), Advance::CircleComplete);
            assert_eq!(scheduler.index(), 0);
            assert_eq!(scheduler.phase(), Phase::AwaitingCircleDecision);
        }
    }

    #[test]
    fn test_circle_decision_blocks_until_new_circle() {
        let mut scheduler = started(2, "T1");
        scheduler.open_round();
        scheduler.round_closed();
        scheduler.open_round();
        scheduler.round_closed();

        assert_eq!(
            scheduler.authorize(Some("T1")),
            Err(GameError::CircleDecisionPending)
        );

        assert_eq!(scheduler.new_circle(), Some("T1"));
        assert_eq!(scheduler.phase(), Phase::Active);
        assert_eq!(scheduler.authorize(Some("T1")), Ok(StartKind::NextRound));
    }

    #[test]
    fn test_new_circle_ignored_outside_decision() {
        let mut scheduler = started(3, "T0");
        assert_eq!(scheduler.new_circle(), None);
        assert_eq!(scheduler.phase(), Phase::Active);
    }
}
