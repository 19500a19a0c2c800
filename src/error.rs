use thiserror::Error;

/// Validation failures reported back to whoever triggered them.
/// None of these leave the session in a modified state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("number of teams must be between {min} and {max}, got {got}")]
    InvalidTeamCount { min: usize, max: usize, got: usize },

    #[error("team name cannot be empty")]
    EmptyTeamName,

    #[error("team name '{0}' is already taken")]
    DuplicateTeamName(String),

    #[error("team name '{0}' is too long")]
    TeamNameTooLong(String),

    #[error("team '{0}' does not exist")]
    UnknownTeam(String),

    #[error("teams are not configured yet, run /setup first")]
    NotConfigured,

    #[error("join a team first")]
    NotInTeam,

    #[error("it is team {expected}'s turn, not yours")]
    NotYourTurn { expected: String },

    #[error("wait, the round is not over yet")]
    RoundInProgress,

    #[error("the circle is complete, choose a new circle or finish the game")]
    CircleDecisionPending,

    #[error("wait for your turn")]
    NotActivePlayer,
}

/// Failures reported by the chat transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telegram api error: {0}")]
    Api(String),

    #[error("recipient unreachable: {0}")]
    Unreachable(String),
}
