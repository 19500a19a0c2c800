// Game engine modules

pub mod roster;
pub mod round;
pub mod scheduler;
pub mod scoreboard;
pub mod session;
pub mod timer;
pub mod word_pool;


pub use roster::JoinOutcome;
pub use round::Response;
pub use session::GameSession;
