pub mod ids;

pub use ids::{ChatId, MessageRef, UserId};
