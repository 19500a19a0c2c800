pub mod events;
pub mod handler;
pub mod setup;

pub use handler::Bot;
