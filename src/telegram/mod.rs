pub mod client;
pub mod polling;
pub mod types;

pub use client::TelegramClient;
pub use polling::run_polling;
pub use types::Update;
