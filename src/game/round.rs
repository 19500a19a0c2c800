use std::time::Duration;

use tokio::{sync::watch, time::Instant};

use crate::{
    bot::events::Action,
    models::{MessageRef, UserId},
    transport::{Button, Keyboard},
};

/// How the current word is shown to the active player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Text,
    Photo,
}

/// Player's verdict on the current word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Correct,
    Wrong,
    Skip,
}

/// Why a round was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Timeout,
    LimitReached,
    WordsExhausted,
    /// The word could not be delivered to the active player
    DeliveryFailed,
}

/// What the round tells its timer task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundSignal {
    /// A new word was dispensed and must be shown; carries the guess count
    Word(u32),
    Closed,
}

/// State of the single open round.
///
/// Exists only while the round is open; closing a round drops it, which also
/// releases the timer's signal channel.
#[derive(Debug)]
pub struct RoundSession {
    pub id: u64,
    pub player: UserId,
    pub player_name: String,
    pub team: String,
    pub word: String,
    pub score: u32,
    /// Words dispensed so far, including the current one
    pub guesses: u32,
    pub deadline: Instant,
    /// Private message showing the word to the player
    pub prompt: Option<MessageRef>,
    pub presentation: Presentation,
    signal: watch::Sender<RoundSignal>,
}

impl RoundSession {
    /// Open a round with its first word already dispensed. The returned
    /// receiver sees every later word, and fires when the round is cancelled
    /// or dropped.
    pub fn open(
        id: u64,
        player: UserId,
        player_name: String,
        team: String,
        first_word: String,
        duration: Duration,
    ) -> (Self, watch::Receiver<RoundSignal>) {
        let (signal, signals) = watch::channel(RoundSignal::Word(1));
        let round = Self {
            id,
            player,
            player_name,
            team,
            word: first_word,
            score: 0,
            guesses: 1,
            deadline: Instant::now() + duration,
            prompt: None,
            presentation: Presentation::Text,
            signal,
        };
        (round, signals)
    }

    /// Whole seconds left before the deadline
    pub fn remaining_secs(&self) -> u64 {
        self.deadline
            .saturating_duration_since(Instant::now())
            .as_secs()
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    pub fn limit_reached(&self, limit: u32) -> bool {
        self.guesses >= limit
    }

    /// Replace the current word and ask the timer to show it
    pub fn next_word(&mut self, word: String) {
        self.word = word;
        self.guesses += 1;
        let _ = self.signal.send(RoundSignal::Word(self.guesses));
    }

    /// Stop the round timer
    pub fn cancel(&self) {
        let _ = self.signal.send(RoundSignal::Closed);
    }

    pub fn prompt_text(&self) -> String {
        word_prompt(&self.word, self.remaining_secs())
    }
}

pub fn word_prompt(word: &str, remaining_secs: u64) -> String {
    format!(
        "🔤 Word: *{}*\n⏱️ Time left: {} s",
        word.to_uppercase(),
        remaining_secs
    )
}

/// Countdown shown in the room while a round is open
pub fn countdown_text(remaining_secs: u64) -> String {
    format!("⏳ Time left: *{}* s", remaining_secs)
}

/// Buttons under the word prompt
pub fn word_keyboard() -> Keyboard {
    Keyboard::row(vec![
        Button::new("✅ Guessed", Action::Right),
        Button::new("❌ No", Action::Wrong),
        Button::new("🔁 Skip", Action::Skip),
    ])
}
