use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    time::{interval_at, sleep_until, Instant, MissedTickBehavior},
};

use super::{round::RoundSignal, session::GameSession};
use crate::models::MessageRef;

/// Countdown refresh period
pub const TICK: Duration = Duration::from_secs(1);

/// Render task for one round.
///
/// Every edit of the player's prompt and of the room `countdown` happens
/// here, one at a time, so a new word and a countdown refresh never race each
/// other. Shows each word dispensed after the first, re-renders every
/// [`TICK`] and closes the round when the deadline passes. Exits once the
/// round signals `Closed` or drops its sender, marking the countdown as
/// finished on the way out.
pub async fn run_round_timer(
    session: Arc<GameSession>,
    round_id: u64,
    deadline: Instant,
    countdown: Option<MessageRef>,
    mut signals: watch::Receiver<RoundSignal>,
) {
    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            changed = signals.changed() => {
                let signal = match changed {
                    Ok(()) => *signals.borrow_and_update(),
                    Err(_) => RoundSignal::Closed,
                };
                match signal {
                    RoundSignal::Word(_) => {
                        session.present_word(round_id).await;
                    }
                    RoundSignal::Closed => {
                        tracing::debug!("Round {} timer cancelled", round_id);
                        break;
                    }
                }
            }
            _ = sleep_until(deadline) => {
                session.expire_round(round_id).await;
                break;
            }
            _ = ticker.tick() => {
                if !session.tick_round(round_id, countdown).await {
                    break;
                }
            }
        }
    }

    if let Some(countdown) = countdown {
        session.end_countdown(countdown).await;
    }
}
