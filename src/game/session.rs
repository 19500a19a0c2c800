use std::{collections::HashMap, sync::Arc};

use rand::{rngs::StdRng, SeedableRng};
use tokio::{
    sync::{watch, Mutex},
    time::Instant,
};

use super::{
    roster::{JoinOutcome, TeamRoster},
    round::{
        countdown_text, word_keyboard, CloseReason, Presentation, Response, RoundSession, RoundSignal,
    },
    scheduler::{Advance, Phase, StartKind, TurnScheduler},
    scoreboard,
    timer::run_round_timer,
    word_pool::WordPool,
};
use crate::{
    bot::events::Action,
    config::GameConfig,
    dictionary::{ImageAssets, WordList},
    error::{GameError, TransportError},
    models::{ChatId, MessageRef, UserId},
    transport::{notify, placeholder_name, Button, EditContent, EditOutcome, Format, Keyboard, Transport},
};

const TIMES_UP: &str = "⌛️ Time's up!";

/// Result of a round-start request that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStart {
    Opened { round_id: u64 },
    /// The word could not be delivered and the round was closed right away
    Aborted,
    /// No words left; the whole game was finished
    GameOver,
}

/// Result of a player's response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    NextWord,
    RoundClosed { score: u32 },
}

/// Read-only view of the session, used by tests and the health endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub active_player: Option<UserId>,
    /// `(team, score)` in configuration order
    pub scores: Vec<(String, u32)>,
    pub turn_order: Vec<String>,
    pub turn_index: usize,
    pub words_left: usize,
    pub round_score: Option<u32>,
    pub round_guesses: Option<u32>,
}

/// A message decided on under the state lock
#[derive(Debug)]
struct Notice {
    target: ChatId,
    text: String,
    actions: Option<Keyboard>,
}

/// Notices collected while the state is locked and sent once the guard is
/// dropped, so no network round trip ever holds up the session.
#[derive(Debug, Default)]
struct Outbox {
    notices: Vec<Notice>,
}

impl Outbox {
    fn post(&mut self, target: Option<ChatId>, text: impl Into<String>, actions: Option<Keyboard>) {
        if let Some(target) = target {
            self.notices.push(Notice {
                target,
                text: text.into(),
                actions,
            });
        }
    }
}

/// What the player should currently see, copied out of the open round
struct PromptView {
    player: UserId,
    word: String,
    text: String,
    prompt: Option<MessageRef>,
    presentation: Presentation,
}

/// A round accepted by `start_round`, ready to be announced
struct Opening {
    round_id: u64,
    player_name: String,
    team_label: String,
    deadline: Instant,
    signals: watch::Receiver<RoundSignal>,
}

struct SessionState {
    /// Chat hosting the game
    room: Option<ChatId>,
    roster: TeamRoster,
    scheduler: TurnScheduler,
    pool: WordPool,
    round: Option<RoundSession>,
    /// Names taken from the updates users sent, kept across games
    names: HashMap<UserId, String>,
    next_round_id: u64,
    rng: StdRng,
}

impl SessionState {
    fn new(rng: StdRng) -> Self {
        Self {
            room: None,
            roster: TeamRoster::new(),
            scheduler: TurnScheduler::new(),
            pool: WordPool::new(),
            round: None,
            names: HashMap::new(),
            next_round_id: 1,
            rng,
        }
    }

    /// Drop everything that belongs to a game, keeping the room binding
    fn reset(&mut self) {
        if let Some(round) = self.round.take() {
            round.cancel();
        }
        self.roster = TeamRoster::new();
        self.scheduler = TurnScheduler::new();
        self.pool.clear();
    }

    fn name_of(&self, user: UserId) -> String {
        self.names
            .get(&user)
            .cloned()
            .unwrap_or_else(|| placeholder_name(user))
    }

    /// Teams in turn order once drawn, configuration order before
    fn standings(&self) -> String {
        if self.scheduler.is_started() {
            scoreboard::score_summary(
                self.scheduler
                    .order()
                    .iter()
                    .filter_map(|name| self.roster.get(name)),
            )
        } else {
            scoreboard::score_summary(self.roster.teams())
        }
    }

    fn roster_overview(&self, joined: UserId, team: &str) -> String {
        let mut text = format!(
            "✅ @{} joined team *{}*!\n\n*Teams:*",
            self.name_of(joined),
            self.roster.display_name(team)
        );
        for t in self.roster.teams() {
            text.push_str(&format!("\n*{}:*\n", t.display_name()));
            if t.members.is_empty() {
                text.push_str("-\n");
            }
            for member in &t.members {
                text.push_str(&format!("@{}\n", self.name_of(*member)));
            }
        }
        text
    }

    /// Close the open round, if any. Returns whether this call closed it;
    /// `false` means another path got there first.
    fn close_round(&mut self, reason: CloseReason, outbox: &mut Outbox) -> bool {
        let Some(round) = self.round.take() else {
            return false;
        };
        round.cancel();

        let total = self.roster.credit(&round.team, round.score);
        tracing::info!(
            "Round {} closed ({:?}): user {} scored {} for team {} (total {:?})",
            round.id,
            reason,
            round.player,
            round.score,
            round.team,
            total
        );

        let result = format!(
            "✅ Round over! @{} scored *{}* points for team *{}*",
            round.player_name,
            round.score,
            self.roster.display_name(&round.team)
        );

        if reason == CloseReason::DeliveryFailed {
            outbox.post(
                self.room,
                format!(
                    "⚠️ Could not send the word to @{}. The round ends early.",
                    round.player_name
                ),
                None,
            );
        }
        outbox.post(self.room, result.clone(), None);
        if reason != CloseReason::DeliveryFailed {
            outbox.post(Some(round.player.into()), result, None);
        }
        outbox.post(self.room, self.standings(), None);

        match self.scheduler.round_closed() {
            Advance::CircleComplete => {
                let keyboard = Keyboard::row(vec![
                    Button::new("🔄 New circle", Action::NewCircle),
                    Button::new("🏁 Finish game", Action::FinishGame),
                ]);
                outbox.post(self.room, "The circle is complete! What next?", Some(keyboard));
            }
            Advance::NextTeam(next) => {
                outbox.post(
                    self.room,
                    format!(
                        "The turn passes to team *{}*! A player of this team should press the button:",
                        self.roster.display_name(&next)
                    ),
                    Some(start_round_keyboard()),
                );
            }
        }

        true
    }

    fn finish(&mut self, announce: bool, outbox: &mut Outbox) {
        if let Some(round) = self.round.take() {
            round.cancel();
            tracing::info!("Round {} discarded by game finish", round.id);
        }

        if announce && self.roster.has_points() {
            if let Some(winner) = scoreboard::winner(self.roster.teams()) {
                let names: Vec<String> = winner.members.iter().map(|m| self.name_of(*m)).collect();
                let summary = scoreboard::final_summary(self.roster.teams(), winner, &names);
                tracing::info!("Game finished, winner is team {}", winner.name);

                outbox.post(self.room, summary, None);
                outbox.post(
                    self.room,
                    "Thanks for playing! Want to play again?",
                    Some(Keyboard::single("🎉 Start a new game", Action::RestartSetup)),
                );
            }
        }

        self.reset();
        tracing::info!("Game state reset");
    }

    fn prompt_view(&self, round_id: u64) -> Option<PromptView> {
        let round = self.round.as_ref().filter(|r| r.id == round_id)?;
        Some(PromptView {
            player: round.player,
            word: round.word.clone(),
            text: round.prompt_text(),
            prompt: round.prompt,
            presentation: round.presentation,
        })
    }
}

/// The one game hosted by the bot.
///
/// All state sits behind a single async mutex, so the inbound event handler
/// and the round timer never interleave their mutations. The lock is never
/// held across a network call: state changes queue their messages in an
/// [`Outbox`] that is delivered after the guard is dropped. Notifications are
/// best-effort: a failed delivery is logged and the state transition still
/// completes.
pub struct GameSession {
    config: GameConfig,
    corpus: WordList,
    assets: ImageAssets,
    transport: Arc<dyn Transport>,
    state: Mutex<SessionState>,
}

impl GameSession {
    pub fn new(
        config: GameConfig,
        corpus: WordList,
        assets: ImageAssets,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        Self::with_rng(config, corpus, assets, transport, StdRng::from_os_rng())
    }

    pub fn with_rng(
        config: GameConfig,
        corpus: WordList,
        assets: ImageAssets,
        transport: Arc<dyn Transport>,
        rng: StdRng,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            corpus,
            assets,
            transport,
            state: Mutex::new(SessionState::new(rng)),
        })
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub async fn bind_room(&self, room: ChatId) {
        self.state.lock().await.room = Some(room);
    }

    pub async fn room(&self) -> Option<ChatId> {
        self.state.lock().await.room
    }

    pub async fn is_configured(&self) -> bool {
        self.state.lock().await.roster.is_configured()
    }

    /// Remember how to address `user` in game messages
    pub async fn remember_name(&self, user: UserId, name: String) {
        self.state.lock().await.names.insert(user, name);
    }

    pub async fn knows_name(&self, user: UserId) -> bool {
        self.state.lock().await.names.contains_key(&user)
    }

    /// Set up teams for a new game in `room`. Any game in progress is
    /// discarded without announcement.
    pub async fn configure(&self, room: ChatId, names: &[String]) -> Result<(), GameError> {
        let mut state = self.state.lock().await;

        let mut roster = TeamRoster::new();
        roster.configure(names, self.config.min_teams, self.config.max_teams)?;

        state.reset();
        state.room = Some(room);
        state.roster = roster;

        tracing::info!("Configured {} teams in chat {}", names.len(), room);
        Ok(())
    }

    /// Team names with their display labels, in configuration order
    pub async fn team_labels(&self) -> Vec<(String, String)> {
        let state = self.state.lock().await;
        state
            .roster
            .teams()
            .iter()
            .map(|t| (t.name.clone(), t.display_name()))
            .collect()
    }

    pub async fn is_started(&self) -> bool {
        self.state.lock().await.scheduler.is_started()
    }

    /// Put `user` into `team` and return the updated roster overview
    pub async fn join(&self, user: UserId, team: &str) -> Result<(JoinOutcome, String), GameError> {
        let mut state = self.state.lock().await;
        let outcome = state.roster.join(team, user)?;

        if let JoinOutcome::Joined { previous } = &outcome {
            tracing::info!(
                "User {} joined team {} (previous: {:?})",
                user,
                team,
                previous
            );
        }

        Ok((outcome, state.roster_overview(user, team)))
    }

    /// Open a round for `user` if it is their team's turn.
    ///
    /// The first successful request starts the game: the word pool is
    /// refilled and the turn order drawn. Running out of words here ends the
    /// whole game.
    pub async fn start_round(self: &Arc<Self>, user: UserId) -> Result<RoundStart, GameError> {
        let mut outbox = Outbox::default();
        let (room, opening) = {
            let mut guard = self.state.lock().await;
            let opening = self.open_round(&mut guard, user, &mut outbox)?;
            (guard.room, opening)
        };
        self.deliver(outbox).await;

        let Some(opening) = opening else {
            return Ok(RoundStart::GameOver);
        };
        let round_id = opening.round_id;

        let countdown = self
            .announce(room, &countdown_text(self.config.round_time), None)
            .await;
        self.announce(
            room,
            &format!(
                "It's @{}'s turn for team *{}*! The word was sent in a private message.",
                opening.player_name, opening.team_label
            ),
            None,
        )
        .await;

        if !self.present_word(round_id).await {
            if let Some(countdown) = countdown {
                self.end_countdown(countdown).await;
            }
            return Ok(RoundStart::Aborted);
        }

        tokio::spawn(run_round_timer(
            Arc::clone(self),
            round_id,
            opening.deadline,
            countdown,
            opening.signals,
        ));

        Ok(RoundStart::Opened { round_id })
    }

    /// Validation and state changes of `start_round`. `None` means the pool
    /// ran dry and the game was finished instead.
    fn open_round(
        &self,
        state: &mut SessionState,
        user: UserId,
        outbox: &mut Outbox,
    ) -> Result<Option<Opening>, GameError> {
        if !state.roster.is_configured() {
            return Err(GameError::NotConfigured);
        }

        let team = state.roster.team_of(user).map(str::to_string);
        let kind = state
            .scheduler
            .authorize(team.as_deref())
            .map_err(|e| match e {
                GameError::NotYourTurn { expected } => GameError::NotYourTurn {
                    expected: state.roster.display_name(&expected),
                },
                e => e,
            })?;
        let team = team.ok_or(GameError::NotInTeam)?;

        if kind == StartKind::FirstRound {
            state.pool.reset(self.corpus.words(), &mut state.rng);
            state
                .scheduler
                .begin(state.roster.names(), &team, &mut state.rng);
            tracing::info!(
                "Game started with turn order {:?} and {} words",
                state.scheduler.order(),
                state.pool.remaining()
            );
            outbox.post(
                state.room,
                format!(
                    "🚀 The game has started! Team *{}* goes first.",
                    state.roster.display_name(&team)
                ),
                None,
            );
        }

        let Some(word) = state.pool.take() else {
            tracing::info!("Word pool exhausted at round start, finishing game");
            outbox.post(state.room, "⚠️ Out of words! Finishing the game.", None);
            state.finish(true, outbox);
            return Ok(None);
        };

        let player_name = state.name_of(user);
        let round_id = state.next_round_id;
        state.next_round_id += 1;

        let (round, signals) = RoundSession::open(
            round_id,
            user,
            player_name.clone(),
            team.clone(),
            word,
            self.config.round_duration(),
        );
        let deadline = round.deadline;
        state.round = Some(round);
        state.scheduler.open_round();

        tracing::info!(
            "Round {} opened for user {} of team {}",
            round_id,
            user,
            team
        );

        Ok(Some(Opening {
            round_id,
            player_name,
            team_label: state.roster.display_name(&team),
            deadline,
            signals,
        }))
    }

    /// Apply the active player's verdict on the current word. The next word
    /// is handed to the round's timer task for display.
    pub async fn respond(&self, user: UserId, response: Response) -> Result<ResponseOutcome, GameError> {
        let mut outbox = Outbox::default();
        let outcome = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            let round = match state.round.as_mut() {
                Some(round) if round.player == user => round,
                _ => return Err(GameError::NotActivePlayer),
            };

            if response == Response::Correct {
                round.score += 1;
            }
            let score = round.score;

            let close_reason = if round.limit_reached(self.config.round_limit) {
                Some(CloseReason::LimitReached)
            } else {
                match state.pool.take() {
                    Some(word) => {
                        round.next_word(word);
                        None
                    }
                    None => Some(CloseReason::WordsExhausted),
                }
            };

            match close_reason {
                Some(reason) => {
                    state.close_round(reason, &mut outbox);
                    ResponseOutcome::RoundClosed { score }
                }
                None => ResponseOutcome::NextWord,
            }
        };

        self.deliver(outbox).await;
        Ok(outcome)
    }

    /// Timer deadline reached for `round_id`. Returns whether this call
    /// closed the round.
    pub async fn expire_round(&self, round_id: u64) -> bool {
        let mut outbox = Outbox::default();
        let closed = {
            let mut state = self.state.lock().await;
            state.round.as_ref().map(|r| r.id) == Some(round_id)
                && state.close_round(CloseReason::Timeout, &mut outbox)
        };
        self.deliver(outbox).await;
        closed
    }

    /// Refresh the player's prompt and the room `countdown` of `round_id`.
    /// Returns `false` once the round is gone and the timer should stop.
    pub async fn tick_round(&self, round_id: u64, countdown: Option<MessageRef>) -> bool {
        let mut outbox = Outbox::default();
        let rendered = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            let expired = state
                .round
                .as_ref()
                .filter(|r| r.id == round_id)
                .map(|r| r.is_expired());
            match expired {
                None => None,
                Some(true) => {
                    state.close_round(CloseReason::Timeout, &mut outbox);
                    None
                }
                Some(false) => state.round.as_ref().map(|round| {
                    let prompt = round.prompt.map(|prompt| {
                        let content = match round.presentation {
                            Presentation::Photo => EditContent::Caption(round.prompt_text()),
                            Presentation::Text => EditContent::Text(round.prompt_text()),
                        };
                        (prompt, content)
                    });
                    (prompt, round.remaining_secs())
                }),
            }
        };

        let Some((prompt, remaining)) = rendered else {
            self.deliver(outbox).await;
            return false;
        };

        if let Some((prompt, content)) = prompt {
            self.edit_quietly(prompt, content, Some(&word_keyboard()))
                .await;
        }
        if let Some(countdown) = countdown {
            self.edit_quietly(countdown, EditContent::Text(countdown_text(remaining)), None)
                .await;
        }
        true
    }

    /// Mark a round's room countdown as finished
    pub async fn end_countdown(&self, countdown: MessageRef) {
        self.edit_quietly(countdown, EditContent::Text(TIMES_UP.to_string()), None)
            .await;
    }

    /// Start another circle after the last team has played
    pub async fn new_circle(&self) -> bool {
        let mut outbox = Outbox::default();
        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;

            let Some(team) = state.scheduler.new_circle().map(str::to_string) else {
                return false;
            };

            tracing::info!("New circle started, team {} plays first", team);
            outbox.post(
                state.room,
                format!(
                    "🔄 *New circle!* Team *{}* plays again. A player of this team should press the button:",
                    state.roster.display_name(&team)
                ),
                Some(start_round_keyboard()),
            );
        }
        self.deliver(outbox).await;
        true
    }

    /// End the game. With `announce`, and if anyone scored, the winner and
    /// their reward are posted first. The session is always fully reset.
    pub async fn finish(&self, announce: bool) {
        let mut outbox = Outbox::default();
        self.state.lock().await.finish(announce, &mut outbox);
        self.deliver(outbox).await;
    }

    /// Post the current standings to the room
    pub async fn show_score(&self) {
        let (room, standings) = {
            let state = self.state.lock().await;
            (state.room, state.standings())
        };
        self.announce(room, &standings, None).await;
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        let state = self.state.lock().await;
        GameSnapshot {
            phase: state.scheduler.phase(),
            active_player: state.round.as_ref().map(|r| r.player),
            scores: state.roster.scores(),
            turn_order: state.scheduler.order().to_vec(),
            turn_index: state.scheduler.index(),
            words_left: state.pool.remaining(),
            round_score: state.round.as_ref().map(|r| r.score),
            round_guesses: state.round.as_ref().map(|r| r.guesses),
        }
    }

    /// Show the current word of `round_id` to the active player.
    ///
    /// Returns `false` when the word could not be delivered; the round is
    /// then closed early with the points it has. A round that is already
    /// gone needs nothing and counts as delivered.
    pub async fn present_word(&self, round_id: u64) -> bool {
        let Some(view) = self.state.lock().await.prompt_view(round_id) else {
            return true;
        };

        let shown = self.show_word(&view).await;

        let mut outbox = Outbox::default();
        let delivered = {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            match shown {
                Ok((message, presentation)) => {
                    if let Some(round) = state.round.as_mut().filter(|r| r.id == round_id) {
                        round.prompt = Some(message);
                        round.presentation = presentation;
                    }
                    true
                }
                Err(e) => {
                    tracing::warn!("Could not deliver word to user {}: {}", view.player, e);
                    if state.round.as_ref().is_some_and(|r| r.id == round_id) {
                        state.close_round(CloseReason::DeliveryFailed, &mut outbox);
                    }
                    false
                }
            }
        };
        self.deliver(outbox).await;
        delivered
    }

    /// Photo when an illustration exists, text otherwise. A photo prompt is
    /// edited in place for the next photo; since a photo cannot become text
    /// (or the reverse), switching kinds sends a fresh prompt.
    async fn show_word(&self, view: &PromptView) -> Result<(MessageRef, Presentation), TransportError> {
        let keyboard = word_keyboard();
        let player = ChatId::from(view.player);

        if let Some(path) = self.assets.lookup(&view.word).await {
            let shown = match (view.prompt, view.presentation) {
                (Some(prompt), Presentation::Photo) => self
                    .transport
                    .edit_message(
                        prompt,
                        EditContent::Photo {
                            path,
                            caption: view.text.clone(),
                        },
                        Format::Markdown,
                        Some(&keyboard),
                    )
                    .await
                    .map(|_| prompt),
                _ => {
                    self.transport
                        .send_photo(player, &path, &view.text, Format::Markdown, Some(&keyboard))
                        .await
                }
            };
            match shown {
                Ok(message) => return Ok((message, Presentation::Photo)),
                Err(e) => tracing::debug!("Photo for '{}' not shown, falling back to text: {}", view.word, e),
            }
        }

        match (view.prompt, view.presentation) {
            (Some(prompt), Presentation::Text) => {
                self.transport
                    .edit_message(
                        prompt,
                        EditContent::Text(view.text.clone()),
                        Format::Markdown,
                        Some(&keyboard),
                    )
                    .await?;
                Ok((prompt, Presentation::Text))
            }
            _ => {
                let message = self
                    .transport
                    .send_message(player, &view.text, Format::Markdown, Some(&keyboard))
                    .await?;
                Ok((message, Presentation::Text))
            }
        }
    }

    async fn deliver(&self, outbox: Outbox) {
        for notice in outbox.notices {
            notify(
                self.transport.as_ref(),
                notice.target,
                &notice.text,
                notice.actions.as_ref(),
            )
            .await;
        }
    }

    async fn announce(&self, room: Option<ChatId>, text: &str, actions: Option<&Keyboard>) -> Option<MessageRef> {
        let room = room?;
        notify(self.transport.as_ref(), room, text, actions).await
    }

    async fn edit_quietly(&self, message: MessageRef, content: EditContent, actions: Option<&Keyboard>) {
        match self
            .transport
            .edit_message(message, content, Format::Markdown, actions)
            .await
        {
            Ok(EditOutcome::Edited) | Ok(EditOutcome::Unchanged) => {}
            Err(e) => tracing::warn!("Timer update error: {}", e),
        }
    }
}

pub fn start_round_keyboard() -> Keyboard {
    Keyboard::single("▶️ Start round", Action::StartRound)
}
