use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;

use super::{
    events::{Action, Command, InboundEvent},
    setup::{first_prompt, SetupReply, SetupStep},
};
use crate::{
    error::GameError,
    game::{
        session::{ResponseOutcome, RoundStart},
        GameSession, JoinOutcome, Response,
    },
    models::{ChatId, MessageRef, UserId},
    transport::{display_name, Button, EditContent, Format, Keyboard, Transport},
};

/// Routes inbound chat events to the game session and runs the setup
/// dialogue. Events are expected one at a time per chat.
pub struct Bot {
    session: Arc<GameSession>,
    transport: Arc<dyn Transport>,
    /// Pending `/setup` dialogues keyed by chat
    setups: DashMap<ChatId, SetupStep>,
}

impl Bot {
    pub fn new(session: Arc<GameSession>, transport: Arc<dyn Transport>) -> Self {
        Self {
            session,
            transport,
            setups: DashMap::new(),
        }
    }

    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    /// Handle one inbound event
    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Command {
                chat,
                user,
                command,
            } => {
                tracing::info!("User {} sent {:?} in chat {}", user, command, chat);
                // Any command abandons a setup dialogue in progress
                self.setups.remove(&chat);
                self.handle_command(chat, command).await
            }
            InboundEvent::Text { chat, user, text } => {
                let Some((_, step)) = self.setups.remove(&chat) else {
                    return Ok(());
                };
                tracing::debug!("Setup reply from user {} in chat {}", user, chat);
                self.handle_setup_reply(chat, step, &text).await
            }
            InboundEvent::Action {
                action_id,
                chat,
                user,
                name,
                message,
                action,
            } => {
                tracing::debug!("User {} pressed {:?} in chat {}", user, action, chat);
                self.remember(user, name).await;
                self.handle_action(&action_id, chat, user, message, action)
                    .await
            }
            InboundEvent::Ignored { action_id } => {
                self.answer(&action_id, None, false).await;
                Ok(())
            }
        }
    }

    /// Keep the name the update carried, or look it up once when it had none
    async fn remember(&self, user: UserId, name: Option<String>) {
        let name = match name {
            Some(name) => name,
            None if self.session.knows_name(user).await => return,
            None => display_name(self.transport.as_ref(), user).await,
        };
        self.session.remember_name(user, name).await;
    }

    async fn handle_command(&self, chat: ChatId, command: Command) -> Result<()> {
        match command {
            Command::Setup => self.begin_setup(chat).await,
            Command::Start => self.post_rules(chat).await,
            Command::Finish => {
                self.reply(chat, "🛑 Finishing the game by your command!", None)
                    .await?;
                self.session.bind_room(chat).await;
                self.session.finish(true).await;
                Ok(())
            }
            Command::Score => {
                self.session.show_score().await;
                Ok(())
            }
        }
    }

    async fn begin_setup(&self, chat: ChatId) -> Result<()> {
        self.session.finish(false).await;
        self.session.bind_room(chat).await;
        self.reply(chat, &first_prompt(), None).await?;
        self.setups.insert(chat, SetupStep::TeamCount);
        Ok(())
    }

    async fn handle_setup_reply(&self, chat: ChatId, step: SetupStep, text: &str) -> Result<()> {
        let config = self.session.config();
        let (next, reply) = step.advance(text, config.min_teams, config.max_teams);
        if let Some(next) = next {
            self.setups.insert(chat, next);
        }

        match reply {
            // Prompts may quote what the user typed, which is not valid Markdown
            SetupReply::Prompt(prompt) => self.reply_plain(chat, &prompt).await,
            SetupReply::Done(names) => match self.session.configure(chat, &names).await {
                Ok(()) => {
                    self.reply(
                        chat,
                        "Great! The teams are set. Send /start to begin the game.",
                        None,
                    )
                    .await
                }
                Err(e) => {
                    tracing::warn!("Rejected team setup in chat {}: {}", chat, e);
                    self.reply_plain(chat, &format!("Could not set up teams: {}. Send /setup to try again.", e))
                        .await
                }
            },
        }
    }

    async fn post_rules(&self, chat: ChatId) -> Result<()> {
        self.session.bind_room(chat).await;

        let labels = self.session.team_labels().await;
        if labels.is_empty() {
            return self
                .reply(
                    chat,
                    "Hello! 👋\n\nTo play, a chat admin first has to set up the teams with /setup",
                    None,
                )
                .await;
        }

        let config = self.session.config();
        let rules = format!(
            "👋 *Welcome to Alias! The game is set up and ready.*\n\n\
             📌 *Rules:*\n\
             1. Every player joins their team with the buttons below.\n\
             2. The bot decides which team goes first.\n\
             3. When it is your team's turn, one player presses 'Start game' or 'Start round'.\n\
             4. *Only a player of the team whose turn it is can start a round.*\n\
             5. You have {} seconds or {} words to explain as many as you can.\n\
             6. Every guessed word is +1 point for your team.\n\n\
             🏆 *Prize: every member of the winning team gets a +30 min break!*",
            config.round_time, config.round_limit
        );
        self.reply(chat, &rules, None).await?;
        self.reply(chat, "✏️ *Pick your team:*", Some(&join_keyboard(&labels)))
            .await
    }

    async fn handle_action(
        &self,
        action_id: &str,
        chat: ChatId,
        user: UserId,
        message: Option<MessageRef>,
        action: Action,
    ) -> Result<()> {
        match action {
            Action::Join(team) => self.join(action_id, chat, user, message, &team).await,
            Action::StartRound => self.start_round(action_id, chat, user).await,
            Action::Right => self.respond(action_id, user, Response::Correct).await,
            Action::Wrong => self.respond(action_id, user, Response::Wrong).await,
            Action::Skip => self.respond(action_id, user, Response::Skip).await,
            Action::NewCircle => {
                self.answer(action_id, None, false).await;
                if !self.session.is_configured().await {
                    return self
                        .reply(chat, "No teams found. Start with /setup.", None)
                        .await;
                }
                if self.session.new_circle().await {
                    if let Some(message) = message {
                        self.edit_quietly(message, "🔄 *Starting a new circle!*").await;
                    }
                }
                Ok(())
            }
            Action::FinishGame => {
                self.answer(action_id, None, false).await;
                self.session.finish(true).await;
                Ok(())
            }
            Action::RestartSetup => {
                self.answer(action_id, None, false).await;
                if let Some(message) = message {
                    self.edit_quietly(message, "Setting up a new game...").await;
                }
                self.setups.remove(&chat);
                self.begin_setup(chat).await
            }
        }
    }

    async fn join(
        &self,
        action_id: &str,
        chat: ChatId,
        user: UserId,
        message: Option<MessageRef>,
        team: &str,
    ) -> Result<()> {
        let (outcome, overview) = match self.session.join(user, team).await {
            Ok(joined) => joined,
            Err(e) => {
                self.answer(action_id, Some(&e.to_string()), true).await;
                return Ok(());
            }
        };
        self.answer(action_id, None, false).await;

        if outcome == JoinOutcome::AlreadyMember {
            return Ok(());
        }

        if let Some(message) = message {
            let keyboard = join_keyboard(&self.session.team_labels().await);
            if let Err(e) = self
                .transport
                .edit_message(message, EditContent::Text(overview), Format::Markdown, Some(&keyboard))
                .await
            {
                tracing::debug!("Could not update team overview: {}", e);
            }
        }

        if !self.session.is_started().await {
            self.reply(
                chat,
                "When everyone has joined, the first player can start the game!",
                Some(&Keyboard::single("▶️ Start game", Action::StartRound)),
            )
            .await?;
        }
        Ok(())
    }

    async fn start_round(&self, action_id: &str, chat: ChatId, user: UserId) -> Result<()> {
        match self.session.start_round(user).await {
            Ok(started) => {
                match started {
                    RoundStart::Opened { round_id } => {
                        tracing::info!("User {} opened round {}", user, round_id)
                    }
                    RoundStart::Aborted | RoundStart::GameOver => {
                        tracing::info!("Round start by user {} ended with {:?}", user, started)
                    }
                }
                self.answer(action_id, None, false).await;
                Ok(())
            }
            Err(GameError::NotConfigured) => {
                self.answer(action_id, None, false).await;
                self.reply(chat, "Set up the teams first with /setup", None)
                    .await
            }
            Err(e) => {
                let text = match e {
                    GameError::NotYourTurn { expected } => {
                        format!("It is team {}'s turn now, not yours.", expected)
                    }
                    GameError::RoundInProgress => "⏳ Wait, the round is not over yet.".to_string(),
                    GameError::NotInTeam => "Please join a team first.".to_string(),
                    other => other.to_string(),
                };
                self.answer(action_id, Some(&text), true).await;
                Ok(())
            }
        }
    }

    async fn respond(&self, action_id: &str, user: UserId, response: Response) -> Result<()> {
        match self.session.respond(user, response).await {
            Ok(ResponseOutcome::NextWord) => {
                let text = match response {
                    Response::Correct => "✅ +1 point",
                    Response::Wrong | Response::Skip => "⏭️ Next word",
                };
                self.answer(action_id, Some(text), false).await;
            }
            Ok(ResponseOutcome::RoundClosed { score }) => {
                let text = format!("🏁 Round over with {} points", score);
                self.answer(action_id, Some(&text), false).await;
            }
            Err(_) => {
                self.answer(action_id, Some("⏳ Wait for your turn"), false)
                    .await;
            }
        }
        Ok(())
    }

    async fn reply(&self, chat: ChatId, text: &str, actions: Option<&Keyboard>) -> Result<()> {
        self.transport
            .send_message(chat, text, Format::Markdown, actions)
            .await
            .with_context(|| format!("failed to reply in chat {}", chat))?;
        Ok(())
    }

    async fn reply_plain(&self, chat: ChatId, text: &str) -> Result<()> {
        self.transport
            .send_message(chat, text, Format::Plain, None)
            .await
            .with_context(|| format!("failed to reply in chat {}", chat))?;
        Ok(())
    }

    async fn answer(&self, action_id: &str, text: Option<&str>, alert: bool) {
        if let Err(e) = self.transport.answer_action(action_id, text, alert).await {
            tracing::debug!("Could not answer action {}: {}", action_id, e);
        }
    }

    async fn edit_quietly(&self, message: MessageRef, text: &str) {
        if let Err(e) = self
            .transport
            .edit_message(message, EditContent::Text(text.to_string()), Format::Markdown, None)
            .await
        {
            tracing::warn!("Could not edit message {}: {}", message.message_id, e);
        }
    }
}

/// One button per team, labelled with its display name
fn join_keyboard(labels: &[(String, String)]) -> Keyboard {
    Keyboard::column(
        labels
            .iter()
            .map(|(name, label)| Button::new(label.clone(), Action::Join(name.clone())))
            .collect(),
    )
}
