use std::str::FromStr;

use crate::models::{ChatId, MessageRef, UserId};

/// Button action tags carried by inline keyboards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Join(String),
    StartRound,
    Right,
    Wrong,
    Skip,
    NewCircle,
    FinishGame,
    RestartSetup,
}

impl Action {
    /// Opaque payload stored in the button
    pub fn tag(&self) -> String {
        match self {
            Action::Join(team) => format!("join:{}", team),
            Action::StartRound => "start-round".to_string(),
            Action::Right => "right".to_string(),
            Action::Wrong => "wrong".to_string(),
            Action::Skip => "skip".to_string(),
            Action::NewCircle => "new-circle".to_string(),
            Action::FinishGame => "finish-game".to_string(),
            Action::RestartSetup => "restart-setup".to_string(),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(team) = s.strip_prefix("join:") {
            return Ok(Action::Join(team.to_string()));
        }
        match s {
            "start-round" => Ok(Action::StartRound),
            "right" => Ok(Action::Right),
            "wrong" => Ok(Action::Wrong),
            "skip" => Ok(Action::Skip),
            "new-circle" => Ok(Action::NewCircle),
            "finish-game" => Ok(Action::FinishGame),
            "restart-setup" => Ok(Action::RestartSetup),
            other => Err(format!("unknown action tag: {}", other)),
        }
    }
}

/// Slash commands understood by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Setup,
    Start,
    Finish,
    Score,
}

impl Command {
    /// Parse a message text such as `/start` or `/start@alias_bot extra`
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?;
        let name = word.strip_prefix('/')?.split('@').next()?;
        match name {
            "setup" => Some(Command::Setup),
            "start" => Some(Command::Start),
            "finish" => Some(Command::Finish),
            "score" => Some(Command::Score),
            _ => None,
        }
    }
}

/// Something a chat participant did, already stripped of platform details
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command {
        chat: ChatId,
        user: UserId,
        command: Command,
    },
    /// Free text, meaningful only during the setup dialogue
    Text {
        chat: ChatId,
        user: UserId,
        text: String,
    },
    /// A button press. `message` is the message carrying the button, and
    /// `name` how the presser wants to be addressed, when known
    Action {
        action_id: String,
        chat: ChatId,
        user: UserId,
        name: Option<String>,
        message: Option<MessageRef>,
        action: Action,
    },
    /// A button press carrying no action the bot knows; it is only answered
    Ignored { action_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tags_parse_back() {
        let actions = [
            Action::Join("Red Dragons".to_string()),
            Action::StartRound,
            Action::Right,
            Action::Wrong,
            Action::Skip,
            Action::NewCircle,
            Action::FinishGame,
            Action::RestartSetup,
        ];
        for action in actions {
            assert_eq!(action.tag().parse::<Action>(), Ok(action));
        }
    }

    #[test]
    fn test_join_tag_keeps_colons_in_team_name() {
        assert_eq!(
            "join:a:b".parse::<Action>(),
            Ok(Action::Join("a:b".to_string()))
        );
    }

    #[test]
    fn test_unknown_action_tag() {
        assert!("team_Red".parse::<Action>().is_err());
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/setup"), Some(Command::Setup));
        assert_eq!(Command::parse("/start@alias_bot"), Some(Command::Start));
        assert_eq!(Command::parse("  /finish now"), Some(Command::Finish));
        assert_eq!(Command::parse("/score"), Some(Command::Score));
        assert_eq!(Command::parse("/help"), None);
        assert_eq!(Command::parse("start"), None);
        assert_eq!(Command::parse(""), None);
    }
}
