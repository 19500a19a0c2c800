use crate::{error::GameError, game::roster::validate_team_name};

/// Position in the guided `/setup` dialogue of one chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStep {
    TeamCount,
    TeamName { total: usize, collected: Vec<String> },
}

/// What the dialogue answers to a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupReply {
    /// Ask (again) for the next input
    Prompt(String),
    /// All names collected
    Done(Vec<String>),
}

pub fn first_prompt() -> String {
    "How many teams will play? (enter a number)".to_string()
}

impl SetupStep {
    /// Feed one free-text reply into the dialogue. Returns the step to wait
    /// in next (`None` once finished) and the reply to send.
    pub fn advance(self, text: &str, min: usize, max: usize) -> (Option<SetupStep>, SetupReply) {
        match self {
            SetupStep::TeamCount => match text.trim().parse::<usize>() {
                Ok(count) if (min..=max).contains(&count) => (
                    Some(SetupStep::TeamName {
                        total: count,
                        collected: Vec::new(),
                    }),
                    SetupReply::Prompt("Enter the name of team 1:".to_string()),
                ),
                _ => (
                    Some(SetupStep::TeamCount),
                    SetupReply::Prompt(format!("Please enter a number from {} to {}.", min, max)),
                ),
            },
            SetupStep::TeamName {
                total,
                mut collected,
            } => {
                let name = match validate_team_name(text) {
                    Ok(name) if collected.contains(&name) => {
                        let message = format!("Team name '{}' is already taken. Try again:", name);
                        return (
                            Some(SetupStep::TeamName { total, collected }),
                            SetupReply::Prompt(message),
                        );
                    }
                    Ok(name) => name,
                    Err(GameError::EmptyTeamName) => {
                        let message = "The team name cannot be empty. Try again:".to_string();
                        return (
                            Some(SetupStep::TeamName { total, collected }),
                            SetupReply::Prompt(message),
                        );
                    }
                    Err(e) => {
                        let message = format!("{}. Try again:", capitalize(&e.to_string()));
                        return (
                            Some(SetupStep::TeamName { total, collected }),
                            SetupReply::Prompt(message),
                        );
                    }
                };

                collected.push(name);
                if collected.len() < total {
                    let next = collected.len() + 1;
                    (
                        Some(SetupStep::TeamName { total, collected }),
                        SetupReply::Prompt(format!("Thanks! Now enter the name of team {}:", next)),
                    )
                } else {
                    (None, SetupReply::Done(collected))
                }
            }
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_out_of_range_reprompts() {
        for input in ["1", "11", "abc", ""] {
            let (next, reply) = SetupStep::TeamCount.advance(input, 2, 10);
            assert_eq!(next, Some(SetupStep::TeamCount));
            assert_eq!(
                reply,
                SetupReply::Prompt("Please enter a number from 2 to 10.".to_string())
            );
        }
    }

    #[test]
    fn test_full_dialogue() {
        let (step, _) = SetupStep::TeamCount.advance(" 2 ", 2, 10);
        let step = step.unwrap();
        assert_eq!(
            step,
            SetupStep::TeamName {
                total: 2,
                collected: vec![]
            }
        );

        let (step, reply) = step.advance("Red", 2, 10);
        assert_eq!(
            reply,
            SetupReply::Prompt("Thanks! Now enter the name of team 2:".to_string())
        );

        let (step, reply) = step.unwrap().advance("  Blue ", 2, 10);
        assert_eq!(step, None);
        assert_eq!(
            reply,
            SetupReply::Done(vec!["Red".to_string(), "Blue".to_string()])
        );
    }

    #[test]
    fn test_bad_names_reprompt_without_progress() {
        let step = SetupStep::TeamName {
            total: 2,
            collected: vec!["Red".to_string()],
        };

        let (next, reply) = step.clone().advance("   ", 2, 10);
        assert_eq!(next, Some(step.clone()));
        assert!(matches!(reply, SetupReply::Prompt(text) if text.contains("cannot be empty")));

        let (next, reply) = step.clone().advance("Red", 2, 10);
        assert_eq!(next, Some(step.clone()));
        assert!(matches!(reply, SetupReply::Prompt(text) if text.contains("already taken")));

        let (next, reply) = step.clone().advance(&"Ж".repeat(30), 2, 10);
        assert_eq!(next, Some(step));
        assert!(matches!(reply, SetupReply::Prompt(text) if text.contains("too long")));
    }
}
