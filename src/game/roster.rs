use crate::{bot::events::Action, error::GameError, models::UserId};

/// Emoji assigned to teams by position, cycled when there are more teams than entries
pub const TEAM_EMOJIS: [&str; 10] = ["🚀", "🦅", "🔥", "⚡️", "🏆", "🎯", "🦁", "🐺", "🌟", "💎"];
/// Marker used when rendering a name that is not (or no longer) a team
pub const FALLBACK_EMOJI: &str = "🔹";
/// Telegram's limit on a button's callback payload, in bytes
pub const MAX_ACTION_PAYLOAD: usize = 64;

#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub emoji: &'static str,
    /// Members in join order
    pub members: Vec<UserId>,
    pub score: u32,
}

impl Team {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.emoji, self.name)
    }
}

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { previous: Option<String> },
    AlreadyMember,
}

/// Teams in configuration order
#[derive(Debug, Default)]
pub struct TeamRoster {
    teams: Vec<Team>,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the roster with fresh teams built from `names`.
    ///
    /// Names are trimmed and must be non-empty, unique and short enough for
    /// their join button (see [`validate_team_name`]); the count must lie in
    /// `min..=max`. On error the
    /// existing roster is left untouched.
    pub fn configure(&mut self, names: &[String], min: usize, max: usize) -> Result<(), GameError> {
        if names.len() < min || names.len() > max {
            return Err(GameError::InvalidTeamCount {
                min,
                max,
                got: names.len(),
            });
        }

        let mut teams: Vec<Team> = Vec::with_capacity(names.len());
        for (i, raw) in names.iter().enumerate() {
            let name = validate_team_name(raw)?;
            if teams.iter().any(|t| t.name == name) {
                return Err(GameError::DuplicateTeamName(name));
            }
            teams.push(Team {
                name,
                emoji: TEAM_EMOJIS[i % TEAM_EMOJIS.len()],
                members: Vec::new(),
                score: 0,
            });
        }

        self.teams = teams;
        Ok(())
    }

    /// Move `member` into `team_name`, leaving whatever team it held before.
    /// Joining the team one already belongs to changes nothing.
    pub fn join(&mut self, team_name: &str, member: UserId) -> Result<JoinOutcome, GameError> {
        if self.get(team_name).is_none() {
            return Err(GameError::UnknownTeam(team_name.to_string()));
        }

        let previous = self.team_of(member).map(str::to_string);
        if previous.as_deref() == Some(team_name) {
            return Ok(JoinOutcome::AlreadyMember);
        }

        for team in &mut self.teams {
            team.members.retain(|m| *m != member);
        }
        if let Some(team) = self.teams.iter_mut().find(|t| t.name == team_name) {
            team.members.push(member);
        }

        Ok(JoinOutcome::Joined { previous })
    }

    pub fn display_name(&self, team_name: &str) -> String {
        match self.get(team_name) {
            Some(team) => team.display_name(),
            None => format!("{} {}", FALLBACK_EMOJI, team_name),
        }
    }

    pub fn team_of(&self, member: UserId) -> Option<&str> {
        self.teams
            .iter()
            .find(|t| t.members.contains(&member))
            .map(|t| t.name.as_str())
    }

    pub fn get(&self, team_name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == team_name)
    }

    /// Add round points to a team. Scores only ever grow within a game.
    pub fn credit(&mut self, team_name: &str, points: u32) -> Option<u32> {
        let team = self.teams.iter_mut().find(|t| t.name == team_name)?;
        team.score = team.score.saturating_add(points);
        Some(team.score)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// `(name, score)` pairs in configuration order
    pub fn scores(&self) -> Vec<(String, u32)> {
        self.teams.iter().map(|t| (t.name.clone(), t.score)).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.teams.iter().map(|t| t.name.clone()).collect()
    }

    pub fn is_configured(&self) -> bool {
        !self.teams.is_empty()
    }

    pub fn has_points(&self) -> bool {
        self.teams.iter().any(|t| t.score > 0)
    }
}

/// Trim and check a single team name. The encoded join action must fit in
/// [`MAX_ACTION_PAYLOAD`] bytes, so the limit depends on the UTF-8 length.
pub fn validate_team_name(raw: &str) -> Result<String, GameError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(GameError::EmptyTeamName);
    }
    let name = name.to_string();
    if Action::Join(name.clone()).tag().len() > MAX_ACTION_PAYLOAD {
        return Err(GameError::TeamNameTooLong(name));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Team{}", i)).collect()
    }

    fn red_blue() -> TeamRoster {
        let mut roster = TeamRoster::new();
        roster
            .configure(&["Red".to_string(), "Blue".to_string()], 2, 10)
            .unwrap();
        roster
    }

    #[test]
    fn test_configure_every_allowed_count() {
        for n in 2..=10 {
            let mut roster = TeamRoster::new();
            roster.configure(&names(n), 2, 10).unwrap();

            assert_eq!(roster.teams().len(), n);
            for (i, team) in roster.teams().iter().enumerate() {
                assert_eq!(team.name, format!("Team{}", i));
                assert_eq!(team.score, 0);
                assert_eq!(team.emoji, TEAM_EMOJIS[i % 10]);
                assert!(team.members.is_empty());
            }
        }
    }

    #[test]
    fn test_configure_rejects_bad_counts() {
        let mut roster = TeamRoster::new();
        assert_eq!(
            roster.configure(&names(1), 2, 10),
            Err(GameError::InvalidTeamCount { min: 2, max: 10, got: 1 })
        );
        assert_eq!(
            roster.configure(&names(11), 2, 10),
            Err(GameError::InvalidTeamCount { min: 2, max: 10, got: 11 })
        );
        assert!(!roster.is_configured());
    }

    #[test]
    fn test_configure_rejects_empty_and_duplicate_names() {
        let mut roster = TeamRoster::new();
        let empty = vec!["Red".to_string(), "   ".to_string()];
        assert_eq!(roster.configure(&empty, 2, 10), Err(GameError::EmptyTeamName));

        let dup = vec!["Red".to_string(), " Red ".to_string()];
        assert_eq!(
            roster.configure(&dup, 2, 10),
            Err(GameError::DuplicateTeamName("Red".to_string()))
        );
        assert!(!roster.is_configured());
    }

    #[test]
    fn test_name_limit_counts_bytes_of_join_payload() {
        // 59 bytes plus the "join:" prefix fill the payload exactly
        let longest = "a".repeat(59);
        assert_eq!(validate_team_name(&longest), Ok(longest.clone()));
        assert_eq!(Action::Join(longest).tag().len(), MAX_ACTION_PAYLOAD);

        let too_long = "a".repeat(60);
        assert_eq!(
            validate_team_name(&too_long),
            Err(GameError::TeamNameTooLong(too_long.clone()))
        );

        // Two bytes per letter: 32 letters are 64 bytes of name alone
        let cyrillic = "Ж".repeat(32);
        assert_eq!(
            validate_team_name(&cyrillic),
            Err(GameError::TeamNameTooLong(cyrillic.clone()))
        );
        let fits = "Ж".repeat(29);
        assert_eq!(validate_team_name(&fits), Ok(fits.clone()));

        // Surrounding whitespace is not counted
        assert!(validate_team_name(&format!("  {}  ", "a".repeat(59))).is_ok());
    }

    #[test]
    fn test_configure_rejects_name_too_long_for_button() {
        let mut roster = TeamRoster::new();
        let names = vec!["Ж".repeat(32), "Blue".to_string()];
        assert!(matches!(
            roster.configure(&names, 2, 10),
            Err(GameError::TeamNameTooLong(_))
        ));
        assert!(!roster.is_configured());
    }

    #[test]
    fn test_configure_palette_wraps_past_ten() {
        let mut roster = TeamRoster::new();
        roster.configure(&names(12), 2, 12).unwrap();
        assert_eq!(roster.teams()[10].emoji, TEAM_EMOJIS[0]);
        assert_eq!(roster.teams()[11].emoji, TEAM_EMOJIS[1]);
    }

    #[test]
    fn test_join_moves_member_between_teams() {
        let mut roster = red_blue();
        let user = UserId(1);

        assert_eq!(
            roster.join("Red", user),
            Ok(JoinOutcome::Joined { previous: None })
        );
        assert_eq!(
            roster.join("Blue", user),
            Ok(JoinOutcome::Joined {
                previous: Some("Red".to_string())
            })
        );

        assert!(roster.get("Red").unwrap().members.is_empty());
        assert_eq!(roster.get("Blue").unwrap().members, vec![user]);
        assert_eq!(roster.team_of(user), Some("Blue"));
    }

    #[test]
    fn test_rejoining_same_team_is_noop() {
        let mut roster = red_blue();
        roster.join("Red", UserId(1)).unwrap();
        roster.join("Red", UserId(2)).unwrap();

        assert_eq!(roster.join("Red", UserId(1)), Ok(JoinOutcome::AlreadyMember));
        // Join order is preserved
        assert_eq!(roster.get("Red").unwrap().members, vec![UserId(1), UserId(2)]);
    }

    #[test]
    fn test_join_unknown_team_is_rejected() {
        let mut roster = red_blue();
        assert_eq!(
            roster.join("Green", UserId(1)),
            Err(GameError::UnknownTeam("Green".to_string()))
        );
        assert_eq!(roster.team_of(UserId(1)), None);
    }

    #[test]
    fn test_display_name() {
        let roster = red_blue();
        assert_eq!(roster.display_name("Red"), "🚀 Red");
        assert_eq!(roster.display_name("Blue"), "🦅 Blue");
        assert_eq!(roster.display_name("Ghost"), "🔹 Ghost");
    }

    #[test]
    fn test_credit_accumulates() {
        let mut roster = red_blue();
        assert_eq!(roster.credit("Red", 3), Some(3));
        assert_eq!(roster.credit("Red", 2), Some(5));
        assert_eq!(roster.credit("Ghost", 2), None);
        assert!(roster.has_points());
        assert_eq!(
            roster.scores(),
            vec![("Red".to_string(), 5), ("Blue".to_string(), 0)]
        );
    }
}
