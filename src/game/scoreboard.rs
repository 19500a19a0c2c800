use super::roster::Team;

/// Bonus announced for every member of the winning team
pub const WINNER_REWARD: &str = "+30 min break";

/// Pick the team with the highest score.
///
/// Ties go to the first team holding the maximum, in the order the teams are
/// given (configuration order). Returns `None` for an empty slice.
pub fn winner(teams: &[Team]) -> Option<&Team> {
    let mut best: Option<&Team> = None;
    for team in teams {
        match best {
            Some(current) if team.score <= current.score => {}
            _ => best = Some(team),
        }
    }
    best
}

/// Standings block, one line per team
pub fn standings<'a>(teams: impl IntoIterator<Item = &'a Team>) -> String {
    teams
        .into_iter()
        .map(|team| format!("{}: *{}* points\n", team.display_name(), team.score))
        .collect()
}

/// Current score message
pub fn score_summary<'a>(teams: impl IntoIterator<Item = &'a Team>) -> String {
    format!("📊 *Current score:*\n{}", standings(teams))
}

/// Final summary naming the winner and the members who earn the reward.
/// `member_names` are already resolved display names of the winning members.
pub fn final_summary(teams: &[Team], winner: &Team, member_names: &[String]) -> String {
    let mut summary = format!("🏁 *Game over!*\n\n{}", standings(teams));
    summary.push_str(&format!(
        "\n🥇 Team *{}* wins!\n🎁 {} for:\n",
        winner.display_name(),
        WINNER_REWARD
    ));
    for name in member_names {
        summary.push_str(&format!("- @{}\n", name));
    }
    summary
}
