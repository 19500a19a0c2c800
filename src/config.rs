use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub token: String,
    /// Public base URL; when unset the bot long-polls instead of using a webhook
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub words_path: String,
    pub images_dir: String,
    /// Round length in seconds
    pub round_time: u64,
    /// Words dispensed per round
    pub round_limit: u32,
    pub min_teams: usize,
    pub max_teams: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            words_path: "./words.txt".to_string(),
            images_dir: "./images".to_string(),
            round_time: 60,
            round_limit: 10,
            min_teams: 2,
            max_teams: 10,
        }
    }
}

impl GameConfig {
    pub fn round_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.round_time)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.round_time > 0, "ROUND_TIME must be positive");
        anyhow::ensure!(self.round_limit > 0, "ROUND_LIMIT must be positive");
        anyhow::ensure!(
            self.min_teams >= 1 && self.min_teams <= self.max_teams,
            "MIN_TEAMS must be at least 1 and not exceed MAX_TEAMS"
        );
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let bot = BotConfig {
            token: env::var("BOT_TOKEN")
                .context("BOT_TOKEN must be set")?,
            webhook_url: env::var("WEBHOOK_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        };

        let server = ServerConfig {
            host: env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a number")?,
        };

        let defaults = GameConfig::default();
        let game = GameConfig {
            words_path: env::var("WORDS_PATH")
                .unwrap_or(defaults.words_path),
            images_dir: env::var("IMAGES_DIR")
                .unwrap_or(defaults.images_dir),
            round_time: parse_var("ROUND_TIME", defaults.round_time)?,
            round_limit: parse_var("ROUND_LIMIT", defaults.round_limit)?,
            min_teams: parse_var("MIN_TEAMS", defaults.min_teams)?,
            max_teams: parse_var("MAX_TEAMS", defaults.max_teams)?,
        };
        game.validate()?;

        Ok(Config { bot, server, game })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .ok()
            .with_context(|| format!("{} must be a number", name)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_defaults() {
        let game = GameConfig::default();
        assert_eq!(game.round_time, 60);
        assert_eq!(game.round_limit, 10);
        assert_eq!((game.min_teams, game.max_teams), (2, 10));
        assert!(game.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let game = GameConfig {
            round_limit: 0,
            ..GameConfig::default()
        };
        assert!(game.validate().is_err());

        let game = GameConfig {
            min_teams: 5,
            max_teams: 3,
            ..GameConfig::default()
        };
        assert!(game.validate().is_err());
    }

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let value: u32 = parse_var("ALIAS_TEST_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }
}
