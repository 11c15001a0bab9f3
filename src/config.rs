use serde::{Deserialize, Serialize};

pub const DEFAULT_HOME: &str = "/home/user";

/// Tunables for a game session. Every field has a default so a partial JSON
/// document (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Absolute path of the home directory; the filesystem root.
    pub home: String,
    pub user: String,
    pub host: String,
    /// XP for each completed objective.
    pub objective_xp: u32,
    /// Delay before the next mission loads after a completion.
    pub advance_delay_ms: u32,
    /// Missions finished faster than this unlock the speedrunner achievement.
    pub speedrun_secs: u64,
    pub storage_key: String,
    pub starting_xp_to_next_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            home: DEFAULT_HOME.into(),
            user: "user".into(),
            host: "terminal-quest".into(),
            objective_xp: 25,
            advance_delay_ms: 3000,
            speedrun_secs: 60,
            storage_key: "terminalQuest".into(),
            starting_xp_to_next_level: 100,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut cfg: GameConfig = serde_json::from_str(json)?;
        let trimmed = cfg.home.trim_end_matches('/');
        cfg.home = if trimmed.is_empty() {
            DEFAULT_HOME.into()
        } else {
            trimmed.into()
        };
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let cfg = GameConfig::from_json("{}").unwrap();
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let cfg = GameConfig::from_json(r#"{"objective_xp": 40, "home": "/home/neo/"}"#).unwrap();
        assert_eq!(cfg.objective_xp, 40);
        assert_eq!(cfg.home, "/home/neo");
        assert_eq!(cfg.advance_delay_ms, 3000);
    }
}
