//! Player state and progression

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Achievement IDs. Serialized with the snake_case ids the save file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstCommand, // Execute the first command
    ListMaster,   // ls 10 times
    Navigator,    // cd 5 times
    FileCreator,  // Create a file
    #[serde(rename = "mission_1")]
    Mission1,
    #[serde(rename = "mission_5")]
    Mission5,
    Speedrunner, // Mission under a minute
    Rtfm,        // Use man
    PipeMaster,  // Use a pipe
    GrepGuru,    // grep with a match
    NoHints,     // Mission without hints
}

impl Achievement {
    pub const ALL: [Achievement; 11] = [
        Achievement::FirstCommand,
        Achievement::ListMaster,
        Achievement::Navigator,
        Achievement::FileCreator,
        Achievement::Mission1,
        Achievement::Mission5,
        Achievement::Speedrunner,
        Achievement::Rtfm,
        Achievement::PipeMaster,
        Achievement::GrepGuru,
        Achievement::NoHints,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Achievement::FirstCommand => "Hello, Terminal!",
            Achievement::ListMaster => "List Master",
            Achievement::Navigator => "Navigator",
            Achievement::FileCreator => "File Creator",
            Achievement::Mission1 => "First Day Complete",
            Achievement::Mission5 => "Rising Star",
            Achievement::Speedrunner => "Speedrunner",
            Achievement::Rtfm => "RTFM",
            Achievement::PipeMaster => "Pipe Master",
            Achievement::GrepGuru => "Grep Guru",
            Achievement::NoHints => "Self Taught",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstCommand => "Execute your first command",
            Achievement::ListMaster => "Use ls 10 times",
            Achievement::Navigator => "Change directories 5 times",
            Achievement::FileCreator => "Create your first file",
            Achievement::Mission1 => "Complete Mission 1",
            Achievement::Mission5 => "Complete 5 missions",
            Achievement::Speedrunner => "Complete a mission in under 60 seconds",
            Achievement::Rtfm => "Use the man command",
            Achievement::PipeMaster => "Use pipes in a command",
            Achievement::GrepGuru => "Use grep successfully",
            Achievement::NoHints => "Complete a mission without using hints",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Achievement::FirstCommand => "👋",
            Achievement::ListMaster => "📋",
            Achievement::Navigator => "🧭",
            Achievement::FileCreator => "📄",
            Achievement::Mission1 => "⭐",
            Achievement::Mission5 => "🌟",
            Achievement::Speedrunner => "⚡",
            Achievement::Rtfm => "📚",
            Achievement::PipeMaster => "🔧",
            Achievement::GrepGuru => "🔍",
            Achievement::NoHints => "🧠",
        }
    }

    pub fn xp(&self) -> u32 {
        match self {
            Achievement::FirstCommand => 50,
            Achievement::ListMaster | Achievement::Navigator | Achievement::Rtfm => 100,
            Achievement::FileCreator => 75,
            Achievement::Mission1 => 200,
            Achievement::Mission5 => 500,
            Achievement::Speedrunner => 300,
            Achievement::PipeMaster | Achievement::GrepGuru => 150,
            Achievement::NoHints => 250,
        }
    }
}

/// One entry of the achievement list shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AchievementView {
    pub id: Achievement,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub xp: u32,
    pub unlocked: bool,
}

/// Player profile, persisted as part of the save data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub name: String,
    pub level: u32,
    pub xp: u32,
    pub xp_to_next_level: u32,
    pub title: String,
    pub missions_completed: u32,
    pub commands_used: u32,
    pub achievements: BTreeSet<Achievement>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Player {
    pub fn new(xp_to_next_level: u32) -> Self {
        Player {
            name: "Terminal Novice".into(),
            level: 1,
            xp: 0,
            xp_to_next_level: xp_to_next_level.max(1),
            title: title_for(1).into(),
            missions_completed: 0,
            commands_used: 0,
            achievements: BTreeSet::new(),
        }
    }

    /// Add XP, rolling over into as many levels as it pays for. Returns the
    /// number of levels gained.
    pub fn add_xp(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level += 1;
            self.xp_to_next_level = (self.xp_to_next_level as u64 * 3 / 2).max(1) as u32;
            gained += 1;
        }
        self.title = title_for(self.level).into();
        gained
    }

    pub fn has(&self, achievement: Achievement) -> bool {
        self.achievements.contains(&achievement)
    }

    /// Record an unlock. Returns false when it was already unlocked.
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        self.achievements.insert(achievement)
    }

    /// Every achievement in catalog order, locked ones included.
    pub fn achievement_list(&self) -> Vec<AchievementView> {
        Achievement::ALL
            .iter()
            .map(|&a| AchievementView {
                id: a,
                name: a.name(),
                description: a.description(),
                icon: a.icon(),
                xp: a.xp(),
                unlocked: self.has(a),
            })
            .collect()
    }
}

pub fn title_for(level: u32) -> &'static str {
    match level {
        20.. => "Terminal Master",
        15.. => "DevOps Engineer",
        10.. => "Senior Sysadmin",
        5.. => "Sysadmin",
        _ => "Junior Sysadmin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_up_rolls_over() {
        let mut p = Player::default();
        assert_eq!(p.add_xp(99), 0);
        assert_eq!(p.add_xp(1), 1);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 0);
        assert_eq!(p.xp_to_next_level, 150);
    }

    #[test]
    fn test_multiple_levels_at_once() {
        let mut p = Player::default();
        // 100 + 150 + 225 = 475
        assert_eq!(p.add_xp(500), 3);
        assert_eq!(p.level, 4);
        assert_eq!(p.xp, 25);
        assert_eq!(p.xp_to_next_level, 337);
    }

    #[test]
    fn test_titles() {
        assert_eq!(title_for(1), "Junior Sysadmin");
        assert_eq!(title_for(5), "Sysadmin");
        assert_eq!(title_for(12), "Senior Sysadmin");
        assert_eq!(title_for(20), "Terminal Master");
    }

    #[test]
    fn test_unlock_once() {
        let mut p = Player::default();
        assert!(p.unlock(Achievement::Rtfm));
        assert!(!p.unlock(Achievement::Rtfm));
    }

    #[test]
    fn test_achievement_list() {
        let mut p = Player::default();
        p.unlock(Achievement::PipeMaster);
        let list = p.achievement_list();
        assert_eq!(list.len(), 11);
        assert_eq!(list[0].name, "Hello, Terminal!");
        assert!(!list[0].unlocked);
        let pipe = list.iter().find(|v| v.id == Achievement::PipeMaster).unwrap();
        assert!(pipe.unlocked);
        assert_eq!(pipe.description, "Use pipes in a command");
        assert_eq!(list.iter().filter(|v| v.unlocked).count(), 1);
    }

    #[test]
    fn test_achievement_ids() {
        let json = serde_json::to_string(&Achievement::Mission1).unwrap();
        assert_eq!(json, "\"mission_1\"");
        let json = serde_json::to_string(&Achievement::FirstCommand).unwrap();
        assert_eq!(json, "\"first_command\"");
    }
}
