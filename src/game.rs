//! Mission progression: objective checking, rewards, snapshots and saves.

use crate::complete::{complete, Completion};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::mission::{catalog, is_free_roaming, matches_objective, Mission};
use crate::parse::CommandLine;
use crate::persist::KeyValueStore;
use crate::player::{Achievement, Player};
use crate::shell::{prompt, CommandProcessor, CommandResult, CommandStats};
use crate::vfs::{FsNode, Vfs};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How the active mission treated an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Satisfied the active objective.
    Matched,
    /// Ran without affecting progress.
    FreeRoam,
    /// Not run: not the active objective.
    Rejected,
    /// Not run: could not be parsed.
    Invalid,
    /// No objective is pending; everything runs.
    NoMission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    ObjectiveCompleted {
        index: usize,
        text: String,
    },
    XpGained {
        amount: u32,
    },
    LevelUp {
        level: u32,
        title: String,
    },
    AchievementUnlocked {
        id: Achievement,
        name: &'static str,
        icon: &'static str,
        xp: u32,
    },
    MissionCompleted {
        index: usize,
        title: String,
        xp: u32,
    },
    AllMissionsComplete,
}

/// Everything the UI needs to render one submitted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub result: CommandResult,
    pub verdict: Verdict,
    pub events: Vec<GameEvent>,
    /// Objective to bring into view after a completion.
    pub scroll_to: Option<usize>,
    /// Set when a mission was just completed; call `advance` after this delay.
    pub advance_in_ms: Option<u32>,
    pub prompt: String,
}

/// Progress shared by every mission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameState {
    pub player: Player,
    pub current_mission: usize,
    pub completed_missions: BTreeSet<usize>,
    pub hint_used: bool,
    pub hints_viewed: u32,
    pub command_stats: CommandStats,
    /// Filesystem as it was when each mission was first loaded.
    pub filesystem_snapshots: BTreeMap<usize, FsNode>,
}

/// The persisted subset of `GameState`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    pub player: Player,
    pub current_mission: usize,
    pub completed_missions: BTreeSet<usize>,
    pub command_stats: CommandStats,
    pub filesystem_snapshots: BTreeMap<usize, FsNode>,
    /// Mission scheduled by the last completion, if not yet loaded.
    pub pending_advance: Option<usize>,
    /// Live tree, kept only once the current mission is finished.
    pub filesystem: Option<FsNode>,
}

impl From<&GameState> for SaveData {
    fn from(state: &GameState) -> Self {
        SaveData {
            player: state.player.clone(),
            current_mission: state.current_mission,
            completed_missions: state.completed_missions.clone(),
            command_stats: state.command_stats.clone(),
            filesystem_snapshots: state.filesystem_snapshots.clone(),
            pending_advance: None,
            filesystem: None,
        }
    }
}

/// Read-only view of the active mission for the UI.
#[derive(Debug, Serialize)]
pub struct MissionView<'a> {
    pub index: usize,
    pub total: usize,
    pub mission: &'a Mission,
    pub objectives_done: &'a [bool],
    pub active_objective: Option<usize>,
    pub hints_viewed: u32,
}

pub struct Game {
    config: GameConfig,
    missions: Vec<Mission>,
    fs: Vfs,
    shell: CommandProcessor,
    state: GameState,
    objectives_done: Vec<bool>,
    mission_started_ms: f64,
    pending_advance: Option<usize>,
}

impl Game {
    pub fn new(config: GameConfig, now_ms: f64) -> Game {
        let missions = catalog(&config.home);
        let state = GameState {
            player: Player::new(config.starting_xp_to_next_level),
            ..GameState::default()
        };
        let mut game = Game {
            fs: Vfs::with_home(&config.home),
            shell: CommandProcessor::new(),
            missions,
            state,
            objectives_done: Vec::new(),
            mission_started_ms: now_ms,
            pending_advance: None,
            config,
        };
        if let Err(e) = game.load_mission(0, now_ms) {
            warn!("starting mission unavailable: {}", e);
        }
        game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn fs(&self) -> &Vfs {
        &self.fs
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    pub fn mission(&self) -> Option<&Mission> {
        self.missions.get(self.state.current_mission)
    }

    pub fn objectives_done(&self) -> &[bool] {
        &self.objectives_done
    }

    pub fn pending_advance(&self) -> Option<usize> {
        self.pending_advance
    }

    /// First incomplete objective of the current mission.
    pub fn active_objective(&self) -> Option<usize> {
        self.mission()?;
        self.objectives_done.iter().position(|done| !done)
    }

    pub fn prompt(&self) -> String {
        prompt(&self.fs, &self.config.user, &self.config.host)
    }

    pub fn complete(&self, line: &str) -> Completion {
        complete(line, &self.fs)
    }

    pub fn mission_view(&self) -> Option<MissionView<'_>> {
        Some(MissionView {
            index: self.state.current_mission,
            total: self.missions.len(),
            mission: self.mission()?,
            objectives_done: &self.objectives_done,
            active_objective: self.active_objective(),
            hints_viewed: self.state.hints_viewed,
        })
    }

    fn turn(&self, result: CommandResult, verdict: Verdict) -> Turn {
        Turn {
            result,
            verdict,
            events: Vec::new(),
            scroll_to: None,
            advance_in_ms: None,
            prompt: self.prompt(),
        }
    }

    /// Check `line` against the active objective, then run it if allowed.
    /// A rejected line is not executed.
    pub fn submit(&mut self, line: &str, now_ms: f64) -> Turn {
        let raw = line.trim();
        if raw.is_empty() {
            return self.turn(CommandResult::Output(String::new()), Verdict::FreeRoam);
        }
        let parsed = match CommandLine::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => return self.turn(CommandResult::Error(e.to_string()), Verdict::Invalid),
        };

        let active = self.active_objective();
        // Between a completion and `advance` only free-roaming lines run.
        let gated = active.is_some() || self.pending_advance.is_some();
        let verdict = match (active, self.mission()) {
            (Some(i), Some(m))
                if matches_objective(&parsed, &m.objectives[i].command, &self.fs) =>
            {
                Verdict::Matched
            }
            _ if !gated => Verdict::NoMission,
            _ if is_free_roaming(&parsed) => Verdict::FreeRoam,
            _ => {
                let message = GameError::ObjectiveMismatch.to_string();
                return self.turn(CommandResult::Error(message), Verdict::Rejected);
            }
        };

        let execution = self.shell.run(&mut self.fs, &parsed);
        self.state.command_stats = self.shell.stats().clone();
        self.state.player.commands_used = self.state.command_stats.total;

        let mut events = Vec::new();
        for achievement in execution.triggers {
            self.unlock(achievement, &mut events);
        }

        let mut scroll_to = None;
        let mut advance_in_ms = None;
        if let (Verdict::Matched, Some(index)) = (verdict, active) {
            if !execution.result.is_error() {
                scroll_to = self.complete_objective(index, now_ms, &mut events);
                if self.pending_advance.is_some() {
                    advance_in_ms = Some(self.config.advance_delay_ms);
                }
            }
        }

        Turn {
            result: execution.result,
            verdict,
            events,
            scroll_to,
            advance_in_ms,
            prompt: self.prompt(),
        }
    }

    /// Returns the objective to scroll to next.
    fn complete_objective(
        &mut self,
        index: usize,
        now_ms: f64,
        events: &mut Vec<GameEvent>,
    ) -> Option<usize> {
        let Some(done) = self.objectives_done.get_mut(index) else {
            return None;
        };
        *done = true;
        let text = self
            .mission()
            .and_then(|m| m.objectives.get(index))
            .map(|o| o.text.clone())
            .unwrap_or_default();
        info!("objective {} complete: {}", index + 1, text);
        events.push(GameEvent::ObjectiveCompleted { index, text });
        self.award(self.config.objective_xp, events);

        let next = self.active_objective();
        if next.is_none() {
            self.complete_mission(now_ms, events);
        }
        next
    }

    fn complete_mission(&mut self, now_ms: f64, events: &mut Vec<GameEvent>) {
        let index = self.state.current_mission;
        let Some(mission) = self.missions.get(index) else {
            return;
        };
        let title = mission.title.clone();
        let mut reward = mission.xp_reward;
        if self.state.hint_used {
            reward /= 2;
        }
        info!("{} complete, {} XP", title, reward);
        events.push(GameEvent::MissionCompleted {
            index,
            title,
            xp: reward,
        });
        self.award(reward, events);

        if self.state.completed_missions.insert(index) {
            self.state.player.missions_completed += 1;
        }
        if index == 0 {
            self.unlock(Achievement::Mission1, events);
        }
        if self.state.player.missions_completed >= 5 {
            self.unlock(Achievement::Mission5, events);
        }
        if !self.state.hint_used {
            self.unlock(Achievement::NoHints, events);
        }
        if now_ms - self.mission_started_ms < self.config.speedrun_secs as f64 * 1000.0 {
            self.unlock(Achievement::Speedrunner, events);
        }

        let next = self.next_uncompleted();
        self.pending_advance = next;
        match next {
            // Taken now so the work just done survives a reload before `advance`.
            Some(next) if self.missing_path(next).is_none() => self.capture_snapshot(next),
            Some(_) => {}
            None => {
                info!("all missions complete");
                events.push(GameEvent::AllMissionsComplete);
            }
        }
    }

    fn next_uncompleted(&self) -> Option<usize> {
        (0..self.missions.len()).find(|i| !self.state.completed_missions.contains(i))
    }

    /// First required path of mission `index` absent from the live tree.
    fn missing_path(&self, index: usize) -> Option<&str> {
        self.missions
            .get(index)?
            .required_paths
            .iter()
            .find(|p| !self.fs.exists(&format!("~/{}", p)))
            .map(String::as_str)
    }

    /// Record the live tree as mission `index`'s starting point, once.
    fn capture_snapshot(&mut self, index: usize) {
        if self.state.filesystem_snapshots.contains_key(&index) {
            return;
        }
        info!("snapshot captured for mission {}", index + 1);
        self.state
            .filesystem_snapshots
            .insert(index, self.fs.snapshot());
    }

    fn award(&mut self, amount: u32, events: &mut Vec<GameEvent>) {
        if amount == 0 {
            return;
        }
        events.push(GameEvent::XpGained { amount });
        let gained = self.state.player.add_xp(amount);
        if gained > 0 {
            let player = &self.state.player;
            info!("level up: {} ({})", player.level, player.title);
            events.push(GameEvent::LevelUp {
                level: player.level,
                title: player.title.clone(),
            });
        }
    }

    fn unlock(&mut self, achievement: Achievement, events: &mut Vec<GameEvent>) {
        if !self.state.player.unlock(achievement) {
            return;
        }
        info!("achievement unlocked: {}", achievement.name());
        events.push(GameEvent::AchievementUnlocked {
            id: achievement,
            name: achievement.name(),
            icon: achievement.icon(),
            xp: achievement.xp(),
        });
        self.award(achievement.xp(), events);
    }

    /// Load the mission scheduled by the last completion. Returns false when
    /// nothing was pending.
    pub fn advance(&mut self, now_ms: f64) -> Result<bool, GameError> {
        match self.pending_advance.take() {
            Some(index) => self.load_mission(index, now_ms).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn load_mission(&mut self, index: usize, now_ms: f64) -> Result<(), GameError> {
        if index >= self.missions.len() {
            return Err(GameError::UnknownMission(index));
        }
        if let Some(path) = self.missing_path(index) {
            warn!("mission {} needs ~/{}, reinitializing filesystem", index + 1, path);
            self.fs.reset();
        }
        self.capture_snapshot(index);
        let Some(mission) = self.missions.get(index) else {
            return Err(GameError::UnknownMission(index));
        };
        if self.fs.cd(&mission.start_dir).is_err() {
            warn!("start directory {} missing", mission.start_dir);
            let _ = self.fs.cd("~");
        }

        self.objectives_done = vec![false; mission.objectives.len()];
        self.state.current_mission = index;
        self.state.hint_used = false;
        self.state.hints_viewed = 0;
        self.mission_started_ms = now_ms;
        self.pending_advance = None;
        Ok(())
    }

    /// Throw away progress on the current mission and put the filesystem
    /// back the way the mission found it.
    pub fn restart_mission(&mut self, now_ms: f64) -> Result<(), GameError> {
        let index = self.state.current_mission;
        if let Some(snapshot) = self.state.filesystem_snapshots.remove(&index) {
            info!("restoring snapshot for mission {}", index + 1);
            self.fs.restore(snapshot);
        }
        self.load_mission(index, now_ms)
    }

    /// Hint for the active objective (the last one once they run out).
    /// Viewing any hint halves the mission reward.
    pub fn reveal_hint(&mut self) -> Option<String> {
        let mission = self.mission()?;
        let index = self
            .active_objective()
            .unwrap_or(mission.objectives.len().saturating_sub(1));
        let hint = mission.hint(index)?.to_string();
        self.state.hint_used = true;
        self.state.hints_viewed += 1;
        Some(hint)
    }

    pub fn save_data(&self) -> SaveData {
        let finished = self.active_objective().is_none();
        SaveData {
            pending_advance: self.pending_advance,
            filesystem: finished.then(|| self.fs.snapshot()),
            ..SaveData::from(&self.state)
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), GameError> {
        let json = serde_json::to_string(&self.save_data())?;
        store.set(&self.config.storage_key, &json)
    }

    /// Restore a saved game. Returns false when nothing was stored.
    pub fn load(&mut self, store: &dyn KeyValueStore, now_ms: f64) -> Result<bool, GameError> {
        let Some(json) = store.get(&self.config.storage_key)? else {
            return Ok(false);
        };
        let data: SaveData = serde_json::from_str(&json)?;
        self.apply(data, now_ms)?;
        Ok(true)
    }

    /// Resume a save. An unfinished mission restarts from its snapshot; a
    /// finished one resumes at the pending mission on the post-mission tree.
    pub fn apply(&mut self, data: SaveData, now_ms: f64) -> Result<(), GameError> {
        let current = data.current_mission.min(self.missions.len().saturating_sub(1));
        self.shell = CommandProcessor::with_stats(data.command_stats.clone());
        self.state = GameState {
            player: data.player,
            current_mission: current,
            completed_missions: data.completed_missions,
            hint_used: false,
            hints_viewed: 0,
            command_stats: data.command_stats,
            filesystem_snapshots: data.filesystem_snapshots,
        };
        self.pending_advance = None;
        if !self.state.completed_missions.contains(&current) {
            self.restore_or_reset(current);
            return self.load_mission(current, now_ms);
        }

        let next = data
            .pending_advance
            .filter(|i| !self.state.completed_missions.contains(i) && *i < self.missions.len())
            .or_else(|| self.next_uncompleted());
        match (data.filesystem, next) {
            (Some(root), _) => self.fs.restore(root),
            (None, Some(i)) => self.restore_or_reset(i),
            (None, None) => self.fs.reset(),
        }
        match next {
            Some(i) => self.load_mission(i, now_ms),
            None => {
                let total = self.mission().map_or(0, |m| m.objectives.len());
                self.objectives_done = vec![true; total];
                self.mission_started_ms = now_ms;
                Ok(())
            }
        }
    }

    fn restore_or_reset(&mut self, index: usize) {
        match self.state.filesystem_snapshots.get(&index) {
            Some(snapshot) => self.fs.restore(snapshot.clone()),
            None => self.fs.reset(),
        }
    }

    /// Forget everything: clear storage and start over from mission 1.
    pub fn reset_account(
        &mut self,
        store: &mut dyn KeyValueStore,
        now_ms: f64,
    ) -> Result<(), GameError> {
        warn!("resetting account");
        *self = Game::new(self.config.clone(), now_ms);
        store.remove(&self.config.storage_key)
    }
}
