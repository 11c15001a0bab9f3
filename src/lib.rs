pub mod command;
pub mod complete;
pub mod config;
pub mod error;
pub mod game;
pub mod glob;
pub mod logger;
pub mod mission;
pub mod parse;
pub mod persist;
pub mod player;
pub mod shell;
pub mod system;
pub mod vfs;

pub use complete::{complete, Completion};
pub use config::GameConfig;
pub use error::{CommandError, FsError, GameError};
pub use game::{Game, GameEvent, SaveData, Turn, Verdict};
pub use persist::{KeyValueStore, MemoryStore};
pub use shell::{CommandProcessor, CommandResult};
pub use system::TerminalQuest;
pub use vfs::{FsNode, Vfs};
