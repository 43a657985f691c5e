pub mod config_service;
pub mod dto;
pub mod migration;
pub mod paths;
pub mod persister;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::migration::{MigrationOutcome, SchemaMigrator};
pub use crate::paths::TabcalcPaths;
pub use crate::persister::ScheduledPersister;
pub use crate::storage::{JsonFileStorage, MemoryStorage};
