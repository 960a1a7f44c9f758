pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{Result, StorageError};
pub use memory::{MemoryDatabase, MemoryState, MemoryStore};
pub use postgres::{PgDatabase, PgStore};
pub use repository::{
    AthleteStore, ClubStore, CoachAssignmentStore, CoachStore, Database, EventStore, JudgeStore,
    ResultStore, Store,
};
