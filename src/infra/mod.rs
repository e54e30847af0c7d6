//! Infrastructure layer - External systems integration
//!
//! Database connection and migrations, the tracked session, both repository
//! implementations and the Unit of Work that coordinates them.

pub mod db;
pub mod repositories;
pub mod session;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use repositories::{
    Filter, Repository, RepositoryFactory, RepositoryKind, entities::UserEntity,
};
pub use session::DbSession;
pub use unit_of_work::{Persistence, UnitOfWork};
