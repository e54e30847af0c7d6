//! Repository layer - Data access abstraction
//!
//! Two interchangeable implementations of [`Repository`]: one staging writes
//! on the tracked session, one issuing hand-built SQL.

mod base;
pub mod entities;
mod factory;
mod filter;
mod mapping;
mod orm_repository;
mod sql_repository;

pub use base::{KeyOf, Repository, RepositoryKind};
pub use factory::RepositoryFactory;
pub use filter::Filter;
pub use mapping::TableMapping;
pub use orm_repository::OrmRepository;
pub use sql_repository::SqlRepository;
