//! SeaORM entity definitions
//!
//! These are database-specific entities separate from the request and
//! response types in `domain`.

pub mod user;

pub use user::{Entity as UserEntity, Model as UserModel};
