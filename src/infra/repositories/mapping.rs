//! Column metadata for hand-built SQL.
//!
//! Collected once per repository from the SeaORM derive output, so the
//! raw-SQL repository never has to inspect types at query time.

use sea_orm::{
    ColumnTrait, ColumnType, EntityName, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn,
    PrimaryKeyTrait,
};

/// Table name, key and persisted columns of one entity.
#[derive(Debug, Clone)]
pub struct TableMapping<E: EntityTrait> {
    table: String,
    key: Option<E::Column>,
    key_generated: bool,
    columns: Vec<E::Column>,
}

impl<E: EntityTrait> TableMapping<E> {
    /// Build the mapping from the entity definition.
    ///
    /// Fields marked `#[sea_orm(ignore)]` never become columns, so they are
    /// left out of every statement. Only the first primary-key column is
    /// used.
    pub fn of() -> Self {
        let key = E::PrimaryKey::iter().next().map(|pk| pk.into_column());
        let key_generated = key.is_some_and(|column| {
            <E::PrimaryKey as PrimaryKeyTrait>::auto_increment()
                && is_integer(column.def().get_column_type())
        });

        Self {
            table: E::default().table_name().to_string(),
            key,
            key_generated,
            columns: E::Column::iter().collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> Option<E::Column> {
        self.key
    }

    /// Whether the store assigns the key on insert
    pub fn key_generated(&self) -> bool {
        self.key_generated
    }

    /// Every persisted column, in declaration order
    pub fn columns(&self) -> &[E::Column] {
        &self.columns
    }

    /// Columns written by `INSERT`: everything except a store-generated key.
    pub fn insert_columns(&self) -> Vec<E::Column> {
        self.columns
            .iter()
            .copied()
            .filter(|column| !(self.key_generated && self.is_key(*column)))
            .collect()
    }

    /// Columns written by `UPDATE ... SET`: everything except the key.
    pub fn update_columns(&self) -> Vec<E::Column> {
        self.columns
            .iter()
            .copied()
            .filter(|column| !self.is_key(*column))
            .collect()
    }

    fn is_key(&self, column: E::Column) -> bool {
        self.key
            .is_some_and(|key| key.as_str() == column.as_str())
    }
}

fn is_integer(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned
    )
}
