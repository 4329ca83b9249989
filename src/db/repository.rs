//! Generic CRUD repository over a single mapped entity type.
//!
//! The surface is narrow: `find_all`, a lazy [`Query`] builder for filtered
//! reads, and per-call `create`/`update`/`delete`. Filters and update
//! fields name columns explicitly; a name the entity does not map is
//! dropped rather than treated as an error.

use std::marker::PhantomData;

use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::error::DatabaseError;

/// A record type mapped to one table.
pub trait Entity: Send + Sync {
    /// Table the entity maps to.
    const TABLE: &'static str;

    /// Every mapped column.
    const COLUMNS: &'static [&'static str];

    /// Columns written on insert. Server-defaulted columns are excluded.
    const INSERT_COLUMNS: &'static [&'static str];

    fn from_row(row: &Row) -> Self;

    /// Parameter values matching `INSERT_COLUMNS`, in order.
    fn insert_params(&self) -> Vec<&(dyn ToSql + Sync)>;
}

/// CRUD access over exactly one entity type, backed by a shared pool.
///
/// Each operation acquires a pooled connection for its own duration and
/// commits implicitly; there are no cross-call transaction boundaries.
pub struct Repository<E: Entity> {
    pool: Pool,
    _entity: PhantomData<E>,
}

impl<E: Entity> Repository<E> {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    fn is_mapped(column: &str) -> bool {
        E::COLUMNS.iter().any(|c| *c == column)
    }

    /// Every row of the entity's table, in store order.
    pub async fn find_all(&self) -> Result<Vec<E>, DatabaseError> {
        let statement = format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE);
        let conn = self.pool.get().await?;
        let rows = conn.query(statement.as_str(), &[]).await?;
        Ok(rows.iter().map(E::from_row).collect())
    }

    /// Start a filtered query.
    ///
    /// Nothing executes until the query is fetched, so callers can keep
    /// refining it.
    pub fn find_by(&self) -> Query<'_, E> {
        Query {
            repo: self,
            filters: Vec::new(),
        }
    }

    /// Insert one instance. One statement, committed immediately.
    pub async fn create(&self, entity: &E) -> Result<(), DatabaseError> {
        let placeholders: Vec<String> = (1..=E::INSERT_COLUMNS.len())
            .map(|i| format!("${i}"))
            .collect();
        let statement = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            E::INSERT_COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let conn = self.pool.get().await?;
        conn.execute(statement.as_str(), &entity.insert_params())
            .await?;
        Ok(())
    }

    /// Set the named fields on the row with the given id.
    ///
    /// A missing row is a silent no-op, as is an empty field list once
    /// unmapped names are dropped.
    pub async fn update(
        &self,
        id: Uuid,
        fields: &[(&str, &(dyn ToSql + Sync))],
    ) -> Result<(), DatabaseError> {
        let mut assignments = Vec::new();
        let mut params: Vec<&(dyn ToSql + Sync)> = vec![&id];

        for &(column, value) in fields {
            if !Self::is_mapped(column) {
                tracing::debug!(column, table = E::TABLE, "dropping unmapped update field");
                continue;
            }
            params.push(value);
            assignments.push(format!("{} = ${}", column, params.len()));
        }

        if assignments.is_empty() {
            return Ok(());
        }

        let statement = format!(
            "UPDATE {} SET {} WHERE id = $1",
            E::TABLE,
            assignments.join(", ")
        );

        let conn = self.pool.get().await?;
        conn.execute(statement.as_str(), &params).await?;
        Ok(())
    }

    /// Delete the row with the given id. A missing row is a no-op.
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let statement = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        let conn = self.pool.get().await?;
        conn.execute(statement.as_str(), &[&id]).await?;
        Ok(())
    }
}

/// A lazy conjunctive equality filter over one entity's table.
///
/// Execution happens at [`Query::fetch`] or [`Query::one`]; until then
/// filters can keep being added. Filters naming unmapped columns are
/// dropped, so a query carrying only unknown names returns the full set.
pub struct Query<'a, E: Entity> {
    repo: &'a Repository<E>,
    filters: Vec<(&'a str, &'a (dyn ToSql + Sync))>,
}

impl<'a, E: Entity> Query<'a, E> {
    /// Add an equality filter on a column.
    pub fn filter(mut self, column: &'a str, value: &'a (dyn ToSql + Sync)) -> Self {
        if Repository::<E>::is_mapped(column) {
            self.filters.push((column, value));
        } else {
            tracing::debug!(column, table = E::TABLE, "dropping filter on unmapped column");
        }
        self
    }

    fn statement(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE);
        if !self.filters.is_empty() {
            let conditions: Vec<String> = self
                .filters
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ${}", column, i + 1))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql
    }

    fn params(&self) -> Vec<&'a (dyn ToSql + Sync)> {
        self.filters.iter().map(|(_, value)| *value).collect()
    }

    /// Execute and materialize every matching row.
    pub async fn fetch(self) -> Result<Vec<E>, DatabaseError> {
        let statement = self.statement();
        let params = self.params();
        let conn = self.repo.pool.get().await?;
        let rows = conn.query(statement.as_str(), &params).await?;
        Ok(rows.iter().map(E::from_row).collect())
    }

    /// Execute and return at most one row.
    pub async fn one(self) -> Result<Option<E>, DatabaseError> {
        let statement = format!("{} LIMIT 1", self.statement());
        let params = self.params();
        let conn = self.repo.pool.get().await?;
        let row = conn.query_opt(statement.as_str(), &params).await?;
        Ok(row.as_ref().map(E::from_row))
    }
}

#[cfg(test)]
mod tests {
    use deadpool_postgres::{Config, Runtime};
    use pretty_assertions::assert_eq;

    use super::*;

    struct Widget;

    impl Entity for Widget {
        const TABLE: &'static str = "widget";
        const COLUMNS: &'static [&'static str] = &["id", "name", "created_at"];
        const INSERT_COLUMNS: &'static [&'static str] = &["id", "name"];

        fn from_row(_row: &Row) -> Self {
            unimplemented!("statement-building tests never materialize rows")
        }

        fn insert_params(&self) -> Vec<&(dyn ToSql + Sync)> {
            Vec::new()
        }
    }

    // The pool is never used: statement-building tests stop before I/O.
    fn repo() -> Repository<Widget> {
        let mut cfg = Config::new();
        cfg.url = Some("postgres://postgres@localhost:5432/widgets".to_string());
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), tokio_postgres::NoTls)
            .unwrap();
        Repository::new(pool)
    }

    #[test]
    fn unfiltered_query_selects_everything() {
        let repo = repo();
        let query = repo.find_by();
        assert_eq!(query.statement(), "SELECT id, name, created_at FROM widget");
    }

    #[test]
    fn filters_on_unmapped_columns_are_dropped() {
        let repo = repo();
        let value = "x".to_string();
        let query = repo.find_by().filter("no_such_column", &value);
        assert_eq!(query.statement(), "SELECT id, name, created_at FROM widget");
        assert!(query.params().is_empty());
    }

    #[test]
    fn filters_compose_conjunctively() {
        let repo = repo();
        let name = "gear".to_string();
        let id = Uuid::new_v4();
        let query = repo.find_by().filter("name", &name).filter("id", &id);
        assert_eq!(
            query.statement(),
            "SELECT id, name, created_at FROM widget WHERE name = $1 AND id = $2"
        );
        assert_eq!(query.params().len(), 2);
    }
}
