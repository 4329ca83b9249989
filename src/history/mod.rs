//! Analysis history: the one persisted entity and its store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::db::repository::{Entity, Repository};
use crate::error::DatabaseError;

/// One stored code analysis.
///
/// Rows are written once after a successful analysis and never mutated.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisHistory {
    pub id: Uuid,
    pub code_snippet: String,
    pub suggestions: String,
    /// Assigned by the database at insertion; `None` until loaded back.
    pub created_at: Option<DateTime<Utc>>,
}

impl AnalysisHistory {
    /// Build a record ready for insertion.
    pub fn new(code_snippet: impl Into<String>, suggestions: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code_snippet: code_snippet.into(),
            suggestions: suggestions.into(),
            created_at: None,
        }
    }
}

impl Entity for AnalysisHistory {
    const TABLE: &'static str = "analysis_history";
    const COLUMNS: &'static [&'static str] = &["id", "code_snippet", "suggestions", "created_at"];
    const INSERT_COLUMNS: &'static [&'static str] = &["id", "code_snippet", "suggestions"];

    fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            code_snippet: row.get("code_snippet"),
            suggestions: row.get("suggestions"),
            created_at: row.get("created_at"),
        }
    }

    fn insert_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![&self.id, &self.code_snippet, &self.suggestions]
    }
}

/// Store surface the analysis service depends on.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persist one analysis. One insert, committed immediately.
    async fn record(&self, entry: AnalysisHistory) -> Result<(), DatabaseError>;

    async fn find_all(&self) -> Result<Vec<AnalysisHistory>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisHistory>, DatabaseError>;

    /// Delete by id. A missing row is a no-op.
    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError>;
}

/// Postgres-backed history store over the generic repository.
pub struct PgHistoryStore {
    repo: Repository<AnalysisHistory>,
}

impl PgHistoryStore {
    pub fn new(pool: Pool) -> Self {
        Self {
            repo: Repository::new(pool),
        }
    }

    /// The underlying repository, for generic operations.
    pub fn repository(&self) -> &Repository<AnalysisHistory> {
        &self.repo
    }
}

#[async_trait]
impl HistoryStore for PgHistoryStore {
    async fn record(&self, entry: AnalysisHistory) -> Result<(), DatabaseError> {
        self.repo.create(&entry).await
    }

    async fn find_all(&self) -> Result<Vec<AnalysisHistory>, DatabaseError> {
        self.repo.find_all().await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisHistory>, DatabaseError> {
        self.repo.find_by().filter("id", &id).one().await
    }

    async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_records_have_no_timestamp_yet() {
        let entry = AnalysisHistory::new("fn main() {}", "looks fine");
        assert_eq!(entry.code_snippet, "fn main() {}");
        assert_eq!(entry.suggestions, "looks fine");
        assert!(entry.created_at.is_none());
    }

    #[test]
    fn insert_excludes_server_defaulted_columns() {
        assert!(!AnalysisHistory::INSERT_COLUMNS.contains(&"created_at"));
        let entry = AnalysisHistory::new("code", "text");
        assert_eq!(
            entry.insert_params().len(),
            AnalysisHistory::INSERT_COLUMNS.len()
        );
    }
}
