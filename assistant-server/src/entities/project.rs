use crate::entities::{parse_timestamp, AnyStore, ProjectPatch, ProjectRecord};
use std::future::Future;

pub trait ProjectStore: Send + Sync + 'static {
    fn create_project(&self, project: ProjectRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_project(&self, id: &str) -> impl Future<Output = Result<Option<ProjectRecord>, sqlx::Error>> + Send;
    fn list_projects(&self) -> impl Future<Output = Result<Vec<ProjectRecord>, sqlx::Error>> + Send;
    fn update_project(
        &self,
        id: &str,
        patch: ProjectPatch,
    ) -> impl Future<Output = Result<Option<ProjectRecord>, sqlx::Error>> + Send;
    /// Removes the project and returns the deleted row.
    fn delete_project(&self, id: &str) -> impl Future<Output = Result<Option<ProjectRecord>, sqlx::Error>> + Send;
}

type ProjectRow = (String, String, Option<String>, String, String);

const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at";

fn from_row((id, name, description, created_at, updated_at): ProjectRow) -> ProjectRecord {
    ProjectRecord {
        id,
        name,
        description,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    }
}

impl ProjectStore for AnyStore {
    async fn create_project(&self, project: ProjectRecord) -> Result<(), sqlx::Error> {
        let created_at = project.created_at.to_rfc3339();
        let updated_at = project.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO projects (id, name, description, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_project(&self, id: &str) -> Result<Option<ProjectRecord>, sqlx::Error> {
        let row: Option<ProjectRow> =
            sqlx::query_as(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(from_row))
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>, sqlx::Error> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn update_project(
        &self,
        id: &str,
        patch: ProjectPatch,
    ) -> Result<Option<ProjectRecord>, sqlx::Error> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "UPDATE projects SET \
                 name = COALESCE($1, name), \
                 description = COALESCE($2, description), \
                 updated_at = $3 \
             WHERE id = $4 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(patch.name)
        .bind(patch.description)
        .bind(&updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn delete_project(&self, id: &str) -> Result<Option<ProjectRecord>, sqlx::Error> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "DELETE FROM projects WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }
}
