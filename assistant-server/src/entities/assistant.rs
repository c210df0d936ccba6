use crate::entities::{parse_timestamp, AnyStore, AssistantPatch, AssistantRecord, Tool};
use serde_json::Value;
use std::future::Future;
use tracing::warn;

pub trait AssistantStore: Send + Sync + 'static {
    fn create_assistant(&self, assistant: AssistantRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_assistant(&self, id: &str) -> impl Future<Output = Result<Option<AssistantRecord>, sqlx::Error>> + Send;
    fn list_assistants_by_project(
        &self,
        project_id: &str,
    ) -> impl Future<Output = Result<Vec<AssistantRecord>, sqlx::Error>> + Send;
    fn update_assistant(
        &self,
        id: &str,
        patch: AssistantPatch,
    ) -> impl Future<Output = Result<Option<AssistantRecord>, sqlx::Error>> + Send;
    fn delete_assistant(&self, id: &str) -> impl Future<Output = Result<Option<AssistantRecord>, sqlx::Error>> + Send;
    /// Removes every assistant of a project and returns the deleted rows.
    fn delete_assistants_by_project(
        &self,
        project_id: &str,
    ) -> impl Future<Output = Result<Vec<AssistantRecord>, sqlx::Error>> + Send;
}

type AssistantRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    String,
    String,
    String,
);

const ASSISTANT_COLUMNS: &str = "id, external_id, project_id, name, description, instructions, \
                                 model, tools, metadata, created_at, updated_at";

fn from_row(row: AssistantRow) -> AssistantRecord {
    let (
        id,
        external_id,
        project_id,
        name,
        description,
        instructions,
        model,
        tools,
        metadata,
        created_at,
        updated_at,
    ) = row;
    let tools = serde_json::from_str::<Vec<Tool>>(&tools).unwrap_or_else(|e| {
        warn!(assistant_id = %id, error = %e, "invalid stored tools; treating as empty");
        Vec::new()
    });
    let metadata = serde_json::from_str::<Value>(&metadata).unwrap_or_else(|e| {
        warn!(assistant_id = %id, error = %e, "invalid stored metadata; treating as empty");
        Value::Object(Default::default())
    });
    AssistantRecord {
        id,
        external_id,
        project_id,
        name,
        description,
        instructions,
        model,
        tools,
        metadata,
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

impl AssistantStore for AnyStore {
    async fn create_assistant(&self, assistant: AssistantRecord) -> Result<(), sqlx::Error> {
        let tools = encode_json(&assistant.tools)?;
        let metadata = encode_json(&assistant.metadata)?;
        let created_at = assistant.created_at.to_rfc3339();
        let updated_at = assistant.updated_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO assistants (id, external_id, project_id, name, description, instructions, \
                                     model, tools, metadata, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(&assistant.id)
        .bind(&assistant.external_id)
        .bind(&assistant.project_id)
        .bind(&assistant.name)
        .bind(&assistant.description)
        .bind(&assistant.instructions)
        .bind(&assistant.model)
        .bind(&tools)
        .bind(&metadata)
        .bind(&created_at)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_assistant(&self, id: &str) -> Result<Option<AssistantRecord>, sqlx::Error> {
        let row: Option<AssistantRow> =
            sqlx::query_as(&format!("SELECT {ASSISTANT_COLUMNS} FROM assistants WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(from_row))
    }

    async fn list_assistants_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<AssistantRecord>, sqlx::Error> {
        let rows: Vec<AssistantRow> = sqlx::query_as(&format!(
            "SELECT {ASSISTANT_COLUMNS} FROM assistants \
             WHERE project_id = $1 ORDER BY created_at, id"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn update_assistant(
        &self,
        id: &str,
        patch: AssistantPatch,
    ) -> Result<Option<AssistantRecord>, sqlx::Error> {
        let tools = patch.tools.as_ref().map(encode_json).transpose()?;
        let metadata = patch.metadata.as_ref().map(encode_json).transpose()?;
        let updated_at = chrono::Utc::now().to_rfc3339();
        let row: Option<AssistantRow> = sqlx::query_as(&format!(
            "UPDATE assistants SET \
                 name = COALESCE($1, name), \
                 description = COALESCE($2, description), \
                 instructions = COALESCE($3, instructions), \
                 model = COALESCE($4, model), \
                 tools = COALESCE($5, tools), \
                 metadata = COALESCE($6, metadata), \
                 updated_at = $7 \
             WHERE id = $8 \
             RETURNING {ASSISTANT_COLUMNS}"
        ))
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.instructions)
        .bind(patch.model)
        .bind(tools)
        .bind(metadata)
        .bind(&updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn delete_assistant(&self, id: &str) -> Result<Option<AssistantRecord>, sqlx::Error> {
        let row: Option<AssistantRow> = sqlx::query_as(&format!(
            "DELETE FROM assistants WHERE id = $1 RETURNING {ASSISTANT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn delete_assistants_by_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<AssistantRecord>, sqlx::Error> {
        let rows: Vec<AssistantRow> = sqlx::query_as(&format!(
            "DELETE FROM assistants WHERE project_id = $1 RETURNING {ASSISTANT_COLUMNS}"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(from_row).collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::{ProjectRecord, ProjectStore};
    use crate::test_support::memory_store;
    use chrono::Utc;
    use serde_json::json;

    async fn seeded_project(store: &AnyStore) -> String {
        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();
        store
            .create_project(ProjectRecord {
                id: id.clone(),
                name: "owner".into(),
                description: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        id
    }

    fn assistant(project_id: &str, name: &str) -> AssistantRecord {
        let now = Utc::now();
        AssistantRecord {
            id: uuid::Uuid::new_v4().to_string(),
            external_id: format!("asst_{name}"),
            project_id: project_id.to_owned(),
            name: name.to_owned(),
            description: None,
            instructions: Some("You are a math tutor.".into()),
            model: "gpt-4".into(),
            tools: vec![Tool {
                kind: "code_interpreter".into(),
            }],
            metadata: json!({ "tier": "free" }),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn json_columns_round_trip() {
        let store = memory_store().await;
        let project_id = seeded_project(&store).await;
        let a = assistant(&project_id, "tutor");
        store.create_assistant(a.clone()).await.unwrap();

        let fetched = store.get_assistant(&a.id).await.unwrap().unwrap();
        assert_eq!(fetched, a);
    }

    #[tokio::test]
    async fn unknown_project_violates_foreign_key() {
        let store = memory_store().await;
        let err = store
            .create_assistant(assistant("no-such-project", "orphan"))
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db) => assert!(db.is_foreign_key_violation()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn partial_update_keeps_untouched_columns() {
        let store = memory_store().await;
        let project_id = seeded_project(&store).await;
        let a = assistant(&project_id, "tutor");
        store.create_assistant(a.clone()).await.unwrap();

        let patch = AssistantPatch {
            model: Some("gpt-3.5-turbo".into()),
            tools: Some(vec![]),
            ..Default::default()
        };
        let updated = store.update_assistant(&a.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.model, "gpt-3.5-turbo");
        assert!(updated.tools.is_empty());
        assert_eq!(updated.name, a.name);
        assert_eq!(updated.metadata, a.metadata);
        assert_eq!(updated.instructions, a.instructions);
    }

    #[tokio::test]
    async fn project_scoped_list_and_bulk_delete() {
        let store = memory_store().await;
        let p1 = seeded_project(&store).await;
        let p2 = seeded_project(&store).await;
        store.create_assistant(assistant(&p1, "one")).await.unwrap();
        store.create_assistant(assistant(&p1, "two")).await.unwrap();
        let other = assistant(&p2, "three");
        store.create_assistant(other.clone()).await.unwrap();

        assert_eq!(store.list_assistants_by_project(&p1).await.unwrap().len(), 2);

        let removed = store.delete_assistants_by_project(&p1).await.unwrap();
        assert_eq!(removed.len(), 2);
        assert!(store.list_assistants_by_project(&p1).await.unwrap().is_empty());
        assert!(store.get_assistant(&other.id).await.unwrap().is_some());

        assert!(store.delete_assistant(&other.id).await.unwrap().is_some());
        assert!(store.delete_assistant(&other.id).await.unwrap().is_none());
    }
}
