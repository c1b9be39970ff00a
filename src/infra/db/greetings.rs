use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{GreetingStore, RepoError};
use crate::domain::greeting::Greeting;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct GreetingRow {
    id: Uuid,
    message: String,
}

impl TryFrom<GreetingRow> for Greeting {
    type Error = RepoError;

    fn try_from(row: GreetingRow) -> Result<Self, Self::Error> {
        Greeting::new(row.id, row.message).map_err(|err| RepoError::integrity(err.to_string()))
    }
}

#[async_trait]
impl GreetingStore for PostgresRepositories {
    async fn save(&self, greeting: &Greeting) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO greetings (id, message)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET message = EXCLUDED.message
            "#,
        )
        .bind(greeting.id)
        .bind(&greeting.message)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Greeting>, RepoError> {
        let row = sqlx::query_as::<_, GreetingRow>(
            r#"
            SELECT id, message
            FROM greetings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(Greeting::try_from).transpose()
    }
}
