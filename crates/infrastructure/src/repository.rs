use std::time::Duration;

use application::repository::{MessageRepository, ParticipantRepository};
use async_trait::async_trait;
use domain::{
    Message, MessageId, MessageKind, Participant, ParticipantName, RepositoryError, Timestamp,
    VisibilityFilter,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL 唯一约束冲突
const UNIQUE_VIOLATION: &str = "23505";

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    let unique_violation = err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION);
    if unique_violation {
        RepositoryError::Conflict
    } else {
        RepositoryError::storage(err.to_string())
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct ParticipantRecord {
    name: String,
    last_status: Timestamp,
}

impl From<ParticipantRecord> for Participant {
    fn from(value: ParticipantRecord) -> Self {
        Participant {
            name: ParticipantName::new(value.name),
            last_status: value.last_status,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    sender: String,
    recipient: String,
    body: String,
    kind: String,
    sent_time: String,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let kind = value
            .kind
            .parse::<MessageKind>()
            .map_err(|err| invalid_data(err.to_string()))?;

        Ok(Message {
            id: MessageId::from(value.id),
            from: ParticipantName::new(value.sender),
            to: value.recipient,
            text: value.body,
            kind,
            time: value.sent_time,
        })
    }
}

#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    async fn insert_if_absent(
        &self,
        participant: Participant,
    ) -> Result<Participant, RepositoryError> {
        // 依赖主键约束完成原子的"不存在才插入"
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"
            INSERT INTO participants (name, last_status)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING name, last_status
            "#,
        )
        .bind(participant.name.as_str())
        .bind(participant.last_status)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record
            .map(Participant::from)
            .ok_or(RepositoryError::Conflict)
    }

    async fn find_by_name(
        &self,
        name: &ParticipantName,
    ) -> Result<Option<Participant>, RepositoryError> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT name, last_status FROM participants WHERE name = $1"#,
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(record.map(Participant::from))
    }

    async fn list(&self) -> Result<Vec<Participant>, RepositoryError> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT name, last_status FROM participants ORDER BY name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Participant::from).collect())
    }

    async fn touch(&self, name: &ParticipantName, at: Timestamp) -> Result<bool, RepositoryError> {
        let result = sqlx::query(r#"UPDATE participants SET last_status = $2 WHERE name = $1"#)
            .bind(name.as_str())
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_stale(&self, cutoff: Timestamp) -> Result<Vec<Participant>, RepositoryError> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            r#"SELECT name, last_status FROM participants WHERE last_status <= $1 ORDER BY name"#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(records.into_iter().map(Participant::from).collect())
    }

    async fn delete_stale(
        &self,
        names: &[ParticipantName],
        cutoff: Timestamp,
    ) -> Result<Vec<ParticipantName>, RepositoryError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let names: Vec<String> = names.iter().map(|name| name.as_str().to_owned()).collect();

        let removed = sqlx::query_scalar::<_, String>(
            r#"DELETE FROM participants WHERE name = ANY($1) AND last_status <= $2 RETURNING name"#,
        )
        .bind(names)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(removed.into_iter().map(ParticipantName::new).collect())
    }

    async fn remove(&self, name: &ParticipantName) -> Result<bool, RepositoryError> {
        let result = sqlx::query(r#"DELETE FROM participants WHERE name = $1"#)
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_MESSAGE: &str = r#"
    INSERT INTO messages (id, sender, recipient, body, kind, sent_time)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: Message) -> Result<Message, RepositoryError> {
        sqlx::query(INSERT_MESSAGE)
            .bind(Uuid::from(message.id))
            .bind(message.from.as_str())
            .bind(&message.to)
            .bind(&message.text)
            .bind(message.kind.as_str())
            .bind(&message.time)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(message)
    }

    async fn insert_many(&self, messages: Vec<Message>) -> Result<usize, RepositoryError> {
        // 整批在同一事务内写入，要么全部成功要么全部失败
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        for message in &messages {
            sqlx::query(INSERT_MESSAGE)
                .bind(Uuid::from(message.id))
                .bind(message.from.as_str())
                .bind(&message.to)
                .bind(&message.text)
                .bind(message.kind.as_str())
                .bind(&message.time)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_err)?;
        }
        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(messages.len())
    }

    async fn find_by_id(&self, id: MessageId) -> Result<Option<Message>, RepositoryError> {
        let record = sqlx::query_as::<_, MessageRecord>(
            r#"SELECT id, sender, recipient, body, kind, sent_time FROM messages WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Message::try_from).transpose()
    }

    async fn list_visible(
        &self,
        filter: &VisibilityFilter,
    ) -> Result<Vec<Message>, RepositoryError> {
        // 与 VisibilityFilter::matches 保持一致
        let records = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender, recipient, body, kind, sent_time
            FROM messages
            WHERE recipient = $1
               OR recipient = $2
               OR sender = $2
               OR kind = 'message'
            ORDER BY seq
            "#,
        )
        .bind(&filter.broadcast_target)
        .bind(&filter.requester)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Message::try_from).collect()
    }

    async fn update(&self, message: Message) -> Result<Message, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE messages SET recipient = $2, body = $3, kind = $4 WHERE id = $1"#,
        )
        .bind(Uuid::from(message.id))
        .bind(&message.to)
        .bind(&message.text)
        .bind(message.kind.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(message)
    }

    async fn delete(&self, id: MessageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(r#"DELETE FROM messages WHERE id = $1"#)
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(result.rows_affected() > 0)
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}
