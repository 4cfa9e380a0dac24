//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CatalogStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lecture_catalog_core::domain::{FileKind, Grade, Lecture, Role, Topic, User};
use lecture_catalog_core::ports::{CatalogStore, PortError, PortResult};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

const FOREIGN_KEY_VIOLATION: &str = "23503";
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `CatalogStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Maps constraint violations onto the port's vocabulary.
fn write_error(e: sqlx::Error, subject: &str) -> PortError {
    let code = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());
    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => PortError::Conflict(subject.to_string()),
        Some(FOREIGN_KEY_VIOLATION) => PortError::NotFound(subject.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

async fn completed_ids<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid) -> PortResult<HashSet<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT lecture_id FROM lecture_completions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(executor)
            .await
            .map_err(unexpected)?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct TopicRecord {
    id: String,
    grade: i16,
    month: i16,
    name: String,
    icon: String,
}
impl TopicRecord {
    fn to_domain(self) -> PortResult<Topic> {
        let grade = u8::try_from(self.grade)
            .map_err(|e| e.to_string())
            .and_then(Grade::try_from)
            .map_err(|e| PortError::Unexpected(format!("Topic {}: {}", self.id, e)))?;
        let month = u8::try_from(self.month)
            .map_err(|e| PortError::Unexpected(format!("Topic {}: month {}: {}", self.id, self.month, e)))?;
        let topic = Topic {
            grade,
            month,
            id: self.id,
            name: self.name,
            icon: self.icon,
        };
        if !topic.is_well_formed() {
            return Err(PortError::Unexpected(format!("Topic {} is malformed", topic.id)));
        }
        Ok(topic)
    }
}

#[derive(FromRow)]
struct LectureRecord {
    id: String,
    topic_id: String,
    title: String,
    description: String,
    file_url: String,
    file_name: String,
    file_type: String,
    created_at: DateTime<Utc>,
}
impl LectureRecord {
    fn to_domain(self) -> PortResult<Lecture> {
        let file_type = FileKind::parse(&self.file_type).ok_or_else(|| {
            PortError::Unexpected(format!("Lecture {} has unknown file type {}", self.id, self.file_type))
        })?;
        Ok(Lecture {
            id: self.id,
            topic_id: self.topic_id,
            title: self.title,
            description: self.description,
            file_url: self.file_url,
            file_name: self.file_name,
            file_type,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    role: String,
}

//=========================================================================================
// `CatalogStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogStore for DbAdapter {
    async fn create_lecture(&self, lecture: Lecture) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO lectures (id, topic_id, title, description, file_url, file_name, file_type, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&lecture.id)
        .bind(&lecture.topic_id)
        .bind(&lecture.title)
        .bind(&lecture.description)
        .bind(&lecture.file_url)
        .bind(&lecture.file_name)
        .bind(lecture.file_type.as_str())
        .bind(lecture.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &format!("Lecture {}", lecture.id)))?;
        Ok(())
    }

    async fn delete_lecture(&self, lecture_id: &str) -> PortResult<()> {
        // Completion rows go with the lecture through ON DELETE CASCADE.
        sqlx::query("DELETE FROM lectures WHERE id = $1")
            .bind(lecture_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn list_lectures(&self) -> PortResult<Vec<Lecture>> {
        let records = sqlx::query_as::<_, LectureRecord>(
            "SELECT id, topic_id, title, description, file_url, file_name, file_type, created_at
             FROM lectures ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_topics(&self) -> PortResult<Vec<Topic>> {
        let records = sqlx::query_as::<_, TopicRecord>(
            "SELECT id, grade, month, name, icon FROM topics ORDER BY grade ASC, month ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT id, role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        Ok(User {
            id: record.id,
            role: Role::parse(&record.role),
            completed_lecture_ids: completed_ids(&self.pool, user_id).await?,
        })
    }

    async fn set_completion(&self, user_id: Uuid, lecture_id: &str, completed: bool) -> PortResult<()> {
        let query = if completed {
            "INSERT INTO lecture_completions (user_id, lecture_id) VALUES ($1, $2)
             ON CONFLICT (user_id, lecture_id) DO NOTHING"
        } else {
            "DELETE FROM lecture_completions WHERE user_id = $1 AND lecture_id = $2"
        };
        sqlx::query(query)
            .bind(user_id)
            .bind(lecture_id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error(e, &format!("Lecture {}", lecture_id)))?;
        Ok(())
    }

    async fn toggle_completion(&self, user_id: Uuid, lecture_id: &str) -> PortResult<HashSet<String>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Holding the user row until commit serialises toggles of the same user.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        let removed = sqlx::query("DELETE FROM lecture_completions WHERE user_id = $1 AND lecture_id = $2")
            .bind(user_id)
            .bind(lecture_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?
            .rows_affected();
        if removed == 0 {
            sqlx::query("INSERT INTO lecture_completions (user_id, lecture_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(lecture_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| write_error(e, &format!("Lecture {}", lecture_id)))?;
        }

        let completed = completed_ids(&mut *tx, user_id).await?;
        tx.commit().await.map_err(unexpected)?;
        Ok(completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    /// A migrated store on `DATABASE_URL`, or `None` when no database is configured.
    /// Every test uses fresh ids so runs can share one database.
    async fn test_store() -> Option<DbAdapter> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL is unset; skipping PostgreSQL test");
            return None;
        };
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .expect("DATABASE_URL should accept connections");
        let store = DbAdapter::new(pool);
        store.run_migrations().await.expect("migrations should apply");
        Some(store)
    }

    async fn insert_student(store: &DbAdapter) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id, role) VALUES ($1, 'STUDENT')")
            .bind(id)
            .execute(&store.pool)
            .await
            .unwrap();
        id
    }

    fn lecture(id: &str) -> Lecture {
        Lecture {
            id: id.to_string(),
            topic_id: "t1".to_string(),
            title: format!("Lecture {}", id),
            description: String::new(),
            file_url: "data:application/pdf;base64,JVBERg==".to_string(),
            file_name: "l.pdf".to_string(),
            file_type: FileKind::Pdf,
            created_at: Utc::now(),
        }
    }

    fn topic_record(month: i16) -> TopicRecord {
        TopicRecord {
            id: "t1".to_string(),
            grade: 10,
            month,
            name: "Algebra".to_string(),
            icon: "sigma".to_string(),
        }
    }

    #[test]
    fn test_topic_rows_out_of_range_are_rejected() {
        assert_eq!(topic_record(3).to_domain().unwrap().month, 3);
        assert!(matches!(topic_record(259).to_domain(), Err(PortError::Unexpected(_))));
        assert!(matches!(topic_record(-1).to_domain(), Err(PortError::Unexpected(_))));
        assert!(matches!(topic_record(13).to_domain(), Err(PortError::Unexpected(_))));
    }

    #[tokio::test]
    async fn test_lectures_list_in_insertion_order() {
        let Some(store) = test_store().await else { return };
        let run = Uuid::new_v4();
        let ids: Vec<String> = ["c", "a", "b"].iter().map(|s| format!("{}-{}", run, s)).collect();
        for id in &ids {
            store.create_lecture(lecture(id)).await.unwrap();
        }

        let listed: Vec<String> = store
            .list_lectures()
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .filter(|id| id.starts_with(&run.to_string()))
            .collect();
        assert_eq!(listed, ids);

        let duplicate = store.create_lecture(lecture(&ids[0])).await;
        assert!(matches!(duplicate, Err(PortError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_missing_ids_are_fine() {
        let Some(store) = test_store().await else { return };
        let user_id = insert_student(&store).await;
        let lecture_id = Uuid::new_v4().to_string();
        store.create_lecture(lecture(&lecture_id)).await.unwrap();
        store.set_completion(user_id, &lecture_id, true).await.unwrap();

        store.delete_lecture(&lecture_id).await.unwrap();
        store.delete_lecture(&lecture_id).await.unwrap();
        store.delete_lecture(&Uuid::new_v4().to_string()).await.unwrap();

        assert!(store.get_user(user_id).await.unwrap().completed_lecture_ids.is_empty());
        assert!(store.list_lectures().await.unwrap().iter().all(|l| l.id != lecture_id));
    }

    #[tokio::test]
    async fn test_set_completion_is_idempotent() {
        let Some(store) = test_store().await else { return };
        let user_id = insert_student(&store).await;
        let lecture_id = Uuid::new_v4().to_string();
        store.create_lecture(lecture(&lecture_id)).await.unwrap();

        store.set_completion(user_id, &lecture_id, true).await.unwrap();
        store.set_completion(user_id, &lecture_id, true).await.unwrap();
        assert_eq!(store.get_user(user_id).await.unwrap().completed_lecture_ids.len(), 1);

        store.set_completion(user_id, &lecture_id, false).await.unwrap();
        store.set_completion(user_id, &lecture_id, false).await.unwrap();
        assert!(store.get_user(user_id).await.unwrap().completed_lecture_ids.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_cancel_out() {
        let Some(store) = test_store().await else { return };
        let user_id = insert_student(&store).await;
        let lecture_id = Uuid::new_v4().to_string();
        store.create_lecture(lecture(&lecture_id)).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                let lecture_id = lecture_id.clone();
                tokio::spawn(async move { store.toggle_completion(user_id, &lecture_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(store.get_user(user_id).await.unwrap().completed_lecture_ids.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_lecture_or_user_is_not_found() {
        let Some(store) = test_store().await else { return };
        let user_id = insert_student(&store).await;

        let result = store.set_completion(user_id, "ghost", true).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
        let result = store.toggle_completion(user_id, "ghost").await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
        let result = store.toggle_completion(Uuid::new_v4(), "ghost").await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
        assert!(store.get_user(user_id).await.unwrap().completed_lecture_ids.is_empty());
    }
}
