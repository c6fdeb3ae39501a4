//! SQLite repository for habits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

use daystack_core::errors::{Error, Result};
use daystack_core::habits::{Habit, HabitRepositoryTrait, HabitUpdate, NewHabit};
use daystack_core::sync::{SyncCollection, SyncOperation, SyncStatus};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::habits;
use crate::sync::{write_outbox_event, OutboxWriteRequest};

use super::model::{habit_row, to_habit, HabitDB};

pub struct HabitRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl HabitRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        HabitRepository { pool, writer }
    }
}

fn upsert_habit(conn: &mut SqliteConnection, habit: &Habit) -> Result<()> {
    let row = habit_row(habit)?;
    diesel::insert_into(habits::table)
        .values(&row)
        .on_conflict(habits::id)
        .do_update()
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl HabitRepositoryTrait for HabitRepository {
    fn get_all_habits(&self) -> Result<Vec<Habit>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = habits::table
            .filter(habits::deleted_at.is_null())
            .order(habits::created_at.desc())
            .load::<HabitDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_habit).collect()
    }

    fn get_habit(&self, habit_id: &str) -> Result<Habit> {
        let mut conn = get_connection(&self.pool)?;
        let row = habits::table
            .find(habit_id)
            .first::<HabitDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(to_habit)
            .transpose()?
            .ok_or_else(|| Error::not_found("habit", habit_id))
    }

    async fn create_habit(&self, new_habit: NewHabit) -> Result<Habit> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let habit = Habit {
                    id: Uuid::new_v4().to_string(),
                    user_id: None,
                    name: new_habit.name,
                    icon: new_habit.icon,
                    color: new_habit.color,
                    target_days: new_habit.target_days,
                    streak_current: 0,
                    streak_best: 0,
                    reminder_time: new_habit.reminder_time,
                    created_at: now.clone(),
                    updated_at: now,
                    deleted_at: None,
                    sync_status: SyncStatus::Dirty,
                };

                // Strict insert: ids are generated here, so a key collision
                // is a bug and must fail rather than overwrite.
                diesel::insert_into(habits::table)
                    .values(&habit_row(&habit)?)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Habit,
                        habit.id.clone(),
                        SyncOperation::Create,
                        serde_json::to_value(&habit)?,
                    ),
                )?;
                Ok(habit)
            })
            .await
    }

    async fn update_habit(&self, habit_id: &str, update: HabitUpdate) -> Result<Habit> {
        let habit_id = habit_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = habits::table
                    .find(&habit_id)
                    .first::<HabitDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found("habit", &habit_id))?;
                let mut habit = to_habit(row)?;

                if let Some(name) = update.name {
                    habit.name = name;
                }
                if let Some(icon) = update.icon {
                    habit.icon = Some(icon);
                }
                if let Some(color) = update.color {
                    habit.color = Some(color);
                }
                if let Some(target_days) = update.target_days {
                    habit.target_days = target_days;
                }
                if let Some(streak_current) = update.streak_current {
                    habit.streak_current = streak_current;
                }
                if let Some(streak_best) = update.streak_best {
                    habit.streak_best = streak_best;
                }
                if let Some(reminder_time) = update.reminder_time {
                    habit.reminder_time = reminder_time;
                }
                habit.updated_at = Utc::now().to_rfc3339();
                habit.sync_status = SyncStatus::Dirty;

                upsert_habit(conn, &habit)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Habit,
                        habit.id.clone(),
                        SyncOperation::Update,
                        serde_json::to_value(&habit)?,
                    ),
                )?;
                Ok(habit)
            })
            .await
    }

    async fn delete_habit(&self, habit_id: &str) -> Result<Habit> {
        let habit_id = habit_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = habits::table
                    .find(&habit_id)
                    .first::<HabitDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found("habit", &habit_id))?;
                let mut habit = to_habit(row)?;

                let now = Utc::now().to_rfc3339();
                habit.deleted_at = Some(now.clone());
                habit.updated_at = now;
                habit.sync_status = SyncStatus::Dirty;

                upsert_habit(conn, &habit)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Habit,
                        habit.id.clone(),
                        SyncOperation::Delete,
                        serde_json::to_value(&habit)?,
                    ),
                )?;
                Ok(habit)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use crate::schema::sync_outbox;
    use crate::sync::model::OutboxEntryDB;

    fn setup_db() -> (Arc<DbPool>, WriteHandle) {
        let app_data = tempdir()
            .expect("tempdir")
            .keep()
            .to_string_lossy()
            .to_string();
        let db_path = init(&app_data).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());
        (pool, writer)
    }

    fn outbox_rows(pool: &Arc<DbPool>) -> Vec<OutboxEntryDB> {
        let mut conn = get_connection(pool).expect("conn");
        sync_outbox::table
            .order(sync_outbox::id.asc())
            .load::<OutboxEntryDB>(&mut conn)
            .expect("outbox rows")
    }

    fn new_habit(name: &str) -> NewHabit {
        NewHabit {
            name: name.to_string(),
            icon: Some("droplet".to_string()),
            color: Some("#4a90d9".to_string()),
            target_days: 7,
            reminder_time: None,
        }
    }

    #[tokio::test]
    async fn created_habit_is_listed_dirty_with_one_create_entry() {
        let (pool, writer) = setup_db();
        let repo = HabitRepository::new(pool.clone(), writer);

        let habit = repo.create_habit(new_habit("Minum air")).await.expect("create");
        assert_eq!(habit.streak_current, 0);
        assert_eq!(habit.sync_status, SyncStatus::Dirty);

        let listed = repo.get_all_habits().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Minum air");

        let entries = outbox_rows(&pool);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, "create");
        assert_eq!(entries[0].entity_id, habit.id);
        assert_eq!(entries[0].store_name, "habits");
    }

    #[tokio::test]
    async fn update_refreshes_timestamp_and_enqueues_full_snapshot() {
        let (pool, writer) = setup_db();
        let repo = HabitRepository::new(pool.clone(), writer);
        let habit = repo.create_habit(new_habit("Stretch")).await.expect("create");

        let updated = repo
            .update_habit(
                &habit.id,
                HabitUpdate {
                    name: Some("Morning stretch".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");

        assert_eq!(updated.name, "Morning stretch");
        assert_eq!(updated.sync_status, SyncStatus::Dirty);
        assert!(updated.updated_at > habit.updated_at);
        // Untouched fields survive the shallow merge.
        assert_eq!(updated.icon.as_deref(), Some("droplet"));

        let entries = outbox_rows(&pool);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].operation, "update");
        let snapshot: serde_json::Value =
            serde_json::from_str(&entries[1].payload).expect("payload json");
        assert_eq!(snapshot["name"], "Morning stretch");
        assert_eq!(snapshot["icon"], "droplet");
    }

    #[tokio::test]
    async fn soft_delete_hides_from_lists_but_keeps_row() {
        let (pool, writer) = setup_db();
        let repo = HabitRepository::new(pool.clone(), writer);
        let habit = repo.create_habit(new_habit("Read")).await.expect("create");

        let deleted = repo.delete_habit(&habit.id).await.expect("delete");
        assert!(deleted.deleted_at.is_some());

        assert!(repo.get_all_habits().expect("list").is_empty());
        let fetched = repo.get_habit(&habit.id).expect("get by id");
        assert!(fetched.deleted_at.is_some());

        let entries = outbox_rows(&pool);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].operation, "delete");
        let snapshot: serde_json::Value =
            serde_json::from_str(&entries[1].payload).expect("payload json");
        assert!(!snapshot["deletedAt"].is_null());
        assert_eq!(entries[1].status, "pending");
    }

    #[tokio::test]
    async fn update_of_missing_habit_reports_not_found() {
        let (_pool, writer) = setup_db();
        let repo = HabitRepository::new(_pool.clone(), writer);
        let err = repo
            .update_habit("no-such-id", HabitUpdate::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn failed_mutation_rolls_back_outbox_write() {
        let (pool, writer) = setup_db();
        let repo = HabitRepository::new(pool.clone(), writer.clone());
        let habit = repo.create_habit(new_habit("Unique")).await.expect("create");

        // Re-inserting the same primary key violates the strict-insert
        // contract; the whole transaction, outbox row included, rolls back.
        let habit_clone = habit.clone();
        let result = writer
            .exec(move |conn| {
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Habit,
                        habit_clone.id.clone(),
                        SyncOperation::Create,
                        serde_json::to_value(&habit_clone)?,
                    ),
                )?;
                diesel::insert_into(habits::table)
                    .values(&habit_row(&habit_clone)?)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await;
        assert!(result.is_err(), "duplicate insert should fail");
        assert_eq!(outbox_rows(&pool).len(), 1);
    }
}
