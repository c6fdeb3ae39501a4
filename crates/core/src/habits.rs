//! Habit domain models, repository contract, and service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::reminders::{NoOpReminderScheduler, ReminderKey, ReminderRequest, ReminderScheduler};
use crate::sync::SyncStatus;

/// A tracked habit with streak bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub target_days: i32,
    pub streak_current: i32,
    pub streak_best: i32,
    /// Local wall-clock reminder time, "HH:MM".
    pub reminder_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: SyncStatus,
}

/// Fields supplied when creating a habit. Lifecycle metadata is stamped by
/// the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub target_days: i32,
    pub reminder_time: Option<String>,
}

/// Partial update; `None` fields are left untouched. `reminder_time` is
/// doubly optional so a reminder can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitUpdate {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub target_days: Option<i32>,
    pub streak_current: Option<i32>,
    pub streak_best: Option<i32>,
    pub reminder_time: Option<Option<String>>,
}

#[async_trait]
pub trait HabitRepositoryTrait: Send + Sync {
    /// Habits visible to business logic: soft-deleted rows filtered out,
    /// newest first.
    fn get_all_habits(&self) -> Result<Vec<Habit>>;

    /// Fetch by id; soft-deleted habits are returned (undo path).
    fn get_habit(&self, habit_id: &str) -> Result<Habit>;

    async fn create_habit(&self, new_habit: NewHabit) -> Result<Habit>;
    async fn update_habit(&self, habit_id: &str, update: HabitUpdate) -> Result<Habit>;
    async fn delete_habit(&self, habit_id: &str) -> Result<Habit>;
}

/// Habit lifecycle service; pairs every mutation with exactly one reminder
/// scheduling side effect.
pub struct HabitService {
    repository: Arc<dyn HabitRepositoryTrait>,
    scheduler: Arc<dyn ReminderScheduler>,
}

impl HabitService {
    pub fn new(repository: Arc<dyn HabitRepositoryTrait>) -> Self {
        Self {
            repository,
            scheduler: Arc::new(NoOpReminderScheduler),
        }
    }

    /// Sets the reminder sink used for scheduling side effects.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn get_all_habits(&self) -> Result<Vec<Habit>> {
        self.repository.get_all_habits()
    }

    pub fn get_habit(&self, habit_id: &str) -> Result<Habit> {
        self.repository.get_habit(habit_id)
    }

    pub async fn create_habit(&self, new_habit: NewHabit) -> Result<Habit> {
        let habit = self.repository.create_habit(new_habit).await?;
        if let Some(time) = habit.reminder_time.clone() {
            self.scheduler.schedule(ReminderRequest {
                key: reminder_key(&habit.id),
                time,
            });
        }
        Ok(habit)
    }

    pub async fn update_habit(&self, habit_id: &str, update: HabitUpdate) -> Result<Habit> {
        let reminder_change = update.reminder_time.clone();
        let habit = self.repository.update_habit(habit_id, update).await?;
        match reminder_change {
            Some(Some(time)) => self.scheduler.schedule(ReminderRequest {
                key: reminder_key(&habit.id),
                time,
            }),
            Some(None) => {
                debug!("Cancelling reminder for habit {}", habit.id);
                self.scheduler.cancel(&reminder_key(&habit.id));
            }
            None => {}
        }
        Ok(habit)
    }

    pub async fn delete_habit(&self, habit_id: &str) -> Result<Habit> {
        let habit = self.repository.delete_habit(habit_id).await?;
        if habit.reminder_time.is_some() {
            self.scheduler.cancel(&reminder_key(&habit.id));
        }
        Ok(habit)
    }
}

fn reminder_key(habit_id: &str) -> ReminderKey {
    ReminderKey {
        entity_id: habit_id.to_string(),
        target_date: Utc::now().date_naive(),
    }
}
