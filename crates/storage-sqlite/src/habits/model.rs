//! Database model for habits.

use diesel::prelude::*;

use daystack_core::habits::Habit;
use daystack_core::Result;

use crate::codec::{enum_from_db, enum_to_db};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::habits)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct HabitDB {
    pub id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub target_days: i32,
    pub streak_current: i32,
    pub streak_best: i32,
    pub reminder_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: String,
}

pub fn to_habit(row: HabitDB) -> Result<Habit> {
    Ok(Habit {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        icon: row.icon,
        color: row.color,
        target_days: row.target_days,
        streak_current: row.streak_current,
        streak_best: row.streak_best,
        reminder_time: row.reminder_time,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        sync_status: enum_from_db(&row.sync_status)?,
    })
}

pub fn habit_row(habit: &Habit) -> Result<HabitDB> {
    Ok(HabitDB {
        id: habit.id.clone(),
        user_id: habit.user_id.clone(),
        name: habit.name.clone(),
        icon: habit.icon.clone(),
        color: habit.color.clone(),
        target_days: habit.target_days,
        streak_current: habit.streak_current,
        streak_best: habit.streak_best,
        reminder_time: habit.reminder_time.clone(),
        created_at: habit.created_at.clone(),
        updated_at: habit.updated_at.clone(),
        deleted_at: habit.deleted_at.clone(),
        sync_status: enum_to_db(&habit.sync_status)?,
    })
}
