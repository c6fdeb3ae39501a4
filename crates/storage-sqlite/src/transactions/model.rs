//! Database model for finance transactions.
//!
//! Amounts are stored as canonical decimal strings; SQLite has no exact
//! numeric column type.

use std::str::FromStr;

use diesel::prelude::*;
use rust_decimal::Decimal;

use daystack_core::errors::{DatabaseError, Error};
use daystack_core::transactions::Transaction;
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
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub user_id: Option<String>,
    pub account_id: String,
    pub amount: String,
    pub kind: String,
    pub category: String,
    pub note: Option<String>,
    pub occurred_on: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: String,
}

pub fn to_transaction(row: TransactionDB) -> Result<Transaction> {
    let amount = Decimal::from_str(&row.amount).map_err(|err| {
        Error::Database(DatabaseError::Internal(format!(
            "Transaction '{}' has a non-decimal amount '{}': {}",
            row.id, row.amount, err
        )))
    })?;
    Ok(Transaction {
        id: row.id,
        user_id: row.user_id,
        account_id: row.account_id,
        amount,
        kind: enum_from_db(&row.kind)?,
        category: row.category,
        note: row.note,
        occurred_on: row.occurred_on,
        created_at: row.created_at,
        updated_at: row.updated_at,
        deleted_at: row.deleted_at,
        sync_status: enum_from_db(&row.sync_status)?,
    })
}

pub fn transaction_row(transaction: &Transaction) -> Result<TransactionDB> {
    Ok(TransactionDB {
        id: transaction.id.clone(),
        user_id: transaction.user_id.clone(),
        account_id: transaction.account_id.clone(),
        amount: transaction.amount.to_string(),
        kind: enum_to_db(&transaction.kind)?,
        category: transaction.category.clone(),
        note: transaction.note.clone(),
        occurred_on: transaction.occurred_on.clone(),
        created_at: transaction.created_at.clone(),
        updated_at: transaction.updated_at.clone(),
        deleted_at: transaction.deleted_at.clone(),
        sync_status: enum_to_db(&transaction.sync_status)?,
    })
}
