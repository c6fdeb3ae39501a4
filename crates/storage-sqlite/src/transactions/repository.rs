//! SQLite repository for finance transactions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use uuid::Uuid;

use daystack_core::errors::{Error, Result};
use daystack_core::sync::{SyncCollection, SyncOperation, SyncStatus};
use daystack_core::transactions::{
    NewTransaction, Transaction, TransactionRepositoryTrait, TransactionUpdate,
};

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::transactions;
use crate::sync::{write_outbox_event, OutboxWriteRequest};

use super::model::{to_transaction, transaction_row, TransactionDB};

pub struct TransactionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        TransactionRepository { pool, writer }
    }
}

fn upsert_transaction(conn: &mut SqliteConnection, transaction: &Transaction) -> Result<()> {
    let row = transaction_row(transaction)?;
    diesel::insert_into(transactions::table)
        .values(&row)
        .on_conflict(transactions::id)
        .do_update()
        .set(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    Ok(())
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    fn get_all_transactions(&self) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = transactions::table
            .filter(transactions::deleted_at.is_null())
            .order(transactions::occurred_on.desc())
            .load::<TransactionDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(to_transaction).collect()
    }

    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut conn = get_connection(&self.pool)?;
        let row = transactions::table
            .find(transaction_id)
            .first::<TransactionDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(to_transaction)
            .transpose()?
            .ok_or_else(|| Error::not_found("transaction", transaction_id))
    }

    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        self.writer
            .exec(move |conn| {
                let now = Utc::now().to_rfc3339();
                let transaction = Transaction {
                    id: Uuid::new_v4().to_string(),
                    user_id: None,
                    account_id: new_transaction.account_id,
                    amount: new_transaction.amount,
                    kind: new_transaction.kind,
                    category: new_transaction.category,
                    note: new_transaction.note,
                    occurred_on: new_transaction.occurred_on,
                    created_at: now.clone(),
                    updated_at: now,
                    deleted_at: None,
                    sync_status: SyncStatus::Dirty,
                };

                diesel::insert_into(transactions::table)
                    .values(&transaction_row(&transaction)?)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Transaction,
                        transaction.id.clone(),
                        SyncOperation::Create,
                        serde_json::to_value(&transaction)?,
                    ),
                )?;
                Ok(transaction)
            })
            .await
    }

    async fn update_transaction(
        &self,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = transactions::table
                    .find(&transaction_id)
                    .first::<TransactionDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found("transaction", &transaction_id))?;
                let mut transaction = to_transaction(row)?;

                if let Some(account_id) = update.account_id {
                    transaction.account_id = account_id;
                }
                if let Some(amount) = update.amount {
                    transaction.amount = amount;
                }
                if let Some(kind) = update.kind {
                    transaction.kind = kind;
                }
                if let Some(category) = update.category {
                    transaction.category = category;
                }
                if let Some(note) = update.note {
                    transaction.note = note;
                }
                if let Some(occurred_on) = update.occurred_on {
                    transaction.occurred_on = occurred_on;
                }
                transaction.updated_at = Utc::now().to_rfc3339();
                transaction.sync_status = SyncStatus::Dirty;

                upsert_transaction(conn, &transaction)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Transaction,
                        transaction.id.clone(),
                        SyncOperation::Update,
                        serde_json::to_value(&transaction)?,
                    ),
                )?;
                Ok(transaction)
            })
            .await
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let transaction_id = transaction_id.to_string();
        self.writer
            .exec(move |conn| {
                let row = transactions::table
                    .find(&transaction_id)
                    .first::<TransactionDB>(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found("transaction", &transaction_id))?;
                let mut transaction = to_transaction(row)?;

                let now = Utc::now().to_rfc3339();
                transaction.deleted_at = Some(now.clone());
                transaction.updated_at = now;
                transaction.sync_status = SyncStatus::Dirty;

                upsert_transaction(conn, &transaction)?;
                write_outbox_event(
                    conn,
                    OutboxWriteRequest::new(
                        SyncCollection::Transaction,
                        transaction.id.clone(),
                        SyncOperation::Delete,
                        serde_json::to_value(&transaction)?,
                    ),
                )?;
                Ok(transaction)
            })
            .await
    }
}
