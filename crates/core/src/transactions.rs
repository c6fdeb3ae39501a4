//! Finance transaction domain models and repository contract.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::sync::SyncStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: Option<String>,
    pub account_id: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: String,
    pub note: Option<String>,
    /// Calendar day the transaction occurred, "YYYY-MM-DD".
    pub occurred_on: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub account_id: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub category: String,
    pub note: Option<String>,
    pub occurred_on: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub account_id: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub note: Option<Option<String>>,
    pub occurred_on: Option<String>,
}

#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Transactions visible to business logic, most recent occurrence first;
    /// soft-deleted rows filtered out.
    fn get_all_transactions(&self) -> Result<Vec<Transaction>>;

    /// Fetch by id; soft-deleted transactions are returned.
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction>;

    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction>;
    async fn update_transaction(
        &self,
        transaction_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction>;
    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction>;
}
