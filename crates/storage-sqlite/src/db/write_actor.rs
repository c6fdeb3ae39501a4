//! Single-writer actor serializing all mutations.
//!
//! SQLite allows one writer at a time; funneling every mutation through one
//! dedicated thread keeps repository calls short, independent
//! read-modify-write jobs with no cross-call locking. Each job runs inside an
//! immediate transaction, which is what makes the entity-row/outbox-row side
//! effect pair atomic.

use diesel::sqlite::SqliteConnection;
use diesel::Connection;
use log::{error, warn};
use tokio::sync::{mpsc, oneshot};

use daystack_core::errors::{DatabaseError, Error, Result};

use crate::db::DbPool;
use crate::errors::StorageError;

const JOB_QUEUE_DEPTH: usize = 256;

type Job = Box<dyn FnOnce(&mut SqliteConnection) + Send>;

/// Error type threading both domain and transaction-control failures out of
/// an immediate transaction.
enum TxError {
    Domain(Error),
    Storage(StorageError),
}

impl From<diesel::result::Error> for TxError {
    fn from(err: diesel::result::Error) -> Self {
        TxError::Storage(StorageError::Query(err))
    }
}

/// Cloneable handle submitting write jobs to the actor.
#[derive(Clone)]
pub struct WriteHandle {
    sender: mpsc::Sender<Job>,
}

impl WriteHandle {
    /// Run a job on the writer thread inside an immediate transaction and
    /// await its result. A job that returns an error rolls the whole
    /// transaction back.
    pub async fn exec<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
    {
        let (reply, receiver) = oneshot::channel();
        let wrapped: Job = Box::new(move |conn| {
            let outcome = conn
                .immediate_transaction::<T, TxError, _>(|conn| job(conn).map_err(TxError::Domain))
                .map_err(|err| match err {
                    TxError::Domain(inner) => inner,
                    TxError::Storage(inner) => inner.into(),
                });
            if reply.send(outcome).is_err() {
                warn!("Write job finished but the caller went away");
            }
        });

        self.sender.send(wrapped).await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer actor is no longer running".to_string(),
            ))
        })?;

        receiver.await.map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Writer actor dropped the job".to_string(),
            ))
        })?
    }
}

/// Start the writer thread and return its handle.
pub fn spawn_writer(pool: DbPool) -> WriteHandle {
    let (sender, mut receiver) = mpsc::channel::<Job>(JOB_QUEUE_DEPTH);

    std::thread::Builder::new()
        .name("daystack-writer".to_string())
        .spawn(move || {
            while let Some(job) = receiver.blocking_recv() {
                match pool.get() {
                    Ok(mut conn) => job(&mut conn),
                    Err(err) => {
                        // The job's reply channel is dropped with it; the
                        // caller sees a connection failure either way.
                        error!("Writer could not check out a connection: {}", err);
                    }
                }
            }
        })
        .expect("failed to spawn writer thread");

    WriteHandle { sender }
}
