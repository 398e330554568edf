//! Materializes recurring transactions that have fallen due.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use time::Date;

use crate::{
    Error,
    owner::OwnerId,
    recurring::{LedgerEntry, LedgerStore, RecurringTransaction, next_due_date},
};

/// One lock per owner, held for the whole of a processing pass.
///
/// Cloning shares the same set of locks.
#[derive(Debug, Clone, Default)]
pub struct OwnerLocks(Arc<Mutex<HashMap<OwnerId, Arc<Mutex<()>>>>>);

impl OwnerLocks {
    /// Get the lock for `owner_id`, creating it on first use.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLockError] if the lock table was poisoned.
    pub fn for_owner(&self, owner_id: OwnerId) -> Result<Arc<Mutex<()>>, Error> {
        let mut locks = self.0.lock().map_err(|error| {
            tracing::error!("could not acquire the owner lock table: {error}");
            Error::DatabaseLockError
        })?;

        Ok(locks.entry(owner_id).or_default().clone())
    }

    /// Forget the lock for `owner_id` once nothing else holds it.
    fn prune(&self, owner_id: OwnerId) {
        let Ok(mut locks) = self.0.lock() else {
            return;
        };

        if locks
            .get(&owner_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&owner_id);
        }
    }
}

/// Turns due occurrences of recurring transactions into expenses and income.
pub struct RecurringProcessor<S> {
    store: S,
    owner_locks: OwnerLocks,
}

impl<S: LedgerStore> RecurringProcessor<S> {
    /// Create a processor over `store` that serializes passes with `owner_locks`.
    pub fn new(store: S, owner_locks: OwnerLocks) -> Self {
        Self { store, owner_locks }
    }

    /// Materialize every occurrence of `owner_id`'s recurring transactions due
    /// on or before `as_of`.
    ///
    /// Overdue recurring transactions are caught up: one entry is created for
    /// each missed due date, never past the end date. Each entry is dated on
    /// the due date it satisfies. The entries are returned in the order they
    /// were created.
    ///
    /// A recurring transaction that fails to materialize is logged and skipped
    /// so the rest are still processed. After a [Error::ConcurrencyConflict]
    /// the recurring transaction is read again and processing resumes once.
    /// A conflict that repeats while the stored schedule has not moved is not
    /// caused by another writer, so that recurring transaction is skipped too.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::ConcurrencyConflict] if another writer moved a schedule and it conflicts again,
    /// - [Error::DatabaseLockError] if a lock was poisoned,
    /// - or [Error::PersistenceFailure] if the due recurring transactions could not be read.
    pub fn process_due(&self, owner_id: OwnerId, as_of: Date) -> Result<Vec<LedgerEntry>, Error> {
        let result = self.process_due_locked(owner_id, as_of);
        self.owner_locks.prune(owner_id);

        result
    }

    fn process_due_locked(
        &self,
        owner_id: OwnerId,
        as_of: Date,
    ) -> Result<Vec<LedgerEntry>, Error> {
        let owner_lock = self.owner_locks.for_owner(owner_id)?;
        let _guard = owner_lock.lock().map_err(|error| {
            tracing::error!("could not acquire the lock for owner {owner_id}: {error}");
            Error::DatabaseLockError
        })?;

        let due = self.store.find_due_recurring(owner_id, as_of)?;
        let mut entries = Vec::new();

        for mut recurring in due {
            match self.catch_up(&mut recurring, as_of, &mut entries) {
                Ok(()) => {}
                Err(Error::ConcurrencyConflict) => {
                    tracing::warn!(
                        "Recurring transaction {} conflicted on {}, retrying once",
                        recurring.id,
                        recurring.next_due_date
                    );
                    self.retry(owner_id, &recurring, as_of, &mut entries)?;
                }
                Err(error) => {
                    tracing::error!(
                        "Could not process recurring transaction {}: {error}",
                        recurring.id
                    );
                }
            }
        }

        tracing::info!(
            "Materialized {} recurring entries for owner {owner_id} as of {as_of}",
            entries.len()
        );

        Ok(entries)
    }

    /// Read `stale` again and resume catching it up.
    ///
    /// `stale` holds the schedule as it was when the conflict happened.
    fn retry(
        &self,
        owner_id: OwnerId,
        stale: &RecurringTransaction,
        as_of: Date,
        entries: &mut Vec<LedgerEntry>,
    ) -> Result<(), Error> {
        let id = stale.id;
        let mut fresh = match self.store.get_recurring(owner_id, id) {
            Ok(fresh) => fresh,
            Err(error) => {
                tracing::error!("Could not reload recurring transaction {id}: {error}");
                return Ok(());
            }
        };
        let schedule_moved = fresh.next_due_date != stale.next_due_date
            || fresh.is_active != stale.is_active;

        match self.catch_up(&mut fresh, as_of, entries) {
            Ok(()) => Ok(()),
            Err(Error::ConcurrencyConflict) if schedule_moved => {
                tracing::error!(
                    "Recurring transaction {id} was modified concurrently again, giving up"
                );
                Err(Error::ConcurrencyConflict)
            }
            Err(Error::ConcurrencyConflict) => {
                tracing::error!(
                    "Recurring transaction {id} already has an entry on {}, skipping it",
                    fresh.next_due_date
                );
                Ok(())
            }
            Err(error) => {
                tracing::error!("Could not process recurring transaction {id}: {error}");
                Ok(())
            }
        }
    }

    /// Materialize `recurring` until it is no longer due.
    ///
    /// On error `recurring` holds the schedule of the occurrence that failed.
    fn catch_up(
        &self,
        recurring: &mut RecurringTransaction,
        as_of: Date,
        entries: &mut Vec<LedgerEntry>,
    ) -> Result<(), Error> {
        while is_due(recurring, as_of) {
            let due_date = recurring.next_due_date;
            let next = next_due_date(recurring.frequency, due_date);

            let (entry, updated) = self.store.materialize(recurring, due_date, next)?;

            tracing::debug!(
                "Materialized recurring transaction {} due on {due_date}",
                recurring.id
            );
            entries.push(entry);
            *recurring = updated;
        }

        Ok(())
    }
}

fn is_due(recurring: &RecurringTransaction, as_of: Date) -> bool {
    recurring.is_active
        && recurring.next_due_date <= as_of
        && recurring
            .end_date
            .is_none_or(|end_date| recurring.next_due_date <= end_date)
}
