//! Defines the JSON endpoints for recurring transactions and for processing them.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    database_id::RecurringTransactionId,
    db::lock_connection,
    owner::OwnerId,
    recurring::{
        Frequency, LedgerEntry, NewRecurringTransaction, OwnerLocks, RecurringProcessor,
        RecurringTransaction, SQLiteLedgerStore, create_recurring_transaction,
        deactivate_recurring_transaction, get_recurring_transaction, get_recurring_transactions,
    },
    timezone::local_today,
};

/// The state needed to manage and process recurring transactions.
#[derive(Debug, Clone)]
pub struct RecurringState {
    /// The database connection for managing recurring transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub owner_locks: OwnerLocks,
}

impl FromRef<AppState> for RecurringState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            owner_locks: state.owner_locks.clone(),
        }
    }
}

/// The request body for creating a recurring transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransactionForm {
    pub title: String,
    pub category: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    /// One of daily, weekly, bi-weekly, monthly, quarterly or yearly.
    pub frequency: String,
    pub start_date: Date,
    #[serde(default)]
    pub end_date: Option<Date>,
    /// Defaults to `true`.
    #[serde(default = "default_is_expense")]
    pub is_expense: bool,
}

fn default_is_expense() -> bool {
    true
}

impl TryFrom<RecurringTransactionForm> for NewRecurringTransaction {
    type Error = Error;

    fn try_from(form: RecurringTransactionForm) -> Result<Self, Self::Error> {
        Ok(Self {
            frequency: form.frequency.parse::<Frequency>()?,
            title: form.title,
            category: form.category,
            amount: form.amount,
            description: form.description,
            start_date: form.start_date,
            end_date: form.end_date,
            is_expense: form.is_expense,
        })
    }
}

/// The query parameters for processing recurring transactions.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize)]
pub struct ProcessQuery {
    /// Process everything due on or before this date. Defaults to today.
    pub as_of: Option<Date>,
}

/// A route handler for creating a recurring transaction, responds with the created record.
pub async fn create_recurring_endpoint(
    State(state): State<RecurringState>,
    Path(owner_id): Path<OwnerId>,
    Json(form): Json<RecurringTransactionForm>,
) -> Result<(StatusCode, Json<RecurringTransaction>), Error> {
    let new_recurring = NewRecurringTransaction::try_from(form)?;
    let connection = lock_connection(&state.db_connection)?;

    let recurring = create_recurring_transaction(owner_id, new_recurring, &connection)?;

    Ok((StatusCode::CREATED, Json(recurring)))
}

/// A route handler for listing an owner's recurring transactions.
pub async fn list_recurring_endpoint(
    State(state): State<RecurringState>,
    Path(owner_id): Path<OwnerId>,
) -> Result<Json<Vec<RecurringTransaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_recurring_transactions(owner_id, &connection).map(Json)
}

/// A route handler for fetching a single recurring transaction.
pub async fn get_recurring_endpoint(
    State(state): State<RecurringState>,
    Path((owner_id, recurring_id)): Path<(OwnerId, RecurringTransactionId)>,
) -> Result<Json<RecurringTransaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    get_recurring_transaction(owner_id, recurring_id, &connection).map(Json)
}

/// A route handler for deactivating a recurring transaction, responds with the updated record.
pub async fn deactivate_recurring_endpoint(
    State(state): State<RecurringState>,
    Path((owner_id, recurring_id)): Path<(OwnerId, RecurringTransactionId)>,
) -> Result<Json<RecurringTransaction>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    deactivate_recurring_transaction(owner_id, recurring_id, &connection).map(Json)
}

/// A route handler that materializes everything due for an owner, responds
/// with the entries that were created.
///
/// The pass runs on the blocking thread pool, since an owner that is far
/// behind may have many occurrences to catch up.
pub async fn process_recurring_endpoint(
    State(state): State<RecurringState>,
    Path(owner_id): Path<OwnerId>,
    Query(query): Query<ProcessQuery>,
) -> Result<Json<Vec<LedgerEntry>>, Error> {
    let as_of = match query.as_of {
        Some(as_of) => as_of,
        None => local_today(&state.local_timezone)?,
    };

    let processor = RecurringProcessor::new(
        SQLiteLedgerStore::new(state.db_connection.clone()),
        state.owner_locks.clone(),
    );

    // A long catch up must not stall the async workers.
    tokio::task::spawn_blocking(move || processor.process_due(owner_id, as_of))
        .await
        .map_err(|error| {
            tracing::error!("the processing task for owner {owner_id} failed: {error}");
            Error::TaskJoinError(error.to_string())
        })?
        .map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        db::initialize,
        endpoints::{self, format_endpoint},
        recurring::{
            LedgerEntry, OwnerLocks, RecurringTransaction, create_recurring_endpoint,
            deactivate_recurring_endpoint, get_recurring_endpoint, list_recurring_endpoint,
            process_recurring_endpoint,
        },
    };

    use super::RecurringState;

    fn get_test_server() -> TestServer {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");

        let app = Router::new()
            .route(
                endpoints::RECURRING,
                post(create_recurring_endpoint).get(list_recurring_endpoint),
            )
            .route(endpoints::PROCESS_RECURRING, post(process_recurring_endpoint))
            .route(endpoints::RECURRING_TRANSACTION, get(get_recurring_endpoint))
            .route(
                endpoints::DEACTIVATE_RECURRING,
                post(deactivate_recurring_endpoint),
            )
            .with_state(RecurringState {
                db_connection: Arc::new(Mutex::new(connection)),
                local_timezone: "Etc/UTC".to_owned(),
                owner_locks: OwnerLocks::default(),
            });

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn unknown_frequency_is_bad_request() {
        let server = get_test_server();

        let response = server
            .post(&format_endpoint(endpoints::RECURRING, &[1]))
            .json(&json!({
                "title": "Rent",
                "category": "Housing",
                "amount": "800",
                "frequency": "hourly",
                "start_date": "2024-01-01"
            }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<serde_json::Value>();
        assert!(body["error"].as_str().unwrap().contains("hourly"));
    }

    #[tokio::test]
    async fn zero_amount_is_bad_request() {
        let server = get_test_server();

        server
            .post(&format_endpoint(endpoints::RECURRING, &[1]))
            .json(&json!({
                "title": "Rent",
                "category": "Housing",
                "amount": "0",
                "frequency": "monthly",
                "start_date": "2024-01-01"
            }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_then_process() {
        let server = get_test_server();
        let response = server
            .post(&format_endpoint(endpoints::RECURRING, &[1]))
            .json(&json!({
                "title": "Rent",
                "category": "Housing",
                "amount": "800",
                "frequency": "monthly",
                "start_date": "2024-01-01"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let recurring = response.json::<RecurringTransaction>();
        assert!(recurring.is_expense);

        let entries = server
            .post(&format_endpoint(endpoints::PROCESS_RECURRING, &[1]))
            .add_query_param("as_of", "2024-04-15")
            .await
            .json::<Vec<LedgerEntry>>();
        assert_eq!(entries.len(), 4);

        let recurring = server
            .get(&format_endpoint(
                endpoints::RECURRING_TRANSACTION,
                &[1, recurring.id],
            ))
            .await
            .json::<RecurringTransaction>();
        assert_eq!(recurring.next_due_date, date!(2024 - 05 - 01));

        let again = server
            .post(&format_endpoint(endpoints::PROCESS_RECURRING, &[1]))
            .add_query_param("as_of", "2024-04-15")
            .await
            .json::<Vec<LedgerEntry>>();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn years_of_daily_occurrences_are_caught_up() {
        let server = get_test_server();
        server
            .post(&format_endpoint(endpoints::RECURRING, &[1]))
            .json(&json!({
                "title": "Coffee",
                "category": "Food",
                "amount": "4.50",
                "frequency": "daily",
                "start_date": "2020-01-01"
            }))
            .await
            .assert_status(StatusCode::CREATED);

        let entries = server
            .post(&format_endpoint(endpoints::PROCESS_RECURRING, &[1]))
            .add_query_param("as_of", "2024-12-31")
            .await
            .json::<Vec<LedgerEntry>>();

        assert_eq!(entries.len(), 1827);
        assert_eq!(entries.last().map(LedgerEntry::date), Some(date!(2024 - 12 - 31)));
    }

    #[tokio::test]
    async fn deactivated_recurring_is_not_processed() {
        let server = get_test_server();
        let recurring = server
            .post(&format_endpoint(endpoints::RECURRING, &[1]))
            .json(&json!({
                "title": "Gym",
                "category": "Health",
                "amount": "30",
                "frequency": "weekly",
                "start_date": "2024-01-01"
            }))
            .await
            .json::<RecurringTransaction>();

        let deactivated = server
            .post(&format_endpoint(
                endpoints::DEACTIVATE_RECURRING,
                &[1, recurring.id],
            ))
            .await
            .json::<RecurringTransaction>();
        assert!(!deactivated.is_active);

        let entries = server
            .post(&format_endpoint(endpoints::PROCESS_RECURRING, &[1]))
            .add_query_param("as_of", "2024-04-15")
            .await
            .json::<Vec<LedgerEntry>>();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn other_owner_gets_not_found() {
        let server = get_test_server();
        let recurring = server
            .post(&format_endpoint(endpoints::RECURRING, &[1]))
            .json(&json!({
                "title": "Gym",
                "category": "Health",
                "amount": "30",
                "frequency": "weekly",
                "start_date": "2024-01-01"
            }))
            .await
            .json::<RecurringTransaction>();

        server
            .get(&format_endpoint(
                endpoints::RECURRING_TRANSACTION,
                &[2, recurring.id],
            ))
            .await
            .assert_status_not_found();
    }
}
