use std::error::Error;
use std::path::Path;
use std::process::exit;
use std::sync::{Arc, Mutex};

use clap::Parser;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Month, OffsetDateTime};

use fintrack::{
    Expense, Frequency, Income, NewRecurringTransaction, NewSavingsGoal, OwnerId, OwnerLocks,
    RecurringProcessor, SQLiteLedgerStore, create_budget, create_expense, create_income,
    create_recurring_transaction, create_savings_goal, initialize_db,
};

/// A utility for creating a test database for the REST API server of fintrack.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The owner ID to create the demo data for.
    #[arg(long, default_value_t = 1)]
    owner_id: i64,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let owner = OwnerId::new(args.owner_id);
    let today = OffsetDateTime::now_utc().date();
    let start = Date::from_calendar_date(today.year(), Month::January, 1)?;

    println!("Creating budgets and savings goals...");
    for (category, limit) in [("Food", 600), ("Transport", 200), ("Entertainment", 150)] {
        create_budget(owner, category, Decimal::from(limit), &conn)?;
    }
    create_savings_goal(
        owner,
        NewSavingsGoal {
            name: "Emergency fund".to_owned(),
            target_amount: Decimal::from(10_000),
            current_amount: Decimal::from(2_500),
            target_date: Date::from_calendar_date(today.year() + 1, Month::June, 30).ok(),
        },
        &conn,
    )?;

    println!("Creating one-off expenses and income...");
    for (category, amount, description) in [
        ("Food", Decimal::new(8_450, 2), "Groceries"),
        ("Transport", Decimal::new(4_000, 2), "Fuel"),
        ("Entertainment", Decimal::new(2_299, 2), "Cinema"),
    ] {
        create_expense(
            Expense::build(owner, category, amount, start)
                .description(Some(description.to_owned())),
            &conn,
        )?;
    }
    create_income(
        Income::build(owner, "Gift", Decimal::from(100), start),
        &conn,
    )?;

    println!("Creating recurring transactions...");
    for (title, category, amount, frequency, is_expense) in [
        ("Salary", "Wages", Decimal::from(4_200), Frequency::Monthly, false),
        ("Rent", "Housing", Decimal::from(450), Frequency::Weekly, true),
        ("Phone plan", "Utilities", Decimal::from(45), Frequency::Monthly, true),
        ("Car insurance", "Transport", Decimal::from(320), Frequency::Quarterly, true),
    ] {
        create_recurring_transaction(
            owner,
            NewRecurringTransaction {
                title: title.to_owned(),
                category: category.to_owned(),
                amount,
                description: None,
                frequency,
                start_date: start,
                end_date: None,
                is_expense,
            },
            &conn,
        )?;
    }

    println!("Processing recurring transactions up to {today}...");
    let processor = RecurringProcessor::new(
        SQLiteLedgerStore::new(Arc::new(Mutex::new(conn))),
        OwnerLocks::default(),
    );
    let entries = processor.process_due(owner, today)?;
    println!("Created {} ledger entries.", entries.len());

    println!("Success!");

    Ok(())
}
