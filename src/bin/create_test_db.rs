use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, Month, OffsetDateTime};

use ledgerline::{
    PasswordHash, ValidatedPassword, initialize_db,
    transaction::{Amount, Transaction, TransactionType, create_transaction},
    user::{NewUser, Permission, Role, create_user},
};

/// A utility for creating a test database for the ledgerline server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
///
/// Both users have the password "test".
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test users...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let admin = create_user(
        NewUser {
            email: "admin@example.com".to_owned(),
            name: "Ama Admin".to_owned(),
            role: Role::Admin,
            permission: Permission::Write,
            password_hash: password_hash.clone(),
        },
        &conn,
    )?;
    create_user(
        NewUser {
            email: "viewer@example.com".to_owned(),
            name: "Kofi Viewer".to_owned(),
            role: Role::User,
            permission: Permission::Read,
            password_hash,
        },
        &conn,
    )?;

    println!("Creating test transactions...");

    let today = OffsetDateTime::now_utc().date();
    let mut count = 0;

    for month in 1..=today.month() as u8 {
        let month = Month::try_from(month)?;
        let first_of_month = Date::from_calendar_date(today.year(), month, 1)?;

        let rows = [
            (TransactionType::Income, 250_000, 0, None, "Cake sales"),
            (TransactionType::Income, 80_000, 14, None, "Catering"),
            (TransactionType::Expenditure, 120_000, 1, Some("Rent"), "Shop rent"),
            (TransactionType::Expenditure, 45_000, 7, Some("Ingredients"), "Flour and sugar"),
            (TransactionType::Expenditure, 15_000, 20, Some("Utilities"), "Electricity"),
        ];

        for (transaction_type, cents, day_offset, category, description) in rows {
            let date = first_of_month + Duration::days(day_offset);
            if date > today {
                continue;
            }

            let mut builder =
                Transaction::build(transaction_type, Amount::from_cents(cents), date, description);
            if let Some(category) = category {
                builder = builder.category(category);
            }

            create_transaction(builder.validate(today)?, admin.id, &conn)?;
            count += 1;
        }
    }

    println!("Created {count} transactions.");
    println!("Success!");

    Ok(())
}
