//! Sets up the application's SQLite database.

use rusqlite::Connection;

use crate::{transaction::create_transaction_table, user::create_user_table};

/// Create the application's tables if they do not exist yet.
///
/// Also turns on foreign key enforcement, which SQLite leaves off by default,
/// so transactions cannot point at missing users.
///
/// # Errors
/// Returns an error if a pragma or table creation statement fails.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    create_user_table(connection)?;
    create_transaction_table(connection)?;

    Ok(())
}
