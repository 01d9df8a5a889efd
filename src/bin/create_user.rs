use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use ledgerline::{
    PasswordHash, ValidatedPassword, initialize_db,
    user::{NewUser, Permission, Role, count_users, create_user, parse_email},
};

/// A utility for registering a user with the ledgerline server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address the user logs in with.
    #[arg(long)]
    email: String,

    /// The user's display name.
    #[arg(long)]
    name: String,

    /// Either "admin" or "user".
    #[arg(long, default_value = "user")]
    role: String,

    /// Either "read" or "write". Only writers can record transactions.
    #[arg(long, default_value = "read")]
    permission: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);
    validate_db_path(db_path);

    let email = parse_email(&args.email)?;
    let role: Role = args.role.to_uppercase().parse()?;
    let permission: Permission = args.permission.to_uppercase().parse()?;

    let Some(password_hash) = get_new_password_hash(&[&email, &args.name]) else {
        return Ok(());
    };

    let conn = Connection::open(db_path)?;
    initialize_db(&conn)?;

    let user = create_user(
        NewUser {
            email,
            name: args.name,
            role,
            permission,
            password_hash,
        },
        &conn,
    )?;

    println!("Created user {} with ID {}", user.email, user.id);
    println!("{} user(s) are now registered.", count_users(&conn)?);

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            print_error("Database path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }
}

fn get_new_password_hash(context: &[&str]) -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = prompt("Enter a password: ")?;

        let validated_password = match ValidatedPassword::new(&first_password, context) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = prompt("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
                continue;
            }
        }
    }
}

/// Read a password without echoing it. Returns `None` on end of input or a read error.
fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
