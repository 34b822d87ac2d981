use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::auth::password as credential;
use crate::auth::repo_types::User;
use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 8;
const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=50;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Validated, normalized registration input.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

pub fn normalize_registration(username: &str, email: &str, password: &str) -> Result<NewUser, AppError> {
    let username = username.trim();
    let email = email.trim().to_lowercase();

    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(AppError::Validation(
            "Username must be between 3 and 50 characters.".into(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email.".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    Ok(NewUser {
        username: username.to_string(),
        email,
    })
}

/// Stores a new user. Fails with `DuplicateCredential` if the username or
/// email is already registered.
#[instrument(skip(db, password))]
pub async fn register(
    db: &SqlitePool,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let new_user = normalize_registration(username, email, password)?;

    if User::credentials_taken(db, &new_user.username, &new_user.email).await? {
        warn!(username = %new_user.username, "username or email already registered");
        return Err(AppError::DuplicateCredential);
    }

    let hash = credential::hash(password)?;

    let user = User::create(db, &new_user.username, &new_user.email, &hash)
        .await
        .map_err(|e| match e.as_database_error() {
            // Lost a race with a concurrent registration.
            Some(db_err) if db_err.is_unique_violation() => AppError::DuplicateCredential,
            _ => AppError::Database(e),
        })?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Checks a username/password pair. Unknown users and wrong passwords are
/// reported identically.
#[instrument(skip(db, password))]
pub async fn verify(db: &SqlitePool, username: &str, password: &str) -> Result<User, AppError> {
    let Some(user) = User::find_by_username(db, username.trim()).await? else {
        warn!(username = %username, "login unknown username");
        return Err(AppError::InvalidCredential);
    };

    if !credential::matches(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredential);
    }

    Ok(user)
}
