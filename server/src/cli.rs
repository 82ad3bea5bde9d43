use crate::db::DbConnectionPool;
use crate::queries::{create_user, delete_user, get_recent_users, get_user_by_username};
use crate::types::{Nickname, Password, PasswordHash, Username};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use sentinel::RoleId;
use std::io::Write;
use tracing::info;

//--------------------------------------------------------------------------------------------------
// Command line interface
//--------------------------------------------------------------------------------------------------

#[derive(Parser)]
#[command(version, about = "HTTP backend with token admission control")]
pub struct Cli {
    /// Configuration file stem (reads <stem> and <stem>.local)
    #[arg(short = 'f', long, default_value = "config")]
    pub config_file: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server (the default)
    Serve,
    /// Run pending database migrations and exit
    Migrate,
    /// Operator user management
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user (prompts for the password)
    Create {
        username: String,
        /// 1 = admin, 2 = normal
        #[arg(long, default_value_t = 2)]
        role: i16,
        #[arg(long)]
        nickname: Option<String>,
    },
    /// Show the most recently created users
    List,
    /// Remove a user
    Remove { username: String },
}

//--------------------------------------------------------------------------------------------------
// Operator user management
//--------------------------------------------------------------------------------------------------

pub async fn user_create(
    pool: &DbConnectionPool,
    username: String,
    role: i16,
    nickname: Option<String>,
) -> Result<()> {
    if role != sentinel::ADMIN.value() && role != sentinel::NORMAL.value() {
        bail!("role must be 1 (admin) or 2 (normal)");
    }

    let username = Username::new(username);
    if get_user_by_username(&username, pool).await?.is_some() {
        bail!("user {} already exists", username);
    }

    let password = prompt_password()?;
    let password_hash = PasswordHash::from_password(&password)
        .map_err(|err| anyhow::anyhow!("failed to hash password: {err}"))?;

    create_user(
        &username,
        &nickname.map(Nickname::new),
        &password_hash,
        RoleId::new(role),
        pool,
    )
    .await?;

    info!("Created user {}", username);

    Ok(())
}

pub async fn user_list(pool: &DbConnectionPool) -> Result<()> {
    let users = get_recent_users(10, pool).await?;

    for user in users {
        println!(
            "ID: {}  Username: {}  Role: {}  CreatedAt: {}",
            user.id, user.username, user.role_id, user.created_at
        );
    }

    Ok(())
}

pub async fn user_remove(pool: &DbConnectionPool, username: String) -> Result<()> {
    let username = Username::new(username);

    let deleted = delete_user(&username, pool).await?;
    if deleted == 0 {
        bail!("user {} does not exist", username);
    }

    info!("Deleted user {}", username);

    Ok(())
}

fn prompt_password() -> Result<Password> {
    let first = read_line("Password: ")?;
    let second = read_line("Repeat password: ")?;

    if first != second {
        bail!("passwords do not match");
    }
    if first.is_empty() {
        bail!("password must not be empty");
    }

    Ok(Password::new(first))
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

//--------------------------------------------------------------------------------------------------
