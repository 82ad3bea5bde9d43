use crate::queries::{create_user, get_user_count};
use crate::types::{Password, PasswordHash, Username};
use bb8::Pool;
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;

//--------------------------------------------------------------------------------------------------
// DB Pool Type
//--------------------------------------------------------------------------------------------------

pub type DbConnectionPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

//--------------------------------------------------------------------------------------------------
// Migrations
//--------------------------------------------------------------------------------------------------

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub async fn run_migrations(connection_string: String) -> anyhow::Result<()> {
    // Get a connection and run migrations - we cannot use diesel_async because it doesn't have
    // run_pending_migrations
    let db_conn = &mut PgConnection::establish(&connection_string)?;
    let migrations_done = db_conn
        .run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");
    if migrations_done.is_empty() {
        info!("No migrations to run");
    } else {
        info!("Ran migrations: {:?}", migrations_done);
    }

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Seeding
//--------------------------------------------------------------------------------------------------

// Used to prevent other code from minting bootstrap credentials
#[allow(dead_code)]
pub struct SeedPermission(bool);

pub async fn seed_db(connection_pool: &DbConnectionPool) -> anyhow::Result<()> {
    let user_count = get_user_count(connection_pool).await?;

    if user_count > 0 {
        info!("Database has {} users, no seeding required", user_count);
        return Ok(());
    }

    info!("Database empty - seeding");

    // Create an admin user with a throwaway password for first login
    let password_uuid = uuid::Uuid::new_v4();
    let password = Password::from_uuid(SeedPermission(true), password_uuid);

    info!(
        "NOTE CAREFULLY: Admin user 'admin' created with password {:?}.",
        password_uuid
    );

    let password_hash = PasswordHash::from_password(&password).expect("Failed to hash password");

    create_user(
        &Username::new("admin"),
        &None,
        &password_hash,
        sentinel::ADMIN,
        connection_pool,
    )
    .await?;

    info!("Seeding complete");

    Ok(())
}

//--------------------------------------------------------------------------------------------------
