use crate::db::DbConnectionPool;
use crate::db_models::User;
use crate::types::{Nickname, PasswordHash, Username};
use diesel::dsl::insert_into;
use diesel::{
    BoolExpressionMethods, ExpressionMethods, NullableExpressionMethods, OptionalExtension,
    PgTextExpressionMethods, QueryDsl, SelectableHelper,
};
use diesel_async::*;
use sentinel::RoleId;

//--------------------------------------------------------------------------------------------------
// Get user by username
//--------------------------------------------------------------------------------------------------

pub async fn get_user_by_username(
    by: &Username,
    db_connection_pool: &DbConnectionPool,
) -> Result<Option<User>, anyhow::Error> {
    use crate::schema::users;

    let mut db_connection = db_connection_pool.get().await?;
    let user = users::table
        .filter(users::username.eq(by))
        .first::<User>(&mut db_connection)
        .await
        .optional()?;

    Ok(user)
}

//--------------------------------------------------------------------------------------------------
// Get user by ID
//--------------------------------------------------------------------------------------------------

pub async fn get_user_by_id(
    user_id: i64,
    db_connection_pool: &DbConnectionPool,
) -> Result<Option<User>, anyhow::Error> {
    use crate::schema::users::dsl::users;

    let mut db_connection = db_connection_pool.get().await?;
    let user = users
        .find(user_id)
        .first::<User>(&mut db_connection)
        .await
        .optional()?;

    Ok(user)
}

//--------------------------------------------------------------------------------------------------
// Count users
//--------------------------------------------------------------------------------------------------

pub async fn get_user_count(db_connection_pool: &DbConnectionPool) -> Result<i64, anyhow::Error> {
    use crate::schema::users;

    let mut db_connection = db_connection_pool.get().await?;
    let count = users::table.count().get_result(&mut db_connection).await?;

    Ok(count)
}

//--------------------------------------------------------------------------------------------------
// List users, newest first, with optional fuzzy matching on username/nickname
//--------------------------------------------------------------------------------------------------

pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
}

pub async fn list_users(
    page: i64,
    limit: i64,
    key: Option<&str>,
    db_connection_pool: &DbConnectionPool,
) -> Result<UserPage, anyhow::Error> {
    use crate::schema::users;

    let mut db_connection = db_connection_pool.get().await?;

    let mut query = users::table
        .select(User::as_select())
        .order(users::created_at.desc())
        .into_boxed();
    let mut count_query = users::table.count().into_boxed();
    if let Some(key) = key {
        let pattern = format!("%{}%", key);
        query = query.filter(
            users::username
                .ilike(pattern.clone())
                .or(users::nickname.assume_not_null().ilike(pattern.clone())),
        );
        count_query = count_query.filter(
            users::username
                .ilike(pattern.clone())
                .or(users::nickname.assume_not_null().ilike(pattern)),
        );
    }

    let total = count_query.get_result(&mut db_connection).await?;

    let offset = (page - 1) * limit;
    let page_users = query
        .limit(limit)
        .offset(offset)
        .load::<User>(&mut db_connection)
        .await?;

    Ok(UserPage {
        users: page_users,
        total,
    })
}

//--------------------------------------------------------------------------------------------------
// Most recently created users
//--------------------------------------------------------------------------------------------------

pub async fn get_recent_users(
    limit: i64,
    db_connection_pool: &DbConnectionPool,
) -> Result<Vec<User>, anyhow::Error> {
    use crate::schema::users;

    let mut db_connection = db_connection_pool.get().await?;
    let recent = users::table
        .select(User::as_select())
        .order(users::created_at.desc())
        .limit(limit)
        .load::<User>(&mut db_connection)
        .await?;

    Ok(recent)
}

//--------------------------------------------------------------------------------------------------
// Create user
//--------------------------------------------------------------------------------------------------

pub async fn create_user(
    new_username: &Username,
    new_nickname: &Option<Nickname>,
    new_password_hash: &PasswordHash,
    new_role_id: RoleId,
    db_connection_pool: &DbConnectionPool,
) -> Result<User, anyhow::Error> {
    use crate::schema::users::dsl::*;

    let mut db_connection = db_connection_pool.get().await?;
    let user = insert_into(users)
        .values((
            username.eq(new_username),
            nickname.eq(new_nickname.as_ref()),
            password_hash.eq(new_password_hash),
            role_id.eq(new_role_id.value()),
        ))
        .get_result(&mut db_connection)
        .await?;

    Ok(user)
}

//--------------------------------------------------------------------------------------------------
// Delete user
//--------------------------------------------------------------------------------------------------

pub async fn delete_user(
    by: &Username,
    db_connection_pool: &DbConnectionPool,
) -> Result<usize, anyhow::Error> {
    use crate::schema::users;

    let mut db_connection = db_connection_pool.get().await?;
    let deleted = diesel::delete(users::table.filter(users::username.eq(by)))
        .execute(&mut db_connection)
        .await?;

    Ok(deleted)
}

//--------------------------------------------------------------------------------------------------
