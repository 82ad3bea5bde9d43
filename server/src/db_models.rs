use crate::types::{Nickname, PasswordHash, Username};
use diesel::prelude::*;
use time::OffsetDateTime;

//--------------------------------------------------------------------------------------------------
// Database Models
//--------------------------------------------------------------------------------------------------

#[derive(Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i64,
    pub username: Username,
    pub nickname: Option<Nickname>,
    pub password_hash: PasswordHash,
    pub role_id: i16,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

//--------------------------------------------------------------------------------------------------
