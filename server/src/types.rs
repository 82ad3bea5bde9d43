use crate::db::SeedPermission;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as ParsedHash, SaltString};
use argon2::{password_hash, Argon2, PasswordHasher, PasswordVerifier};
use diesel::backend::Backend;
use diesel::deserialize::FromSql;
use diesel::serialize::{Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

//--------------------------------------------------------------------------------------------------
// Macro to derive simple ToSql/FromSql needed for String newtypes that are used in the DB
//--------------------------------------------------------------------------------------------------

macro_rules! derive_to_from_sql {
    ($ty:ident) => {
        impl<DB: Backend> ToSql<Text, DB> for $ty
        where
            String: ToSql<Text, DB>,
        {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, DB>) -> diesel::serialize::Result {
                self.0.to_sql(out)
            }
        }

        impl<DB: Backend> FromSql<Text, DB> for $ty
        where
            String: FromSql<Text, DB>,
        {
            fn from_sql(bytes: DB::RawValue<'_>) -> diesel::deserialize::Result<Self> {
                String::from_sql(bytes).map($ty)
            }
        }
    };
}

//--------------------------------------------------------------------------------------------------
// New types
//--------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize, AsExpression, FromSqlRow, PartialEq, Eq, Hash)]
#[diesel(sql_type = Text)]
pub struct Username(String);

derive_to_from_sql!(Username);

impl Username {
    pub fn new(username: impl Into<String>) -> Self {
        Username(username.into())
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct Nickname(String);

derive_to_from_sql!(Nickname);

impl Nickname {
    pub fn new(nickname: impl Into<String>) -> Self {
        Nickname(nickname.into())
    }
}

// Deserialize only, so plaintext passwords never serialize back out
#[derive(Deserialize)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Password(password.into())
    }

    pub fn from_uuid(_perm: SeedPermission, uuid: uuid::Uuid) -> Self {
        Password(uuid.to_string())
    }
}

#[derive(Debug, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub struct PasswordHash(String);

derive_to_from_sql!(PasswordHash);

impl PasswordHash {
    pub fn validate(&self, password: &Password) -> password_hash::Result<bool> {
        let hash = ParsedHash::new(&self.0)?;

        match Argon2::default().verify_password(password.0.as_bytes(), &hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn from_password(password: &Password) -> password_hash::Result<Self> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default().hash_password(password.0.as_bytes(), &salt)?;

        Ok(PasswordHash(hash.to_string()))
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_validates_matching_password() {
        let password = Password::new("correct horse battery staple");
        let hash = PasswordHash::from_password(&password).unwrap();

        assert!(hash.validate(&password).unwrap());
    }

    #[test]
    fn password_hash_rejects_wrong_password() {
        let hash = PasswordHash::from_password(&Password::new("right")).unwrap();

        assert!(!hash.validate(&Password::new("wrong")).unwrap());
    }
}
