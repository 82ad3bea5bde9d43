use crate::role::RoleId;
use crate::unixtime::UnixTimestamp;
use serde::{Deserialize, Serialize};
use time::Duration;

//--------------------------------------------------------------------------------------------------
// Token claims
//--------------------------------------------------------------------------------------------------

/// The identity a token is issued for.
pub struct ClaimMeta {
    pub user_id: i64,
    pub role_id: RoleId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userID")]
    user_id: i64,
    #[serde(rename = "roleID")]
    role_id: RoleId,
    exp: UnixTimestamp,
    iat: UnixTimestamp,
    iss: String,
}

// Make sure we only assemble these in the codec, so the time invariants hold everywhere else
impl Claims {
    pub(crate) fn new(
        meta: ClaimMeta,
        issued_at: UnixTimestamp,
        validity: Duration,
        issuer: &str,
    ) -> Self {
        Claims {
            user_id: meta.user_id,
            role_id: meta.role_id,
            exp: issued_at + validity,
            iat: issued_at,
            iss: issuer.to_string(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    pub fn issued_at(&self) -> UnixTimestamp {
        self.iat
    }

    pub fn expires_at(&self) -> UnixTimestamp {
        self.exp
    }

    pub fn issuer(&self) -> &str {
        &self.iss
    }
}

//--------------------------------------------------------------------------------------------------
