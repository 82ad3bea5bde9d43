use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Role identifiers
//--------------------------------------------------------------------------------------------------

// Roles stay a flat value comparison - this is deliberately not a policy engine

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(i16);

pub const ADMIN: RoleId = RoleId(1);
pub const NORMAL: RoleId = RoleId(2);

impl RoleId {
    pub const fn new(value: i16) -> Self {
        RoleId(value)
    }

    pub const fn value(self) -> i16 {
        self.0
    }
}

// Zero-sized markers implement this so routes can demand a role at the type level
pub trait Role {
    fn role_id() -> RoleId;
}

//--------------------------------------------------------------------------------------------------
