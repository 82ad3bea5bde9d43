use sentinel::{Role, RoleId};

//--------------------------------------------------------------------------------------------------
// Role markers for route gating
//--------------------------------------------------------------------------------------------------

pub struct AdminRole;

impl Role for AdminRole {
    fn role_id() -> RoleId {
        sentinel::ADMIN
    }
}

//--------------------------------------------------------------------------------------------------
