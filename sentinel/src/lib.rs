//--------------------------------------------------------------------------------------------------

pub mod claims;
pub mod codec;
#[cfg(feature = "axum-extract")]
pub mod extract;
pub mod limiter;
pub mod revocation;
mod role;
mod unixtime;

pub use claims::{ClaimMeta, Claims};
pub use codec::TokenCodec;
pub use role::{Role, RoleId, ADMIN, NORMAL};
pub use unixtime::UnixTimestamp;

//--------------------------------------------------------------------------------------------------
