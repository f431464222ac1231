//! Value Objects

pub mod identity_key;
pub mod login_method;
pub mod outlet_id;
pub mod user_id;

pub use identity_key::IdentityKey;
pub use login_method::LoginMethod;
pub use outlet_id::OutletId;
pub use user_id::UserId;
