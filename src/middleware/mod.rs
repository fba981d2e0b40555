mod auth;
mod staff;

pub use auth::AuthLayer;
pub use staff::StaffLayer;
