pub mod listing;
pub mod review;
pub mod user;

pub use listing::*;
pub use review::*;
pub use user::*;
