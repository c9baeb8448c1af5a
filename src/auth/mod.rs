pub mod claims;
pub mod extract;

pub use claims::{Actor, ActorRole, Claims};
pub use extract::RequireAuth;
