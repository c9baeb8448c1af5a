//! Domain types and DTOs
//!
//! Data structures for the field-service entities: clients and their
//! appliances, technicians, business partners, service tickets and spare
//! part orders.

pub mod appliances;
pub mod clients;
pub mod partners;
pub mod parts;
pub mod services;
pub mod technicians;
pub mod users;

pub use appliances::*;
pub use clients::*;
pub use partners::*;
pub use parts::*;
pub use services::*;
pub use technicians::*;
pub use users::*;
