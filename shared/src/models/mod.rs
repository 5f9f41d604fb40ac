//! Domain models, one file per resource collection

mod contact;
mod driver;
mod location;
mod order;
mod user;

pub use contact::*;
pub use driver::*;
pub use location::*;
pub use order::*;
pub use user::*;
