//! Database model definitions

mod pagination;
mod reservation;
mod room;

pub use pagination::*;
pub use reservation::*;
pub use room::*;
