pub mod achievement;
pub mod plan;
pub mod record;
pub mod task;
pub mod term;
pub mod ticket;

pub use achievement::*;
pub use plan::*;
pub use record::*;
pub use task::*;
pub use term::*;
pub use ticket::*;
