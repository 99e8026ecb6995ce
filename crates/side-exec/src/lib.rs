pub mod command;
pub mod contracts;
pub mod error;
pub mod host;
pub mod search;

pub use command::*;
pub use contracts::*;
pub use error::*;
pub use host::*;
pub use search::*;
