pub mod actions;
pub mod config;
pub mod editor;
pub mod language;
pub mod persistence;
pub mod reducer;
pub mod state;
pub mod tree;

pub use actions::*;
pub use config::*;
pub use editor::*;
pub use reducer::*;
pub use state::*;
pub use tree::*;

pub use persistence::*;
