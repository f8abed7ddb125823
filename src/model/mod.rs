pub mod checklist;
pub mod config;
pub mod project;
pub mod state;

pub use checklist::*;
pub use config::*;
pub use project::*;
pub use state::*;
