pub mod format;
pub mod keys;
pub mod store;
pub mod ticker;
