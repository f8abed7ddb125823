pub mod kv;
pub mod lock;
pub mod project_io;
pub mod recovery;
