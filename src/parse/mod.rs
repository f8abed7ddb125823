pub mod checklist_parser;

pub use checklist_parser::{parse_checklist, slugify};
