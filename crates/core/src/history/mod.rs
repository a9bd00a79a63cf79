pub mod domain;
pub mod history_summary;
pub mod infrastructure;
