pub mod run_recorder;
pub mod run_report;
