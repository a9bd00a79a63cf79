pub mod file_run_recorder;
