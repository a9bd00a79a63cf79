pub mod metrics_extractor;
pub mod metrics_record;
pub mod pause_interval;
