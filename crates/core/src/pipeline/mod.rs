pub mod assess_speech_use_case;
pub mod pipeline_logger;
