pub mod rubric_exchange;
pub mod rubric_parser;
pub mod rubric_prompt;
pub mod rubric_record;
pub mod scorer;
