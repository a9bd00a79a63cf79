pub mod transcript;
pub mod transcript_source;
pub mod word_token;
