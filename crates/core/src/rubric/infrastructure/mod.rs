pub mod ollama_scorer;
pub mod scripted_scorer;
pub mod timeout_scorer;
