pub mod builtin_lexicons;
pub mod lexicon;
pub mod lexicon_store;
