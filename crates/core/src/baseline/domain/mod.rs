pub mod baseline_comparator;
pub mod baseline_profile;
pub mod verdict;
