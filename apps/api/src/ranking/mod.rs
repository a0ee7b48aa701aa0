pub mod fusion;
pub mod handlers;
pub mod heuristics;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod scoring;
pub mod similarity;
pub mod vectorizer;
