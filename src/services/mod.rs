pub mod image;
pub mod llm;
pub mod outline;
pub mod pipeline;
pub mod planner;
pub mod prompt;
