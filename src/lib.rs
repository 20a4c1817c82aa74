pub mod core;
pub mod services;

pub use crate::core::config::Config;
pub use crate::core::error::{ComicError, ComicResult, ParseError, UpstreamStage};
pub use crate::core::model::{GenerationRequest, ImageRef, Panel, Story};
pub use crate::core::state::{PipelineState, StateUpdate};
pub use crate::services::pipeline::Pipeline;
