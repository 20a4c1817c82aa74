use crate::core::model::Story;

/// Phase of a generation attempt, as seen by the presentation layer.
///
/// Values are snapshots: the pipeline publishes a fresh value on every
/// transition and never mutates one that has been handed out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Loading,
    StoryGenerated {
        story: Story,
    },
    /// `progress` is the zero-based index of the panel whose image is being
    /// requested; panels before it are already resolved or failed.
    GeneratingImages {
        story: Story,
        progress: usize,
        total: usize,
    },
    Success {
        story: Story,
    },
    Error {
        message: String,
    },
}

impl PipelineState {
    pub fn phase(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Loading => "loading",
            PipelineState::StoryGenerated { .. } => "story-generated",
            PipelineState::GeneratingImages { .. } => "generating-images",
            PipelineState::Success { .. } => "success",
            PipelineState::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Success { .. } | PipelineState::Error { .. })
    }

    pub fn story(&self) -> Option<&Story> {
        match self {
            PipelineState::StoryGenerated { story }
            | PipelineState::GeneratingImages { story, .. }
            | PipelineState::Success { story } => Some(story),
            _ => None,
        }
    }
}

/// A published transition, tagged with the attempt that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub generation: u64,
    pub state: PipelineState,
}
