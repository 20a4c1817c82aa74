use crate::core::config::{is_configured_credential, Config};
use crate::core::error::{ComicError, ComicResult};
use crate::core::model::{GenerationRequest, Story};
use crate::core::state::{PipelineState, StateUpdate};
use crate::services::image::{ImageClient, OpenAIImageClient};
use crate::services::llm::{CompletionOptions, OpenAIClient, OutlineClient};
use crate::services::{outline, planner, prompt};
use anyhow::Result;
use log::{debug, info, warn};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::broadcast;

/// Transitions buffered per subscriber. An outline with very many panels can
/// outrun a slow subscriber, which then sees `RecvError::Lagged` and should
/// resume from the next update or read `Pipeline::state`.
pub const STATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
struct Slot {
    generation: u64,
    state: PipelineState,
}

/// Drives one comic generation at a time and owns the observable state.
///
/// Every call to [`Pipeline::generate`] or [`Pipeline::reset`] starts a new
/// generation id. Transitions produced under an older id are dropped, and an
/// attempt that notices it was superseded stops before issuing further calls.
/// Calls already in flight are not aborted.
#[derive(Debug)]
pub struct Pipeline {
    outline: OutlineClient,
    images: ImageClient,
    api_key: String,
    slot: Mutex<Slot>,
    tx: broadcast::Sender<StateUpdate>,
}

impl Pipeline {
    pub fn new(outline: OutlineClient, images: ImageClient, api_key: impl Into<String>) -> Self {
        let (tx, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Self {
            outline,
            images,
            api_key: api_key.into(),
            slot: Mutex::new(Slot {
                generation: 0,
                state: PipelineState::Idle,
            }),
            tx,
        }
    }

    /// Wires OpenAI backed clients from the loaded configuration. The
    /// credential is resolved once here; an unconfigured key is reported by
    /// the first `generate` call rather than at construction.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key();
        let llm = OpenAIClient::new(&api_key, &config.llm)?;
        let generator = OpenAIImageClient::new(&api_key, &config.llm, &config.image)?;

        Ok(Self::new(
            OutlineClient::new(Box::new(llm), CompletionOptions::from(&config.llm)),
            ImageClient::new(Box::new(generator), config.image.clone()),
            api_key,
        ))
    }

    /// Current snapshot.
    pub fn state(&self) -> PipelineState {
        self.lock().state.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Receives every transition published after this call, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.tx.subscribe()
    }

    /// Abandons the current attempt and returns observers to Idle.
    pub fn reset(&self) {
        let mut slot = self.lock();
        slot.generation += 1;
        info!("Pipeline reset (generation {})", slot.generation);
        self.store(&mut slot, PipelineState::Idle);
    }

    /// Runs one attempt to completion.
    ///
    /// Returns the terminal state reached, or `None` when the attempt was
    /// superseded by `reset` or a newer `generate` before finishing.
    pub async fn generate(&self, request: GenerationRequest) -> Option<PipelineState> {
        let generation = self.begin();

        if let Err(e) = self.check_gate(&request) {
            warn!("Rejected request: {}", e);
            return self.finish(generation, PipelineState::Error { message: e.to_string() });
        }

        if !self.publish(generation, PipelineState::Loading) {
            return None;
        }

        let story = match self.build_story(&request).await {
            Ok(story) => story,
            Err(e) => {
                warn!("Outline stage failed: {}", e);
                let message = format!("Failed to generate story: {}", e);
                return self.finish(generation, PipelineState::Error { message });
            }
        };

        if !self.publish(generation, PipelineState::StoryGenerated { story: story.clone() }) {
            return None;
        }

        let story = self.illustrate(generation, story).await?;
        self.finish(generation, PipelineState::Success { story })
    }

    fn check_gate(&self, request: &GenerationRequest) -> ComicResult<()> {
        request.validate()?;
        if !is_configured_credential(&self.api_key) {
            return Err(ComicError::validation("Please configure your OpenAI API key"));
        }
        Ok(())
    }

    async fn build_story(&self, request: &GenerationRequest) -> ComicResult<Story> {
        let panel_count = planner::plan(request.reading_time_minutes, request.child_age);
        info!(
            "Requesting outline: {} panels for age {} ({} min)",
            panel_count, request.child_age, request.reading_time_minutes
        );

        let prompt = prompt::outline_prompt(request, panel_count);
        let raw = self.outline.request_outline(&prompt).await?;
        let story = outline::parse(&raw)?;

        if story.total_panels() != panel_count as usize {
            debug!(
                "Outline has {} panels, {} were requested",
                story.total_panels(),
                panel_count
            );
        }
        Ok(story)
    }

    /// Requests artwork panel by panel. A failed panel keeps no image and the
    /// loop moves on; only supersession stops it early.
    async fn illustrate(&self, generation: u64, mut story: Story) -> Option<Story> {
        let total = story.total_panels();

        for index in 0..total {
            let snapshot = PipelineState::GeneratingImages {
                story: story.clone(),
                progress: index,
                total,
            };
            if !self.publish(generation, snapshot) {
                return None;
            }

            let panel = &story.panels()[index];
            let result = self.images.request_image(panel).await;
            match result {
                Ok(image) => {
                    debug!("Panel {} illustrated: {}", panel.panel_number, image.url);
                    story = story.with_image(index, Some(image));
                }
                Err(e) => {
                    warn!("Panel {} left without image: {}", panel.panel_number, e);
                }
            }
        }

        Some(story)
    }

    fn begin(&self) -> u64 {
        let mut slot = self.lock();
        slot.generation += 1;
        info!("Starting generation {}", slot.generation);
        slot.generation
    }

    fn finish(&self, generation: u64, state: PipelineState) -> Option<PipelineState> {
        if self.publish(generation, state.clone()) {
            Some(state)
        } else {
            None
        }
    }

    /// Stores and broadcasts `state` if `generation` is still current.
    fn publish(&self, generation: u64, state: PipelineState) -> bool {
        let mut slot = self.lock();
        if slot.generation != generation {
            warn!(
                "Dropping {} from stale generation {} (current {})",
                state.phase(),
                generation,
                slot.generation
            );
            return false;
        }
        self.store(&mut slot, state);
        true
    }

    fn store(&self, slot: &mut MutexGuard<'_, Slot>, state: PipelineState) {
        info!("Pipeline: {} -> {}", slot.state.phase(), state.phase());
        slot.state = state.clone();
        // No subscribers is fine; the snapshot is still readable via state().
        let _ = self.tx.send(StateUpdate {
            generation: slot.generation,
            state,
        });
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
