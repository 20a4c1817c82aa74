use anyhow::{Context, Result};
use comicgen::core::model::{CHILD_AGE_RANGE, READING_TIME_RANGE};
use comicgen::{Config, GenerationRequest, Pipeline, PipelineState, Story};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, CustomUserError, Text};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            eprintln!(
                "Please ensure 'config.yml' exists (an empty file uses the defaults) \
                 and set OPENAI_API_KEY."
            );
            return Err(e);
        }
    };

    let pipeline = Arc::new(Pipeline::from_config(&config)?);
    let mut args = std::env::args().skip(1);
    let mut request = match args.next() {
        Some(prompt) => Some(request_from_args(prompt, args)?),
        None => None,
    };

    loop {
        let req = match request.take() {
            Some(req) => req,
            None => ask_request()?,
        };

        match run_once(&pipeline, req).await? {
            PipelineState::Success { story } => print_story(&story),
            PipelineState::Error { message } => eprintln!("Oops! {}", message),
            other => eprintln!("Generation ended in unexpected state: {}", other.phase()),
        }

        let again = Confirm::new("Create another comic?")
            .with_default(false)
            .prompt()
            .unwrap_or(false);
        if !again {
            break;
        }
        pipeline.reset();
    }

    Ok(())
}

fn request_from_args(
    prompt: String,
    mut rest: impl Iterator<Item = String>,
) -> Result<GenerationRequest> {
    let minutes = match rest.next() {
        Some(v) => v.parse().context("reading time must be a number of minutes")?,
        None => 5,
    };
    let age = match rest.next() {
        Some(v) => v.parse().context("child age must be a number")?,
        None => 8,
    };
    Ok(GenerationRequest::new(prompt, minutes, age))
}

fn ask_request() -> Result<GenerationRequest> {
    let prompt = Text::new("Comic idea:")
        .with_placeholder("e.g., 'spiderman fights a gorilla'")
        .prompt()?;
    let minutes = ask_number("Reading time (minutes):", READING_TIME_RANGE, 5)?;
    let age = ask_number("Child age (years):", CHILD_AGE_RANGE, 8)?;
    Ok(GenerationRequest::new(prompt, minutes, age))
}

fn ask_number(label: &str, range: RangeInclusive<u32>, default: u32) -> Result<u32> {
    let help = format!("{} to {}", range.start(), range.end());
    let value = CustomType::<u32>::new(label)
        .with_default(default)
        .with_help_message(&help)
        .with_validator(move |v: &u32| -> Result<Validation, CustomUserError> {
            if range.contains(v) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Please choose {} to {}", range.start(), range.end()).into(),
                ))
            }
        })
        .prompt()?;
    Ok(value)
}

/// Runs one attempt and renders its transitions until it settles.
async fn run_once(pipeline: &Arc<Pipeline>, request: GenerationRequest) -> Result<PipelineState> {
    let mut rx = pipeline.subscribe();
    let runner = pipeline.clone();
    let task = tokio::spawn(async move { runner.generate(request).await });

    let bar = ProgressBar::new_spinner();
    bar.enable_steady_tick(Duration::from_millis(120));

    loop {
        let update = match rx.recv().await {
            Ok(update) => update,
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        };

        match &update.state {
            PipelineState::Loading => bar.set_message("Generating story structure..."),
            PipelineState::StoryGenerated { story } => {
                bar.set_message(format!("\"{}\" created! Now generating images...", story.title()))
            }
            PipelineState::GeneratingImages { progress, total, .. } => {
                if bar.length() != Some(*total as u64) {
                    bar.set_length(*total as u64);
                    bar.set_style(
                        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?
                            .progress_chars("=> "),
                    );
                }
                bar.set_position(*progress as u64);
                bar.set_message(format!("Panel {} of {}", progress + 1, total));
            }
            PipelineState::Idle => {}
            PipelineState::Success { .. } | PipelineState::Error { .. } => break,
        }
    }
    bar.finish_and_clear();

    let state = task
        .await
        .context("generation task panicked")?
        .unwrap_or_else(|| pipeline.state());
    Ok(state)
}

fn print_story(story: &Story) {
    println!();
    println!("=== {} ===", story.title());
    for panel in story.panels() {
        println!();
        println!("Panel {}", panel.panel_number);
        match &panel.image {
            Some(image) => println!("  Image: {}", image.url),
            None => println!("  [No image] {}", panel.description),
        }
        println!("  \"{}\"", panel.dialogue);
    }
    println!();
    println!(
        "{} of {} panels illustrated.",
        story.resolved_count(),
        story.total_panels()
    );
}
