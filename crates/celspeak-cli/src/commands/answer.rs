use std::path::PathBuf;

use celspeak_core::generation::build_prompt;
use celspeak_core::{
    Config, GeminiClient, GenerationRequest, GenerationService, ImageAttachment, TaskCatalog,
};
use clap::Args;

#[derive(Args)]
pub struct AnswerArgs {
    /// Task ID
    #[arg(long)]
    task: u32,
    /// Sample prompt index
    #[arg(long, default_value = "0", conflicts_with = "custom")]
    sample: usize,
    /// Custom prompt text instead of a sample
    #[arg(long)]
    custom: Option<String>,
    /// Image to send with picture tasks
    #[arg(long)]
    image: Option<PathBuf>,
}

pub fn run(args: AnswerArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let catalog = TaskCatalog::for_config(&config)?;
    let task = catalog
        .get(args.task)
        .ok_or_else(|| format!("unknown task: {}", args.task))?;

    let prompt_text = match &args.custom {
        Some(text) => text.trim().to_string(),
        None => task
            .sample(args.sample)
            .ok_or_else(|| {
                format!(
                    "sample {} is out of range (task has {})",
                    args.sample,
                    task.sample_count()
                )
            })?
            .to_string(),
    };
    if prompt_text.is_empty() {
        return Err("prompt text is empty".into());
    }

    let image = match &args.image {
        Some(path) if task.requires_image => Some(ImageAttachment::from_path(path)?),
        Some(_) => {
            tracing::warn!("task {} does not use an image; ignoring it", task.id);
            None
        }
        None => None,
    };

    let request = GenerationRequest {
        prompt: build_prompt(task, &prompt_text),
        image,
    };
    let client = GeminiClient::from_config(&config.generation)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let text = runtime.block_on(client.generate(&request))?;
    println!("{}", text.trim());
    Ok(())
}
