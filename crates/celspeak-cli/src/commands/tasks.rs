use celspeak_core::commands::format_mm_ss;
use celspeak_core::{Config, TaskCatalog};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum TasksAction {
    /// List all tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one task with its sample prompts
    Show {
        /// Task ID
        id: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: TasksAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = TaskCatalog::for_config(&Config::load_or_default())?;
    match action {
        TasksAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.tasks())?);
                return Ok(());
            }
            for task in catalog.tasks() {
                let image = if task.requires_image { "  [image]" } else { "" };
                println!(
                    "{:>2}  {:<40} prep {}  speak {}{image}",
                    task.id,
                    task.title,
                    format_mm_ss(task.prep_time),
                    format_mm_ss(task.speak_time),
                );
            }
        }
        TasksAction::Show { id, json } => {
            let task = catalog.get(id).ok_or_else(|| format!("unknown task: {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(task)?);
                return Ok(());
            }
            println!("Task {}: {}", task.id, task.title);
            println!("{}", task.description);
            println!(
                "Preparation {}, speaking {}",
                format_mm_ss(task.prep_time),
                format_mm_ss(task.speak_time)
            );
            if task.requires_image {
                println!("Requires an image.");
            }
            println!();
            for (i, sample) in task.samples.iter().enumerate() {
                println!("  [{i}] {sample}");
            }
            if let Some(helper) = &task.helper {
                println!();
                println!("{}:", helper.title);
                for point in &helper.points {
                    println!("  - {point}");
                }
            }
        }
    }
    Ok(())
}
