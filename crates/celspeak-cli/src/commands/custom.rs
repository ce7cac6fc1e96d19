use celspeak_core::{Database, DurableStore};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum CustomAction {
    /// Print the saved custom prompt
    Show,
    /// Replace the saved custom prompt
    Set {
        /// Prompt text
        text: String,
    },
    /// Clear the saved custom prompt
    Clear,
}

pub fn run(action: CustomAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        CustomAction::Show => {
            println!("{}", db.load_custom_text()?.unwrap_or_default());
        }
        CustomAction::Set { text } => {
            db.save_custom_text(&text)?;
            println!("ok");
        }
        CustomAction::Clear => {
            db.save_custom_text("")?;
            println!("custom prompt cleared");
        }
    }
    Ok(())
}
