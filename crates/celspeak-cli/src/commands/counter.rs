use celspeak_core::{Database, DurableStore};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum CounterAction {
    /// Print the number of completed practices
    Show,
    /// Reset the counter to zero
    Reset,
}

pub fn run(action: CounterAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        CounterAction::Show => {
            println!("{}", db.load_practice_count()?.unwrap_or(0));
        }
        CounterAction::Reset => {
            db.save_practice_count(0)?;
            println!("counter reset");
        }
    }
    Ok(())
}
