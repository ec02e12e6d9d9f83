use clap::Subcommand;
use coindrop_core::storage::Database;

#[derive(Subcommand)]
pub enum ActivityAction {
    /// List all activities
    List,
    /// Add a custom activity
    Add {
        name: String,
        #[arg(long, default_value = "🪙")]
        glyph: String,
    },
    /// Rename a custom activity or change its glyph
    Edit {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        glyph: String,
    },
    /// Remove an activity (past session records are kept)
    Remove { id: String },
    /// Select the activity for new sessions
    Select { id: String },
}

pub fn run(action: ActivityAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        ActivityAction::List => {
            let activities = db.list_activities()?;
            let selected = db.selected_activity_id()?;
            println!("{}", serde_json::to_string_pretty(&activities)?);
            if let Some(id) = selected {
                println!("selected: {id}");
            }
        }
        ActivityAction::Add { name, glyph } => {
            let activity = db.create_activity(&name, &glyph)?;
            println!("{}", serde_json::to_string_pretty(&activity)?);
        }
        ActivityAction::Edit { id, name, glyph } => {
            if !db.update_activity(&id, &name, &glyph)? {
                return Err(format!("no activity with id {id}").into());
            }
        }
        ActivityAction::Remove { id } => {
            if !db.delete_activity(&id)? {
                return Err(format!("no activity with id {id}").into());
            }
        }
        ActivityAction::Select { id } => {
            if db.get_activity(&id)?.is_none() {
                return Err(format!("no activity with id {id}").into());
            }
            db.set_selected_activity(&id)?;
        }
    }
    Ok(())
}
