use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::Result;
use crate::pagination::{PageParams, MAX_PAGE_LIMIT};
use crate::storage::SqliteStorage;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle history commands
pub fn handle_history(command: HistoryCommand, config: &Config) -> Result<()> {
    let storage = match &config.storage.path {
        Some(path) => SqliteStorage::new_with_path(path)?,
        None => SqliteStorage::new()?,
    };

    match command {
        HistoryCommand::List { owner, limit } => {
            let params = PageParams::first(limit.unwrap_or(MAX_PAGE_LIMIT));
            let page = storage.list_page(&owner, &params)?;

            if page.chats.is_empty() {
                println!("{}", format!("No chats found for {}.", owner).yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Visibility".bold(),
                "Created".bold()
            ]);

            for chat in &page.chats {
                let title = if chat.title.len() > 40 {
                    format!("{}...", &chat.title[..37])
                } else {
                    chat.title.clone()
                };
                let created = chat.created_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    chat.id.cyan(),
                    title,
                    chat.visibility,
                    created
                ]);
            }

            println!("\nChat History for {}:", owner);
            table.printstd();
            println!();
            if page.has_more {
                println!(
                    "More chats exist; raise {} to see older entries.",
                    "--limit".cyan()
                );
                println!();
            }
        }
        HistoryCommand::Delete { owner, id } => {
            storage.delete_chat(&owner, &id)?;
            println!("{}", format!("Deleted chat {}", id).green());
        }
    }

    Ok(())
}
