use clap::Subcommand;
use fluide_core::{Database, HistoryLedger};

use super::CliResult;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show one session in full
    Show {
        /// Date as YYYY-MM-DD
        date: String,
    },
}

pub fn run(action: HistoryAction) -> CliResult {
    let db = Database::open()?;
    let ledger = HistoryLedger::load(&db);

    match action {
        HistoryAction::List { json, limit } => {
            let sessions = ledger.list_all();
            let sessions = &sessions[..limit.unwrap_or(sessions.len()).min(sessions.len())];
            if json {
                println!("{}", serde_json::to_string_pretty(sessions)?);
                return Ok(());
            }
            if sessions.is_empty() {
                println!("no sessions yet");
            }
            for session in sessions {
                print!(
                    "{}  {:<22} {} chunk(s), {} sentence(s)",
                    session.date,
                    session.theme,
                    session.selected_chunks.len(),
                    session.sentence_count()
                );
                if let Some(above) = session.time_above_target_minutes {
                    print!(", +{above} min");
                }
                println!();
            }
        }
        HistoryAction::Show { date } => {
            let date = date
                .parse()
                .map_err(|_| format!("invalid date: {date} (expected YYYY-MM-DD)"))?;
            let Some(session) = ledger.get(date) else {
                return Err(format!("no session on {date}").into());
            };
            println!("{}", serde_json::to_string_pretty(session)?);
        }
    }
    Ok(())
}
