use clap::Subcommand;
use fluide_core::{ChunkDraft, ChunkPatch, CustomChunkRepository, CustomChunkStore, Database, Theme};

use super::CliResult;

#[derive(Subcommand)]
pub enum ChunksAction {
    /// Add a chunk to a theme
    Add {
        /// Theme name or slug (e.g. "opinions", "desires")
        theme: String,
        /// The French phrase
        text: String,
        /// English translation
        translation: String,
        /// Pronunciation hint
        #[arg(long)]
        phonetic: Option<String>,
    },
    /// List custom chunks, optionally for one theme
    List {
        theme: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a chunk
    Update {
        theme: String,
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        translation: Option<String>,
        /// New pronunciation hint; pass "" to clear it
        #[arg(long)]
        phonetic: Option<String>,
    },
    /// Delete a chunk
    Delete { theme: String, id: String },
    /// Move a chunk to another theme
    Move { from: String, id: String, to: String },
}

fn theme_key(name: &str) -> Result<&'static str, String> {
    name.parse::<Theme>().map(|t| t.as_str())
}

pub fn run(action: ChunksAction) -> CliResult {
    let db = Database::open()?;
    let mut repo = CustomChunkRepository::load(&db);

    match action {
        ChunksAction::Add {
            theme,
            text,
            translation,
            phonetic,
        } => {
            let theme = theme_key(&theme)?;
            let mut draft = ChunkDraft::new(text, translation);
            if let Some(phonetic) = phonetic {
                draft = draft.with_phonetic(phonetic);
            }
            match repo.add(theme, draft)? {
                Some(chunk) => println!("{}", serde_json::to_string_pretty(&chunk)?),
                None => return Err("text and translation must not be empty".into()),
            }
        }
        ChunksAction::List { theme, json } => {
            let themes: Vec<String> = match theme {
                Some(name) => vec![theme_key(&name)?.to_string()],
                None => repo.themes().map(str::to_string).collect(),
            };
            if json {
                let selected: CustomChunkStore = themes
                    .iter()
                    .map(|t| (t.clone(), repo.chunks(t).to_vec()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&selected)?);
                return Ok(());
            }
            if themes.iter().all(|t| repo.chunks(t).is_empty()) {
                println!("no custom chunks");
            }
            for theme in &themes {
                let chunks = repo.chunks(theme);
                if chunks.is_empty() {
                    continue;
                }
                println!("{theme}");
                for chunk in chunks {
                    println!("  {}  {} = {}", chunk.id, chunk.text, chunk.translation);
                }
            }
        }
        ChunksAction::Update {
            theme,
            id,
            text,
            translation,
            phonetic,
        } => {
            let theme = theme_key(&theme)?;
            let patch = ChunkPatch {
                text,
                translation,
                phonetic,
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            if repo.find(theme, &id).is_none() {
                return Err(format!("no chunk {id} in {theme}").into());
            }
            if repo.update(theme, &id, patch)? {
                println!("updated {id}");
            } else {
                println!("unchanged");
            }
        }
        ChunksAction::Delete { theme, id } => {
            let theme = theme_key(&theme)?;
            if !repo.delete(theme, &id)? {
                return Err(format!("no chunk {id} in {theme}").into());
            }
            println!("deleted {id}");
        }
        ChunksAction::Move { from, id, to } => {
            let from = theme_key(&from)?;
            let to = theme_key(&to)?;
            if repo.find(from, &id).is_none() {
                return Err(format!("no chunk {id} in {from}").into());
            }
            if repo.move_to_theme(from, &id, to)? {
                println!("moved {id} to {to}");
            } else {
                println!("unchanged");
            }
        }
    }
    Ok(())
}
