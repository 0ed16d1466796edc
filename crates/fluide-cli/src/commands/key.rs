use clap::Subcommand;
use fluide_core::{CredentialStore, Database, Provider};

use super::CliResult;

#[derive(Subcommand)]
pub enum KeyAction {
    /// Store the Gemini API key
    Set {
        /// The key; an empty value clears it
        key: String,
    },
    /// Remove the stored key
    Clear,
    /// Check whether a key is available
    Status,
}

pub fn run(action: KeyAction) -> CliResult {
    let db = Database::open()?;
    let credentials = CredentialStore::new(&db);
    let provider = Provider::Gemini;

    match action {
        KeyAction::Set { key } => {
            credentials.set(provider, &key)?;
            if key.trim().is_empty() {
                println!("{provider} key cleared");
            } else {
                println!("{provider} key saved");
            }
        }
        KeyAction::Clear => {
            credentials.clear(provider)?;
            println!("{provider} key cleared");
        }
        KeyAction::Status => {
            let source = if credentials.get(provider).is_some() {
                "stored"
            } else if credentials.has_key(provider) {
                "environment"
            } else {
                "not configured"
            };
            println!("{provider}: {source}");
        }
    }
    Ok(())
}
