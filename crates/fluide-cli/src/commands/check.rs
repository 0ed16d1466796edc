use fluide_core::{Config, CredentialStore, Database, Feedback, GeminiClient, GrammarChecker, GrammarError};

use super::{runtime, CliResult};

pub fn run(chunk: &str, sentence: &str) -> CliResult {
    let sentence = sentence.trim();
    if sentence.is_empty() {
        return Err("sentence must not be empty".into());
    }

    let config = Config::load();
    let db = Database::open()?;
    let client = client(&db, &config)?;

    let rt = runtime()?;
    let feedback = rt.block_on(client.check(chunk.trim(), sentence))?;
    print_feedback(&feedback);
    Ok(())
}

/// A client for the stored key, with a hint when there is none.
pub fn client(db: &Database, config: &Config) -> Result<GeminiClient, GrammarError> {
    let credentials = CredentialStore::new(db);
    GeminiClient::from_credentials(&credentials, &config.grammar).map_err(|e| match e {
        GrammarError::CredentialMissing { provider } => {
            eprintln!("hint: run `fluide key set <KEY>` or set FLUIDE_GEMINI_API_KEY");
            GrammarError::CredentialMissing { provider }
        }
        other => other,
    })
}

pub fn print_feedback(feedback: &Feedback) {
    if feedback.is_correct {
        println!("Correct! {}", feedback.explanation);
    } else {
        println!("Not quite. {}", feedback.explanation);
        if let Some(correction) = &feedback.correction {
            println!("Correction: {correction}");
        }
    }
}
