use std::io::Write;

use fluide_core::curriculum::{self, Curriculum};
use tokio::io::{AsyncBufRead, Lines};
use fluide_core::timer::now_ms;
use fluide_core::{
    AlertScheduler, AudioContext, Chunk, Config, CoreError, CountdownState, CustomChunkRepository,
    Database, GeminiClient, GrammarError, HistoryLedger, PracticePhase, PracticeSession,
    WeeklyPlan,
};

use super::check::{client, print_feedback};
use super::timer::{drive, logged_summary, print_event, stdin_lines, Input};
use super::{resolve_day, runtime, today, CliResult};
use selection::parse_picks;

type Routine = PracticeSession<&'static AudioContext>;

pub fn run(day: Option<&str>) -> CliResult {
    let day = resolve_day(day)?;
    let config = Config::load();
    let plan = WeeklyPlan::standard();
    let db = Database::open()?;
    let repo = CustomChunkRepository::load(&db);
    let mut ledger = HistoryLedger::load(&db);

    let alert = AlertScheduler::from_config(AudioContext::shared(), &config.alert);
    let mut session: Routine = PracticeSession::new(alert, &config.timers);

    if let Some(day_plan) = plan.plan(day) {
        println!("{day}: {}\n{}", day_plan.theme, day_plan.description);
        if let Some(task) = day_plan.task() {
            println!("Task: {task}");
        }
    }

    session.begin(day, &plan, repo.store(), &mut rand::thread_rng())?;

    let rt = runtime()?;
    rt.block_on(async {
        let mut input = stdin_lines();

        if session.phase() == PracticePhase::Select {
            let offered = curriculum::list_for_day(day, repo.store(), &plan);
            select(&mut session, &offered, &mut input).await?;
            session.go_to(PracticePhase::Drill)?;
        }

        drill(&mut session, &mut input).await?;

        session.go_to(PracticePhase::Integrate)?;
        integrate(&mut session, &db, &config, &mut input).await?;

        session.go_to(PracticePhase::Monologue)?;
        monologue(&mut session, &mut input).await?;

        loop {
            match session.finish(today(), &mut ledger) {
                Ok(_) => break,
                Err(e) => {
                    eprintln!("error: could not save the session: {e}");
                    if !confirm("Try again?", &mut input).await? {
                        return Err(e.into());
                    }
                }
            }
        }
        println!("\nSession saved. À demain !");
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Ask and wait for one line. A closed input ends the routine.
async fn prompt<R>(question: &str, input: &mut Lines<R>) -> std::io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    print!("{question} ");
    std::io::stdout().flush()?;
    input
        .next_line()
        .await?
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "input closed"))
}

async fn confirm(question: &str, input: &mut Input) -> std::io::Result<bool> {
    let answer = prompt(&format!("{question} [y/N]"), input).await?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn select(session: &mut Routine, offered: &[Chunk], input: &mut Input) -> CliResult {
    println!("\nStep 1: pick up to 3 chunks");
    for (i, chunk) in offered.iter().enumerate() {
        println!("  {:>2}. {:<32} {}", i + 1, chunk.text, chunk.translation);
    }
    loop {
        let line = prompt("Numbers (e.g. 1 3 4):", input).await?;
        for index in parse_picks(&line, offered.len()) {
            session.toggle_chunk(&offered[index])?;
        }
        if !session.selected().is_empty() {
            return Ok(());
        }
        println!("Pick at least one chunk.");
    }
}

fn show_chunk(chunk: &Chunk, index: usize, total: usize) {
    println!("\nChunk {} of {total}", index + 1);
    println!("  {}", chunk.text);
    if let Some(phonetic) = &chunk.phonetic {
        println!("  {phonetic}");
    }
    println!("  {}", chunk.translation);
}

/// Run the active countdown until it and its alert finish, or Enter.
async fn run_countdown(session: &mut Routine, input: &mut Input) -> CliResult {
    let monologue = session.phase() == PracticePhase::Monologue;
    let started = if monologue {
        session.start_monologue(now_ms())?
    } else {
        session.start_drill(now_ms())?
    };
    if let Some(event) = started {
        print_event(&event, false)?;
    }

    let outcome = drive(
        |now| {
            let events = session.advance_to(now);
            let timer = if monologue {
                session.monologue_timer()
            } else {
                session.drill_timer()
            };
            let done = timer.state() == CountdownState::Expired && !session.alert().is_active();
            (events, done)
        },
        input,
        false,
    )
    .await?;
    tracing::debug!(?outcome, "countdown finished");

    let paused = if monologue {
        session.pause_monologue()
    } else {
        session.pause_drill()
    };
    if let Some(event) = paused {
        print_event(&event, false)?;
    }
    // Silence a still-repeating alert.
    if monologue {
        session.reset_monologue();
    } else {
        session.reset_drill();
    }
    Ok(())
}

async fn drill(session: &mut Routine, input: &mut Input) -> CliResult {
    println!("\nStep 2: the drill. Repeat each chunk aloud, no pauses.");
    let total = session.selected().len();
    loop {
        if let Some(chunk) = session.drill_chunk() {
            show_chunk(chunk, session.drill_index(), total);
        }
        loop {
            let question = format!(
                "[Enter] start {}s timer, [n] next:",
                session.drill_timer().duration_secs()
            );
            let answer = prompt(&question, input).await?;
            if answer.trim() == "n" {
                break;
            }
            run_countdown(session, input).await?;
            println!("{}", logged_summary(session.drill_target(), session.drill_timer().elapsed_secs()));
        }
        if !session.next_chunk() {
            return Ok(());
        }
    }
}

async fn integrate(
    session: &mut Routine,
    db: &Database,
    config: &Config,
    input: &mut Input,
) -> CliResult {
    println!("\nStep 3: write one sentence with each chunk.");
    let mut checker: Option<GeminiClient> = None;
    let mut checks_enabled = true;

    let chunks: Vec<Chunk> = session.selected().to_vec();
    for chunk in &chunks {
        let sentence = prompt(&format!("\n{}:", chunk.text), input).await?;
        if sentence.trim().is_empty() {
            continue;
        }
        session.set_sentence(&chunk.id, &sentence)?;

        if !checks_enabled || !confirm("Check grammar?", input).await? {
            continue;
        }
        if checker.is_none() {
            match client(db, config) {
                Ok(c) => checker = Some(c),
                Err(e) => {
                    eprintln!("{e}");
                    checks_enabled = false;
                    continue;
                }
            }
        }
        let Some(c) = checker.as_ref() else {
            continue;
        };
        match session.check_sentence(c, &chunk.id).await {
            Ok(feedback) => print_feedback(&feedback),
            Err(CoreError::Grammar(GrammarError::Upstream(message))) => {
                tracing::warn!(%message, "grammar check failed");
                println!("Something went wrong.");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

async fn monologue(session: &mut Routine, input: &mut Input) -> CliResult {
    println!("\nStep 4: monologue. Talk using all your chunks.");
    let topic = prompt("Your topic / prompt:", input).await?;
    session.set_monologue_prompt(&topic);

    println!("Recall cheat sheet:");
    for chunk in session.selected() {
        match session.sentence(&chunk.id) {
            Some(sentence) if !sentence.trim().is_empty() => {
                println!("  {} -> {sentence}", chunk.text)
            }
            _ => println!("  {}", chunk.text),
        }
    }

    loop {
        let question = format!(
            "[Enter] start {}s timer",
            session.monologue_timer().duration_secs()
        );
        prompt(&question, input).await?;
        run_countdown(session, input).await?;
        println!(
            "{}",
            logged_summary(session.monologue_target(), session.monologue_timer().elapsed_secs())
        );
        if !confirm("Another round?", input).await? {
            return Ok(());
        }
    }
}


mod selection {
    /// Zero-based indexes from a line like "1 3, 4". Out-of-range and
    /// repeated numbers are skipped.
    pub fn parse_picks(line: &str, len: usize) -> Vec<usize> {
        let mut picks = Vec::new();
        for token in line.split(|c: char| c.is_whitespace() || c == ',') {
            let Ok(n) = token.parse::<usize>() else {
                continue;
            };
            if (1..=len).contains(&n) && !picks.contains(&(n - 1)) {
                picks.push(n - 1);
            }
        }
        picks
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn picks_are_one_based_and_deduplicated() {
            assert_eq!(parse_picks("1 3, 4", 5), vec![0, 2, 3]);
            assert_eq!(parse_picks("2 2 9 x", 5), vec![1]);
            assert!(parse_picks("", 5).is_empty());
        }
    }
}
