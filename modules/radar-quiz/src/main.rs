use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use radar_common::Config;
use radar_quiz::{
    grade, revision, FileCache, QuizError, QuizSession, ResumeOutcome, StartOutcome,
};
use radar_store::PgStore;

#[derive(Parser)]
#[command(name = "quiz", about = "Take a quiz from the terminal")]
struct Cli {
    /// Quiz to take.
    #[arg(long)]
    quiz_id: Uuid,

    /// Admission number; identifies the attempt.
    #[arg(long)]
    admission_number: String,

    /// Student name. Asked for when omitted.
    #[arg(long)]
    name: Option<String>,

    /// Where in-progress attempts are cached between runs.
    #[arg(long, env = "QUIZ_CACHE_DIR", default_value = ".quiz-progress")]
    cache_dir: PathBuf,
}

type Input = Lines<BufReader<Stdin>>;

async fn prompt(input: &mut Input, question: &str) -> Result<String> {
    println!("{question}");
    match input.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => bail!("input closed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("radar=warn".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let store = Arc::new(PgStore::connect(&config.database_url).await?);
    let cache = Arc::new(FileCache::new(&cli.cache_dir));

    let mut session =
        QuizSession::open(store, cache, cli.quiz_id, &cli.admission_number).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let name = match cli.name {
        Some(name) => name,
        None => prompt(&mut input, "Your name:").await?,
    };

    let outcome = session.start(&name, false).await?;
    let in_progress = match outcome {
        StartOutcome::Started => true,
        StartOutcome::AlreadySubmitted => false,
        StartOutcome::SavedProgressFound(saved) => {
            println!(
                "Saved progress found: {} answered, at question {}.",
                saved.answers.len(),
                saved.current + 1
            );
            let choice = prompt(&mut input, "[r]esume or [s]tart over?").await?;
            if choice.eq_ignore_ascii_case("r") {
                match session.resume().await? {
                    ResumeOutcome::Resumed { .. } => true,
                    ResumeOutcome::AlreadySubmitted => false,
                    ResumeOutcome::NothingSaved => {
                        session.start(&name, true).await? == StartOutcome::Started
                    }
                }
            } else {
                session.start(&name, true).await? == StartOutcome::Started
            }
        }
    };

    if in_progress {
        take_quiz(&mut session, &mut input).await?;
    }

    show_result(&session);
    session.close().await;
    Ok(())
}

async fn take_quiz(session: &mut QuizSession, input: &mut Input) -> Result<()> {
    loop {
        let Some(question) = session.current_question().cloned() else {
            break;
        };
        let total = session.questions().len();
        println!("\n({}/{}) {}", session.state().current + 1, total, question.question_text);
        for (i, choice) in question.choices.iter().enumerate() {
            println!("  {}. {choice}", i + 1);
        }

        while !session.state().is_locked(question.id) {
            let raw = prompt(input, "Answer:").await?;
            let Some(choice) = raw.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                println!("Enter a number between 1 and {}", question.choices.len());
                continue;
            };
            if let Err(e) = session.answer(question.id, choice) {
                println!("{e}");
            }
        }

        if session.is_last_question() {
            break;
        }
        session.advance()?;
    }

    loop {
        match session.submit().await {
            Ok(_) | Err(QuizError::AlreadySubmitted) => return Ok(()),
            Err(QuizError::Store(e)) => {
                println!("Could not submit: {e}");
                let retry = prompt(input, "Try again? [y/n]").await?;
                if !retry.eq_ignore_ascii_case("y") {
                    println!("Your answers are saved locally; run again to submit.");
                    return Ok(());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn show_result(session: &QuizSession) {
    let Some(submission) = session.submission() else {
        println!("\nThis quiz has already been submitted.");
        return;
    };
    let questions = session.questions();
    println!(
        "\nSubmitted. Score: {}%",
        grade(questions, &submission.answers)
    );
    for (i, item) in revision(questions, &submission.answers).iter().enumerate() {
        let mark = if item.is_correct { "correct" } else { "wrong" };
        let chosen = item
            .chosen
            .and_then(|c| item.choices.get(c))
            .map(String::as_str)
            .unwrap_or("-");
        println!("{}. {} [{mark}] your answer: {chosen}", i + 1, item.question_text);
    }
}
