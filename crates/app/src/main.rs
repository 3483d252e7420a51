use std::fmt;

use progress_core::model::{ClassId, PracticeSession, StudentEmail};
use progress_core::policy::ProgressPolicy;
use serde::Serialize;
use services::{AppServices, Clock};

mod args;

use args::{Args, ArgsError, Command, print_usage};

#[derive(Debug)]
enum RunError {
    NotSignedIn,
    NoStudentRecord(StudentEmail),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::NotSignedIn => write!(f, "no --email given and nobody is signed in"),
            RunError::NoStudentRecord(email) => write!(f, "no student record for {email}"),
        }
    }
}

impl std::error::Error for RunError {}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `--email` if given, otherwise the signed-in user's email.
async fn resolve_email(
    app: &AppServices,
    raw: Option<&str>,
) -> Result<StudentEmail, Box<dyn std::error::Error>> {
    if let Some(raw) = raw {
        return Ok(StudentEmail::parse(raw)?);
    }
    let user = app.auth().current_user().await?.ok_or(RunError::NotSignedIn)?;
    Ok(user.email)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()).map_err(
        |e| {
            eprintln!("{e}");
            print_usage();
            e
        },
    )?;

    if parsed.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let clock = parsed.today.map_or_else(Clock::default_clock, Clock::fixed_on);
    let mut policy = ProgressPolicy::default();
    if let Some(class_id) = parsed.class_id.as_deref() {
        policy = policy.with_default_class(class_id)?;
    }
    let class_id: ClassId = policy.default_class_id().clone();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, clock, policy).await?;
    log::debug!("using {} on {}", parsed.db_url, clock.today());

    match parsed.command {
        Command::SignIn => {
            let email = parsed
                .email
                .as_deref()
                .ok_or(ArgsError::MissingFlag { flag: "--email" })?;
            let user = app
                .auth()
                .sign_in(parsed.name.as_deref().unwrap_or(""), email, parsed.role)
                .await?;
            print_json(&user)
        }
        Command::SignOut => {
            app.auth().sign_out().await?;
            Ok(())
        }
        Command::WhoAmI => print_json(&app.auth().current_user().await?),
        Command::Practice => {
            let correct = parsed
                .correct
                .ok_or(ArgsError::MissingFlag { flag: "--correct" })?;
            let incorrect = parsed
                .incorrect
                .ok_or(ArgsError::MissingFlag { flag: "--incorrect" })?;
            let email = resolve_email(&app, parsed.email.as_deref()).await?;

            let mut session = PracticeSession::new(correct, incorrect);
            session.time_minutes = parsed.minutes;
            session.subject = parsed.subject;

            let record = app
                .progress()
                .complete_practice_session(&email, session)
                .await?
                .ok_or_else(|| RunError::NoStudentRecord(email.clone()))?;
            print_json(&record)
        }
        Command::Student => {
            let email = resolve_email(&app, parsed.email.as_deref()).await?;
            let record = app
                .progress()
                .get_student(&email)
                .await?
                .ok_or_else(|| RunError::NoStudentRecord(email.clone()))?;
            print_json(&record)
        }
        Command::Students => print_json(&app.progress().list_students().await?),
        Command::Class => print_json(&app.classes().class_overview(&class_id).await?),
        Command::Seed => print_json(&app.classes().seed_default_roster().await?),
        Command::Help => Ok(()),
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
