use std::fmt;

use chrono::NaiveDate;
use progress_core::model::{Role, Subject};

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidCount { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidDate { raw: String },
    InvalidRole { raw: String },
    InvalidSubject { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidCount { flag, raw } => {
                write!(f, "invalid {flag} value (expected a non-negative integer): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDate { raw } => {
                write!(f, "invalid --today value (expected YYYY-MM-DD): {raw}")
            }
            ArgsError::InvalidRole { raw } => write!(f, "invalid --role value: {raw}"),
            ArgsError::InvalidSubject { raw } => write!(f, "invalid --subject value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app sign-in  --email <email> [--name <name>] [--role student|teacher]");
    eprintln!("  app sign-out");
    eprintln!("  app whoami");
    eprintln!("  app practice --correct <n> --incorrect <n> [--email <email>]");
    eprintln!("               [--minutes <n>] [--subject quant|logical|verbal]");
    eprintln!("  app student  [--email <email>]");
    eprintln!("  app students");
    eprintln!("  app class    [--class-id <id>]");
    eprintln!("  app seed");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>   (default: sqlite://progress.sqlite3)");
    eprintln!("  --today <date>      pin the calendar date, YYYY-MM-DD");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PROGRESS_DB_URL, PROGRESS_CLASS_ID, PROGRESS_TODAY, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SignIn,
    SignOut,
    WhoAmI,
    Practice,
    Student,
    Students,
    Class,
    Seed,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "sign-in" => Some(Self::SignIn),
            "sign-out" => Some(Self::SignOut),
            "whoami" => Some(Self::WhoAmI),
            "practice" => Some(Self::Practice),
            "student" => Some(Self::Student),
            "students" => Some(Self::Students),
            "class" => Some(Self::Class),
            "seed" => Some(Self::Seed),
            "--help" | "-h" | "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Parsed command line, with environment fallbacks already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub command: Command,
    pub db_url: String,
    pub today: Option<NaiveDate>,
    pub class_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub correct: Option<u32>,
    pub incorrect: Option<u32>,
    pub minutes: Option<u32>,
    pub subject: Option<Subject>,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_count(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ArgsError::InvalidCount { flag, raw })
}

fn parse_date(raw: String) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ArgsError::InvalidDate { raw })
}

impl Args {
    /// Parse `argv` (without the program name), falling back to `env` lookups.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter();
        let command = match args.next() {
            None => Command::Help,
            Some(first) => {
                Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?
            }
        };

        let mut parsed = Self {
            command,
            db_url: env("PROGRESS_DB_URL")
                .map_or_else(|| "sqlite://progress.sqlite3".into(), normalize_sqlite_url),
            today: env("PROGRESS_TODAY").map(parse_date).transpose()?,
            class_id: env("PROGRESS_CLASS_ID").filter(|v| !v.trim().is_empty()),
            email: None,
            name: None,
            role: Role::Student,
            correct: None,
            incorrect: None,
            minutes: None,
            subject: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--today" => {
                    parsed.today = Some(parse_date(require_value(&mut args, "--today")?)?);
                }
                "--class-id" => {
                    parsed.class_id = Some(require_value(&mut args, "--class-id")?);
                }
                "--email" => parsed.email = Some(require_value(&mut args, "--email")?),
                "--name" => parsed.name = Some(require_value(&mut args, "--name")?),
                "--role" => {
                    let value = require_value(&mut args, "--role")?;
                    parsed.role = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidRole { raw: value.clone() })?;
                }
                "--correct" => {
                    let value = require_value(&mut args, "--correct")?;
                    parsed.correct = Some(parse_count("--correct", value)?);
                }
                "--incorrect" => {
                    let value = require_value(&mut args, "--incorrect")?;
                    parsed.incorrect = Some(parse_count("--incorrect", value)?);
                }
                "--minutes" => {
                    let value = require_value(&mut args, "--minutes")?;
                    parsed.minutes = Some(parse_count("--minutes", value)?);
                }
                "--subject" => {
                    let value = require_value(&mut args, "--subject")?;
                    parsed.subject = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidSubject { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => parsed.command = Command::Help,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

/// Turn a relative `sqlite:` path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_owned()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn practice_flags_parse() {
        let args = Args::parse(
            argv(&[
                "practice",
                "--correct",
                "8",
                "--incorrect",
                "2",
                "--subject",
                "verbal",
                "--today",
                "2024-05-01",
            ]),
            no_env,
        )
        .unwrap();
        assert_eq!(args.command, Command::Practice);
        assert_eq!(args.correct, Some(8));
        assert_eq!(args.incorrect, Some(2));
        assert_eq!(args.subject, Some(Subject::Verbal));
        assert_eq!(args.today, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(args.db_url, "sqlite://progress.sqlite3");
    }

    #[test]
    fn negative_counts_are_rejected() {
        let err = Args::parse(argv(&["practice", "--correct", "-1"]), no_env).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidCount { flag: "--correct", .. }));
    }

    #[test]
    fn env_supplies_defaults_and_flags_override() {
        let env = |key: &str| match key {
            "PROGRESS_DB_URL" => Some("sqlite:///tmp/p.db".to_owned()),
            "PROGRESS_CLASS_ID" => Some("evening".to_owned()),
            _ => None,
        };
        let args = Args::parse(argv(&["class"]), env).unwrap();
        assert_eq!(args.db_url, "sqlite:///tmp/p.db");
        assert_eq!(args.class_id.as_deref(), Some("evening"));

        let args = Args::parse(argv(&["class", "--class-id", "morning"]), env).unwrap();
        assert_eq!(args.class_id.as_deref(), Some("morning"));
    }

    #[test]
    fn unknown_command_and_flag() {
        assert_eq!(
            Args::parse(argv(&["dance"]), no_env).unwrap_err(),
            ArgsError::UnknownCommand("dance".into())
        );
        assert_eq!(
            Args::parse(argv(&["whoami", "--loud"]), no_env).unwrap_err(),
            ArgsError::UnknownArg("--loud".into())
        );
        assert_eq!(
            Args::parse(argv(&["sign-in", "--email"]), no_env).unwrap_err(),
            ArgsError::MissingValue { flag: "--email" }
        );
    }

    #[test]
    fn role_and_subject_validation() {
        let args = Args::parse(argv(&["sign-in", "--role", "Teacher"]), no_env).unwrap();
        assert_eq!(args.role, Role::Teacher);
        assert!(Args::parse(argv(&["sign-in", "--role", "admin"]), no_env).is_err());
        assert!(Args::parse(argv(&["practice", "--subject", "art"]), no_env).is_err());
    }

    #[test]
    fn students_listing_parses() {
        let args = Args::parse(argv(&["students", "--db", "sqlite::memory:"]), no_env).unwrap();
        assert_eq!(args.command, Command::Students);
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn no_arguments_means_help() {
        let args = Args::parse(Vec::new(), no_env).unwrap();
        assert_eq!(args.command, Command::Help);
    }

    #[test]
    fn memory_url_is_kept() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert!(normalize_sqlite_url("sqlite:dev.db".into()).starts_with("sqlite:///"));
    }
}
