use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use interview_core::model::{DifficultyLevel, FeedbackReport, InterviewId, InterviewType};
use interview_core::{FallbackQuestionBank, QuestionBank, StaticQuestionBank};
use services::{
    Clock, InterviewError, InterviewHistoryService, InterviewLoopService, LlmNarrativeFeedback,
    NarrativeContext, NarrativeFeedback, parse_question_bank,
};
use storage::repository::{InterviewRepository, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_URL: &str = "sqlite://interview.sqlite3";
const DEFAULT_USER_ID: &str = "local";
const DEFAULT_HISTORY_LIMIT: u32 = 10;
const END_COMMAND: &str = ":end";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidType { raw: String },
    InvalidDifficulty { raw: String },
    InvalidLimit { raw: String },
    InvalidInterviewId { raw: String },
    MissingInterviewId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidType { raw } => write!(f, "invalid --type value: {raw}"),
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid --difficulty value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
            ArgsError::InvalidInterviewId { raw } => write!(f, "invalid interview id: {raw}"),
            ArgsError::MissingInterviewId => write!(f, "report requires an interview id"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  interview run     [--type <slug>] [--topics <a,b>] [--difficulty <slug>]");
    eprintln!("                    [--db <sqlite_url>] [--user <id>] [--bank <json_file>]");
    eprintln!("  interview history [--db <sqlite_url>] [--user <id>] [--limit <n>]");
    eprintln!("  interview report  <interview-id> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults for run:");
    eprintln!("  --type frontend");
    eprintln!("  --difficulty intermediate");
    eprintln!("  --topics <type>");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Answer each question on one line. Type {END_COMMAND} to finish early.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  INTERVIEW_DB_URL, INTERVIEW_USER_ID, RUST_LOG");
    eprintln!("  INTERVIEW_AI_API_KEY, INTERVIEW_AI_BASE_URL, INTERVIEW_AI_MODEL");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Run(RunArgs),
    History(HistoryArgs),
    Report(ReportArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunArgs {
    db_url: String,
    user_id: String,
    interview_type: InterviewType,
    topics: Vec<String>,
    difficulty: DifficultyLevel,
    bank: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryArgs {
    db_url: String,
    user_id: String,
    limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReportArgs {
    db_url: String,
    interview_id: InterviewId,
}

fn default_db_url() -> String {
    std::env::var("INTERVIEW_DB_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url)
}

fn default_user_id() -> String {
    std::env::var("INTERVIEW_USER_ID")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.into())
}

fn parse_db(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
}

fn split_topics(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

impl RunArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url();
        let mut user_id = default_user_id();
        let mut interview_type = InterviewType::Frontend;
        let mut topics = None;
        let mut difficulty = DifficultyLevel::default();
        let mut bank = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db(args)?,
                "--user" => user_id = require_value(args, "--user")?,
                "--type" => {
                    let value = require_value(args, "--type")?;
                    interview_type = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidType { raw: value.clone() })?;
                }
                "--topics" => topics = Some(split_topics(&require_value(args, "--topics")?)),
                "--difficulty" => {
                    let value = require_value(args, "--difficulty")?;
                    difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--bank" => bank = Some(PathBuf::from(require_value(args, "--bank")?)),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            interview_type,
            topics: topics.unwrap_or_else(|| vec![interview_type.slug().to_string()]),
            difficulty,
            bank,
        })
    }
}

impl HistoryArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url();
        let mut user_id = default_user_id();
        let mut limit = DEFAULT_HISTORY_LIMIT;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db(args)?,
                "--user" => user_id = require_value(args, "--user")?,
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            limit,
        })
    }
}

impl ReportArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = default_db_url();
        let mut interview_id: Option<InterviewId> = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_url = parse_db(args)?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                raw if !raw.starts_with("--") && interview_id.is_none() => {
                    interview_id = Some(
                        raw.parse()
                            .map_err(|_| ArgsError::InvalidInterviewId { raw: arg.clone() })?,
                    );
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            interview_id: interview_id.ok_or(ArgsError::MissingInterviewId)?,
        })
    }
}

impl Command {
    fn parse(argv: Vec<String>) -> Result<Option<Self>, ArgsError> {
        let mut iter = argv.into_iter();
        let Some(first) = iter.next() else {
            return Ok(None);
        };
        let cmd = match first.as_str() {
            "run" => Command::Run(RunArgs::parse(&mut iter)?),
            "history" => Command::History(HistoryArgs::parse(&mut iter)?),
            "report" => Command::Report(ReportArgs::parse(&mut iter)?),
            "--help" | "-h" => return Ok(None),
            _ => return Err(ArgsError::UnknownArg(first)),
        };
        Ok(Some(cmd))
    }

    fn db_url(&self) -> &str {
        match self {
            Command::Run(args) => &args.db_url,
            Command::History(args) => &args.db_url,
            Command::Report(args) => &args.db_url,
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
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

fn load_bank(path: Option<&PathBuf>) -> Result<Arc<dyn QuestionBank>, Box<dyn std::error::Error>> {
    let bank = match path {
        Some(path) => parse_question_bank(&std::fs::read_to_string(path)?)?,
        None => StaticQuestionBank::builtin()?,
    };
    Ok(Arc::new(FallbackQuestionBank::new(bank)))
}

fn print_report(report: &FeedbackReport, duration: Option<&str>) {
    println!();
    println!("Overall score: {}%", report.overall_score);
    if let Some(duration) = duration {
        println!("Duration: {duration}");
    }
    println!("{}", report.detailed_analysis);

    println!();
    println!("Strengths:");
    for item in &report.strengths {
        println!("  + {item}");
    }
    println!("Improvements:");
    for item in &report.improvements {
        println!("  - {item}");
    }

    println!();
    for (n, q) in report.question_scores.iter().enumerate() {
        println!("Q{}: {} ({}%)", n + 1, q.question, q.score);
        println!("    {}", q.feedback);
    }

    println!();
    println!("Resources:");
    for resource in &report.resources {
        println!("  * {}: {}", resource.title, resource.description);
    }
}

async fn run_interview(storage: &Storage, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bank = load_bank(args.bank.as_ref())?;
    let loop_svc = InterviewLoopService::from_storage(Clock::default_clock(), storage, bank);
    let history = InterviewHistoryService::from_storage(storage);

    let mut session = loop_svc
        .start_interview(&args.user_id, args.interview_type, args.topics, args.difficulty)
        .await?;

    println!(
        "{}",
        loop_svc
            .aggregator()
            .welcome_message(session.interview_type(), session.topics(), session.difficulty())
    );
    if let Some(question) = session.current_question() {
        println!();
        println!("{}", question.text());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.is_complete() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == END_COMMAND {
            break;
        }
        match loop_svc.answer_current(&mut session, &line).await {
            Ok(result) => {
                println!();
                println!("[score {}%] {}", result.analysis.score, result.next_prompt);
            }
            Err(InterviewError::EmptyAnswer) => {
                eprintln!("(type an answer, or {END_COMMAND} to finish)");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let finished = loop_svc.finish(&mut session).await?;
    let mut report = finished.report;

    let narrative = LlmNarrativeFeedback::from_env();
    if narrative.enabled() {
        let context = NarrativeContext::new(
            session.interview_type(),
            session.topics().to_vec(),
            history.transcript(session.id()).await?,
        );
        match narrative.generate(&context).await {
            Ok(extra) => {
                report = extra.merge_into(&report);
                storage
                    .interviews
                    .save_feedback(session.id(), &report, &finished.duration)
                    .await?;
            }
            Err(err) => tracing::warn!(error = %err, "narrative feedback skipped"),
        }
    }

    print_report(&report, Some(&finished.duration));
    println!();
    println!("Interview id: {}", session.id());
    Ok(())
}

async fn show_history(storage: &Storage, args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let history = InterviewHistoryService::from_storage(storage);
    let stats = history.stats(&args.user_id).await?;
    println!(
        "Interviews: {}  Average score: {}%  Questions answered: {}",
        stats.total_interviews, stats.average_score, stats.questions_answered
    );

    for item in history.list_recent(&args.user_id, args.limit).await? {
        let score = item
            .score
            .map_or_else(|| "--".to_string(), |s| format!("{s}%"));
        println!(
            "{}  {}  {}  [{}] {}  {}  {}",
            item.id,
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.title,
            item.difficulty,
            item.topics.join(", "),
            score,
            item.duration.as_deref().unwrap_or("--:--"),
        );
    }
    Ok(())
}

async fn show_report(storage: &Storage, args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let history = InterviewHistoryService::from_storage(storage);
    match history.get_report(args.interview_id).await? {
        Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        None => eprintln!("interview {} has no report yet", args.interview_id),
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match Command::parse(argv) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    // Open + migrate SQLite here so the library crates never touch the filesystem.
    prepare_sqlite_file(cmd.db_url())?;
    let storage = Storage::sqlite(cmd.db_url()).await?;

    match cmd {
        Command::Run(args) => run_interview(&storage, args).await,
        Command::History(args) => show_history(&storage, args).await,
        Command::Report(args) => show_report(&storage, args).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
