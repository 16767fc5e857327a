use std::fmt;

use reasoning_core::model::{Difficulty, GradingResult, ProgressStats, Question, QuestionCategory};
use services::{AppServices, ClientConfig, PracticeFlow, ReviewFlow, SessionError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: Command, flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidCategory { raw: String },
    InvalidDifficulty { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidCategory { raw } => write!(
                f,
                "invalid --category value: {raw} (strengthen, weaken, assumption, flaw)"
            ),
            ArgsError::InvalidDifficulty { raw } => {
                write!(f, "invalid --difficulty value: {raw} (easy, medium, hard)")
            }
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
    eprintln!("  app practice [--category <name>] [--difficulty <level>]");
    eprintln!("  app review");
    eprintln!("  app stats");
    eprintln!("  app status");
    eprintln!("  app login    --email <email> --password <password>");
    eprintln!("  app register --username <name> --email <email> --password <password>");
    eprintln!("  app logout");
    eprintln!("  app guest");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --api <url>   backend base URL");
    eprintln!("  --db  <url>   sqlite database holding the session");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  REASONING_API_URL, REASONING_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Practice,
    Review,
    Stats,
    Status,
    Login,
    Register,
    Logout,
    Guest,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "practice" => Some(Self::Practice),
            "review" => Some(Self::Review),
            "stats" => Some(Self::Stats),
            "status" => Some(Self::Status),
            "login" => Some(Self::Login),
            "register" => Some(Self::Register),
            "logout" => Some(Self::Logout),
            "guest" => Some(Self::Guest),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Practice => "practice",
            Self::Review => "review",
            Self::Stats => "stats",
            Self::Status => "status",
            Self::Login => "login",
            Self::Register => "register",
            Self::Logout => "logout",
            Self::Guest => "guest",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct Args {
    api_url: Option<String>,
    db_url: Option<String>,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    category: Option<QuestionCategory>,
    difficulty: Option<Difficulty>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => parsed.api_url = Some(require_value(args, "--api")?),
                "--db" => {
                    parsed.db_url = Some(normalize_sqlite_url(&require_value(args, "--db")?));
                }
                "--username" => parsed.username = Some(require_value(args, "--username")?),
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--password" => parsed.password = Some(require_value(args, "--password")?),
                "--category" => {
                    let raw = require_value(args, "--category")?;
                    let category = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidCategory { raw: raw.clone() })?;
                    parsed.category = Some(category);
                }
                "--difficulty" => {
                    let raw = require_value(args, "--difficulty")?;
                    let difficulty = raw
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: raw.clone() })?;
                    parsed.difficulty = Some(difficulty);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }

    fn required<'a>(
        value: &'a Option<String>,
        command: Command,
        flag: &'static str,
    ) -> Result<&'a str, ArgsError> {
        value
            .as_deref()
            .ok_or(ArgsError::MissingFlag { command, flag })
    }
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("sqlite:") {
        return trimmed.to_string();
    }
    let path = std::path::Path::new(trimmed);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    match std::path::Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

//
// ─── TERMINAL IO ───────────────────────────────────────────────────────────────
//

struct Terminal {
    lines: Lines<Box<dyn AsyncBufRead + Unpin + Send>>,
}

impl Terminal {
    fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    fn from_reader(reader: impl AsyncBufRead + Unpin + Send + 'static) -> Self {
        let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(reader);
        Self {
            lines: reader.lines(),
        }
    }

    /// Prompt and read one trimmed line; `None` on end of input.
    async fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

fn is_quit(input: &str) -> bool {
    matches!(input.to_ascii_lowercase().as_str(), "q" | "quit" | "exit")
}

fn print_question(question: &Question, heading: &str) {
    println!();
    println!("── {heading} · {} ──", question.category());
    println!("{}", question.prompt());
    println!();
    for option in question.options() {
        println!("  ({}) {}", option.label, option.text);
    }
    println!();
}

fn print_grading(grading: &GradingResult) {
    if grading.correct {
        println!("Correct! The answer is ({}).", grading.correct_answer);
    } else {
        println!("Not quite. The answer is ({}).", grading.correct_answer);
    }
    if !grading.explanation.is_empty() {
        println!("{}", grading.explanation);
    }
}

fn print_stats(stats: &ProgressStats) {
    println!("Questions answered: {}", stats.questions_answered);
    println!("Correct answers:    {}", stats.correct_answers);
    println!("Accuracy:           {:.1}%", stats.accuracy);
    println!(
        "Streak:             {} (longest {})",
        stats.current_streak, stats.longest_streak
    );
    for category in QuestionCategory::ALL {
        println!(
            "  {:<11} {:.1}%",
            category.as_str(),
            stats.accuracy_by_type.get(category)
        );
    }
}

/// Select, submit and show the explanation for the question in view.
///
/// Returns `false` when the learner quits.
async fn answer_loop(
    terminal: &mut Terminal,
    mut select: impl FnMut(&str) -> Result<bool, SessionError>,
) -> std::io::Result<bool> {
    loop {
        let Some(input) = terminal.ask("Your answer (q to quit): ").await? else {
            return Ok(false);
        };
        if is_quit(&input) {
            return Ok(false);
        }
        match select(&input) {
            Ok(_) => return Ok(true),
            Err(err) => println!("{err}"),
        }
    }
}

/// Show the outcome of a load; after a failure offer to try again from idle.
///
/// Returns `false` when the learner gives up.
async fn present_or_retry(
    flow: &mut PracticeFlow,
    terminal: &mut Terminal,
    mut loaded: Result<(), SessionError>,
) -> std::io::Result<bool> {
    loop {
        let err = match loaded {
            Ok(()) => return Ok(true),
            Err(SessionError::Cancelled) => return Ok(false),
            Err(err) => err,
        };
        println!("Could not load a question: {err}");
        let Some(input) = terminal.ask("Enter to try again, q to quit: ").await? else {
            return Ok(false);
        };
        if is_quit(&input) {
            return Ok(false);
        }
        loaded = flow
            .start()
            .await
            .map(|question| print_question(question, "Practice"));
    }
}

async fn run_practice(
    flow: &mut PracticeFlow,
    terminal: &mut Terminal,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = flow
        .start()
        .await
        .map(|question| print_question(question, "Practice"));
    if !present_or_retry(flow, terminal, loaded).await? {
        return Ok(());
    }

    loop {
        if !answer_loop(terminal, |label| flow.select(label)).await? {
            return Ok(());
        }
        match flow.submit().await {
            Ok(grading) => print_grading(grading),
            Err(err) => {
                println!("Could not grade your answer: {err}");
                continue;
            }
        }

        let Some(input) = terminal.ask("Enter for the next question, q to quit: ").await? else {
            return Ok(());
        };
        if is_quit(&input) {
            println!("Answered {} question(s) this session.", flow.graded_count());
            return Ok(());
        }
        let loaded = flow
            .next()
            .await
            .map(|question| print_question(question, "Practice"));
        if !present_or_retry(flow, terminal, loaded).await? {
            println!("Answered {} question(s) this session.", flow.graded_count());
            return Ok(());
        }
    }
}

async fn run_review(
    flow: &mut ReviewFlow,
    terminal: &mut Terminal,
) -> Result<(), Box<dyn std::error::Error>> {
    if flow.start().await?.is_none() {
        println!("Nothing to review. Nice work!");
        return Ok(());
    }

    loop {
        let progress = flow.progress();
        if let Some(question) = flow.lifecycle().question() {
            print_question(question, &format!("Review {}/{}", progress.position, progress.total));
        }

        if !answer_loop(terminal, |label| flow.select(label)).await? {
            return Ok(());
        }
        match flow.submit().await {
            Ok(grading) => print_grading(grading),
            Err(err) => {
                println!("Could not grade your answer: {err}");
                continue;
            }
        }

        let Some(input) = terminal.ask("Enter to continue, q to quit: ").await? else {
            return Ok(());
        };
        if is_quit(&input) {
            return Ok(());
        }
        if flow.next()?.is_none() {
            println!("Review complete.");
            return Ok(());
        }
    }
}

fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => Command::Practice,
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?,
    };

    let parsed = Args::parse(&mut argv)?;

    let mut config = ClientConfig::from_env()?;
    if let Some(api) = &parsed.api_url {
        config = config.with_api_base_url(api.as_str())?;
    }
    if let Some(db) = &parsed.db_url {
        config = config.with_database_url(db.as_str());
    }
    init_tracing(&config.log_filter);
    tracing::debug!(api = %config.api_base_url, command = %cmd, "starting");

    prepare_sqlite_dir(&config.database_url)?;
    let services = AppServices::new_sqlite(config).await?;
    let session = services.session();

    match cmd {
        Command::Practice => {
            if !session.check_auth_status().await {
                let guest = session.enter_as_guest().await;
                println!("Practicing as {} (sign in to save progress).", guest.username);
            }
            let category = parsed.category.unwrap_or(QuestionCategory::Strengthen);
            let mut flow = services.practice(category, parsed.difficulty);
            run_practice(&mut flow, &mut Terminal::new()).await
        }
        Command::Review => {
            let mut flow = services.review();
            run_review(&mut flow, &mut Terminal::new()).await
        }
        Command::Stats => {
            print_stats(&session.get_user_stats().await);
            Ok(())
        }
        Command::Status => {
            if session.check_auth_status().await {
                if let Some(user) = session.current_user() {
                    println!("Signed in as {} <{}> ({})", user.username, user.email, user.subscription_tier);
                }
            } else {
                println!("Not signed in.");
            }
            Ok(())
        }
        Command::Login => {
            let email = Args::required(&parsed.email, cmd, "--email")?;
            let password = Args::required(&parsed.password, cmd, "--password")?;
            let auth = session.login(email, password).await?;
            println!("Welcome back, {}.", auth.user.username);
            Ok(())
        }
        Command::Register => {
            let username = Args::required(&parsed.username, cmd, "--username")?;
            let email = Args::required(&parsed.email, cmd, "--email")?;
            let password = Args::required(&parsed.password, cmd, "--password")?;
            let auth = session.register(username, email, password).await?;
            println!("Account created. Welcome, {}.", auth.user.username);
            Ok(())
        }
        Command::Logout => {
            session.logout().await;
            println!("Signed out.");
            Ok(())
        }
        Command::Guest => {
            let guest = session.enter_as_guest().await;
            println!("Continuing as {}.", guest.username);
            Ok(())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        if err.downcast_ref::<ArgsError>().is_some() {
            print_usage();
        }
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;
    use serde_json::json;
    use services::{LifecycleState, StubTransport};
    use storage::repository::Storage;

    use super::*;

    /// Signed-in services whose first generation fails and later ones succeed.
    async fn services_with_flaky_generation() -> AppServices {
        let stub = StubTransport::new();
        stub.respond(
            Method::POST,
            "/auth/login",
            200,
            json!({"user": {"id": 7, "username": "cy"}, "token": "tok-7"}),
        );
        stub.respond(
            Method::POST,
            "/questions/generate",
            200,
            json!({
                "id": 12,
                "category": "weaken",
                "prompt": "Which weakens the argument?",
                "options": [{"label": "A", "text": "x"}, {"label": "B", "text": "y"}],
                "correctAnswer": "B"
            }),
        );
        stub.respond_once(
            Method::POST,
            "/questions/generate",
            503,
            json!({"error": "generator busy"}),
        );

        let config = ClientConfig::default()
            .with_api_base_url("http://backend.test/api")
            .unwrap();
        let services = AppServices::with_parts(config, Arc::new(stub), Storage::in_memory()).await;
        services.session().login("cy@example.com", "pw").await.unwrap();
        services
    }

    #[tokio::test]
    async fn failed_load_is_retried_from_idle() {
        let services = services_with_flaky_generation().await;
        let mut flow = services.practice(QuestionCategory::Weaken, None);
        let mut terminal = Terminal::from_reader(&b"\n"[..]);

        let loaded = flow.start().await.map(|q| print_question(q, "Practice"));
        assert!(matches!(loaded, Err(SessionError::Api(_))));
        assert_eq!(flow.state(), LifecycleState::Idle);

        assert!(present_or_retry(&mut flow, &mut terminal, loaded).await.unwrap());
        assert_eq!(flow.state(), LifecycleState::Presented);
    }

    #[tokio::test]
    async fn quitting_after_failed_load_leaves_flow_idle() {
        let services = services_with_flaky_generation().await;
        let mut flow = services.practice(QuestionCategory::Weaken, None);
        let mut terminal = Terminal::from_reader(&b"q\n"[..]);

        let loaded = flow.start().await.map(|q| print_question(q, "Practice"));
        assert!(!present_or_retry(&mut flow, &mut terminal, loaded).await.unwrap());
        assert_eq!(flow.state(), LifecycleState::Idle);
    }

    #[test]
    fn bare_paths_become_absolute_sqlite_urls() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_sqlite_url("/tmp/r.sqlite3"), "sqlite:///tmp/r.sqlite3");
    }
}
