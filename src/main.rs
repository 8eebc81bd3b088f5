use chrono::{Local, NaiveDate};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::PathBuf,
};

use engtrack::{
    backend::{
        open_store, BackgroundWorker, Dictionary, FreeDictionary, Notice, SqliteStore, Store,
    },
    config::{Config, ConfigStore, FileConfigStore},
    logging::init_logging,
    review::{ReviewMode, ReviewSession, WordFilter},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    schedule::{
        flatten_schedule, format_duration, preset, presets, total_seconds, Exercise,
        FileScheduleStore, Schedule, ScheduleLibrary, StoredSchedule,
    },
    study::{aggregate_last_n_days, export_csv, total_minutes, SessionKind, StudySession},
    timer::{SpeechAnnouncer, TimerSession, TimerState},
    ui::{run_screen, ReviewScreen, Screen, StudyScreen, TimerScreen},
};

/// back mechanic interval timer, word review and study log in the terminal
#[derive(Parser, Debug)]
#[command(name = "engtrack", version, about)]
pub struct Cli {
    /// study-tracker API base URL (overrides the config file)
    #[arg(long, global = true, conflicts_with = "db")]
    api_url: Option<String>,

    /// use this SQLite file instead of the configured backend
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an exercise schedule with spoken cues
    Timer(TimerArgs),
    /// Presets and saved schedules
    #[command(subcommand)]
    Schedules(SchedulesCommand),
    /// Flash-card review of saved words
    Review(ReviewArgs),
    /// Study stopwatch; words can be added while it runs
    Study,
    /// Log a finished session
    Log {
        /// length in minutes (1-1440)
        minutes: u32,
        /// defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// log a review session instead of a study session
        #[arg(long)]
        review: bool,
    },
    /// Minutes per day for recent sessions
    Stats {
        #[arg(long, default_value_t = 7)]
        days: usize,
        #[arg(long)]
        review: bool,
        /// print every session as CSV instead
        #[arg(long)]
        csv: bool,
    },
    #[command(subcommand)]
    Words(WordsCommand),
    #[command(subcommand)]
    Topics(TopicsCommand),
    /// Look a word up in the free dictionary
    Lookup { word: String },
    /// Check that the backend answers
    Ping,
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
struct TimerArgs {
    /// preset id, saved schedule id or name, or a schedule JSON file
    schedule: Option<String>,
    #[arg(long)]
    no_voice: bool,
    #[arg(long)]
    no_beep: bool,
    /// text-to-speech program, e.g. "espeak -s 150"
    #[arg(long)]
    speech_command: Option<String>,
}

#[derive(Args, Debug, Default)]
struct RangeArgs {
    #[arg(long, value_enum)]
    filter: Option<WordFilter>,
    /// first day of a custom range
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,
    /// last day of a custom range
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct ReviewArgs {
    #[arg(long, value_enum)]
    mode: Option<ReviewMode>,
    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Subcommand, Debug)]
enum SchedulesCommand {
    List,
    /// Print the flattened phases of a schedule
    Show { id: String },
    /// Print a schedule as JSON
    Export {
        id: String,
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Save a schedule JSON file to the library
    Import {
        path: PathBuf,
        /// save to the backend instead of the local file
        #[arg(long)]
        remote: bool,
    },
    /// Build a custom schedule from exercise shorthands
    New {
        name: String,
        /// NAME:SETSxREPSxHOLD[/REST], repeatable
        #[arg(long = "exercise", short = 'x', required = true)]
        exercises: Vec<String>,
        /// rest between exercises in seconds
        #[arg(long, default_value_t = 30)]
        rest: u32,
        /// rest between sets in seconds
        #[arg(long, default_value_t = 20)]
        set_rest: u32,
        #[arg(long)]
        remote: bool,
    },
    Delete {
        id: String,
        #[arg(long)]
        remote: bool,
    },
}

#[derive(Subcommand, Debug)]
enum WordsCommand {
    Add {
        word: String,
        /// example sentence, repeatable
        #[arg(long = "example", short = 'e', required = true)]
        examples: Vec<String>,
    },
    List(RangeArgs),
}

#[derive(Subcommand, Debug)]
enum TopicsCommand {
    Add { name: String },
    List,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    /// Use the study-tracker API at URL
    SetApi { url: String },
    /// Go back to the local database
    ClearApi,
}

impl Cli {
    fn config(&self, store: &impl ConfigStore) -> Config {
        let mut config = store.load();
        if let Some(url) = &self.api_url {
            config.api_url = Some(url.clone());
        }
        config
    }

    fn open_backend(&self, config: &Config) -> engtrack::Result<Box<dyn Store + Send>> {
        match &self.db {
            Some(path) => Ok(Box::new(SqliteStore::open(path)?)),
            None => open_store(config),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let config_store = FileConfigStore::new();
    let config = cli.config(&config_store);
    log::debug!("running {:?}", cli.command);

    match &cli.command {
        Command::Timer(args) => run_timer(&cli, &config, args)?,
        Command::Schedules(cmd) => schedules(&cli, &config, cmd)?,
        Command::Review(args) => run_review(&cli, &config, args)?,
        Command::Study => run_study(&cli, &config)?,
        Command::Log {
            minutes,
            date,
            review,
        } => {
            let session =
                StudySession::new(date.unwrap_or_else(|| Local::now().date_naive()), *minutes)?;
            let kind = session_kind(*review);
            cli.open_backend(&config)?.log_session(kind, &session)?;
            println!("logged {} min of {kind} on {}", session.duration_minutes, session.date);
        }
        Command::Stats { days, review, csv } => {
            let sessions = cli.open_backend(&config)?.list_sessions(session_kind(*review))?;
            if *csv {
                export_csv(&sessions, io::stdout())?;
            } else {
                print_stats(&sessions, *days);
            }
        }
        Command::Words(cmd) => words(&cli, &config, cmd)?,
        Command::Topics(TopicsCommand::Add { name }) => {
            let topic = cli.open_backend(&config)?.add_topic(name)?;
            println!("{}\t{}", topic.id, topic.name);
        }
        Command::Topics(TopicsCommand::List) => {
            for topic in cli.open_backend(&config)?.list_topics()? {
                println!("{}\t{}", topic.id, topic.name);
            }
        }
        Command::Lookup { word } => {
            let definitions = FreeDictionary::new()?.lookup(word)?;
            if definitions.is_empty() {
                println!("no definitions for {word:?}");
            }
            for (part_of_speech, group) in &definitions.iter().chunk_by(|d| d.part_of_speech.clone()) {
                println!("{part_of_speech}");
                for (i, d) in group.enumerate() {
                    println!("  {}. {}", i + 1, d.definition);
                    if let Some(example) = &d.example {
                        println!("     \"{example}\"");
                    }
                }
            }
        }
        Command::Ping => {
            let store = cli.open_backend(&config)?;
            let health = store.health()?;
            println!(
                "{} {} ({})",
                if health.ok { "ok" } else { "unhealthy" },
                health.time,
                store.describe()
            );
        }
        Command::Config(cmd) => configure(&config_store, cmd)?,
    }

    Ok(())
}

fn session_kind(review: bool) -> SessionKind {
    if review {
        SessionKind::Review
    } else {
        SessionKind::Study
    }
}

fn require_tty() {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }
}

/// Run `screen` full-screen until it quits, restoring the terminal even on error.
fn run_tui<S: Screen>(screen: &mut S) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::every_second());
    let result = run_screen(&mut terminal, &mut runner, screen);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(result?)
}

fn report(notices: &[Notice]) {
    for notice in notices {
        if let Notice::Failed { action, error } = notice {
            eprintln!("failed to {action}: {error}");
        }
    }
}

fn run_timer(cli: &Cli, config: &Config, args: &TimerArgs) -> Result<(), Box<dyn Error>> {
    require_tty();
    let schedule = match &args.schedule {
        Some(id) => resolve_schedule(cli, config, id)?,
        None => presets()
            .into_iter()
            .next()
            .ok_or_else(|| engtrack::Error::NotFound("no presets".into()))?,
    };

    let mut cues = config.cue_settings();
    cues.voice &= !args.no_voice;
    cues.chime &= !args.no_beep;
    let command = args
        .speech_command
        .clone()
        .unwrap_or_else(|| config.speech_command());
    log::info!("timer: {} ({} phases)", schedule.id, flatten_schedule(&schedule).len());

    let session = TimerSession::new(schedule, SpeechAnnouncer::new(Some(command)), cues);
    let mut screen = TimerScreen::new(session);
    run_tui(&mut screen)?;

    let session = screen.into_session();
    let summary = format!(
        "{} / {}",
        format_duration(session.elapsed_seconds()),
        format_duration(session.total_seconds())
    );
    match session.state() {
        TimerState::Finished => println!("{}: finished ({summary})", session.schedule().display_name()),
        state => println!("{}: {state} at {summary}", session.schedule().display_name()),
    }
    Ok(())
}

fn run_review(cli: &Cli, config: &Config, args: &ReviewArgs) -> Result<(), Box<dyn Error>> {
    require_tty();
    let store = cli.open_backend(config)?;
    let range = word_range(&args.range, config.word_filter);
    let words = store.list_words(range)?;
    let mode = args.mode.unwrap_or(config.review_mode);
    log::info!("review: {} words, {mode} order", words.len());

    let mut screen = ReviewScreen::new(ReviewSession::new(words, mode), BackgroundWorker::spawn(store));
    run_tui(&mut screen)?;

    let reviewed = screen.session().reviewed();
    report(&screen.finish());
    println!("reviewed {reviewed} words");
    Ok(())
}

fn run_study(cli: &Cli, config: &Config) -> Result<(), Box<dyn Error>> {
    require_tty();
    let mut screen = StudyScreen::new(BackgroundWorker::spawn(cli.open_backend(config)?));
    run_tui(&mut screen)?;

    let (added, notices) = screen.finish();
    report(&notices);
    for notice in &notices {
        if let Notice::SessionLogged { minutes, .. } = notice {
            println!("logged {minutes} min of study");
        }
    }
    if !added.is_empty() {
        println!("added: {}", added.iter().map(|w| &w.word).join(", "));
    }
    Ok(())
}

fn word_range(args: &RangeArgs, default: WordFilter) -> engtrack::review::DateRange {
    let custom = args.start.zip(args.end);
    let filter = match (args.filter, custom) {
        (Some(filter), _) => filter,
        (None, Some(_)) => WordFilter::Custom,
        (None, None) => default,
    };
    filter.range(Local::now().date_naive(), custom)
}

fn words(cli: &Cli, config: &Config, cmd: &WordsCommand) -> Result<(), Box<dyn Error>> {
    let store = cli.open_backend(config)?;
    match cmd {
        WordsCommand::Add { word, examples } => {
            let word = store.add_word(word, examples)?;
            println!("{}\t{}\t{}", word.id, word.date, word.word);
        }
        WordsCommand::List(range) => {
            for word in store.list_words(word_range(range, WordFilter::All))? {
                println!(
                    "{}\t{}\t{:>3.0}%\t{}\t{}",
                    word.id,
                    word.date,
                    word.familiarity() * 100.0,
                    word.word,
                    word.examples.iter().join(" | ")
                );
            }
        }
    }
    Ok(())
}

fn print_stats(sessions: &[StudySession], days: usize) {
    let totals = aggregate_last_n_days(sessions, days, Local::now().date_naive());
    let widest = totals.iter().map(|d| d.minutes).max().unwrap_or(0).max(1);
    for day in &totals {
        let bar = "#".repeat((day.minutes * 40 / widest) as usize);
        println!("{}  {:>4}  {bar}", day.date, day.minutes);
    }
    let recent: u64 = totals.iter().map(|d| u64::from(d.minutes)).sum();
    println!("last {days} days: {recent} min, all time: {} min", total_minutes(sessions));
}

/// Preset, then the local library, then the backend, then a file path.
fn resolve_schedule(cli: &Cli, config: &Config, id: &str) -> Result<Schedule, Box<dyn Error>> {
    if let Some(schedule) = preset(id) {
        return Ok(schedule);
    }
    let matches = |name: &str, sid: &str| sid == id || name.eq_ignore_ascii_case(id);

    if let Some(found) = FileScheduleStore::new()
        .list_schedules()?
        .into_iter()
        .find(|s| matches(&s.name, &s.id))
    {
        return Ok(found.schedule);
    }

    let path = PathBuf::from(id);
    if path.is_file() {
        return Ok(serde_json::from_str(&fs::read_to_string(&path)?)?);
    }

    match cli.open_backend(config).and_then(|store| store.list_schedules()) {
        Ok(remote) => {
            if let Some(found) = remote.into_iter().find(|s| matches(&s.name, &s.id)) {
                return Ok(found.schedule);
            }
        }
        Err(e) => log::warn!("could not list backend schedules: {e}"),
    }

    Err(engtrack::Error::NotFound(format!("schedule {id:?}")).into())
}

/// Where `schedules import|new|delete` write: the local file or the backend.
enum Library {
    Local(FileScheduleStore),
    Remote(Box<dyn Store + Send>),
}

impl Library {
    fn open(cli: &Cli, config: &Config, remote: bool) -> engtrack::Result<Self> {
        if remote {
            Ok(Library::Remote(cli.open_backend(config)?))
        } else {
            Ok(Library::Local(FileScheduleStore::new()))
        }
    }

    fn save(&self, schedule: &Schedule) -> engtrack::Result<StoredSchedule> {
        match self {
            Library::Local(local) => local.save_schedule(schedule),
            Library::Remote(store) => store.save_schedule(schedule),
        }
    }

    fn delete(&self, id: &str) -> engtrack::Result<()> {
        match self {
            Library::Local(local) => local.delete_schedule(id),
            Library::Remote(store) => store.delete_schedule(id),
        }
    }
}

fn schedules(cli: &Cli, config: &Config, cmd: &SchedulesCommand) -> Result<(), Box<dyn Error>> {
    match cmd {
        SchedulesCommand::List => {
            let line = |id: &str, name: &str, schedule: &Schedule| {
                let total = total_seconds(&flatten_schedule(schedule));
                println!("  {id:<32} {name:<28} {:>6}", format_duration(total));
            };
            println!("presets:");
            for schedule in presets() {
                line(&schedule.id, schedule.display_name(), &schedule);
            }
            println!("saved:");
            for s in FileScheduleStore::new().list_schedules()? {
                line(&s.id, &s.name, &s.schedule);
            }
            match cli.open_backend(config).and_then(|store| {
                let location = store.describe();
                store.list_schedules().map(|list| (location, list))
            }) {
                Ok((location, remote)) => {
                    println!("backend ({location}):");
                    for s in remote.iter().sorted_by(|a, b| a.name.cmp(&b.name)) {
                        line(&s.id, &s.name, &s.schedule);
                    }
                }
                Err(e) => eprintln!("backend schedules unavailable: {e}"),
            }
        }
        SchedulesCommand::Show { id } => {
            let schedule = resolve_schedule(cli, config, id)?;
            let phases = flatten_schedule(&schedule);
            println!("{} ({})", schedule.display_name(), schedule.id);
            for (i, phase) in phases.iter().enumerate() {
                println!(
                    "{:>4}  {:<5} {:>6}  {}",
                    i + 1,
                    phase.kind,
                    format_duration(u64::from(phase.duration_seconds)),
                    phase.label
                );
            }
            println!(
                "total {} in {} phases",
                format_duration(total_seconds(&phases)),
                phases.len()
            );
        }
        SchedulesCommand::Export { id, out } => {
            let json = serde_json::to_string_pretty(&resolve_schedule(cli, config, id)?)?;
            match out {
                Some(path) => fs::write(path, json + "\n")?,
                None => println!("{json}"),
            }
        }
        SchedulesCommand::Import { path, remote } => {
            let schedule: Schedule = serde_json::from_str(&fs::read_to_string(path)?)?;
            let saved = Library::open(cli, config, *remote)?.save(&schedule)?;
            println!("saved {} ({})", saved.name, saved.id);
        }
        SchedulesCommand::New {
            name,
            exercises,
            rest,
            set_rest,
            remote,
        } => {
            let mut schedule = Schedule::new_custom();
            schedule.name = name.clone();
            schedule.break_between_exercises_seconds = *rest;
            schedule.exercises = exercises
                .iter()
                .map(|shorthand| {
                    shorthand.parse::<Exercise>().map(|mut ex| {
                        ex.break_between_sets_seconds = *set_rest;
                        ex
                    })
                })
                .collect::<engtrack::Result<_>>()?;
            let saved = Library::open(cli, config, *remote)?.save(&schedule)?;
            println!(
                "saved {} ({}), {}",
                saved.name,
                saved.id,
                format_duration(total_seconds(&flatten_schedule(&saved.schedule)))
            );
        }
        SchedulesCommand::Delete { id, remote } => {
            Library::open(cli, config, *remote)?.delete(id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn configure(store: &FileConfigStore, cmd: &ConfigCommand) -> Result<(), Box<dyn Error>> {
    let mut config = store.load();
    match cmd {
        ConfigCommand::Show => {
            println!("# {}", store.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        ConfigCommand::SetApi { url } => config.api_url = Some(url.trim_end_matches('/').to_string()),
        ConfigCommand::ClearApi => config.api_url = None,
    }
    store.save(&config)?;
    println!("api: {}", config.api_url.as_deref().unwrap_or("local database"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_cli_timer_defaults() {
        let cli = Cli::parse_from(["engtrack", "timer"]);
        assert_matches!(
            cli.command,
            Command::Timer(TimerArgs {
                schedule: None,
                no_voice: false,
                no_beep: false,
                speech_command: None
            })
        );
        assert_eq!(cli.api_url, None);
    }

    #[test]
    fn test_cli_timer_flags() {
        let cli = Cli::parse_from(["engtrack", "timer", "minimal_demo", "--no-voice", "--speech-command", "say -r 180"]);
        let Command::Timer(args) = cli.command else {
            panic!("expected timer");
        };
        assert_eq!(args.schedule.as_deref(), Some("minimal_demo"));
        assert!(args.no_voice);
        assert!(!args.no_beep);
        assert_eq!(args.speech_command.as_deref(), Some("say -r 180"));
    }

    #[test]
    fn test_cli_global_backend_flags() {
        let cli = Cli::parse_from(["engtrack", "ping", "--api-url", "http://localhost:3000"]);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:3000"));

        let cli = Cli::parse_from(["engtrack", "--db", "/tmp/x.db", "stats"]);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));

        assert!(Cli::try_parse_from(["engtrack", "--db", "x.db", "--api-url", "http://a", "ping"]).is_err());
    }

    #[test]
    fn test_cli_review_options() {
        let cli = Cli::parse_from(["engtrack", "review", "--mode", "weighted", "--filter", "week"]);
        let Command::Review(args) = cli.command else {
            panic!("expected review");
        };
        assert_eq!(args.mode, Some(ReviewMode::Weighted));
        assert_eq!(args.range.filter, Some(WordFilter::Week));

        // a custom range needs both ends
        assert!(Cli::try_parse_from(["engtrack", "review", "--start", "2025-01-01"]).is_err());
    }

    #[test]
    fn test_cli_log_and_stats() {
        let cli = Cli::parse_from(["engtrack", "log", "25", "--date", "2025-03-01", "--review"]);
        assert_matches!(
            cli.command,
            Command::Log { minutes: 25, date: Some(d), review: true } if d == NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );

        let cli = Cli::parse_from(["engtrack", "stats"]);
        assert_matches!(cli.command, Command::Stats { days: 7, review: false, csv: false });

        assert!(Cli::try_parse_from(["engtrack", "log", "-5"]).is_err());
    }

    #[test]
    fn test_cli_words_need_examples() {
        let cli = Cli::parse_from(["engtrack", "words", "add", "quip", "-e", "A quip.", "-e", "Another quip."]);
        assert_matches!(
            cli.command,
            Command::Words(WordsCommand::Add { ref examples, .. }) if examples.len() == 2
        );
        assert!(Cli::try_parse_from(["engtrack", "words", "add", "quip"]).is_err());
    }

    #[test]
    fn test_cli_schedule_new() {
        let cli = Cli::parse_from([
            "engtrack", "schedules", "new", "Evening", "-x", "Curl Up:1x3x6", "-x", "Bird Dog:2x4x8/4", "--rest", "15",
        ]);
        let Command::Schedules(SchedulesCommand::New { exercises, rest, set_rest, remote, .. }) = cli.command else {
            panic!("expected schedules new");
        };
        assert_eq!(exercises.len(), 2);
        assert_eq!((rest, set_rest, remote), (15, 20, false));
    }

    #[test]
    fn word_range_prefers_explicit_filter() {
        let today = Local::now().date_naive();
        let range = word_range(&RangeArgs::default(), WordFilter::Day);
        assert!(range.contains(today));
        assert!(!range.contains(today - chrono::Duration::days(1)));

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let args = RangeArgs {
            filter: None,
            start: Some(start),
            end: Some(end),
        };
        let range = word_range(&args, WordFilter::Day);
        assert!(range.contains(start) && range.contains(end));
        assert!(!range.contains(today));
    }
}
