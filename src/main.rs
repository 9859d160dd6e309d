mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{File, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn, Level};
use wordrush::{
    app_dirs::AppDirs,
    cheat::{CheatErrors, CheatField, CheatForm},
    config::{Config, ConfigStore, FileConfigStore},
    game_result::ResultPublisher,
    history::{export_csv, HistoryStore},
    language::{BundledWords, ChainedWords, FileWords, WordSource},
    mode::ModeName,
    round::{InputEffect, Round, RoundPhase, RoundSetup, RoundSummary},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    typing_policy::COMMAND_PREFIX,
    EngineError,
};

/// energy-driven typing game: race the drain, type the words
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing game where every correct word refuels a draining energy bar. Survive to the word goal, or relax in zen mode. Scores reward speed, accuracy and the difficulty you pick."
)]
pub struct Cli {
    /// preset to play (classic, hard, practice, speedrunner, zen)
    #[clap(short = 'm', long, value_enum)]
    mode: Option<ModeName>,

    /// words needed to win
    #[clap(short = 'w', long, allow_hyphen_values = true)]
    word_goal: Option<i64>,

    /// energy gained per completed word
    #[clap(short = 'b', long, allow_hyphen_values = true)]
    bonus: Option<i64>,

    /// energy at the start of a round
    #[clap(short = 'e', long, allow_hyphen_values = true)]
    energy: Option<i64>,

    /// share of the word goal (1-100) that wins the round
    #[clap(short = 'g', long, allow_hyphen_values = true)]
    goal_percentage: Option<i64>,

    /// play zen mode until this many words are typed
    #[clap(short = 'z', long)]
    zen_goal: Option<i64>,

    /// word list to draw from (bundled or ~/.config/wordrush/words/<id>.json)
    #[clap(short = 'l', long)]
    word_list: Option<String>,

    /// name recorded with results
    #[clap(short = 'u', long)]
    username: Option<String>,

    /// print the most recent results and exit
    #[clap(long, num_args = 0..=1, default_missing_value = "10")]
    history: Option<usize>,

    /// write all recorded results to a CSV file and exit
    #[clap(long)]
    export_csv: Option<PathBuf>,

    /// list available word lists and exit
    #[clap(long)]
    list_word_lists: bool,

    /// log at debug level
    #[clap(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// Fold command-line overrides into the persisted settings.
    fn apply(&self, cfg: &mut Config) {
        if let Some(mode) = self.mode {
            cfg.apply_mode(mode);
        }
        if let Some(word_goal) = self.word_goal {
            cfg.word_goal = word_goal;
        }
        if let Some(bonus) = self.bonus {
            cfg.bonus_per_word = bonus;
        }
        if let Some(energy) = self.energy {
            cfg.initial_energy = energy;
        }
        if let Some(goal_percentage) = self.goal_percentage {
            cfg.goal_percentage = goal_percentage;
        }
        if let Some(zen_goal) = self.zen_goal {
            cfg.zen = true;
            cfg.word_goal = zen_goal;
        }
        if let Some(ref word_list) = self.word_list {
            cfg.word_list = word_list.clone();
        }
        if let Some(ref username) = self.username {
            cfg.username = username.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Typing,
    CheatEntry,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExitType {
    Continue,
    Quit,
}

pub struct App {
    pub round: Round,
    pub buffer: String,
    pub state: AppState,
    pub summary: Option<RoundSummary>,
    /// One-line message for the player (settings fallback, command replies).
    pub notice: Option<String>,
    pub cheat_form: CheatForm,
    pub cheat_field: CheatField,
    pub cheat_errors: CheatErrors,
    publisher: ResultPublisher,
}

impl App {
    pub fn new(round: Round, publisher: ResultPublisher, notice: Option<String>) -> Self {
        Self {
            round,
            buffer: String::new(),
            state: AppState::Typing,
            summary: None,
            notice,
            cheat_form: CheatForm::default(),
            cheat_field: CheatField::Wpm,
            cheat_errors: CheatErrors::default(),
            publisher,
        }
    }

    pub fn restart(&mut self) {
        if let Err(e) = self.round.restart() {
            warn!(error = %e, "could not restart round");
        }
        self.buffer.clear();
        self.state = AppState::Typing;
        self.summary = None;
        self.cheat_form = CheatForm::default();
        self.cheat_field = CheatField::Wpm;
        self.cheat_errors = CheatErrors::default();
    }

    fn feed(&mut self, now: Instant) -> ExitType {
        let effect = self.round.on_input(&self.buffer, now);
        self.apply_effect(effect)
    }

    fn apply_effect(&mut self, effect: InputEffect) -> ExitType {
        if effect.clear_buffer {
            self.buffer.clear();
        }
        if self.round.phase() == RoundPhase::CheatPending {
            self.state = AppState::CheatEntry;
        }
        if let Some(summary) = effect.summary {
            self.on_summary(summary);
        }
        ExitType::Continue
    }

    fn on_summary(&mut self, summary: RoundSummary) {
        if let Some(ref result) = summary.result {
            let delivered = self.publisher.publish(result);
            info!(delivered, score = result.score, "result published");
        }
        self.buffer.clear();
        self.summary = Some(summary);
        self.state = AppState::Results;
    }

    /// The command interpreter; runs when Enter is pressed in command mode.
    fn run_command(&mut self, now: Instant) -> ExitType {
        let command = self.buffer.trim().to_string();
        self.buffer.clear();
        let exit = self.feed(now);
        match command.trim_start_matches(COMMAND_PREFIX) {
            "quit" | "q" => return ExitType::Quit,
            "restart" | "r" => self.restart(),
            "help" | "h" => {
                self.notice = Some(
                    "/restart  /quit  /help  !debug  !abort  (time is paused while a command is typed)"
                        .to_string(),
                )
            }
            other => self.notice = Some(format!("unknown command: {other}")),
        }
        exit
    }

    pub fn on_tick_fast(&mut self, now: Instant) {
        if self.state == AppState::Typing {
            self.round.on_fast_tick(now);
        }
    }

    pub fn on_tick_slow(&mut self, now: Instant) {
        if self.state == AppState::Typing {
            if let Some(summary) = self.round.on_slow_tick(now) {
                self.on_summary(summary);
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) -> ExitType {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return ExitType::Quit;
        }
        match self.state {
            AppState::Typing => self.on_typing_key(key, now),
            AppState::CheatEntry => self.on_cheat_key(key, now),
            AppState::Results => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => ExitType::Quit,
                KeyCode::Char('r') | KeyCode::Enter => {
                    self.restart();
                    ExitType::Continue
                }
                _ => ExitType::Continue,
            },
        }
    }

    fn on_typing_key(&mut self, key: KeyEvent, now: Instant) -> ExitType {
        match key.code {
            KeyCode::Esc => ExitType::Quit,
            KeyCode::Enter if self.round.in_command_mode() => self.run_command(now),
            KeyCode::Backspace => {
                if self.buffer.pop().is_some() {
                    self.feed(now)
                } else {
                    ExitType::Continue
                }
            }
            // a space between words is habit, not an attempt
            KeyCode::Char(' ') if self.buffer.is_empty() => ExitType::Continue,
            KeyCode::Char(c) => {
                self.buffer.push(c);
                self.feed(now)
            }
            _ => ExitType::Continue,
        }
    }

    fn on_cheat_key(&mut self, key: KeyEvent, now: Instant) -> ExitType {
        match key.code {
            KeyCode::Esc => {
                if let Some(summary) = self.round.abort(now) {
                    self.on_summary(summary);
                }
            }
            KeyCode::Tab | KeyCode::Down => self.cheat_field = next_field(self.cheat_field),
            KeyCode::BackTab | KeyCode::Up => {
                self.cheat_field = next_field(next_field(self.cheat_field))
            }
            KeyCode::Backspace => {
                self.cheat_form.field_mut(self.cheat_field).pop();
            }
            KeyCode::Char(c) => self.cheat_form.field_mut(self.cheat_field).push(c),
            KeyCode::Enter => match self.round.submit_cheat(&self.cheat_form, now) {
                Ok(summary) => self.on_summary(summary),
                Err(EngineError::CheatRejected(errors)) => self.cheat_errors = errors,
                Err(e) => warn!(error = %e, "cheat submission failed"),
            },
            _ => {}
        }
        ExitType::Continue
    }
}

fn next_field(field: CheatField) -> CheatField {
    match field {
        CheatField::Wpm => CheatField::Accuracy,
        CheatField::Accuracy => CheatField::Time,
        CheatField::Time => CheatField::Wpm,
    }
}

fn init_logging(verbose: bool) {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .try_init();
}

fn open_history() -> Result<HistoryStore, EngineError> {
    match AppDirs::db_path() {
        Some(path) => HistoryStore::open(path),
        None => HistoryStore::open_in_memory(),
    }
}

fn print_history(limit: usize) -> Result<(), Box<dyn Error>> {
    let store = open_history()?;
    let recent = store.recent(limit)?;
    if recent.is_empty() {
        println!("no results recorded yet");
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:>5} {:>7} {:>7} {:>6} {:>6}",
        "when", "mode", "wpm", "acc", "score", "words", "energy"
    );
    for r in &recent {
        println!(
            "{:<20} {:<12} {:>5} {:>6.1}% {:>7} {:>6} {:>6}",
            r.timestamp.format("%Y-%m-%d %H:%M"),
            r.mode.to_string(),
            r.wpm,
            r.accuracy_percent,
            r.score,
            r.words_completed,
            r.energy_remaining.map_or("-".to_string(), |e| e.to_string()),
        );
    }

    let best = store.best_by_mode()?;
    println!(
        "\nbest: {}",
        best.iter()
            .map(|r| format!("{} {}", r.mode, r.score))
            .join(" | ")
    );
    Ok(())
}

fn list_word_lists() {
    let mut ids = BundledWords::ids();
    if let Some(dir) = AppDirs::word_list_dir() {
        if let Ok(entries) = std::fs::read_dir(dir) {
            ids.extend(
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                    .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string)),
            );
        }
    }
    for id in ids.into_iter().unique() {
        println!("{id}");
    }
}

fn word_source() -> ChainedWords {
    let mut sources: Vec<Box<dyn WordSource>> = Vec::new();
    if let Some(dir) = AppDirs::word_list_dir() {
        sources.push(Box::new(FileWords::new(dir)));
    }
    sources.push(Box::new(BundledWords));
    ChainedWords::new(sources)
}

fn build_app(cfg: &Config) -> Result<App, Box<dyn Error>> {
    let (engine_config, config_notice) = cfg.resolve();
    let mut notice = config_notice.map(|n| n.to_string());

    let source = word_source();
    let (list_id, language) = match source.active_list(&cfg.word_list) {
        Ok(language) => (cfg.word_list.clone(), language),
        Err(e) => {
            warn!(error = %e, list = %cfg.word_list, "falling back to english");
            notice = Some(format!("{e}, using english"));
            ("english".to_string(), BundledWords.active_list("english")?)
        }
    };

    let setup = RoundSetup {
        word_list_id: list_id,
        username: cfg.username.clone(),
        drain_interval: Duration::from_millis(cfg.slow_tick_ms.max(1)),
        ..RoundSetup::new(engine_config, language.words)
    };
    let mut round = Round::new(setup)?;
    round.start(engine_config)?;

    let mut publisher = ResultPublisher::new();
    match open_history() {
        Ok(store) => publisher.register(Box::new(store)),
        Err(e) => warn!(error = %e, "history unavailable, results will not be saved"),
    }

    Ok(App::new(round, publisher, notice))
}

/// Persist the applied settings; invalid tunables are saved as Classic.
/// Returns whether the write succeeded.
fn save_settings(store: &impl ConfigStore, cfg: &Config) -> bool {
    let mut saved = cfg.clone();
    if cfg.engine_config().is_err() {
        saved.reset_tunables();
    }
    match store.save(&saved) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "could not save settings");
            false
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(limit) = cli.history {
        return print_history(limit);
    }
    if let Some(ref path) = cli.export_csv {
        let results = open_history()?.recent(usize::MAX)?;
        export_csv(&results, File::create(path)?)?;
        println!("exported {} results to {}", results.len(), path.display());
        return Ok(());
    }
    if cli.list_word_lists {
        list_word_lists();
        return Ok(());
    }

    let store = FileConfigStore::new();
    let mut cfg = store.load();
    cli.apply(&mut cfg);
    save_settings(&store, &cfg);

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = build_app(&cfg)?;
    let fast = FixedTicker::new(Duration::from_millis(cfg.fast_tick_ms));
    let slow = FixedTicker::new(Duration::from_millis(cfg.slow_tick_ms));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app, Runner::new(CrosstermEventSource::new(), fast, slow));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut runner: Runner<CrosstermEventSource, FixedTicker, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    loop {
        runner.set_ticking(app.state == AppState::Typing && app.round.is_ticking());
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let now = Instant::now();
        let exit = match runner.step() {
            GameEvent::FastTick => {
                app.on_tick_fast(now);
                ExitType::Continue
            }
            GameEvent::SlowTick => {
                app.on_tick_slow(now);
                ExitType::Continue
            }
            GameEvent::Resize => ExitType::Continue,
            GameEvent::Key(key) => app.on_key(key, Instant::now()),
        };

        if exit == ExitType::Quit {
            if let Some(summary) = app.round.abort(Instant::now()) {
                info!(outcome = ?summary.outcome, "quit during round");
            }
            return Ok(());
        }
    }
}
