mod app;
mod braille;
mod capture;
mod color;
mod config;
mod error;
mod frame;
mod links;
mod particle;
mod presets;
mod quiz;
mod settings;
mod simulation;
mod surface;
mod ui;

use app::{App, Focus};
use clap::{Args, Parser, Subcommand};
use color::Palette;
use config::AppConfig;
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event, KeyCode,
        KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use env_logger::{Env, Target};
use frame::{FrameDriver, FrameTicket};
use presets::PresetManager;
use quiz::QuizBattle;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use settings::PARTICLE_STEP;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// The quiz only needs to redraw its timer
const QUIZ_FPS: u32 = 30;

#[derive(Parser, Debug)]
#[command(name = "portfolio-demos")]
#[command(about = "Constellation particle field and grammar quiz battle in the terminal")]
#[command(version)]
struct Cli {
    /// Write logs here instead of the user cache directory
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive constellation particle field (default)
    Particles(ParticleArgs),
    /// Grammar quiz battle against the Commawidow
    Quiz(QuizArgs),
}

#[derive(Args, Debug, Default)]
struct ParticleArgs {
    /// Number of particles (0-300)
    #[arg(short = 'p', long)]
    particles: Option<usize>,

    /// Start from a named preset (light, medium, dense, swarm, calm, embers, or a saved one)
    #[arg(long)]
    preset: Option<String>,

    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the final settings to a JSON config file on exit
    #[arg(long = "save-config")]
    save_config: Option<PathBuf>,

    /// Color palette (cool, aurora, ember, mono)
    #[arg(long, value_parser = parse_palette)]
    palette: Option<Palette>,

    /// Target frames per second (10-120)
    #[arg(long)]
    fps: Option<u32>,

    /// RNG seed for a reproducible particle layout
    #[arg(long)]
    seed: Option<u64>,

    /// Clear the canvas every frame instead of leaving trails
    #[arg(long = "no-trails")]
    no_trails: bool,

    /// Directory for PNG snapshots and GIF recordings
    #[arg(long = "capture-dir")]
    capture_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct QuizArgs {
    /// Load questions from a JSON file instead of the built-in bank
    #[arg(long)]
    questions: Option<PathBuf>,

    /// Go straight to the battle
    #[arg(long = "skip-intro")]
    skip_intro: bool,
}

fn parse_palette(s: &str) -> Result<Palette, String> {
    Palette::parse(s).ok_or_else(|| format!("unknown palette '{}' (cool, aurora, ember, mono)", s))
}

fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("portfolio-demos").join("demos.log"))
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// The terminal belongs to the UI, so logs go to a file (or nowhere)
fn init_logging(path: Option<PathBuf>) {
    let target: Box<dyn Write + Send> = match path.or_else(default_log_path).map(|p| open_log(&p)) {
        Some(Ok(file)) => Box::new(file),
        _ => Box::new(io::sink()),
    };
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(target))
        .init();
}

/// Resolve CLI flags into a config: file, then preset, then individual overrides
fn build_config(args: &ParticleArgs, presets: &PresetManager) -> error::Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        config.settings = presets.find(name)?.settings.clone();
    }
    if let Some(count) = args.particles {
        config.settings.particle_count = count;
    }
    if let Some(palette) = args.palette {
        config.settings.palette = palette;
    }
    if let Some(fps) = args.fps {
        config.fps = fps.clamp(frame::MIN_FPS, frame::MAX_FPS);
    }
    if args.no_trails {
        config.settings.trails = false;
    }
    config.settings.sanitize();
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_file);

    let command = cli.command.unwrap_or(Command::Particles(ParticleArgs::default()));

    // Resolve everything that can fail before taking over the terminal
    let demo = match command {
        Command::Particles(args) => {
            let presets = PresetManager::new();
            let config = build_config(&args, &presets)?;
            Demo::Particles {
                config,
                presets,
                seed: args.seed,
                save_config: args.save_config,
                capture_dir: args.capture_dir,
            }
        }
        Command::Quiz(args) => {
            let questions = match &args.questions {
                Some(path) => quiz::load_questions(path)?,
                None => quiz::builtin_questions(),
            };
            let mut quiz = QuizBattle::new(questions);
            if args.skip_intro {
                quiz.skip_intro();
            }
            Demo::Quiz(quiz)
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = demo.run(&mut terminal);

    // Cleanup
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("Demo failed: {}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

enum Demo {
    Particles {
        config: AppConfig,
        presets: PresetManager,
        seed: Option<u64>,
        save_config: Option<PathBuf>,
        capture_dir: Option<PathBuf>,
    },
    Quiz(QuizBattle),
}

impl Demo {
    fn run<B: ratatui::backend::Backend>(self, terminal: &mut Terminal<B>) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Demo::Particles {
                config,
                presets,
                seed,
                save_config,
                capture_dir,
            } => {
                let size = terminal.size()?;
                let screen = Rect::new(0, 0, size.width, size.height);
                let mut app = App::new(screen, &config, seed, presets);
                if let Some(dir) = capture_dir {
                    app.capture_dir = dir;
                }

                let res = run_particles(terminal, &mut app);
                app.teardown();
                if let Some(path) = save_config {
                    app.config().save_to_file(&path)?;
                }
                res?;
            }
            Demo::Quiz(mut quiz) => run_quiz(terminal, &mut quiz)?,
        }
        Ok(())
    }
}

/// Handle input until `ticket` is due. Returns true when the handler asked to quit.
///
/// An overdue ticket still gets one event through so input is never starved.
fn drain_events(ticket: &FrameTicket, mut handle: impl FnMut(Event) -> bool) -> io::Result<bool> {
    loop {
        let timeout = ticket.remaining(Instant::now());
        if !event::poll(timeout)? {
            return Ok(false);
        }
        if handle(event::read()?) {
            return Ok(true);
        }
        if timeout.is_zero() {
            return Ok(false);
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn run_particles<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    while let Some(ticket) = app.driver.request_frame() {
        let max_scroll = ui::controls_max_scroll(terminal.size()?.height);
        if drain_events(&ticket, |ev| handle_particle_event(app, ev, max_scroll))? {
            return Ok(());
        }

        // Input may have restarted the driver, which makes this ticket stale
        if app.driver.begin(ticket, Instant::now()) {
            app.frame();
            terminal.draw(|frame| ui::render(frame, app))?;
        }
    }
    Ok(())
}

fn handle_particle_event(app: &mut App, event: Event, controls_max_scroll: u16) -> bool {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if is_quit(&key) {
                return true;
            }
            handle_particle_key(app, key.code, controls_max_scroll);
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => app.pointer_moved(mouse.column, mouse.row),
            _ => {}
        },
        Event::FocusLost => app.pointer_left(),
        Event::Resize(width, height) => app.resize(Rect::new(0, 0, width, height)),
        _ => {}
    }
    false
}

fn handle_particle_key(app: &mut App, code: KeyCode, controls_max_scroll: u16) {
    match code {
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('r') | KeyCode::Char('R') => app.reinitialize(),
        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            app.adjust_particles(PARTICLE_STEP);
            app.focus = Focus::Particles;
        }
        KeyCode::Char('-') | KeyCode::Char('_') => {
            app.adjust_particles(-PARTICLE_STEP);
            app.focus = Focus::Particles;
        }
        KeyCode::Char('c') | KeyCode::Char('C') => {
            app.cycle_palette(true);
            app.focus = Focus::Palette;
        }
        KeyCode::Char('x') | KeyCode::Char('X') => {
            app.random_palette();
            app.focus = Focus::Palette;
        }
        KeyCode::Char('t') | KeyCode::Char('T') => {
            app.toggle_trails();
            app.focus = Focus::Trails;
        }
        KeyCode::Char('n') | KeyCode::Char('N') => app.next_preset(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.save_current_preset(),
        KeyCode::Char('d') | KeyCode::Char('D') => app.delete_current_preset(),
        KeyCode::Char('p') | KeyCode::Char('P') => app.snapshot(),
        KeyCode::Char('g') | KeyCode::Char('G') => app.toggle_recording(),

        // Navigation
        KeyCode::Tab => app.next_focus(),
        KeyCode::BackTab => app.prev_focus(),
        KeyCode::Up => {
            if !app.show_help {
                if app.focus.is_param() {
                    app.adjust_focused_up();
                } else {
                    app.scroll_controls_up();
                }
            }
        }
        KeyCode::Down => {
            if !app.show_help {
                if app.focus.is_param() {
                    app.adjust_focused_down();
                } else {
                    app.scroll_controls_down(controls_max_scroll);
                }
            }
        }
        KeyCode::Esc => {
            if app.show_help {
                app.toggle_help();
            } else if app.focus.is_param() {
                app.focus = Focus::Controls;
            }
        }
        KeyCode::Char('j') | KeyCode::Char('J') => {
            if app.show_help {
                app.scroll_help_down(ui::HELP_CONTENT_LINES);
            }
        }
        KeyCode::Char('k') | KeyCode::Char('K') => {
            if app.show_help {
                app.scroll_help_up();
            }
        }
        _ => {}
    }
}

fn run_quiz<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, quiz: &mut QuizBattle) -> io::Result<()> {
    let mut driver = FrameDriver::new(QUIZ_FPS);
    driver.start();
    let mut last_tick = Instant::now();

    while let Some(ticket) = driver.request_frame() {
        let quit = drain_events(&ticket, |ev| match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if is_quit(&key) {
                    return true;
                }
                handle_quiz_key(quiz, key.code);
                false
            }
            _ => false,
        })?;
        if quit {
            driver.cancel();
            break;
        }

        let now = Instant::now();
        if driver.begin(ticket, now) {
            quiz.tick(now.saturating_duration_since(last_tick));
            last_tick = now;
            terminal.draw(|frame| ui::render_quiz(frame, quiz))?;
        }
    }
    Ok(())
}

fn handle_quiz_key(quiz: &mut QuizBattle, code: KeyCode) {
    match code {
        KeyCode::Enter | KeyCode::Char(' ') => quiz.advance(),
        KeyCode::Char('s') | KeyCode::Char('S') => quiz.skip_intro(),
        KeyCode::Char('r') | KeyCode::Char('R') => quiz.restart(),
        KeyCode::Char(c @ '1'..='9') => answer(quiz, c as usize - '1' as usize),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => {
            let index = c.to_ascii_lowercase() as usize - 'a' as usize;
            if index < 9 {
                answer(quiz, index);
            }
        }
        _ => {}
    }
}

fn answer(quiz: &mut QuizBattle, option: usize) {
    if let Some(correct) = quiz.answer(option) {
        log::debug!("Answered option {} ({})", option, if correct { "correct" } else { "wrong" });
    }
}
