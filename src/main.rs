//! BLOCKFALL - a terminal falling-block puzzle

mod audio;
mod board;
mod game;
mod input;
mod piece;
mod score;
mod settings;
mod spawner;
mod tetromino;
mod ui;

use audio::{AudioManager, Sfx};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use game::{Action, Game, GameEvent};
use input::InputHandler;
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

fn main() -> io::Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    // Log to the temp directory; the terminal itself belongs to the game
    let log_dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&log_dir);
    let log_file = format!("{:08x}.log", session_id);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blockfall=debug".parse().unwrap()),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "blockfall starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    // Load settings
    let settings = Settings::load();

    // Initialize audio (optional - game works without audio)
    let mut audio = AudioManager::new();
    if let Some(ref mut a) = audio {
        a.set_sfx_volume(settings.audio.sfx_volume as f32 / 100.0);
    }

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run app and capture result
    let result = run_app(&mut terminal, &settings, &mut audio);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    // Write the settings file so there is something to edit
    if let Err(e) = settings.save() {
        eprintln!("Warning: Could not save settings: {}", e);
    }

    // Print final message
    if let Ok(game) = &result {
        println!("\nThanks for playing BLOCKFALL!");
        println!("Final Score: {}", game.score.points);
        println!("Level: {} | Lines: {}", game.score.level, game.score.lines);
    }

    result.map(|_| ())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    settings: &Settings,
    audio: &mut Option<AudioManager>,
) -> io::Result<Game> {
    let mut game = Game::new();
    let mut input = InputHandler::from_settings(settings);
    let mut last_tick = Instant::now();

    loop {
        // Render
        terminal.draw(|frame| ui::render_game(frame, &game, settings))?;

        // Handle input; all pending actions land before this frame's
        // gravity tick
        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                match key.kind {
                    KeyEventKind::Press => {
                        for action in input.key_down(key) {
                            if action == Action::Quit {
                                tracing::info!("quit requested");
                                return Ok(game);
                            }
                            game.handle(action);
                        }
                    }
                    KeyEventKind::Release => input.key_up(key),
                    _ => {}
                }
            }
        }

        // Process held keys
        for action in input.update() {
            game.handle(action);
        }
        if game.is_paused() {
            input.clear();
        }

        // Advance the simulation by the real frame time
        let elapsed = last_tick.elapsed();
        last_tick = Instant::now();
        game.update(elapsed);

        // Play SFX for whatever the frame produced
        for event in game.take_events() {
            if let Some(audio) = audio.as_mut() {
                let sfx = match event {
                    GameEvent::Rotated => Sfx::Rotate,
                    GameEvent::Locked => Sfx::Lock,
                    GameEvent::ClearStarted => Sfx::Clear,
                    GameEvent::LevelUp => Sfx::LevelUp,
                    GameEvent::GameOver => Sfx::GameOver,
                };
                audio.play_sfx(sfx);
            }
        }
    }
}
