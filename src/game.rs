//! Core game state and logic

use crate::board::Board;
use crate::piece::Piece;
use crate::score::Score;
use crate::spawner::Spawner;
use std::time::Duration;

/// How long cleared rows flash before they are removed
const CLEAR_FLASH: Duration = Duration::from_millis(150);

/// Game phase
///
/// All guard logic lives in [`Game::handle`] and [`Game::update`]; the
/// mutating helpers below assume their phase was already checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// The current piece is live and gravity applies
    Falling,
    /// Full rows are flashing; piece and gravity are frozen until the
    /// countdown runs out
    Clearing {
        rows: Vec<usize>,
        remaining: Duration,
    },
    /// Gravity suspended; only the pause toggle and reset do anything
    Paused,
    /// Terminal until an explicit reset
    GameOver,
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    Rotate,
    Pause,
    Reset,
    Quit,
}

/// Things that happened this frame which the shell may react to
/// (sound effects, mostly)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Rotated,
    Locked,
    ClearStarted,
    LevelUp,
    GameOver,
}

/// The main game struct
pub struct Game {
    /// The game board
    pub board: Board,
    /// Score tracking
    pub score: Score,
    /// Piece under player control
    current: Piece,
    /// Upcoming piece, shown in the side panel
    next: Piece,
    /// Piece randomizer
    spawner: Spawner,
    /// Current phase
    phase: Phase,
    /// Time since the last automatic descent
    drop_accumulator: Duration,
    /// Events since the last `take_events` call
    events: Vec<GameEvent>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Create a new game with a random piece sequence
    pub fn new() -> Self {
        Self::with_spawner(Spawner::new())
    }

    /// Create a new game with a seeded piece sequence
    #[allow(dead_code)]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_spawner(Spawner::with_seed(seed))
    }

    fn with_spawner(mut spawner: Spawner) -> Self {
        let current = spawner.next_piece();
        let next = spawner.next_piece();
        Self {
            board: Board::new(),
            score: Score::new(),
            current,
            next,
            spawner,
            phase: Phase::Falling,
            drop_accumulator: Duration::ZERO,
            events: Vec::new(),
        }
    }

    /// Restore the initial state: empty board, score 0, level 1, fresh
    /// pieces. Works from any phase, including game over.
    pub fn reset(&mut self) {
        *self = Self::with_spawner(self.spawner.clone());
    }

    /// Apply a player action. Which actions do anything depends on the
    /// phase; everything else is inert.
    pub fn handle(&mut self, action: Action) {
        match self.phase {
            Phase::Falling => match action {
                Action::MoveLeft => {
                    self.try_move(-1, 0);
                }
                Action::MoveRight => {
                    self.try_move(1, 0);
                }
                Action::SoftDrop => {
                    self.try_move(0, 1);
                }
                Action::HardDrop => self.hard_drop(),
                Action::Rotate => {
                    if self.try_rotate(1) {
                        self.events.push(GameEvent::Rotated);
                    }
                }
                Action::Pause => self.phase = Phase::Paused,
                Action::Reset => self.reset(),
                Action::Quit => {
                    // Handled by the shell
                }
            },
            Phase::Paused => match action {
                Action::Pause => self.phase = Phase::Falling,
                Action::Reset => self.reset(),
                _ => {}
            },
            // The flash window rejects everything except a restart
            Phase::Clearing { .. } | Phase::GameOver => {
                if action == Action::Reset {
                    self.reset();
                }
            }
        }
    }

    /// Advance the simulation by the elapsed frame time
    pub fn update(&mut self, elapsed: Duration) {
        let mut flash_done = false;
        match &mut self.phase {
            Phase::GameOver | Phase::Paused => {}
            Phase::Clearing { remaining, .. } => {
                // Gravity is fully suspended while the flash runs down
                *remaining = remaining.saturating_sub(elapsed);
                flash_done = remaining.is_zero();
            }
            Phase::Falling => {
                self.drop_accumulator += elapsed;
                if self.drop_accumulator >= self.score.gravity_interval() {
                    self.drop_accumulator = Duration::ZERO;
                    if !self.try_move(0, 1) {
                        self.lock_current();
                    }
                }
            }
        }
        if flash_done {
            self.finish_clear();
        }
    }

    /// Drain the events recorded since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// The piece under player control, hidden while a clear flash runs
    /// and once the game is over
    pub fn current_piece(&self) -> Option<&Piece> {
        matches!(self.phase, Phase::Falling | Phase::Paused).then_some(&self.current)
    }

    /// The upcoming piece
    pub fn next_piece(&self) -> &Piece {
        &self.next
    }

    /// Rows mid-clear, with the fraction of the flash still to run
    pub fn clearing(&self) -> Option<(&[usize], f32)> {
        match &self.phase {
            Phase::Clearing { rows, remaining } => Some((
                rows.as_slice(),
                remaining.as_secs_f32() / CLEAR_FLASH.as_secs_f32(),
            )),
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Replace the current piece with a translated candidate if it fits
    fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        let candidate = self.current.translated(dx, dy);
        if self.board.collides(&candidate) {
            return false;
        }
        self.current = candidate;
        true
    }

    /// Replace the current piece with a rotated candidate if it fits.
    /// No kick offsets are tried; a blocked rotation fails outright.
    fn try_rotate(&mut self, delta: i32) -> bool {
        let candidate = self.current.rotated(delta);
        if self.board.collides(&candidate) {
            return false;
        }
        self.current = candidate;
        true
    }

    /// Drop to the lowest legal position, score the distance, and lock
    fn hard_drop(&mut self) {
        let mut distance = 0;
        while self.try_move(0, 1) {
            distance += 1;
        }
        self.score.add_hard_drop(distance);
        self.lock_current();
    }

    /// Commit the current piece to the board and decide what comes next:
    /// a clear flash when rows filled up, otherwise the next piece
    fn lock_current(&mut self) {
        self.board.lock(&self.current);
        self.events.push(GameEvent::Locked);

        let rows = self.board.full_rows();
        if rows.is_empty() {
            self.spawn_next();
        } else {
            tracing::debug!(rows = rows.len(), "clear flash started");
            self.events.push(GameEvent::ClearStarted);
            self.phase = Phase::Clearing {
                rows,
                remaining: CLEAR_FLASH,
            };
        }
    }

    /// The flash ran out: award the clear, drop the rows, bring in the
    /// next piece
    fn finish_clear(&mut self) {
        let Phase::Clearing { rows, .. } =
            std::mem::replace(&mut self.phase, Phase::Falling)
        else {
            return;
        };

        if self.score.add_clear(rows.len()) {
            // Faster gravity starts from a clean accumulator
            self.drop_accumulator = Duration::ZERO;
            self.events.push(GameEvent::LevelUp);
            tracing::info!(
                level = self.score.level,
                interval_ms = self.score.gravity_interval().as_millis() as u64,
                "level up"
            );
        }
        tracing::debug!(
            cleared = rows.len(),
            lines = self.score.lines,
            points = self.score.points,
            "rows cleared"
        );

        self.board.remove_rows(&rows);
        self.spawn_next();
    }

    /// Promote the held next piece and draw a fresh one; a blocked spawn
    /// ends the game
    fn spawn_next(&mut self) {
        self.current = self.next;
        self.next = self.spawner.next_piece();
        if self.board.collides(&self.current) {
            self.phase = Phase::GameOver;
            self.events.push(GameEvent::GameOver);
            tracing::info!(
                points = self.score.points,
                lines = self.score.lines,
                "game over"
            );
        } else {
            self.phase = Phase::Falling;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Cell, COLS, ROWS};
    use crate::tetromino::TetrominoType;

    /// Fill a row except for the given columns
    fn fill_row_except(game: &mut Game, y: usize, gaps: &[usize]) {
        for x in 0..COLS {
            if !gaps.contains(&x) {
                game.board.set(x as i32, y as i32, Cell::Filled(TetrominoType::L));
            }
        }
    }

    /// An O piece dropped at spawn lands on the floor filling columns 4-5
    fn game_with_o_piece() -> Game {
        let mut game = Game::with_seed(42);
        game.current = Piece::spawn(TetrominoType::O);
        game
    }

    #[test]
    fn test_moves_shift_the_piece() {
        let mut game = game_with_o_piece();
        let x = game.current.x;
        game.handle(Action::MoveLeft);
        assert_eq!(game.current.x, x - 1);
        game.handle(Action::MoveRight);
        game.handle(Action::MoveRight);
        assert_eq!(game.current.x, x + 1);
        game.handle(Action::SoftDrop);
        assert_eq!(game.current.y, 1);
    }

    #[test]
    fn test_walls_stop_movement() {
        let mut game = game_with_o_piece();
        for _ in 0..COLS {
            game.handle(Action::MoveLeft);
        }
        // O occupies columns 1-2 of its box, so the box can hang one past
        // the left edge
        assert_eq!(game.current.x, -1);
        for _ in 0..COLS {
            game.handle(Action::MoveRight);
        }
        assert_eq!(game.current.x, COLS as i32 - 3);
    }

    #[test]
    fn test_blocked_rotation_fails_without_kicks() {
        let mut game = Game::with_seed(1);
        // Vertical I bar hugging the left wall; going horizontal would
        // poke out at x = -1
        game.current = Piece {
            kind: TetrominoType::I,
            x: -1,
            y: 5,
            rotation: 1,
        };
        game.handle(Action::Rotate);
        assert_eq!(game.current.rotation, 1);
        assert!(game.take_events().is_empty());
    }

    #[test]
    fn test_rotation_succeeds_in_the_open() {
        let mut game = Game::with_seed(1);
        game.current = Piece {
            kind: TetrominoType::T,
            x: 3,
            y: 5,
            rotation: 0,
        };
        game.handle(Action::Rotate);
        assert_eq!(game.current.rotation, 1);
        assert_eq!(game.take_events(), vec![GameEvent::Rotated]);
    }

    #[test]
    fn test_gravity_waits_for_the_interval() {
        let mut game = game_with_o_piece();
        game.update(Duration::from_millis(799));
        assert_eq!(game.current.y, 0);
        game.update(Duration::from_millis(1));
        assert_eq!(game.current.y, 1);
        assert_eq!(game.drop_accumulator, Duration::ZERO);
    }

    #[test]
    fn test_gravity_locks_a_grounded_piece() {
        let mut game = game_with_o_piece();
        game.current = game.current.translated(0, ROWS as i32 - 2);
        game.update(Duration::from_millis(800));
        // The O is on the floor, so the failed descent locked it
        assert_eq!(game.board.get(4, ROWS as i32 - 1), Some(Cell::Filled(TetrominoType::O)));
        assert_eq!(game.board.get(5, ROWS as i32 - 2), Some(Cell::Filled(TetrominoType::O)));
        assert!(game.take_events().contains(&GameEvent::Locked));
        // And the next piece took over at spawn
        assert_eq!(game.current_piece().map(|p| p.y), Some(0));
    }

    #[test]
    fn test_hard_drop_bonus_counts_rows() {
        let mut game = game_with_o_piece();
        game.handle(Action::HardDrop);
        // O falls from row 0 to rows 18-19: 18 descents, 2 points each
        assert_eq!(game.score.points, 36);
        assert!(game.board.get(4, 18).is_some_and(|c| c.is_filled()));
    }

    #[test]
    fn test_double_clear_scores_at_level_one() {
        let mut game = game_with_o_piece();
        fill_row_except(&mut game, ROWS - 2, &[4, 5]);
        fill_row_except(&mut game, ROWS - 1, &[4, 5]);

        game.handle(Action::HardDrop);

        // Both bottom rows filled up: the flash is running, the piece is
        // hidden, and inputs are inert
        let (rows, fraction) = game.clearing().expect("clear flash should be active");
        assert_eq!(rows, &[ROWS - 2, ROWS - 1]);
        assert!(fraction > 0.9);
        assert!(game.current_piece().is_none());
        let frozen = game.current;
        game.handle(Action::MoveLeft);
        assert_eq!(game.current, frozen);

        // Run the flash down: 300 points for the double at level 1, on
        // top of the 36-point hard drop
        game.update(Duration::from_millis(150));
        assert_eq!(game.score.points, 36 + 300);
        assert_eq!(game.score.lines, 2);
        assert_eq!(game.score.level, 1);
        assert!(game.clearing().is_none());
        assert!(game.board.is_empty());
    }

    #[test]
    fn test_clear_flash_runs_across_frames() {
        let mut game = game_with_o_piece();
        fill_row_except(&mut game, ROWS - 1, &[4, 5]);
        game.handle(Action::HardDrop);

        game.update(Duration::from_millis(100));
        let (_, fraction) = game.clearing().expect("flash still running");
        assert!((fraction - 1.0 / 3.0).abs() < 0.01);

        game.update(Duration::from_millis(100));
        assert!(game.clearing().is_none());
        assert_eq!(game.score.lines, 1);
    }

    #[test]
    fn test_level_up_shortens_gravity_and_resets_accumulator() {
        let mut game = game_with_o_piece();
        game.score.lines = 8;
        game.drop_accumulator = Duration::from_millis(500);
        fill_row_except(&mut game, ROWS - 2, &[4, 5]);
        fill_row_except(&mut game, ROWS - 1, &[4, 5]);

        game.handle(Action::HardDrop);
        game.update(Duration::from_millis(150));

        assert_eq!(game.score.lines, 10);
        assert_eq!(game.score.level, 2);
        assert_eq!(game.score.gravity_interval(), Duration::from_millis(730));
        assert_eq!(game.drop_accumulator, Duration::ZERO);
        assert!(game.take_events().contains(&GameEvent::LevelUp));
    }

    #[test]
    fn test_blocked_spawn_ends_the_game() {
        let mut game = game_with_o_piece();
        // Junk across the spawn area (not full rows), so whatever piece
        // comes next collides immediately
        for x in 3..=6 {
            for y in 0..=1 {
                game.board.set(x, y, Cell::Filled(TetrominoType::S));
            }
        }
        game.current = Piece::spawn(TetrominoType::O).translated(0, ROWS as i32 - 2);
        game.handle(Action::HardDrop);

        assert!(game.is_game_over());
        assert!(game.take_events().contains(&GameEvent::GameOver));

        // Terminal: nothing moves until an explicit reset
        let points = game.score.points;
        game.handle(Action::MoveLeft);
        game.handle(Action::Rotate);
        game.update(Duration::from_secs(5));
        assert!(game.is_game_over());
        assert_eq!(game.score.points, points);
        assert_eq!(game.drop_accumulator, Duration::ZERO);
        assert!(game.board.get(3, 0).is_some_and(|c| c.is_filled()));

        game.handle(Action::Reset);
        assert!(!game.is_game_over());
        assert!(game.board.is_empty());
        assert_eq!(game.score.points, 0);
        assert_eq!(game.score.level, 1);
    }

    #[test]
    fn test_pause_freezes_the_simulation() {
        let mut game = game_with_o_piece();
        game.handle(Action::Pause);
        assert!(game.is_paused());

        game.update(Duration::from_secs(2));
        assert_eq!(game.current.y, 0);
        assert_eq!(game.drop_accumulator, Duration::ZERO);
        game.handle(Action::MoveLeft);
        assert_eq!(game.current.x, 3);

        // The piece stays visible behind the pause overlay
        assert!(game.current_piece().is_some());

        game.handle(Action::Pause);
        assert!(!game.is_paused());
        game.update(Duration::from_millis(800));
        assert_eq!(game.current.y, 1);
    }

    #[test]
    fn test_reset_works_while_paused() {
        let mut game = game_with_o_piece();
        game.handle(Action::SoftDrop);
        game.handle(Action::Pause);
        game.handle(Action::Reset);
        assert!(!game.is_paused());
        assert_eq!(game.current_piece().map(|p| p.y), Some(0));
    }

    #[test]
    fn test_seeded_games_agree() {
        let mut a = Game::with_seed(99);
        let mut b = Game::with_seed(99);
        for _ in 0..5 {
            a.handle(Action::HardDrop);
            b.handle(Action::HardDrop);
        }
        assert_eq!(a.current, b.current);
        assert_eq!(a.next, b.next);
    }
}
