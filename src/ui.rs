//! Terminal UI rendering with ratatui

use crate::board::{Cell, COLS, ROWS};
use crate::game::Game;
use crate::piece::Piece;
use crate::settings::Settings;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const EMPTY: &str = "  ";

/// Total width needed: board(22) + next/stats(16) = 38
const GAME_WIDTH: u16 = 38;
/// Board rows plus the two border lines
const GAME_HEIGHT: u16 = ROWS as u16 + 2;

/// Render the entire game UI
pub fn render_game(frame: &mut Frame, game: &Game, settings: &Settings) {
    let area = frame.area();
    let (block_char, _) = settings.visual.block_chars();

    // Center the game area
    let game_area = center_rect(area, GAME_WIDTH, GAME_HEIGHT);

    let main_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(22), // Board (10*2 + 2 for borders)
            Constraint::Length(16), // Next box + stats
        ])
        .split(game_area);

    render_board(frame, main_layout[0], game, settings);

    let right_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Next box
            Constraint::Min(12),   // Stats
        ])
        .split(main_layout[1]);

    render_next(frame, right_layout[0], game.next_piece(), block_char);
    render_stats(frame, right_layout[1], game);

    // Overlays
    if game.is_paused() {
        render_overlay(frame, area, "PAUSED", "Press P to resume");
    }
    if game.is_game_over() {
        render_overlay(frame, area, "GAME OVER", "R restarts, Q quits");
    }
}

/// Center a rect within another rect
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Where the current piece would land if dropped straight down
fn ghost_piece(game: &Game) -> Option<Piece> {
    let mut ghost = *game.current_piece()?;
    while !game.board.collides(&ghost.translated(0, 1)) {
        ghost = ghost.translated(0, 1);
    }
    Some(ghost)
}

/// Render the game board
fn render_board(frame: &mut Frame, area: Rect, game: &Game, settings: &Settings) {
    let (block_char, ghost_char) = settings.visual.block_chars();

    let block = Block::default()
        .title(" BLOCKFALL ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let clearing = game.clearing();
    // Rows mid-clear blink as the countdown runs down
    let flash_on = clearing.is_some_and(|(_, fraction)| (fraction * 4.0) as u32 % 2 == 0);

    let current = game.current_piece();
    let ghost = if settings.visual.show_ghost {
        ghost_piece(game)
    } else {
        None
    };

    let mut lines: Vec<Line> = Vec::new();
    for y in 0..ROWS as i32 {
        let mid_clear = clearing.is_some_and(|(rows, _)| rows.contains(&(y as usize)));
        let mut spans = Vec::new();

        for x in 0..COLS as i32 {
            let (text, style) = if mid_clear {
                let style = if flash_on {
                    Style::default().fg(Color::White).bold()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                (block_char, style)
            } else if let Some(piece) = current.filter(|p| p.cells().any(|c| c == (x, y))) {
                (block_char, Style::default().fg(piece.kind.color()))
            } else if let Some(piece) = ghost.filter(|p| p.cells().any(|c| c == (x, y))) {
                (ghost_char, Style::default().fg(piece.kind.color()).dim())
            } else {
                match game.board.get(x, y) {
                    Some(Cell::Filled(kind)) => (block_char, Style::default().fg(kind.color())),
                    _ => (EMPTY, Style::default()),
                }
            };

            spans.push(Span::styled(text, style));
        }

        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

/// Render the next piece box
fn render_next(frame: &mut Frame, area: Rect, next: &Piece, block_char: &str) {
    let block = Block::default()
        .title(" NEXT ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let color = next.kind.color();
    let mask = next.mask();

    // Spawn-state pieces fit in the top two rows of their 4x4 box
    let mut lines: Vec<Line> = Vec::new();
    for row in &mask[..2] {
        let mut spans = Vec::new();
        for &cell in row {
            if cell != 0 {
                spans.push(Span::styled(block_char, Style::default().fg(color)));
            } else {
                spans.push(Span::raw(EMPTY));
            }
        }
        lines.push(Line::from(spans));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

/// Render stats panel
fn render_stats(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(Span::styled("SCORE", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", game.score.points),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::raw(""),
        Line::from(Span::styled("LEVEL", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", game.score.level),
            Style::default().fg(Color::Cyan),
        )),
        Line::raw(""),
        Line::from(Span::styled("LINES", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}", game.score.lines),
            Style::default().fg(Color::Green),
        )),
        Line::raw(""),
        Line::from(Span::styled("SPEED", Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            format!("{}ms", game.score.gravity_interval().as_millis()),
            Style::default().fg(Color::White),
        )),
    ];

    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, inner);
}

/// Render an overlay (for pause/game over)
fn render_overlay(frame: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let popup_width = 24u16;
    let popup_height = 5u16;
    let popup_area = center_rect(area, popup_width, popup_height);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .style(Style::default().bg(Color::Black));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let text = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
        Line::styled(subtitle, Style::default().fg(Color::Gray)),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}
