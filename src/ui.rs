use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::app::{App, Screen};
use crate::board::{Board, Marker, LONG_GAME_THRESHOLD};
use crate::input::{KeypadButton, PadKey};
use crate::session::NoticeKind;
use crate::stats::{distribution_bars, StatsRecord};

pub const KEYPAD_HEIGHT: u16 = 3;

const DIGIT_KEY_WIDTH: u16 = 3;
const DELETE_LABEL: &str = " DELETE ";
const ENTER_LABEL: &str = " ENTER ";

/// On-screen keypad geometry, derived purely from the drawn area so the
/// renderer and the mouse dispatcher always agree on the hit-boxes.
pub fn keypad_layout(area: Rect) -> Vec<KeypadButton> {
    let digits_width = 10 * DIGIT_KEY_WIDTH + 9;
    if area.height < KEYPAD_HEIGHT || area.width < digits_width {
        return Vec::new();
    }

    let digits_y = area.y + area.height - KEYPAD_HEIGHT;
    let controls_y = digits_y + 2;
    let mut buttons = Vec::new();

    let mut x = area.x + (area.width - digits_width) / 2;
    for d in "1234567890".chars() {
        buttons.push(KeypadButton {
            rect: Rect::new(x, digits_y, DIGIT_KEY_WIDTH, 1),
            key: PadKey::Digit(d),
        });
        x += DIGIT_KEY_WIDTH + 1;
    }

    let controls_width = (DELETE_LABEL.len() + 3 + ENTER_LABEL.len()) as u16;
    let mut x = area.x + (area.width - controls_width) / 2;
    buttons.push(KeypadButton {
        rect: Rect::new(x, controls_y, DELETE_LABEL.len() as u16, 1),
        key: PadKey::Delete,
    });
    x += DELETE_LABEL.len() as u16 + 3;
    buttons.push(KeypadButton {
        rect: Rect::new(x, controls_y, ENTER_LABEL.len() as u16, 1),
        key: PadKey::Enter,
    });

    buttons
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.screen {
            Screen::Playing => render_playing(self, area, buf),
            Screen::Results => render_results(self, area, buf),
            Screen::Stats => render_stats(self, area, buf),
        }
    }
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),             // header
            Constraint::Min(1),                // board
            Constraint::Length(1),             // notice
            Constraint::Length(1),             // confirm prompt
            Constraint::Length(KEYPAD_HEIGHT), // keypad
        ])
        .split(area);

    render_header(app, chunks[0], buf);
    render_board(app, chunks[1].inner(Margin::new(2, 0)), buf);
    render_notice(app, chunks[2], buf);
    render_prompt(app, chunks[3], buf);
    render_keypad(app.session.board(), area, buf);
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let max = session.config().max_attempts;
    let attempts = if max >= LONG_GAME_THRESHOLD {
        "∞".to_string()
    } else {
        max.to_string()
    };

    let title = Line::from(vec![
        Span::styled("CODEBREAKER", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(
                "  {} · {} digits · attempt {}/{}",
                app.setup.mode_label,
                session.config().code_length,
                session.current_row() + 1,
                attempts
            ),
            Style::default().add_modifier(Modifier::DIM),
        ),
    ]);

    let mut status = vec![Span::styled(
        "h hint · g give up · s stats · q quit",
        Style::default().add_modifier(Modifier::DIM),
    )];
    if session.timer().enabled() {
        let timer_style = if session.timer().is_urgent() {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        status.push(Span::raw("   "));
        status.push(Span::styled(session.timer().format(), timer_style));
    }

    Paragraph::new(vec![title, Line::from(status)])
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_board(app: &App, area: Rect, buf: &mut Buffer) {
    let board = app.session.board();
    let current = app.session.current_row();
    let rendered = board.rendered_rows();
    let visible = (area.height as usize).max(1);

    // keep the active row in view, like scrolling it into the viewport
    let mut first = current.saturating_sub(visible / 2);
    if first + visible > rendered {
        first = rendered.saturating_sub(visible);
    }
    let last = rendered.min(first + visible);

    let active_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let filled_style = Style::default().add_modifier(Modifier::BOLD);
    let empty_style = Style::default().add_modifier(Modifier::DIM);

    let mut lines = Vec::with_capacity(last - first);
    for row_idx in first..last {
        let Some(row) = board.row(row_idx) else {
            continue;
        };
        let is_active = row_idx == current && !app.session.is_over();

        let mut spans = vec![Span::styled(
            format!("{} {:>4}  ", if is_active { "❯" } else { " " }, row_idx + 1),
            Style::default().add_modifier(Modifier::DIM),
        )];

        for tile in &row.tiles {
            match tile {
                Some(d) => spans.push(Span::styled(
                    format!("{d} "),
                    if is_active { active_style } else { filled_style },
                )),
                None => spans.push(Span::styled("_ ", empty_style)),
            }
        }

        spans.push(Span::raw("  "));
        for marker in &row.markers {
            let (symbol, style) = match marker {
                Marker::Exact => ("●", Style::default().fg(Color::Green)),
                Marker::Partial => ("●", Style::default().fg(Color::Yellow)),
                Marker::Miss => ("●", Style::default().fg(Color::DarkGray)),
                Marker::Empty => ("·", empty_style),
            };
            spans.push(Span::styled(symbol, style));
            spans.push(Span::raw(" "));
        }

        lines.push(Line::from(spans));
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_notice(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(notice) = app.session.notice() else {
        return;
    };
    let style = match notice.kind {
        NoticeKind::Shake => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        NoticeKind::Rejection => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        NoticeKind::Info => Style::default().fg(Color::Yellow),
    };
    Paragraph::new(Span::styled(notice.text.clone(), style))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_prompt(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(confirm) = app.session.confirm() else {
        return;
    };
    Paragraph::new(Span::styled(
        confirm.prompt(),
        Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn render_keypad(board: &Board, area: Rect, buf: &mut Buffer) {
    for button in keypad_layout(area) {
        let (label, style) = match button.key {
            PadKey::Digit(d) => {
                let style = if board.is_crossed(d) {
                    Style::default()
                        .add_modifier(Modifier::REVERSED | Modifier::CROSSED_OUT | Modifier::DIM)
                } else {
                    Style::default().add_modifier(Modifier::REVERSED)
                };
                (format!(" {d} "), style)
            }
            PadKey::Delete => (
                DELETE_LABEL.to_string(),
                Style::default().add_modifier(Modifier::REVERSED),
            ),
            PadKey::Enter => (
                ENTER_LABEL.to_string(),
                Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD),
            ),
        };
        buf.set_string(button.rect.x, button.rect.y, label, style);
    }
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let won = matches!(session.outcome(), Some(crate::session::Outcome::Won));

    let banner = if won {
        Span::styled(
            "YOU CRACKED THE CODE!",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "GAME OVER",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    };

    let mut lines = vec![
        Line::from(banner),
        Line::from(Span::styled(
            format!("The code was {}", session.secret().unwrap_or("????")),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    if let Some(share) = &app.share {
        for l in share.lines() {
            lines.push(Line::from(l.to_string()));
        }
        lines.push(Line::default());
    }

    lines.push(summary_line(&app.stats));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "n new game · s stats · q quit",
        Style::default().add_modifier(Modifier::DIM),
    )));

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area.inner(Margin::new(0, 2)), buf);
}

fn render_stats(app: &App, area: Rect, buf: &mut Buffer) {
    let area = area.inner(Margin::new(6, 2));
    let bar_width = area.width.saturating_sub(12).min(40).max(1);

    let mut lines = vec![
        Line::from(Span::styled(
            "STATISTICS",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        summary_line(&app.stats),
        Line::default(),
        Line::from(Span::styled(
            "GUESS DISTRIBUTION",
            Style::default().add_modifier(Modifier::BOLD),
        )),
    ];

    for bar in distribution_bars(&app.stats, app.session.config().max_attempts) {
        let width = ((bar.width_pct as u32 * bar_width as u32) / 100).max(1) as usize;
        let style = if bar.count > 0 {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>4} ", bar.attempt), Style::default().add_modifier(Modifier::DIM)),
            Span::styled("█".repeat(width), style),
            Span::raw(format!(" {}", bar.count)),
        ]));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "b back · q quit",
        Style::default().add_modifier(Modifier::DIM),
    )));

    Paragraph::new(lines).render(area, buf);
}

fn summary_line(stats: &StatsRecord) -> Line<'static> {
    Line::from(Span::raw(format!(
        "Played {} · Win {}% · Streak {} · Best {}",
        stats.played,
        stats.win_percentage(),
        stats.streak,
        stats.max_streak
    )))
}
