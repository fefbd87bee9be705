use ratatui::{prelude::*, widgets::*};

use crate::app::{App, View};
use crate::stats::{DAYS, Intensity, Slot};
use crate::timer::{TimerStatus, format_clock};

const FOCUS_COLOR: Color = Color::Rgb(249, 115, 22);
const READY_COLOR: Color = Color::Rgb(52, 211, 153);
const BORDER_COLOR: Color = Color::Rgb(90, 90, 90);
const MUTED_TEXT: Color = Color::DarkGray;

// ============================================================================
// Frame
// ============================================================================

pub fn render_ui(f: &mut Frame, app: &App) {
    let area = centered_rect(60, 90, f.size());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(area);

    render_header(f, app, chunks[0]);
    match app.view() {
        View::Controls => render_controls(f, app, chunks[1]),
        View::Stats => render_stats(f, app, chunks[1]),
    }
    render_hints(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let selected = match app.view() {
        View::Controls => 0,
        View::Stats => 1,
    };
    let tabs = Tabs::new(vec!["Controls", "Stats"])
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
        .divider("•")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_COLOR))
                .title(Span::styled(
                    " ⏱ FOCUSBAR ",
                    Style::default().fg(status_color(app)).add_modifier(Modifier::BOLD),
                )),
        );
    f.render_widget(tabs, area);
}

fn render_hints(f: &mut Frame, app: &App, area: Rect) {
    let pairs: &[(&str, &str)] = match (app.view(), app.engine().status()) {
        (View::Controls, TimerStatus::Idle) => &[
            ("Enter", "Start"),
            ("Digits", "Duration"),
            ("+/-", "Volume"),
            ("M", "Mute"),
            ("Tab", "Stats"),
            ("Q", "Quit"),
        ],
        (View::Controls, _) => &[
            ("Space", "Pause/Resume"),
            ("X", "Stop"),
            ("N", "Skip"),
            ("+/-", "Volume"),
            ("Tab", "Stats"),
            ("Q", "Quit"),
        ],
        (View::Stats, _) => &[
            ("←/→", "Week"),
            ("T", "This week"),
            ("HJKL", "Inspect"),
            ("Esc", "Clear"),
            ("Tab", "Controls"),
            ("Q", "Quit"),
        ],
    };

    let mut spans = Vec::new();
    for (i, (key, label)) in pairs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  •  "));
        }
        spans.push(span_key(key));
        spans.push(Span::raw(format!(" {label}")));
    }

    f.render_widget(
        Paragraph::new(vec![Line::from(""), Line::from(spans)])
            .alignment(Alignment::Center)
            .style(Style::default().fg(MUTED_TEXT)),
        area,
    );
}

fn span_key(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(FOCUS_COLOR).add_modifier(Modifier::BOLD))
}

// ============================================================================
// Controls
// ============================================================================

fn render_controls(f: &mut Frame, app: &App, area: Rect) {
    let engine = app.engine();
    let block = panel(" Controls ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(10),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(1), Constraint::Length(1),
            Constraint::Length(2), Constraint::Length(1),
            Constraint::Length(3), Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Percentage(10),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(engine.status().headline())
            .style(Style::default().fg(status_color(app)).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[1],
    );

    f.render_widget(
        Paragraph::new(format_clock(engine.remaining_secs()))
            .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        sections[3],
    );

    let status = match engine.status() {
        TimerStatus::Idle => Span::styled("○ idle", Style::default().fg(MUTED_TEXT)),
        TimerStatus::Running => Span::styled("● running", Style::default().fg(FOCUS_COLOR)),
        TimerStatus::Paused => Span::styled("⏸  paused", Style::default().fg(Color::Yellow)),
    };
    f.render_widget(Paragraph::new(Line::from(status)).alignment(Alignment::Center), sections[5]);

    f.render_widget(
        Paragraph::new(duration_selector(app)).alignment(Alignment::Center),
        sections[7],
    );

    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(status_color(app)).bg(Color::Black))
            .percent((engine.progress_ratio() * 100.0) as u16),
        sections[9],
    );

    f.render_widget(
        Paragraph::new(volume_line(app)).alignment(Alignment::Center),
        sections[11],
    );
}

fn duration_selector(app: &App) -> Vec<Line<'static>> {
    let engine = app.engine();
    let idle = engine.status() == TimerStatus::Idle;

    let mut bars = Vec::new();
    let mut labels = Vec::new();
    for (i, &minutes) in app.choices().iter().enumerate() {
        let active = minutes <= engine.selected_minutes();
        let mut style = Style::default().fg(if active { FOCUS_COLOR } else { BORDER_COLOR });
        if !idle {
            style = style.add_modifier(Modifier::DIM);
        }
        bars.push(Span::styled("━━━━━", style));
        bars.push(Span::raw(" "));
        labels.push(Span::styled(
            format!("{:^5} ", format!("{}:{}", i + 1, minutes)),
            Style::default().fg(MUTED_TEXT),
        ));
    }
    vec![Line::from(bars), Line::from(labels)]
}

fn volume_line(app: &App) -> Line<'static> {
    let volume = app.volume();
    let filled = usize::from(volume.effective()) / 10;
    let (icon, label) = if volume.is_muted() {
        ("🔇", format!(" muted ({}%)", volume.level()))
    } else {
        ("🔊", format!(" {:>3}%", volume.level()))
    };

    Line::from(vec![
        Span::raw(format!("{icon} ")),
        Span::styled("█".repeat(filled), Style::default().fg(Color::Gray)),
        Span::styled("░".repeat(10 - filled), Style::default().fg(BORDER_COLOR)),
        Span::styled(label, Style::default().fg(MUTED_TEXT)),
    ])
}

// ============================================================================
// Stats
// ============================================================================

fn render_stats(f: &mut Frame, app: &App, area: Rect) {
    let summary = app.week_summary();
    let (title, value) = app.stats_headline(&summary);

    let mut range = vec![
        Span::styled("◀  ", Style::default().fg(MUTED_TEXT)),
        Span::styled(summary.range_label(), Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
        Span::styled("  ▶", Style::default().fg(MUTED_TEXT)),
    ];
    if app.is_current_week() {
        range.push(Span::styled("  (this week)", Style::default().fg(MUTED_TEXT)));
    }

    let mut lines = vec![
        Line::from(""),
        Line::from(range),
        Line::from(""),
        Line::from(Span::styled(title, Style::default().fg(MUTED_TEXT).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(value, Style::default().fg(Color::White).add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];

    for slot in Slot::ALL {
        let mut row = Vec::new();
        for day in 0..DAYS.len() {
            let selected = app.selected_cell() == Some((day, slot));
            let color = intensity_color(Intensity::of(summary.cell(day, slot)));
            let style = if selected {
                Style::default().fg(color).bg(Color::White)
            } else {
                Style::default().fg(color)
            };
            row.push(Span::styled(if selected { "▓▓▓" } else { "███" }, style));
            row.push(Span::raw(" "));
        }
        lines.push(Line::from(row));
    }

    lines.push(Line::from(
        DAYS.iter()
            .map(|day| Span::styled(format!("{day} "), Style::default().fg(MUTED_TEXT)))
            .collect::<Vec<_>>(),
    ));

    let footer = if app.history().is_empty() {
        "No sessions yet. Start a focus session from Controls.".to_string()
    } else {
        app.stats_footer()
    };
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        footer,
        Style::default().fg(MUTED_TEXT).add_modifier(Modifier::ITALIC),
    )));

    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(panel(" Stats ")),
        area,
    );
}

fn intensity_color(intensity: Intensity) -> Color {
    match intensity {
        Intensity::Empty => Color::Rgb(45, 45, 45),
        Intensity::Low => Color::Rgb(13, 90, 66),
        Intensity::Mid => Color::Rgb(14, 140, 100),
        Intensity::High => READY_COLOR,
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn status_color(app: &App) -> Color {
    if app.engine().is_running() { FOCUS_COLOR } else { READY_COLOR }
}

fn panel(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
}

fn centered_rect(w: u16, h: u16, r: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h) / 2),
            Constraint::Percentage(h),
            Constraint::Percentage((100 - h) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w) / 2),
            Constraint::Percentage(w),
            Constraint::Percentage((100 - w) / 2),
        ])
        .split(v[1])[1]
}
