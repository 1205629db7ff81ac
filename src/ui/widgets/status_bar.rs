// src/ui/widgets/status_bar.rs
//! Status panel: track, style, play state, readiness and progress.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::engine::EngineStatus;

/// What the panel shows besides the engine status.
#[derive(Debug, Clone, Default)]
pub struct StatusView<'a> {
    pub track: &'a str,
    pub elapsed: u64,
    pub duration: u64,
    /// Transient message such as a saved snapshot path
    pub notice: Option<&'a str>,
}

fn clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Render the status panel.
pub fn render_status_bar(f: &mut Frame<'_>, area: Rect, status: &EngineStatus, view: &StatusView) {
    let style_name = status.style.map_or("none", |s| s.label());
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" auralux · {} ", style_name)),
        area,
    );

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let state = if !status.ready {
        Span::styled(" ⚠ ", Style::default().fg(Color::Red))
    } else if status.paused {
        Span::styled(" ⏵ ", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(" ⏸ ", Style::default().fg(Color::Green))
    };

    let detail = match (&status.error, view.notice) {
        (Some(err), _) => Span::styled(
            format!("{} (r to retry)", err),
            Style::default().fg(Color::Red),
        ),
        (None, Some(notice)) => Span::styled(notice.to_string(), Style::default().fg(Color::Cyan)),
        (None, None) => Span::styled(
            "←/→ style · space pause · x snapshot · q quit",
            Style::default().fg(Color::DarkGray),
        ),
    };

    let line = Line::from(vec![
        state,
        Span::styled(view.track.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        detail,
    ]);
    f.render_widget(Paragraph::new(line), inner[0]);

    let duration = view.duration.max(1);
    let ratio = (view.elapsed as f64 / duration as f64).clamp(0.0, 1.0);
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta).add_modifier(Modifier::ITALIC))
            .ratio(ratio)
            .label(format!("{} / {}", clock(view.elapsed), clock(view.duration))),
        inner[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_format() {
        assert_eq!(clock(0), "00:00");
        assert_eq!(clock(258), "04:18");
    }
}
