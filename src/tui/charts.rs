use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::metrics;
use crate::model::{DashboardSummary, Status};

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Open => Color::Cyan,
        Status::Urgent => Color::Red,
        Status::Upcoming => Color::Green,
        Status::Closed => Color::Gray,
        Status::Unknown => Color::Magenta,
    }
}

/// Headline metric cards: Total, Open, Urgent, Closed.
pub fn draw_headline_cards(area: Rect, f: &mut Frame, summary: &DashboardSummary) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4].as_ref())
        .split(area);

    let entries = [
        ("Total", summary.total, Color::White),
        ("Open", summary.open, status_color(Status::Open)),
        ("Urgent", summary.urgent, status_color(Status::Urgent)),
        ("Closed", summary.closed, status_color(Status::Closed)),
    ];
    for ((label, value, color), slot) in entries.into_iter().zip(cards.iter()) {
        let p = Paragraph::new(Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(label));
        f.render_widget(p, *slot);
    }
}

/// Vertical bar chart with one bar per status, in display order.
pub fn draw_status_chart(area: Rect, f: &mut Frame, summary: &DashboardSummary) {
    let bars: Vec<Bar> = metrics::chart_buckets(summary)
        .into_iter()
        .map(|(status, count)| {
            Bar::default()
                .value(count as u64)
                .label(Line::from(status.as_str()))
                .style(Style::default().fg(status_color(status)))
                .value_style(
                    Style::default()
                        .fg(Color::Black)
                        .bg(status_color(status)),
                )
        })
        .collect();

    // Spread the bars over the inner width.
    let inner_width = area.width.saturating_sub(2);
    let n = Status::ALL.len() as u16;
    let bar_width = (inner_width.saturating_sub(n - 1) / n).clamp(3, 12);

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("Status breakdown"))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);
    f.render_widget(chart, area);
}
