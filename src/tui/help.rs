use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(format!("{}{}", " ".repeat(pad), action)),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("tab", 9, "Switch tabs"),
        key_line("f", 11, "Cycle status filter"),
        key_line("r", 11, "Reload the spreadsheet"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Dashboard tab:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("↑/↓", Style::default().fg(Color::Magenta)),
            Span::raw(" or "),
            Span::styled("j/k", Style::default().fg(Color::Magenta)),
            Span::raw("  Scroll rows"),
        ]),
        key_line("c", 11, "Export filtered rows as CSV"),
        key_line("e", 11, "Export report as JSON"),
        key_line("y", 11, "Copy exported path to clipboard"),
        Line::from(""),
        Line::from("Statuses:"),
        Line::from("  Open      deadline cell says \"open\""),
        Line::from("  Closed    deadline before the reference date"),
        Line::from("  Urgent    deadline within the urgent window"),
        Line::from("  Upcoming  deadline after the urgent window"),
        Line::from("  Unknown   empty or not a DD.MM.YYYY date"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
