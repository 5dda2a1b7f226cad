mod charts;
mod export;
mod help;
mod state;

use crate::cli::{build_config, Cli};
use crate::model::{Dashboard, DashboardEvent, InfoEvent, StatusFilter};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Terminal,
};
use state::{UiState, TAB_COUNT, TAB_DASHBOARD, TAB_HELP, TAB_MISSING};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<DashboardEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let cfg = build_config(&args);

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let initial_filter = cfg.filter;
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, initial_filter, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    initial_filter: StatusFilter,
    mut event_rx: UnboundedReceiver<DashboardEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        filter: initial_filter,
        loading: true,
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&args, &mut state, ev);
            dirty = true;
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                dirty = true;
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('r')) => {
                        state.loading = true;
                        state.info = "Reload requested…".into();
                        let _ = cmd_tx.send(UiCommand::Reload);
                    }
                    (_, KeyCode::Char('f')) => {
                        state.cycle_filter();
                        state.info = format!("Filter: {}", state.filter);
                    }
                    (_, KeyCode::Char('c')) => match state.dashboard.as_ref() {
                        Some(d) => match export::export_dashboard_csv(d, state.filter) {
                            Ok(p) => {
                                state.last_exported_path = Some(p.to_string_lossy().to_string());
                                state.info = format!(
                                    "Exported CSV: {} (press 'y' to copy path)",
                                    p.display()
                                );
                            }
                            Err(e) => state.info = format!("CSV export failed: {e:#}"),
                        },
                        None => state.info = "Nothing loaded to export yet.".into(),
                    },
                    (_, KeyCode::Char('e')) => match state.dashboard.as_ref() {
                        Some(d) => match export::export_dashboard_json(d, state.filter) {
                            Ok(p) => {
                                state.last_exported_path = Some(p.to_string_lossy().to_string());
                                state.info = format!(
                                    "Exported JSON: {} (press 'y' to copy path)",
                                    p.display()
                                );
                            }
                            Err(e) => state.info = format!("JSON export failed: {e:#}"),
                        },
                        None => state.info = "Nothing loaded to export yet.".into(),
                    },
                    (_, KeyCode::Char('y')) => {
                        if let Some(ref path) = state.last_exported_path {
                            match export::copy_to_clipboard(path) {
                                Ok(_) => {
                                    let display_path = if path.chars().count() > 60 {
                                        let head: String = path.chars().take(57).collect();
                                        format!("{head}...")
                                    } else {
                                        path.clone()
                                    };
                                    state.info = format!("✓ Copied to clipboard: {display_path}");
                                }
                                Err(e) => {
                                    state.info = format!("Clipboard copy failed: {e:#}");
                                }
                            }
                        } else {
                            state.info =
                                "No exported file path to copy. Export a file first (c/e)".into();
                        }
                    }
                    (_, KeyCode::Tab) => {
                        state.tab = (state.tab + 1) % TAB_COUNT;
                    }
                    (_, KeyCode::Char('?')) => {
                        state.tab = TAB_HELP;
                    }
                    (_, KeyCode::Up) | (_, KeyCode::Char('k')) => {
                        if state.tab == TAB_DASHBOARD {
                            state.select_prev();
                        }
                    }
                    (_, KeyCode::Down) | (_, KeyCode::Char('j')) => {
                        if state.tab == TAB_DASHBOARD {
                            state.select_next();
                        }
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn apply_event(args: &Cli, state: &mut UiState, ev: DashboardEvent) {
    match ev {
        DashboardEvent::Loaded { dashboard } => handle_loaded(args, state, *dashboard),
        DashboardEvent::DateRolled { today } => {
            if let Some(d) = state.dashboard.as_mut() {
                d.reclassify(today);
                state.info = format!("Date changed to {today}; statuses updated");
            }
        }
        DashboardEvent::Info(InfoEvent::LoadFailed { reason }) => {
            state.apply_load_failed(reason);
        }
        DashboardEvent::Info(info @ InfoEvent::Loading { .. }) => {
            state.loading = true;
            state.info = info.to_message();
        }
        DashboardEvent::Info(info) => state.info = info.to_message(),
    }
}

fn handle_loaded(args: &Cli, state: &mut UiState, dashboard: Dashboard) {
    let processed = orchestrator::process_load_completion(args, &dashboard, state.filter);
    let rows = dashboard.summary.total;
    state.apply_loaded(dashboard);
    state.info = if processed.export_messages.is_empty() {
        format!("Loaded {rows} rows")
    } else {
        processed.export_messages.join("; ")
    };
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Dashboard"),
        Line::from("Missing values"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("deadline-dashboard"),
    )
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_DASHBOARD => draw_dashboard(chunks[1], f, state),
        TAB_MISSING => draw_missing(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_status_box(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    if let Some(d) = state.dashboard.as_ref() {
        lines.push(Line::from(vec![
            Span::styled("Source:", Style::default().fg(Color::Gray)),
            Span::raw(format!(" {}  ", d.source.display())),
            Span::styled("Reference:", Style::default().fg(Color::Gray)),
            Span::raw(format!(" {}  ", d.reference_date)),
            Span::styled("Filter:", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(" {}", state.filter),
                Style::default().fg(Color::Yellow),
            ),
        ]));
    }
    state::push_wrapped_status_kv(&mut lines, "Info", &state.info, area.width);
    let title = if state.loading { "Status (reloading…)" } else { "Status" };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let Some(d) = state.dashboard.as_ref() else {
        // Fatal load errors show only the message; never a partial dashboard.
        let (title, text, color) = match state.load_error.as_deref() {
            Some(err) => (
                "Error",
                format!("{err}\n\nFix the file and press 'r' to reload."),
                Color::Red,
            ),
            None => ("Loading", "Loading…".to_string(), Color::Gray),
        };
        let p = Paragraph::new(text)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, area);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(5),
            ]
            .as_ref(),
        )
        .split(area);

    draw_status_box(rows[0], f, state);
    charts::draw_headline_cards(rows[1], f, &d.summary);

    // Narrow terminals stack the chart above the table.
    let direction = if rows[2].width < 100 {
        Direction::Vertical
    } else {
        Direction::Horizontal
    };
    let body = Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)].as_ref())
        .split(rows[2]);

    charts::draw_status_chart(body[0], f, &d.summary);
    draw_table(body[1], f, state, d);
}

fn draw_table(area: Rect, f: &mut ratatui::Frame, state: &UiState, d: &Dashboard) {
    let visible = state.visible_records();
    // Borders plus the header row.
    let max_items = (area.height as usize).saturating_sub(3).max(1);
    state.table_page.set(max_items);
    let offset = state::scroll_window(state.table_selected, state.table_scroll_offset, max_items);

    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut header_cells: Vec<Cell> = d.headers.iter().map(|h| Cell::from(h.clone())).collect();
    header_cells.push(Cell::from("Status"));
    let header = Row::new(header_cells).style(header_style);

    let table_rows: Vec<Row> = visible
        .iter()
        .enumerate()
        .skip(offset)
        .take(max_items)
        .map(|(idx, record)| {
            let mut cells: Vec<Cell> = record
                .cells
                .iter()
                .map(|c| Cell::from(c.display()))
                .collect();
            cells.push(Cell::from(Span::styled(
                record.status.as_str(),
                Style::default().fg(charts::status_color(record.status)),
            )));
            let row = Row::new(cells);
            if idx == state.table_selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let columns = (d.headers.len() + 1) as u32;
    let widths = vec![Constraint::Ratio(1, columns); columns as usize];

    let title = format!(
        "Rows ({}: {} of {}) - f: filter, ↑/↓: scroll",
        state.filter,
        visible.len(),
        d.summary.total
    );
    let table = Table::new(table_rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn draw_missing(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let Some(d) = state.dashboard.as_ref() else {
        let p = Paragraph::new("No data loaded.")
            .block(Block::default().borders(Borders::ALL).title("Missing values"));
        f.render_widget(p, area);
        return;
    };

    let mut lines = vec![
        Line::from(format!(
            "Empty cells per column ({} rows, {} empty cells in total)",
            d.summary.total,
            d.missing.total_missing()
        )),
        Line::from(""),
    ];
    let name_width = d
        .missing
        .columns
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, count) in &d.missing.columns {
        let color = if *count > 0 { Color::Yellow } else { Color::Gray };
        lines.push(Line::from(vec![
            Span::raw(format!("  {name:<name_width$}  ")),
            Span::styled(count.to_string(), Style::default().fg(color)),
        ]));
    }

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Missing values"));
    f.render_widget(p, area);
}
