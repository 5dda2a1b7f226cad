use crate::metrics;
use crate::model::{Dashboard, Record, StatusFilter};
use std::cell::Cell;

use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};

pub const TAB_DASHBOARD: usize = 0;
pub const TAB_MISSING: usize = 1;
pub const TAB_HELP: usize = 2;
pub const TAB_COUNT: usize = 3;

#[derive(Default)]
pub struct UiState {
    pub tab: usize,
    pub info: String,
    pub filter: StatusFilter,

    pub dashboard: Option<Dashboard>,
    pub loading: bool,
    // Set when the last load failed; no dashboard is shown alongside it.
    pub load_error: Option<String>,

    pub table_selected: usize, // Index into the filtered rows
    pub table_scroll_offset: usize,
    // Rows that fit in the table at the last draw.
    pub table_page: Cell<usize>,
    pub last_exported_path: Option<String>,
}

impl UiState {
    /// Records passing the current filter, in sheet order.
    pub fn visible_records(&self) -> Vec<&Record> {
        match &self.dashboard {
            Some(d) => metrics::filter(&d.records, self.filter),
            None => Vec::new(),
        }
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.table_selected = 0;
        self.table_scroll_offset = 0;
    }

    /// Replace the dashboard after a successful load, keeping the selection in range.
    pub fn apply_loaded(&mut self, dashboard: Dashboard) {
        self.dashboard = Some(dashboard);
        self.loading = false;
        self.load_error = None;
        self.clamp_selection();
    }

    /// A failed load drops the previous dashboard so nothing stale is shown.
    pub fn apply_load_failed(&mut self, reason: String) {
        self.dashboard = None;
        self.loading = false;
        self.info = format!("Load failed: {reason}");
        self.load_error = Some(reason);
        self.table_selected = 0;
        self.table_scroll_offset = 0;
    }

    pub fn select_prev(&mut self) {
        if self.table_selected > 0 {
            self.table_selected -= 1;
            if self.table_selected < self.table_scroll_offset {
                self.table_scroll_offset = self.table_selected;
            }
        }
    }

    /// Move down one row, scrolling within the page height of the last draw.
    pub fn select_next(&mut self) {
        let len = self.visible_records().len();
        if self.table_selected + 1 < len {
            self.table_selected += 1;
            let page = self.table_page.get().max(1);
            if self.table_selected >= self.table_scroll_offset + page {
                self.table_scroll_offset = self.table_selected + 1 - page;
            }
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_records().len();
        if len == 0 {
            self.table_selected = 0;
            self.table_scroll_offset = 0;
        } else if self.table_selected >= len {
            self.table_selected = len - 1;
        }
        if self.table_scroll_offset > self.table_selected {
            self.table_scroll_offset = self.table_selected;
        }
    }
}

/// First visible row so that `selected` stays inside a window of `height` rows.
pub fn scroll_window(selected: usize, offset: usize, height: usize) -> usize {
    let height = height.max(1);
    if selected < offset {
        selected
    } else if selected >= offset + height {
        selected + 1 - height
    } else {
        offset
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::raw(line_text),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![Span::raw("  "), Span::raw(line_text)]));
        }

        remaining = rest;
    }
}
