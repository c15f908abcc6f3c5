use crate::model::{Directive, LogEntry, LogKind, ToggleEvent, ToggleState};
use crate::storage::entry_clock;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub struct UiState {
    pub toggle: ToggleState,
    /// Directive currently running; the button is disabled while set.
    pub busy: Option<Directive>,
    /// Open confirmation dialog, if any.
    pub confirm: Option<&'static str>,
    pub show_help: bool,
    pub quitting: bool,
    pub info: String,
    pub log: Vec<LogEntry>,
    /// Rows scrolled back from the bottom; 0 follows new output.
    pub log_scroll: usize,
    /// Inner width of the log pane, kept in sync with the terminal size.
    pub log_width: u16,
    pub compose_file: String,
    pub tool: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            toggle: ToggleState::Stopped,
            busy: None,
            confirm: None,
            show_help: false,
            quitting: false,
            info: String::new(),
            log: Vec::new(),
            log_scroll: 0,
            log_width: 78,
            compose_file: String::new(),
            tool: "docker".into(),
        }
    }
}

impl UiState {
    pub fn apply_event(&mut self, ev: ToggleEvent) {
        match ev {
            ToggleEvent::CommandStarted { directive } => {
                self.busy = Some(directive);
                self.confirm = None;
                self.info = format!("Running `{} compose {}`…", self.tool, directive.to_display());
            }
            ToggleEvent::CommandFinished { state, result } => {
                self.busy = None;
                self.toggle = state;
                self.info = if result.success() {
                    match state {
                        ToggleState::Running => "Containers started".into(),
                        ToggleState::Stopped => "Containers stopped".into(),
                    }
                } else {
                    format!("Command failed (exit code {})", result.exit_code)
                };
            }
            ToggleEvent::ConfirmRequested { prompt } => {
                self.confirm = Some(prompt);
            }
            ToggleEvent::LogAppended(entry) => {
                // Keep the viewport anchored when the user has scrolled back.
                if self.log_scroll > 0 {
                    self.log_scroll += entry_lines(&entry, self.log_width).len();
                }
                self.log.push(entry);
            }
            ToggleEvent::Info(info) => {
                self.info = info.to_message();
            }
        }
    }

    pub fn button_label(&self) -> String {
        match self.busy {
            Some(_) => format!("{}…", self.toggle.label()),
            None => self.toggle.label().to_string(),
        }
    }

    /// Log rendered as rows wrapped to the pane width.
    pub fn log_lines(&self) -> Vec<Line<'static>> {
        self.log
            .iter()
            .flat_map(|entry| entry_lines(entry, self.log_width))
            .collect()
    }

    /// Row offset for a log view of `height` rows.
    pub fn log_offset(&self, total_lines: usize, height: usize) -> usize {
        let max_offset = total_lines.saturating_sub(height);
        max_offset.saturating_sub(self.log_scroll)
    }

    pub fn scroll_up(&mut self, n: usize) {
        let total = self.log_lines().len();
        self.log_scroll = self.log_scroll.saturating_add(n).min(total);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }
}

/// Rows for one entry: a clock prefix on the first row, continuation rows indented
/// under it, long lines split at the remaining width.
fn entry_lines(entry: &LogEntry, width: u16) -> Vec<Line<'static>> {
    let style = match entry.kind {
        LogKind::Output => Style::default(),
        LogKind::Warning => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    };
    let clock = format!("[{}] ", entry_clock(entry));
    let clock_width = clock.chars().count();
    let text_width = (width as usize).saturating_sub(clock_width).max(1);

    let mut out: Vec<Line<'static>> = Vec::new();
    for line in entry.text.trim_end_matches('\n').split('\n') {
        let chars: Vec<char> = line.trim_end_matches('\r').chars().collect();
        let mut remaining = chars.as_slice();
        loop {
            let take = remaining.len().min(text_width);
            let (row, rest) = remaining.split_at(take);
            let prefix = if out.is_empty() {
                Span::styled(clock.clone(), Style::default().fg(Color::DarkGray))
            } else {
                Span::raw(" ".repeat(clock_width))
            };
            out.push(Line::from(vec![
                prefix,
                Span::styled(row.iter().collect::<String>(), style),
            ]));
            remaining = rest;
            if remaining.is_empty() {
                break;
            }
        }
    }
    out
}
