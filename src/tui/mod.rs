mod export;
mod help;
mod state;

use crate::compose::ComposeRunner;
use crate::model::{ToggleConfig, ToggleEvent, ToggleState};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Terminal,
};
use state::UiState;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const WINDOW_TITLE: &str = "Docker Compose Toggle";
const BUTTON_WIDTH: u16 = 16;

pub async fn run(cfg: ToggleConfig) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ToggleEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let runner = Arc::new(ComposeRunner::new(&cfg));

    // TUI runs in a dedicated thread to keep all blocking terminal I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(cfg, event_rx, cmd_tx));

    let res = orchestrator::run_controller(runner, event_tx, cmd_rx).await;

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

/// Run the TUI loop on a dedicated thread. Returns once the controller has shut down.
pub fn run_threaded(
    cfg: ToggleConfig,
    mut event_rx: UnboundedReceiver<ToggleEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        or_restore(Terminal::new(backend), restore_terminal).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; the controller talks to it through events.
    let mut state = UiState {
        compose_file: cfg.compose_file.display().to_string(),
        tool: cfg.tool.clone(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        let area = terminal
            .size()
            .map(|s| Rect::new(0, 0, s.width, s.height))
            .unwrap_or_default();
        state.log_width = screen_layout(area).log.width.saturating_sub(2);

        let mut controller_done = false;
        loop {
            match event_rx.try_recv() {
                Ok(ev) => state.apply_event(ev),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    controller_done = true;
                    break;
                }
            }
        }
        if controller_done {
            break Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => {
                    handle_key(&mut state, &cmd_tx, k.modifiers, k.code, area);
                }
                Ok(Event::Mouse(m)) => handle_mouse(&mut state, &cmd_tx, m, area),
                _ => {}
            }
        }
    };

    restore_terminal();
    res
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableMouseCapture, LeaveAlternateScreen).ok();
}

/// Run `restore` before handing back an error, so a failed setup step does not leave
/// the terminal in raw mode.
fn or_restore<T, E>(res: Result<T, E>, restore: impl FnOnce()) -> Result<T, E> {
    if res.is_err() {
        restore();
    }
    res
}

fn request_quit(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    if state.quitting {
        return;
    }
    state.quitting = true;
    state.info = "Quitting…".into();
    let _ = cmd_tx.send(UiCommand::Quit);
}

fn press(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    if state.quitting {
        return;
    }
    let _ = cmd_tx.send(UiCommand::Press);
}

fn answer(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, affirmed: bool) {
    state.confirm = None;
    let _ = cmd_tx.send(UiCommand::Confirm(affirmed));
}

fn handle_key(
    state: &mut UiState,
    cmd_tx: &UnboundedSender<UiCommand>,
    modifiers: KeyModifiers,
    code: KeyCode,
    area: Rect,
) {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        if state.confirm.is_some() {
            answer(state, cmd_tx, false);
        }
        request_quit(state, cmd_tx);
        return;
    }

    // The dialog is modal: only an answer gets through.
    if state.confirm.is_some() {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => answer(state, cmd_tx, true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => answer(state, cmd_tx, false),
            _ => {}
        }
        return;
    }

    let page = screen_layout(area).log.height.saturating_sub(2).max(1) as usize;
    match code {
        KeyCode::Char('q') => request_quit(state, cmd_tx),
        KeyCode::Enter | KeyCode::Char(' ') => press(state, cmd_tx),
        KeyCode::Char('?') => state.show_help = !state.show_help,
        KeyCode::Esc => state.show_help = false,
        KeyCode::Up | KeyCode::Char('k') => state.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => state.scroll_down(1),
        KeyCode::PageUp => state.scroll_up(page),
        KeyCode::PageDown => state.scroll_down(page),
        KeyCode::Home => state.scroll_up(usize::MAX),
        KeyCode::End => state.log_scroll = 0,
        KeyCode::Char('s') => export::save_and_show_path(state),
        KeyCode::Char('y') => export::copy_log(state),
        _ => {}
    }
}

fn handle_mouse(
    state: &mut UiState,
    cmd_tx: &UnboundedSender<UiCommand>,
    m: MouseEvent,
    area: Rect,
) {
    if state.confirm.is_some() {
        return;
    }
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if screen_layout(area)
                .button
                .contains(Position::new(m.column, m.row))
            {
                press(state, cmd_tx);
            }
        }
        MouseEventKind::ScrollUp => state.scroll_up(3),
        MouseEventKind::ScrollDown => state.scroll_down(3),
        _ => {}
    }
}

struct Screen {
    header: Rect,
    button: Rect,
    log: Rect,
    status: Rect,
}

fn screen_layout(area: Rect) -> Screen {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // Compose file
                Constraint::Length(3), // Button
                Constraint::Min(0),    // Log
                Constraint::Length(3), // Status
            ]
            .as_ref(),
        )
        .split(area);

    let button = Layout::horizontal([Constraint::Length(BUTTON_WIDTH)])
        .flex(Flex::Center)
        .split(rows[1])[0];

    Screen {
        header: rows[0],
        button,
        log: rows[2],
        status: rows[3],
    }
}

/// Rect of at most `width` x `height`, centered in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let screen = screen_layout(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled("Compose file: ", Style::default().fg(Color::Gray)),
        Span::raw(state.compose_file.clone()),
    ]))
    .block(Block::default().borders(Borders::ALL).title(WINDOW_TITLE));
    f.render_widget(header, screen.header);

    draw_button(screen.button, f, state);
    draw_log(screen.log, f, state);

    let status = Paragraph::new(Line::from(vec![
        Span::raw(state.info.clone()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Status")
            .title_bottom(Line::from(" Enter: press  ?: help  q: quit ").right_aligned()),
    );
    f.render_widget(status, screen.status);

    if let Some(prompt) = state.confirm {
        draw_confirm(centered_rect(44, 7, area), f, prompt);
    } else if state.show_help {
        help::draw_help(centered_rect(56, 18, area), f);
    }
}

fn draw_button(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let style = if state.busy.is_some() || state.quitting {
        Style::default().fg(Color::DarkGray)
    } else {
        match state.toggle {
            ToggleState::Stopped => Style::default().fg(Color::Green),
            ToggleState::Running => Style::default().fg(Color::Red),
        }
    };
    let button = Paragraph::new(Line::from(state.button_label()))
        .alignment(Alignment::Center)
        .style(style.add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).border_style(style));
    f.render_widget(button, area);
}

fn draw_log(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = if state.log_scroll > 0 {
        "Log (scrolled, End to follow)"
    } else {
        "Log"
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    if state.log.is_empty() {
        let p = Paragraph::new(Line::from(Span::styled(
            "No output yet. Press Enter to start the containers.",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(p, area);
        return;
    }

    let lines = state.log_lines();
    let height = area.height.saturating_sub(2) as usize;
    let offset = state.log_offset(lines.len(), height);
    let p = Paragraph::new(lines)
        .block(block)
        .scroll((offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(p, area);
}

fn draw_confirm(area: Rect, f: &mut ratatui::Frame, prompt: &str) {
    let p = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            prompt.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y]", Style::default().fg(Color::Magenta)),
            Span::raw(" Yes    "),
            Span::styled("[n]", Style::default().fg(Color::Magenta)),
            Span::raw(" No"),
        ]),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title("Confirmation"),
    );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LogEntry, LogKind};
    use crate::toggle::CONFIRM_PROMPT;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn long_daemon_errors_stay_readable() {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut state = UiState::default();
        state.log_width = screen_layout(Rect::new(0, 0, 80, 24)).log.width - 2;
        // 67 columns remain after the clock on an 80-column screen.
        let head = format!("{:<67}", "Error response from daemon: driver failed programming external");
        state.log.push(LogEntry::new(
            LogKind::Output,
            format!("{head}port is already allocated on 0.0.0.0:5432\n"),
        ));

        terminal.draw(|f| draw(f.area(), f, &state)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("driver failed programming external"));
        assert!(screen.contains("port is already allocated on 0.0.0.0:5432"));
    }

    #[test]
    fn failed_setup_restores_terminal() {
        let mut restored = false;
        let res: Result<(), &str> = or_restore(Err("no tty"), || restored = true);
        assert!(res.is_err());
        assert!(restored);

        let mut restored = false;
        let res: Result<u8, &str> = or_restore(Ok(1), || restored = true);
        assert_eq!(res, Ok(1));
        assert!(!restored);
    }

    #[test]
    fn button_is_centered_under_header() {
        let s = screen_layout(Rect::new(0, 0, 80, 24));
        assert_eq!(s.header, Rect::new(0, 0, 80, 3));
        assert_eq!(s.button, Rect::new(32, 3, BUTTON_WIDTH, 3));
        assert_eq!(s.log, Rect::new(0, 6, 80, 15));
        assert_eq!(s.status, Rect::new(0, 21, 80, 3));
    }

    #[test]
    fn centered_rect_clamps_to_area() {
        assert_eq!(
            centered_rect(44, 7, Rect::new(0, 0, 80, 24)),
            Rect::new(18, 8, 44, 7)
        );
        assert_eq!(
            centered_rect(44, 7, Rect::new(0, 0, 20, 5)),
            Rect::new(0, 0, 20, 5)
        );
    }

    #[test]
    fn dialog_swallows_keys_until_answered() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let area = Rect::new(0, 0, 80, 24);
        let mut state = UiState {
            confirm: Some(CONFIRM_PROMPT),
            ..Default::default()
        };

        handle_key(&mut state, &tx, KeyModifiers::NONE, KeyCode::Char('q'), area);
        handle_key(&mut state, &tx, KeyModifiers::NONE, KeyCode::Enter, area);
        assert!(state.confirm.is_none());
        assert!(!state.quitting);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Confirm(true))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn escape_declines_and_click_presses() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let area = Rect::new(0, 0, 80, 24);
        let mut state = UiState {
            confirm: Some(CONFIRM_PROMPT),
            ..Default::default()
        };
        handle_key(&mut state, &tx, KeyModifiers::NONE, KeyCode::Esc, area);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Confirm(false))));

        let click = |column, row| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(&mut state, &tx, click(0, 0), area);
        assert!(rx.try_recv().is_err());
        handle_mouse(&mut state, &tx, click(40, 4), area);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Press)));
    }

    #[test]
    fn quit_is_sent_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let area = Rect::new(0, 0, 80, 24);
        let mut state = UiState::default();
        handle_key(&mut state, &tx, KeyModifiers::NONE, KeyCode::Char('q'), area);
        handle_key(&mut state, &tx, KeyModifiers::CONTROL, KeyCode::Char('c'), area);
        handle_key(&mut state, &tx, KeyModifiers::NONE, KeyCode::Enter, area);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Quit)));
        assert!(rx.try_recv().is_err());
    }
}
