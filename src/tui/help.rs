use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        key_line("Enter", 7, "Press START/STOP (or click the button)"),
        key_line("Space", 7, "Press START/STOP"),
        key_line("↑/↓", 9, "Scroll log"),
        key_line("PgUp/PgDn", 3, "Scroll log by a page"),
        key_line("End", 9, "Follow new output"),
        key_line("s", 11, "Save log as JSON"),
        key_line("y", 11, "Copy log to clipboard"),
        key_line("?", 11, "Toggle this help"),
        key_line("q", 11, "Quit (waits for a running command)"),
        Line::from(""),
        Line::from("Confirmation dialog:"),
        key_line("y/Enter", 5, "Stop the containers"),
        key_line("n/Esc", 7, "Keep them running"),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
