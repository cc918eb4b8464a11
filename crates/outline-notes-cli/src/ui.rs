use outline_notes_engine::{Document, TAB};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

use crate::app::{App, Pane, display_name};

/// Columns a tab takes on screen
const TAB_WIDTH: usize = 2;

pub fn draw(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[0]);

    draw_files(f, app, panes[0]);
    draw_editor(f, app, panes[1]);
    draw_status(f, app, rows[1]);
}

fn pane_block(title: String, active: bool) -> Block<'static> {
    let style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw_files(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .files
        .iter()
        .map(|path| ListItem::new(Line::from(format!("📄 {}", display_name(path)))))
        .collect();

    let list = List::new(items)
        .block(pane_block("Notes".to_string(), app.pane == Pane::Files))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(list, area, &mut app.file_list_state);
}

fn draw_editor(f: &mut Frame, app: &App, area: Rect) {
    let Some(note) = &app.open else {
        let hint = Paragraph::new("Select a note and press Enter")
            .block(pane_block("Editor".to_string(), false));
        f.render_widget(hint, area);
        return;
    };

    let document = note.editor.document();
    let marker = if note.is_dirty() { " *" } else { "" };
    let title = format!("{}{marker}", display_name(&note.path));

    let inner_height = area.height.saturating_sub(2) as usize;
    let focused = document.focused_line_index();
    let scroll = focused.saturating_sub(inner_height.saturating_sub(1));

    let lines: Vec<Line> = (0..document.line_count())
        .skip(scroll)
        .take(inner_height)
        .map(|index| render_line(document, index))
        .collect();

    let active = app.pane == Pane::Editor;
    f.render_widget(
        Paragraph::new(lines).block(pane_block(title, active)),
        area,
    );

    if active {
        let line = document.focused_line();
        let column = display_width(&line.text().chars().take(line.cursor()).collect::<String>());
        f.set_cursor_position(Position::new(
            area.x + 1 + column as u16,
            area.y + 1 + (focused - scroll) as u16,
        ));
    }
}

/// One document line with tabs expanded and the selection highlighted
fn render_line(document: &Document, index: usize) -> Line<'static> {
    let Some(line) = document.line(index) else {
        return Line::default();
    };
    let start = document.line_start_offset(index);
    let selected = document
        .effective_selection_range()
        .filter(|range| !range.is_empty());
    let highlight = Style::default().add_modifier(Modifier::REVERSED);

    let spans: Vec<Span> = line
        .text()
        .chars()
        .enumerate()
        .map(|(local, c)| {
            let text = if c == TAB {
                " ".repeat(TAB_WIDTH)
            } else {
                c.to_string()
            };
            let in_selection = selected
                .as_ref()
                .is_some_and(|range| range.contains(&(start + local)));
            if in_selection {
                Span::styled(text, highlight)
            } else {
                Span::raw(text)
            }
        })
        .collect();
    Line::from(spans)
}

fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| if c == TAB { TAB_WIDTH } else { 1 })
        .sum()
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.pane {
        Pane::Files => "q: Quit | ↑/k ↓/j: Select | Enter: Open | r: Rescan | Tab: Editor",
        Pane::Editor => {
            "Esc: Close | ^S: Save | ^Z/^Y: Undo/Redo | Tab/⇧Tab: Indent | ^B: Bullet | ^K: Checkbox | ^T: Check | Alt-↑↓: Move"
        }
    };
    let lines = vec![Line::from(app.status.clone()), Line::from(help)];
    f.render_widget(Paragraph::new(lines), area);
}
