use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::collections::HashSet;
use std::io::{Stdout, stdout};
use udc_taxonomy_config::Config;
use udc_taxonomy_engine::codec::{Codec, Entry};

use crate::commands::open_codec;

/// One visible row of the tree panel.
#[derive(Debug, Clone, PartialEq)]
struct TreeItem {
    code: String,
    title: String,
    depth: usize,
    has_children: bool,
    is_expanded: bool,
}

struct App {
    codec: Codec,
    expanded: HashSet<String>,
    tree_items: Vec<TreeItem>,
    list_state: ListState,
    detail: Vec<String>,
}

impl App {
    fn new(codec: Codec) -> Self {
        let mut app = Self {
            codec,
            expanded: HashSet::new(),
            tree_items: Vec::new(),
            list_state: ListState::default(),
            detail: Vec::new(),
        };
        app.rebuild_items();

        // Select first item if available
        if !app.tree_items.is_empty() {
            app.list_state.select(Some(0));
        }
        app.update_detail();
        app
    }

    fn rebuild_items(&mut self) {
        let mut items = Vec::new();
        for root in self.codec.roots() {
            push_visible(root, 0, &self.expanded, &mut items);
        }
        self.tree_items = items;
    }

    fn selected(&self) -> Option<&TreeItem> {
        self.list_state
            .selected()
            .and_then(|index| self.tree_items.get(index))
    }

    fn next(&mut self) {
        if self.tree_items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.tree_items.len(),
            None => 0,
        };
        self.list_state.select(Some(i));
        self.update_detail();
    }

    fn previous(&mut self) {
        if self.tree_items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.tree_items.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
        self.update_detail();
    }

    fn toggle_selected(&mut self) {
        let Some(item) = self.selected() else {
            return;
        };
        if !item.has_children {
            return;
        }
        let code = item.code.clone();
        if !self.expanded.remove(&code) {
            self.expanded.insert(code);
        }
        self.rebuild_items();
    }

    fn expand_selected(&mut self) {
        if let Some(item) = self.selected()
            && item.has_children
            && !item.is_expanded
        {
            let code = item.code.clone();
            self.expanded.insert(code);
            self.rebuild_items();
        }
    }

    /// Collapses the selected node, or moves to its parent when it is
    /// already collapsed.
    fn collapse_selected(&mut self) {
        let Some(item) = self.selected() else {
            return;
        };
        let code = item.code.clone();

        if item.is_expanded {
            self.expanded.remove(&code);
            self.rebuild_items();
            return;
        }

        let parent = self
            .codec
            .get(&code)
            .and_then(|entry| entry.parent())
            .map(|parent| parent.code().to_string());
        if let Some(parent) = parent
            && let Some(index) = self.tree_items.iter().position(|i| i.code == parent)
        {
            self.list_state.select(Some(index));
            self.update_detail();
        }
    }

    fn update_detail(&mut self) {
        let Some(code) = self.selected().map(|item| item.code.clone()) else {
            self.detail = vec!["The classification is empty".to_string()];
            return;
        };
        self.detail = match self.codec.get(&code) {
            Some(entry) => detail_lines(&self.codec, entry),
            None => Vec::new(),
        };
    }
}

fn push_visible(entry: Entry<'_>, depth: usize, expanded: &HashSet<String>, items: &mut Vec<TreeItem>) {
    let is_expanded = expanded.contains(entry.code());
    items.push(TreeItem {
        code: entry.code().to_string(),
        title: entry.title().to_string(),
        depth,
        has_children: entry.has_children(),
        is_expanded,
    });

    if is_expanded {
        for child in entry.children() {
            push_visible(child, depth + 1, expanded, items);
        }
    }
}

fn detail_lines(codec: &Codec, entry: Entry<'_>) -> Vec<String> {
    let mut lines = vec![
        entry.code().to_string(),
        entry.title().to_string(),
        String::new(),
        "Ancestry:".to_string(),
    ];
    for (depth, step) in codec
        .ancestry(entry.code())
        .unwrap_or_default()
        .iter()
        .enumerate()
    {
        lines.push(format!("{}{}  {}", "  ".repeat(depth + 1), step.code(), step.title()));
    }

    let children = entry.children();
    lines.push(String::new());
    lines.push(format!("Children ({}):", children.len()));
    for child in children {
        lines.push(format!("  {}  {}", child.code(), child.title()));
    }
    lines
}

pub fn run(config: &Config) -> Result<()> {
    let codec = open_codec(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(codec);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
                KeyCode::Right | KeyCode::Char('l') => app.expand_selected(),
                KeyCode::Left | KeyCode::Char('h') => app.collapse_selected(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    let tree_items: Vec<ListItem> = app
        .tree_items
        .iter()
        .map(|item| {
            let indent = "  ".repeat(item.depth);
            let marker = match (item.has_children, item.is_expanded) {
                (false, _) => "  ",
                (true, false) => "▸ ",
                (true, true) => "▾ ",
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{indent}{marker}")),
                Span::styled(item.code.clone(), Style::default().fg(Color::Cyan)),
                Span::raw(format!("  {}", item.title)),
            ]))
        })
        .collect();

    let tree = List::new(tree_items)
        .block(Block::default().borders(Borders::ALL).title("Classification"))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(tree, chunks[0], &mut app.list_state);

    let detail_text: Vec<Line> = app.detail.iter().map(|line| Line::from(line.as_str())).collect();
    let detail = Paragraph::new(detail_text)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(ratatui::widgets::Wrap { trim: false });

    f.render_widget(detail, chunks[1]);

    let help = Paragraph::new(Line::from(
        "q: Quit | ↑/k: Previous | ↓/j: Next | Enter/Space: Toggle | →/l: Expand | ←/h: Collapse",
    ));
    f.render_widget(help, rows[1]);
}
