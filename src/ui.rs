use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use temple_ledger::{
    DashboardTotals, ExportFormat, Exporter, NetPosition, ReportKind, SqliteSource, TaxReport,
    TempleBooks, TransactionKind, UnifiedTransaction, YearOption,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Ledger,
    TaxReport,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Ledger,
            Page::Ledger => Page::TaxReport,
            Page::TaxReport => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::TaxReport,
            Page::Ledger => Page::Dashboard,
            Page::TaxReport => Page::Ledger,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Ledger => "Overall Transactions",
            Page::TaxReport => "Tax Report",
        }
    }

    /// Report exported from this page
    pub fn report(&self) -> ReportKind {
        match self {
            Page::Dashboard | Page::Ledger => ReportKind::OverallReport,
            Page::TaxReport => ReportKind::TaxReport,
        }
    }
}

pub struct App {
    pub books: TempleBooks,
    pub exporter: Exporter,
    pub source_path: Option<PathBuf>,
    pub current_page: Page,
    pub dashboard: DashboardTotals,
    pub net: NetPosition,
    pub ledger: Vec<UnifiedTransaction>,
    pub ledger_state: TableState,
    pub year_options: Vec<YearOption>,
    pub year_index: usize,
    pub tax_report: TaxReport,
    pub tax_state: TableState,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(books: TempleBooks, exporter: Exporter, source_path: Option<PathBuf>) -> Self {
        let dashboard = books.dashboard();
        let net = books.net_position();
        let ledger = books.ledger();
        let year_options = books.year_options();
        let tax_report = books.tax_report(None);

        let mut app = Self {
            books,
            exporter,
            source_path,
            current_page: Page::Dashboard,
            dashboard,
            net,
            ledger,
            ledger_state: TableState::default(),
            year_options,
            year_index: 0,
            tax_report,
            tax_state: TableState::default(),
            status_message: None,
        };
        app.reset_selection();
        app
    }

    pub fn selected_year(&self) -> Option<i32> {
        self.year_options.get(self.year_index).and_then(|o| o.value)
    }

    /// Recompute every view from the books
    pub fn recompute(&mut self) {
        self.dashboard = self.books.dashboard();
        self.net = self.books.net_position();
        self.ledger = self.books.ledger();
        self.year_options = self.books.year_options();

        // Keep the chosen year if it still exists, else fall back to "All Years"
        let year = self.selected_year();
        self.year_index = self
            .year_options
            .iter()
            .position(|o| o.value == year)
            .unwrap_or(0);

        self.tax_report = self.books.tax_report(self.selected_year());
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        self.ledger_state
            .select(if self.ledger.is_empty() { None } else { Some(0) });
        self.tax_state
            .select(if self.tax_report.entries.is_empty() { None } else { Some(0) });
    }

    pub fn next_year(&mut self) {
        if self.year_options.is_empty() {
            return;
        }
        self.year_index = (self.year_index + 1) % self.year_options.len();
        self.tax_report = self.books.tax_report(self.selected_year());
        self.reset_selection();
    }

    pub fn previous_year(&mut self) {
        if self.year_options.is_empty() {
            return;
        }
        self.year_index = if self.year_index == 0 {
            self.year_options.len() - 1
        } else {
            self.year_index - 1
        };
        self.tax_report = self.books.tax_report(self.selected_year());
        self.reset_selection();
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Reload every collection from the document store
    pub fn reload(&mut self) {
        let Some(path) = self.source_path.clone() else {
            self.status_message = Some("No database configured".to_string());
            return;
        };

        match SqliteSource::open(&path) {
            Ok(source) => {
                self.books.refresh_from(&source);
                self.recompute();
                let missing = self.books.unavailable().len();
                self.status_message = Some(if missing == 0 {
                    "Reloaded".to_string()
                } else {
                    format!("Reloaded ({} collections unavailable)", missing)
                });
            }
            Err(e) => self.status_message = Some(format!("Reload failed: {:#}", e)),
        }
    }

    pub fn export_current(&mut self, format: ExportFormat) {
        let kind = self.current_page.report();
        let table = self.books.table(kind, self.selected_year());

        self.status_message = Some(match self.exporter.export_table(kind, format, table) {
            Ok(artifact) => match artifact.path {
                Some(path) => format!("Exported {}", path.display()),
                None => format!("Sent {} to printer", kind.title()),
            },
            Err(e) => format!("Export failed: {:#}", e),
        });
    }

    fn rows_len(&self) -> usize {
        match self.current_page {
            Page::Dashboard => 0,
            Page::Ledger => self.ledger.len(),
            Page::TaxReport => self.tax_report.entries.len(),
        }
    }

    fn active_state(&mut self) -> Option<&mut TableState> {
        match self.current_page {
            Page::Dashboard => None,
            Page::Ledger => Some(&mut self.ledger_state),
            Page::TaxReport => Some(&mut self.tax_state),
        }
    }

    pub fn next(&mut self) {
        self.move_selection(1);
    }

    pub fn previous(&mut self) {
        self.move_selection(-1);
    }

    pub fn page_down(&mut self) {
        self.move_selection(20);
    }

    pub fn page_up(&mut self) {
        self.move_selection(-20);
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.rows_len();
        if len == 0 {
            return;
        }
        let Some(state) = self.active_state() else {
            return;
        };

        let current = state.selected().unwrap_or(0) as isize;
        let next = match delta {
            1 if current as usize >= len - 1 => 0,
            -1 if current == 0 => len as isize - 1,
            _ => (current + delta).clamp(0, len as isize - 1),
        };
        state.select(Some(next as usize));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('y') => app.next_year(),
                KeyCode::Char('Y') => app.previous_year(),
                KeyCode::Char('r') => app.reload(),
                KeyCode::Char('x') => app.export_current(ExportFormat::Spreadsheet),
                KeyCode::Char('d') => app.export_current(ExportFormat::Pdf),
                KeyCode::Char('p') => app.export_current(ExportFormat::Print),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::PageDown => app.page_down(),
                KeyCode::PageUp => app.page_up(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::Ledger => render_ledger(f, chunks[1], app),
        Page::TaxReport => render_tax_report(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Dashboard, Page::Ledger, Page::TaxReport];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Net: {:.2}", app.net.net),
        Style::default().fg(if app.net.is_surplus() { Color::Green } else { Color::Red }),
    ));

    if !app.books.unavailable().is_empty() {
        tab_spans.push(Span::raw("  |  "));
        tab_spans.push(Span::styled(
            format!("⚠ {} unavailable", app.books.unavailable().len()),
            Style::default().fg(Color::Red),
        ));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn stat_line(label: &str, value: String, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {:<18}", label),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let d = &app.dashboard;
    let n = &app.net;

    let content = vec![
        Line::from(""),
        stat_line("Devotees", d.devotees_count.to_string(), Color::White),
        stat_line("Villages", d.villages_count.to_string(), Color::White),
        stat_line("Tax collected", format!("{:.2}", d.tax_total), Color::Green),
        stat_line("Donations", format!("{:.2}", d.donation_total), Color::Green),
        stat_line("Interest", format!("{:.2}", d.interest_total), Color::Green),
        stat_line("Expenses", format!("{:.2}", d.expense_total), Color::Red),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        stat_line("Total tax", format!("{:.2}", n.total_tax), Color::White),
        stat_line("Total donations", format!("{:.2}", n.total_donations), Color::White),
        stat_line("Total payments", format!("{:.2}", n.total_payments), Color::White),
        stat_line(
            "Net",
            format!("{:.2}", n.net),
            if n.is_surplus() { Color::Green } else { Color::Red },
        ),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Dashboard "),
    );

    f.render_widget(paragraph, area);
}

fn header_row(titles: &[&str]) -> Row<'static> {
    let cells: Vec<Cell> = titles
        .iter()
        .map(|h| {
            Cell::from(h.to_string()).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn kind_color(kind: TransactionKind) -> Color {
    match kind {
        TransactionKind::Tax => Color::Green,
        TransactionKind::Donation => Color::Cyan,
        TransactionKind::Payment => Color::Red,
    }
}

fn render_ledger(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.ledger.iter().map(|tx| {
        let color = kind_color(tx.kind);
        Row::new(vec![
            Cell::from(tx.date.clone()),
            Cell::from(tx.kind.as_str()).style(Style::default().fg(color)),
            Cell::from(truncate(&tx.name, 30)),
            Cell::from(format!("{:.2}", tx.amount)).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(32),
            Constraint::Length(14),
        ],
    )
    .header(header_row(&["Date", "Type", "Name", "Amount"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Overall Transactions ({}) ", app.ledger.len())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.ledger_state);
}

fn render_tax_report(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.tax_report.entries.iter().map(|entry| {
        let color = if entry.paid { Color::Green } else { Color::Yellow };
        Row::new(vec![
            Cell::from(truncate(&entry.devotee_name, 24)),
            Cell::from(truncate(&entry.village_name, 18)),
            Cell::from(entry.year.to_string()),
            Cell::from(format!("{:.2}", entry.amount)),
            Cell::from(if entry.paid { "Paid" } else { "Pending" }).style(Style::default().fg(color)),
        ])
        .height(1)
    });

    let year_label = app
        .year_options
        .get(app.year_index)
        .map(|o| o.label.clone())
        .unwrap_or_default();

    let title = format!(
        " Tax Report - {} | Paid {:.2} | Pending {:.2} | hidden {} ",
        year_label,
        app.tax_report.total_paid,
        app.tax_report.total_pending,
        app.tax_report.excluded.total()
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(20),
            Constraint::Length(6),
            Constraint::Length(12),
            Constraint::Length(9),
        ],
    )
    .header(header_row(&["Devotee", "Village", "Year", "Amount", "Paid"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.tax_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![];

    if let Some(message) = &app.status_message {
        status_spans.push(Span::styled(
            format!(" {} ", message),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" | "));
    }

    for (key, label) in [
        ("Tab", " Page | "),
        ("y/Y", " Year | "),
        ("x", " Sheet | "),
        ("d", " PDF | "),
        ("p", " Print | "),
        ("r", " Reload | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
