//! Results pane: the final artifact, intermediate steps, the email form and
//! the session history, one tab each, with scrolling support.

use crate::state::{CoreState, RunState};
use crate::widgets::form::InputForm;
use pl_core::mail::extract_subject_and_body;
use pl_protocol::run_models::{HistoryEntry, RunStatus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs, Wrap,
    },
    Frame,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTab {
    Final,
    Steps,
    SendEmail,
    History,
}

impl ResultTab {
    pub fn title(self) -> &'static str {
        match self {
            ResultTab::Final => "Final",
            ResultTab::Steps => "Steps",
            ResultTab::SendEmail => "Send email",
            ResultTab::History => "History",
        }
    }

    /// Tabs shown for a pipeline; the email tab only when mail is enabled.
    pub fn available(mail_enabled: bool) -> Vec<ResultTab> {
        let mut tabs = vec![ResultTab::Final, ResultTab::Steps];
        if mail_enabled {
            tabs.push(ResultTab::SendEmail);
        }
        tabs.push(ResultTab::History);
        tabs
    }
}

/// Tab selection and scroll offset of the results pane.
#[derive(Debug, Clone)]
pub struct ResultsView {
    pub tab: ResultTab,
    pub scroll_offset: usize,
}

impl Default for ResultsView {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsView {
    pub fn new() -> Self {
        Self {
            tab: ResultTab::Final,
            scroll_offset: 0,
        }
    }

    /// Switch to the next of `tabs`, wrapping around.
    pub fn next_tab(&mut self, tabs: &[ResultTab]) {
        let current = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        if let Some(next) = tabs.get((current + 1) % tabs.len().max(1)) {
            self.select(*next);
        }
    }

    pub fn select(&mut self, tab: ResultTab) {
        self.tab = tab;
        self.scroll_offset = 0;
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset += 1;
    }

    pub fn page_up(&mut self, page_size: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(page_size);
    }

    pub fn page_down(&mut self, page_size: usize) {
        self.scroll_offset += page_size;
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        tabs: &[ResultTab],
        core: &CoreState,
        mail_form: &InputForm,
        default_subject: &str,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let selected = tabs.iter().position(|t| *t == self.tab).unwrap_or(0);
        let tab_bar = Tabs::new(tabs.iter().map(|t| t.title()).collect::<Vec<_>>())
            .block(Block::default().borders(Borders::ALL).title("Results (Ctrl-T)"))
            .select(selected)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tab_bar, chunks[0]);

        match self.tab {
            ResultTab::SendEmail => {
                self.render_mail(frame, chunks[1], &core.run, mail_form, default_subject)
            }
            tab => {
                let lines = match tab {
                    ResultTab::Final => final_lines(&core.run),
                    ResultTab::Steps => step_lines(&core.run),
                    _ => history_lines(&core.history),
                };
                self.render_scrollable(frame, chunks[1], tab.title(), lines);
            }
        }
    }

    fn render_scrollable(&self, frame: &mut Frame, area: Rect, title: &str, lines: Vec<Line>) {
        let total_lines = lines.len();
        let visible_lines = area.height.saturating_sub(2) as usize;
        let max_offset = total_lines.saturating_sub(visible_lines);
        let offset = self.scroll_offset.min(max_offset);

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, area);

        if total_lines > visible_lines {
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total_lines)
                .viewport_content_length(visible_lines)
                .position(offset);
            let scrollbar = Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
        }
    }

    fn render_mail(
        &self,
        frame: &mut Frame,
        area: Rect,
        run: &RunState,
        mail_form: &InputForm,
        default_subject: &str,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(3)])
            .split(area);

        mail_form.render(chunks[0], frame.buffer_mut(), true);

        let preview = match run.final_text() {
            Some(text) => {
                let (subject, body) = extract_subject_and_body(text, default_subject);
                let mut lines = vec![
                    Line::from(vec![
                        Span::styled("Subject: ", Style::default().fg(Color::Cyan)),
                        Span::raw(subject),
                    ]),
                    Line::from(""),
                ];
                lines.extend(body.lines().map(|l| Line::from(l.to_string())));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    "Enter sends.",
                    Style::default().fg(Color::DarkGray),
                )));
                lines
            }
            None => vec![Line::from(Span::styled(
                "Run the pipeline first; the final result is what gets sent.",
                Style::default().fg(Color::DarkGray),
            ))],
        };
        self.render_scrollable(frame, chunks[1], "Preview", preview);
    }
}

fn dim(text: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(text.into(), Style::default().fg(Color::DarkGray)))
}

fn text_lines(text: &str) -> Vec<Line<'static>> {
    text.lines().map(|l| Line::from(l.to_string())).collect()
}

fn progress_line(run: &RunState) -> Option<Line<'static>> {
    let step = run.current.as_ref()?;
    Some(Line::from(Span::styled(
        format!(
            "Running step {}/{}: {} ({})...",
            step.index + 1,
            run.total_steps,
            step.step_id,
            step.role
        ),
        Style::default().fg(Color::Yellow),
    )))
}

fn final_lines(run: &RunState) -> Vec<Line<'static>> {
    match run.status {
        RunStatus::Pending => vec![dim("Fill in the form and press Enter to run.")],
        RunStatus::Running => {
            let mut lines = vec![Line::from(format!("Running {}...", run.pipeline))];
            lines.extend(progress_line(run));
            lines
        }
        RunStatus::Completed => text_lines(run.final_text().unwrap_or_default()),
        RunStatus::Failed => vec![Line::from(Span::styled(
            run.error.clone().unwrap_or_else(|| "Run failed".to_string()),
            Style::default().fg(Color::Red),
        ))],
    }
}

fn step_lines(run: &RunState) -> Vec<Line<'static>> {
    let shown = match (&run.outcome, run.status) {
        (Some(outcome), RunStatus::Completed) => outcome.intermediate(),
        _ => run.artifacts.as_slice(),
    };

    let mut lines = Vec::new();
    for artifact in shown {
        lines.push(Line::from(Span::styled(
            format!("## {} ({})", artifact.step_id, artifact.role),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        lines.extend(text_lines(&artifact.text));
        lines.push(Line::from(""));
    }
    lines.extend(progress_line(run));
    if lines.is_empty() {
        lines.push(dim("No intermediate results."));
    }
    lines
}

fn history_lines(history: &[HistoryEntry]) -> Vec<Line<'static>> {
    if history.is_empty() {
        return vec![dim("No runs yet in this session. Ctrl-L clears the history.")];
    }

    let mut lines = Vec::new();
    for (i, entry) in history.iter().enumerate().rev() {
        let inputs = entry
            .inputs
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(Line::from(vec![
            Span::styled(
                format!("#{} {} ", i + 1, entry.timestamp.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(
                entry.pipeline.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {inputs}")),
        ]));
        lines.extend(text_lines(&entry.text));
        lines.push(Line::from(""));
    }
    lines
}
