//! Pipeline list widget.
//!
//! A table of the configured pipelines with their step count; the selected
//! row is the pipeline the form belongs to.

use pl_protocol::pipeline_models::PipelineSpec;
use pl_protocol::run_models::RunStatus;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Row, Table, TableState};
use ratatui::Frame;

/// Color of the run status marker.
pub fn status_style(status: RunStatus) -> Style {
    match status {
        RunStatus::Pending => Style::default().fg(Color::DarkGray),
        RunStatus::Running => Style::default().fg(Color::Yellow),
        RunStatus::Completed => Style::default().fg(Color::Green),
        RunStatus::Failed => Style::default().fg(Color::Red),
    }
}

/// Render the pipeline list.
///
/// `running` marks the pipeline of the latest run with its status.
pub fn render_pipeline_list(
    frame: &mut Frame,
    area: Rect,
    pipelines: &[PipelineSpec],
    selected: usize,
    running: Option<(&str, RunStatus)>,
) {
    let rows: Vec<Row> = pipelines
        .iter()
        .map(|p| {
            let marker = match running {
                Some((name, status)) if name == p.name => match status {
                    RunStatus::Running => Cell::from("..").style(status_style(status)),
                    RunStatus::Completed => Cell::from("ok").style(status_style(status)),
                    RunStatus::Failed => Cell::from("!!").style(status_style(status)),
                    RunStatus::Pending => Cell::from(""),
                },
                _ => Cell::from(""),
            };
            Row::new(vec![
                Cell::from(p.display_title().to_string()),
                Cell::from(p.steps.len().to_string()),
                marker,
            ])
        })
        .collect();

    let header = Row::new(vec![Cell::from("Pipeline"), Cell::from("Steps"), Cell::from("")])
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan));

    let widths = [
        Constraint::Min(10),
        Constraint::Length(5),
        Constraint::Length(2),
    ];

    let title = if pipelines.is_empty() {
        "Pipelines (none found)"
    } else {
        "Pipelines (Ctrl-N/Ctrl-P)"
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut table_state = TableState::default();
    if !pipelines.is_empty() {
        table_state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut table_state);
}
