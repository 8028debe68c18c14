//! TUI application state and event loop.
//!
//! This module defines the main `App` struct that manages the TUI state
//! and the event loop using `tokio::select!`.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use pl_protocol::ipc::{Event, Op};
use pl_protocol::pipeline_models::PipelineSpec;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::path::{Path, PathBuf};
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::event::EventStatus;
use crate::event_handler::{self, GlobalAction};
use crate::state::{CoreState, Notice};
use crate::tui::{Tui, TuiEvent};
use crate::widgets::form::InputForm;
use crate::widgets::pipeline_list::render_pipeline_list;
use crate::widgets::results_view::{ResultTab, ResultsView};

const PAGE: usize = 10;

/// Main TUI application state.
pub struct App {
    /// Pipelines from the loaded project.
    pub pipelines: Vec<PipelineSpec>,
    /// Index of the selected pipeline.
    pub selected_index: usize,
    /// Inputs of the selected pipeline.
    pub form: InputForm,
    /// Sender, app password and recipient for the email tab.
    pub mail_form: InputForm,
    pub results: ResultsView,
    /// State derived from runtime events.
    pub core: CoreState,
    /// Where Ctrl-S writes the final result.
    pub save_dir: PathBuf,
    /// Channel to send operations to the runtime.
    pub op_tx: Sender<Op>,
    /// Channel to receive events from the runtime.
    pub event_rx: Receiver<Event>,
    /// Flag to indicate if the application should exit.
    pub should_exit: bool,
}

impl App {
    pub fn new(
        pipelines: Vec<PipelineSpec>,
        save_dir: PathBuf,
        op_tx: Sender<Op>,
        event_rx: Receiver<Event>,
    ) -> Self {
        let form = pipelines
            .first()
            .map(pipeline_form)
            .unwrap_or_default();
        Self {
            pipelines,
            selected_index: 0,
            form,
            mail_form: InputForm::for_mail(),
            results: ResultsView::new(),
            core: CoreState::default(),
            save_dir,
            op_tx,
            event_rx,
            should_exit: false,
        }
    }

    /// Main event loop.
    ///
    /// Uses `tokio::select!` to handle keyboard input and runtime events concurrently.
    pub async fn run(&mut self, tui: &mut Tui) -> Result<()> {
        let mut tui_events = tui.event_stream();

        self.send(Op::GetHistory);
        tui.frame_requester().schedule_frame();

        while !self.should_exit {
            select! {
                Some(event) = self.event_rx.recv() => {
                    self.handle_core_event(event);
                    tui.frame_requester().schedule_frame();
                }
                Some(tui_event) = tui_events.next() => {
                    self.handle_tui_event(tui, tui_event)?;
                }
                else => break,
            }
        }

        Ok(())
    }

    pub fn selected_pipeline(&self) -> Option<&PipelineSpec> {
        self.pipelines.get(self.selected_index)
    }

    fn mail_enabled(&self) -> bool {
        self.selected_pipeline().is_some_and(|p| p.mail.is_some())
    }

    fn default_subject(&self) -> String {
        self.selected_pipeline()
            .and_then(|p| p.mail.as_ref())
            .map(|m| m.default_subject.clone())
            .unwrap_or_default()
    }

    fn tabs(&self) -> Vec<ResultTab> {
        ResultTab::available(self.mail_enabled())
    }

    /// Handle events from the runtime.
    fn handle_core_event(&mut self, event: Event) {
        event_handler::handle_core_event(&mut self.core, event);
    }

    fn handle_tui_event(&mut self, tui: &mut Tui, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Key(key_event) => {
                self.handle_key_event(key_event);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Paste(text) => {
                self.active_form_mut().paste(&text);
                tui.frame_requester().schedule_frame();
            }
            TuiEvent::Draw => {
                tui.draw(|frame| {
                    self.render(frame);
                })?;
            }
        }
        Ok(())
    }

    fn active_form_mut(&mut self) -> &mut InputForm {
        if self.results.tab == ResultTab::SendEmail {
            &mut self.mail_form
        } else {
            &mut self.form
        }
    }

    /// Handle keyboard events.
    ///
    /// The focused form gets the key first; global chords and Enter are
    /// handled here.
    fn handle_key_event(&mut self, key_event: KeyEvent) {
        if key_event.kind != KeyEventKind::Press {
            return;
        }

        if self.active_form_mut().handle_key_event(key_event) == EventStatus::Consumed {
            return;
        }

        if key_event.code == KeyCode::Enter {
            if self.results.tab == ResultTab::SendEmail {
                self.send_mail();
            } else {
                self.submit_run();
            }
            return;
        }

        let Some(action) = event_handler::global_action(key_event) else {
            return;
        };
        match action {
            GlobalAction::Quit => self.should_exit = true,
            GlobalAction::SaveResult => self.save_result(),
            GlobalAction::ClearHistory => {
                self.send(Op::ClearHistory);
                self.core.notice = Some(Notice::info("History cleared"));
            }
            GlobalAction::NextPipeline => self.select_pipeline(self.selected_index + 1),
            GlobalAction::PrevPipeline => {
                if self.selected_index > 0 {
                    self.select_pipeline(self.selected_index - 1);
                }
            }
            GlobalAction::NextTab => {
                let tabs = self.tabs();
                self.results.next_tab(&tabs);
            }
            GlobalAction::ScrollUp => self.results.scroll_up(),
            GlobalAction::ScrollDown => self.results.scroll_down(),
            GlobalAction::PageUp => self.results.page_up(PAGE),
            GlobalAction::PageDown => self.results.page_down(PAGE),
        }
    }

    fn select_pipeline(&mut self, index: usize) {
        if index >= self.pipelines.len() || index == self.selected_index {
            return;
        }
        self.selected_index = index;
        self.form = pipeline_form(&self.pipelines[index]);
        if !self.tabs().contains(&self.results.tab) {
            self.results.select(ResultTab::Final);
        }
    }

    /// Validate the form and ask the runtime to run the selected pipeline.
    fn submit_run(&mut self) {
        let Some(pipeline) = self.selected_pipeline() else {
            return;
        };
        let name = pipeline.name.clone();

        if let Some(label) = self.form.first_missing() {
            self.core.notice = Some(Notice::error(format!("'{label}' is required")));
            return;
        }
        if self.core.run.is_running() {
            self.core.notice = Some(Notice::error("A run is already in progress"));
            return;
        }

        debug!(pipeline = %name, "submitting run");
        self.send(Op::RunPipeline {
            name,
            inputs: self.form.values(),
        });
        self.results.select(ResultTab::Final);
    }

    fn send_mail(&mut self) {
        let Some(text) = self.core.run.final_text().map(str::to_string) else {
            self.core.notice = Some(Notice::error("Run the pipeline before sending email"));
            return;
        };
        if let Some(label) = self.mail_form.first_missing() {
            self.core.notice = Some(Notice::error(format!("{label} is required")));
            return;
        }

        self.send(Op::SendMail {
            from: self.mail_form.value("from").trim().to_string(),
            password: self.mail_form.value("password").to_string(),
            to: self.mail_form.value("to").trim().to_string(),
            text,
            default_subject: self.default_subject(),
        });
        self.core.notice = Some(Notice::info("Sending email..."));
    }

    fn save_result(&mut self) {
        let Some(text) = self.core.run.final_text() else {
            self.core.notice = Some(Notice::error("Nothing to save yet"));
            return;
        };
        self.core.notice = Some(
            match save_artifact(&self.save_dir, &self.core.run.pipeline, text) {
                Ok(path) => Notice::info(format!("Saved {}", path.display())),
                Err(e) => {
                    warn!(error = %e, "saving result failed");
                    Notice::error(format!("Could not save result: {e}"))
                }
            },
        );
    }

    fn send(&self, op: Op) {
        if let Err(e) = self.op_tx.try_send(op) {
            warn!(error = %e, "runtime did not accept operation");
        }
    }

    /// Render the TUI.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(rows[0]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(columns[0]);

        let running = (!self.core.run.pipeline.is_empty())
            .then(|| (self.core.run.pipeline.as_str(), self.core.run.status));
        render_pipeline_list(frame, left[0], &self.pipelines, self.selected_index, running);

        let form_active = self.results.tab != ResultTab::SendEmail;
        self.form.render(left[1], frame.buffer_mut(), form_active);

        self.results.render(
            frame,
            columns[1],
            &self.tabs(),
            &self.core,
            &self.mail_form,
            &self.default_subject(),
        );

        self.render_notice(frame, rows[1]);
        self.render_help(frame, rows[2]);
    }

    fn render_notice(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.core.notice {
            Some(notice) => {
                let color = if notice.is_error { Color::Red } else { Color::Green };
                Line::from(Span::styled(notice.text.clone(), Style::default().fg(color)))
            }
            None => match self.selected_pipeline() {
                Some(p) if !p.description.is_empty() => Line::from(p.description.clone()),
                _ => Line::from(""),
            },
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = "Tab field | Enter run/send | Ctrl-T tab | Ctrl-N/P pipeline | Ctrl-S save | Ctrl-L clear history | Esc quit";
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}

fn pipeline_form(pipeline: &PipelineSpec) -> InputForm {
    InputForm::for_inputs(
        &format!("{} inputs", pipeline.display_title()),
        &pipeline.inputs,
    )
}

/// Write `text` to `<pipeline>-<timestamp>.txt` in `dir`.
pub fn save_artifact(dir: &Path, pipeline: &str, text: &str) -> std::io::Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("{pipeline}-{stamp}.txt"));
    std::fs::write(&path, text)?;
    Ok(path)
}
