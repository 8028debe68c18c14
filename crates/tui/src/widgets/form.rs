//! Input form widget.
//!
//! A vertical list of single-line text fields with a cursor. The pipeline
//! inputs and the email fields both use it; masked fields render as `*`.

use crate::event::EventStatus;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pl_protocol::pipeline_models::InputSpec;
use pl_protocol::run_models::Parameters;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// One editable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub masked: bool,
    /// Shown dimmed while the field is empty.
    pub hint: Option<String>,
    value: String,
    /// Cursor position in chars.
    cursor: usize,
}

impl FormField {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            required: false,
            masked: false,
            hint: None,
            value: String::new(),
            cursor: 0,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    pub fn from_input(input: &InputSpec) -> Self {
        let hint = match (&input.placeholder, &input.default) {
            (Some(placeholder), _) => Some(placeholder.clone()),
            (None, Some(default)) => Some(format!("default: {default}")),
            (None, None) => None,
        };
        Self {
            required: input.required,
            hint,
            ..Self::new(&input.name, &input.label)
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index();
        self.value.insert(at, c);
        self.cursor += 1;
    }

    fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert_char(c);
        }
    }

    fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    fn display_value(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// Form state: fields plus the focused one.
#[derive(Debug, Clone, Default)]
pub struct InputForm {
    title: String,
    fields: Vec<FormField>,
    focused: usize,
}

impl InputForm {
    pub fn new(title: &str, fields: Vec<FormField>) -> Self {
        Self {
            title: title.to_string(),
            fields,
            focused: 0,
        }
    }

    /// Form for a pipeline's declared inputs.
    pub fn for_inputs(title: &str, inputs: &[InputSpec]) -> Self {
        Self::new(title, inputs.iter().map(FormField::from_input).collect())
    }

    /// Sender, app password and recipient.
    pub fn for_mail() -> Self {
        Self::new(
            "Send email",
            vec![
                FormField::new("from", "Sender email").required(),
                FormField::new("password", "App password").required().masked(),
                FormField::new("to", "Recipient email").required(),
            ],
        )
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn value(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(FormField::value)
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.set_value(value);
        }
    }

    /// Field values keyed by name, in form order.
    pub fn values(&self) -> Parameters {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.value.clone()))
            .collect()
    }

    /// Label of the first required field left blank.
    pub fn first_missing(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.required && f.value.trim().is_empty())
            .map(|f| f.label.as_str())
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Insert pasted text into the focused field.
    pub fn paste(&mut self, text: &str) {
        if let Some(field) = self.fields.get_mut(self.focused) {
            field.insert_str(text);
        }
    }

    /// Editing and field navigation. Enter and control chords are left to
    /// the caller.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> EventStatus {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return EventStatus::NotConsumed;
        }
        match key.code {
            KeyCode::Tab => self.focus_next(),
            KeyCode::BackTab => self.focus_prev(),
            code => {
                let Some(field) = self.fields.get_mut(self.focused) else {
                    return EventStatus::NotConsumed;
                };
                match code {
                    KeyCode::Char(c) => field.insert_char(c),
                    KeyCode::Backspace => field.delete_char(),
                    KeyCode::Left => field.move_cursor_left(),
                    KeyCode::Right => field.move_cursor_right(),
                    KeyCode::Home => field.cursor = 0,
                    KeyCode::End => field.cursor = field.value.chars().count(),
                    _ => return EventStatus::NotConsumed,
                }
            }
        }
        EventStatus::Consumed
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer, active: bool) {
        let border = if active { Color::Yellow } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(self.title.as_str());

        let mut lines: Vec<Line> = Vec::new();
        if self.fields.is_empty() {
            lines.push(Line::from(Span::styled(
                "No inputs. Press Enter to run.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (i, field) in self.fields.iter().enumerate() {
            let focused = active && i == self.focused;
            let marker = if field.required { " *" } else { "" };
            let label_style = if focused {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan)
            };
            lines.push(Line::from(Span::styled(
                format!("{}{marker}", field.label),
                label_style,
            )));

            let prefix = if focused { "> " } else { "  " };
            let value_line = match (&field.hint, field.value.is_empty()) {
                (Some(hint), true) => Line::from(vec![
                    Span::raw(prefix),
                    Span::styled(hint.clone(), Style::default().fg(Color::DarkGray)),
                ]),
                _ => Line::from(format!("{prefix}{}", field.display_value())),
            };
            lines.push(value_line);
        }

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
