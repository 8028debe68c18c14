//! Key handling result shared by the widgets.

/// Whether a widget used a key event.
///
/// The app offers each key to the focused form first; keys the form
/// does not use fall through to the global bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Consumed,
    NotConsumed,
}
