//! TUI widgets module.

pub mod form;
pub mod pipeline_list;
pub mod results_view;

pub use form::{FormField, InputForm};
pub use results_view::{ResultTab, ResultsView};
