//! Bundled project files, embedded at compile time.
//!
//! The files live in the workspace root `templates/` directory:
//! - `CARGO_MANIFEST_DIR` = `crates/core`
//! - `../../templates` = workspace root `templates/`
//!
//! With the `debug-embed` feature the files are embedded in debug builds too,
//! so tests see exactly what a release binary ships.

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Content of the bundled file at `path` (e.g. `roles/comedian.md`).
///
/// ```
/// use pl_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("[llm]"));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// Bundled paths under `prefix` (e.g. `pipelines/`), sorted.
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}
