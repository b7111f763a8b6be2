//! Marker-based extraction of PlantUML source from model output.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a `@startuml` ... `@enduml` block, markers included.
/// Case-insensitive; `(?s)` lets `.` span newlines.
static DIAGRAM_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)@startuml.*@enduml").expect("valid regex"));

/// Extract the diagram source block from raw model output.
///
/// Models wrap their answer in prose, reasoning traces or markdown fences
/// more often than not. This keeps the `@startuml`/`@enduml` block
/// (markers included, surrounding whitespace trimmed) and falls back to
/// the whole trimmed output when no markers are present.
#[must_use]
pub fn extract_diagram_source(output: &str) -> String {
    match DIAGRAM_BLOCK_RE.find(output) {
        Some(m) => m.as_str().trim().to_owned(),
        None => output.trim().to_owned(),
    }
}
