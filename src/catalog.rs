//! Catalog of the `actionXxx` methods declared in a controller document.

use regex::Regex;

use crate::config::ConventionConfig;
use crate::scanner::{self, CodeMask};
use crate::types::ActionRecord;

/// Build the declaration pattern for an action prefix: `function <prefix><Upper>...(`.
/// Group 1 is the method name.
///
/// # Panics
///
/// Panics if the pattern is invalid, which cannot happen once the prefix is escaped.
fn action_pattern(prefix: &str) -> Regex {
    let pattern = format!(
        r"\bfunction\s+&?\s*({}[A-Z][A-Za-z0-9_]*)\s*\(",
        regex::escape(prefix)
    );
    return Regex::new(&pattern).expect("valid regex");
}

/// Scan `text` for every action declaration, in declaration order.
///
/// Each record's body is bounded with the tokenizing scanner. Declarations
/// without a body (abstract or interface methods) are skipped, as are
/// declarations inside comments or strings.
pub fn find_all_actions(text: &str, config: &ConventionConfig) -> Vec<ActionRecord> {
    let pattern = action_pattern(&config.action_prefix);
    let mask = CodeMask::new(text);
    let mut actions = Vec::new();

    for cap in pattern.captures_iter(text) {
        let (Some(declaration), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let declaration_offset = declaration.start();
        if !mask.is_code(declaration_offset) {
            tracing::trace!("skipping commented-out action {}", name.as_str());
            continue;
        }
        // Rescan from the `(` so parameter lists balance.
        let params_start = declaration.end().saturating_sub(1);
        let Some(body_start_offset) = scanner::find_body_start(text, params_start) else {
            tracing::trace!("skipping bodiless action {}", name.as_str());
            continue;
        };
        let body_end = scanner::find_body_end(text, body_start_offset);

        actions.push(ActionRecord {
            body_start_offset,
            body_end,
            declaration_offset,
            name: name.as_str().to_string(),
        });
    }

    tracing::debug!("cataloged {} actions", actions.len());
    return actions;
}

/// The first action whose body contains `offset`.
pub fn find_action_at_position(
    text: &str,
    offset: usize,
    config: &ConventionConfig,
) -> Option<ActionRecord> {
    return find_all_actions(text, config)
        .into_iter()
        .find(|action| return action.contains(offset));
}

/// The first action named exactly `name` (prefix included).
pub fn find_action_by_name(
    text: &str,
    name: &str,
    config: &ConventionConfig,
) -> Option<ActionRecord> {
    return find_all_actions(text, config)
        .into_iter()
        .find(|action| return action.name == name);
}
