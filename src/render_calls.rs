use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::scanner::CodeMask;
use crate::types::{RenderCall, ViewReference};

/// `$this->render('name'` or `$this->renderPartial("name"`. Group 1 is the
/// method, group 2 or 3 the single- or double-quoted view name.
static RENDER_CALL: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r#"\$this\s*->\s*(renderPartial|render)\s*\(\s*(?:'([^'\\]*)'|"([^"\\$]*)")"#,
    )
    .expect("valid regex");
});

/// Extract every render call whose match starts inside `range`.
/// Calls with a non-literal view name (variables, concatenation) are skipped,
/// as are calls inside comments, strings or template text.
pub fn find_render_calls(text: &str, range: Range<usize>) -> Vec<RenderCall> {
    let start = range.start;
    let Some(slice) = text.get(range) else {
        return Vec::new();
    };
    let mask = CodeMask::new(text);

    return RENDER_CALL
        .captures_iter(slice)
        .filter(|cap| {
            return cap
                .get(0)
                .is_some_and(|call| return mask.is_code(start.saturating_add(call.start())));
        })
        .filter_map(|cap| return parse_render_call_capture(&cap, start))
        .collect();
}

/// Extract every render call in the whole document.
pub fn find_all_render_calls(text: &str) -> Vec<RenderCall> {
    return find_render_calls(text, 0..text.len());
}

/// Turn one regex capture into a render call, shifting offsets by `base`.
fn parse_render_call_capture(cap: &Captures<'_>, base: usize) -> Option<RenderCall> {
    let method = cap.get(1)?.as_str();
    let name = cap.get(2).or_else(|| return cap.get(3))?;

    return Some(RenderCall {
        offset: base.saturating_add(name.start()),
        reference: ViewReference::new(name.as_str(), method == "renderPartial"),
    });
}
