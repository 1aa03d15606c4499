/// Core domain types shared by the catalog, resolver, and locator.
use std::ops::Range;
use std::path::PathBuf;

use serde::Serialize;

use crate::source::Position;
use crate::view_ref;

/// One `actionXxx` method found in a controller document.
/// Built fresh on every scan; offsets are byte offsets into the scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    /// Offset of the opening `{` of the method body.
    pub body_start_offset: usize,
    /// Where the method body ends.
    pub body_end: BodyEnd,
    /// Offset of the `function` keyword that declares the action.
    pub declaration_offset: usize,
    /// Method name, including the action prefix (`actionIndex`).
    pub name: String,
}

impl ActionRecord {
    /// Byte range of the body, clamped to `text_len` when the end is unbounded.
    pub fn body_range(&self, text_len: usize) -> Range<usize> {
        let end = match self.body_end {
            BodyEnd::Bounded(end) => end.min(text_len),
            BodyEnd::Unbounded => text_len,
        };
        return self.body_start_offset.min(end)..end;
    }

    /// Whether `offset` lies within `[body_start, body_end]`.
    /// An unbounded body contains everything after its start.
    pub const fn contains(&self, offset: usize) -> bool {
        if offset < self.body_start_offset {
            return false;
        }
        return match self.body_end {
            BodyEnd::Bounded(end) => offset <= end,
            BodyEnd::Unbounded => true,
        };
    }
}

/// Exclusive end of a method body. `Unbounded` means brace matching ran off
/// the end of the text; treat it as "extends to end of file".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "offset")]
pub enum BodyEnd {
    /// Offset one past the closing `}`.
    Bounded(usize),
    /// No closing brace before end of text.
    Unbounded,
}

/// The action picked for a view by the locator, and how it was picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionMatch {
    /// Offset of the action's `function` keyword in the controller file.
    pub declaration_offset: usize,
    /// Line and column of that keyword.
    pub declaration_position: Position,
    /// Which rule produced the match.
    pub matched_by: MatchKind,
    /// Full method name (`actionShow`).
    pub name: String,
}

/// Controller file owning a view, plus the action rendering it when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerAction {
    /// `None` when neither a render call nor the naming heuristic matched.
    pub action: Option<ActionMatch>,
    /// Path of the controller class file that exists on disk.
    pub controller_path: PathBuf,
}

/// How the locator tied a view to an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Action name derived from the view file name.
    NameConvention,
    /// The action body contains a render call naming the view.
    RenderCall,
}

/// A `$this->render('...')` or `$this->renderPartial('...')` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderCall {
    /// Offset of the first character of the view name inside its quotes.
    pub offset: usize,
    /// The referenced view.
    pub reference: ViewReference,
}

/// A render call together with where it leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedView {
    /// The call that was resolved.
    pub call: RenderCall,
    /// Outcome of resolving the call's view name.
    pub target: ViewTarget,
}

/// Outcome of resolving one view reference against the disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ViewTarget {
    /// The resolved file is present.
    Exists {
        /// Resolved view file.
        path: PathBuf,
    },
    /// The resolved file is absent; `path` is where it is expected.
    Missing {
        /// Expected view file.
        path: PathBuf,
    },
    /// The reference could not be turned into a path.
    Unresolvable {
        /// Why resolution gave up.
        reason: String,
    },
}

/// Shape of a view reference, decided from its prefix alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// `/site/index`: under the current module's views root.
    Absolute,
    /// `create`: under the controller's view directory.
    Bare,
    /// `application.views.layouts.main`: a path alias.
    DotNotation,
    /// `../shared/_header`: relative to the controller's view directory.
    Relative,
    /// `//layouts/main`: under the application's views root.
    RootAbsolute,
}

/// A view name as written in a render call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewReference {
    /// Whether the call was `renderPartial` rather than `render`.
    pub is_partial: bool,
    /// Classification of `raw_name`.
    pub kind: ViewKind,
    /// The literal string from the call.
    pub raw_name: String,
}

impl ViewReference {
    /// Classify `raw_name`; `is_partial` comes from the render variant, not the string.
    pub fn new(raw_name: &str, is_partial: bool) -> Self {
        return Self {
            is_partial,
            kind: view_ref::classify(raw_name),
            raw_name: raw_name.to_string(),
        };
    }
}
