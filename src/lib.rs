//! Static view and controller navigation for Yii 1.x projects.
//!
//! Answers two questions the framework normally answers at runtime, without
//! running PHP: which file a view reference in a render call resolves to, and
//! which controller action renders a given view file.

pub mod catalog;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod fs;
pub mod locator;
pub mod navigator;
pub mod render_calls;
pub mod scanner;
pub mod source;
pub mod types;
pub mod view_ref;

pub use crate::catalog::{find_action_at_position, find_action_by_name, find_all_actions};
pub use crate::config::{ConventionConfig, Project};
pub use crate::error::Error;
pub use crate::fs::{Disk, DocumentSource, FileOracle, MemoryFs};
pub use crate::locator::find_controller_and_action;
pub use crate::scanner::find_body_end;
pub use crate::source::{Position, SourceText};
pub use crate::types::{
    ActionMatch, ActionRecord, BodyEnd, ControllerAction, MatchKind, RenderCall, ResolvedView,
    ViewKind, ViewReference, ViewTarget,
};
pub use crate::view_ref::{ResolvePolicy, ViewContext, resolve, resolve_with_policy};
