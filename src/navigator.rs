//! From action text forward to the view files it renders.

use std::path::Path;

use crate::catalog;
use crate::config::Project;
use crate::context;
use crate::error::Error;
use crate::fs::FileOracle;
use crate::render_calls;
use crate::types::{RenderCall, ResolvedView, ViewTarget};
use crate::view_ref::{self, ViewContext};

/// Resolve the render calls inside the action that contains `offset`.
/// An offset outside every action yields an empty list.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if `controller_path` is not under
/// a controllers directory.
pub fn views_for_action(
    controller_path: &Path,
    text: &str,
    offset: usize,
    project: &Project,
    oracle: &dyn FileOracle,
) -> Result<Vec<ResolvedView>, Error> {
    let ctx = context::for_controller(controller_path, project)?;
    let Some(action) = catalog::find_action_at_position(text, offset, &project.config) else {
        tracing::debug!("offset {offset} is not inside an action");
        return Ok(Vec::new());
    };

    let calls = render_calls::find_render_calls(text, action.body_range(text.len()));
    return Ok(resolve_calls(calls, &ctx, project, oracle));
}

/// Resolve every render call in a controller or view document.
///
/// Controllers resolve bare names against their own view directory; views
/// resolve them next to the view file.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if the document is under neither
/// a controllers nor a views directory.
pub fn views_for_document(
    path: &Path,
    text: &str,
    project: &Project,
    oracle: &dyn FileOracle,
) -> Result<Vec<ResolvedView>, Error> {
    let ctx = context_for_document(path, project)?;
    let calls = render_calls::find_all_render_calls(text);
    return Ok(resolve_calls(calls, &ctx, project, oracle));
}

/// Resolver context for a document that is either a controller or a view.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` when the path fits neither layout.
pub fn context_for_document(path: &Path, project: &Project) -> Result<ViewContext, Error> {
    return match context::for_controller(path, project) {
        Err(Error::NotInConventionDirectory { .. }) => context::for_view(path, project),
        other => other,
    };
}

/// Resolve each call and probe the result. Unresolvable names are reported,
/// not propagated, so one bad alias does not hide the other targets.
fn resolve_calls(
    calls: Vec<RenderCall>,
    ctx: &ViewContext,
    project: &Project,
    oracle: &dyn FileOracle,
) -> Vec<ResolvedView> {
    return calls
        .into_iter()
        .map(|call| {
            let target = match view_ref::resolve(&call.reference, ctx, &project.config, oracle) {
                Err(Error::UnresolvableReference { reason, .. }) => ViewTarget::Unresolvable { reason },
                Err(e) => ViewTarget::Unresolvable { reason: e.to_string() },
                Ok(path) if oracle.exists(&path) => ViewTarget::Exists { path },
                Ok(path) => ViewTarget::Missing { path },
            };
            return ResolvedView { call, target };
        })
        .collect();
}
