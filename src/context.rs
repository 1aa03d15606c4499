//! Where a file sits in the convention layout.
//!
//! Paths are read as slash-separated segments (either separator accepted);
//! nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::config::Project;
use crate::error::Error;
use crate::view_ref::ViewContext;

/// A module directory found in a path: `.../<modules_dir>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    /// Module name as spelled in the path.
    pub name: String,
    /// Path up to and including the module name.
    pub root: PathBuf,
}

/// A view file's place in the layout: `<views_root>/<controller_id>/.../<file>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLocation {
    /// Segment right after the views directory.
    pub controller_id: String,
    /// File name without extension.
    pub file_stem: String,
    /// Set when a modules segment precedes the views directory.
    pub module: Option<ModuleLocation>,
    /// Directory holding the view file.
    pub view_dir: PathBuf,
    /// Path up to and including the views directory.
    pub views_root: PathBuf,
}

/// Split a path into segments, accepting `/` and `\`. A leading separator
/// yields an empty first segment so the path can be rebuilt as absolute.
fn segments_of(path: &Path) -> Vec<String> {
    return path
        .to_string_lossy()
        .replace('\\', "/")
        .split('/')
        .map(String::from)
        .collect();
}

/// Rebuild a path from leading segments.
fn join_prefix(segments: &[String]) -> PathBuf {
    if segments.len() == 1 && segments.first().is_some_and(String::is_empty) {
        return PathBuf::from("/");
    }
    return PathBuf::from(segments.join("/"));
}

/// Lower-case the first character: `UserProfile` -> `userProfile`.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    return match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    };
}

/// Find the module whose directory precedes segment `before`.
fn module_before(segments: &[String], before: usize, modules_dir: &str) -> Option<ModuleLocation> {
    let modules_idx = segments
        .iter()
        .take(before)
        .rposition(|s| return s == modules_dir)?;
    let name_idx = modules_idx.checked_add(1).filter(|&idx| return idx < before)?;
    let name = segments.get(name_idx)?.clone();
    let root = join_prefix(segments.get(..=name_idx)?);
    return Some(ModuleLocation { name, root });
}

/// Locate a view file in the layout.
///
/// Uses the last views-directory segment that is followed by at least a
/// controller segment and a file name.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if no such segment exists.
pub fn locate_view(view_path: &Path, project: &Project) -> Result<ViewLocation, Error> {
    let config = &project.config;
    let segments = segments_of(view_path);
    let not_in_views = || {
        return Error::NotInConventionDirectory {
            expected: config.views_dir.clone(),
            path: view_path.to_path_buf(),
        };
    };

    let min_tail = 2_usize;
    let views_idx = segments
        .iter()
        .enumerate()
        .rev()
        .find(|(idx, s)| {
            return *s == &config.views_dir
                && idx.saturating_add(min_tail) < segments.len()
                && segments.get(idx.saturating_add(1)).is_some_and(|c| return !c.is_empty());
        })
        .map(|(idx, _)| return idx)
        .ok_or_else(not_in_views)?;

    let controller_id = segments
        .get(views_idx.saturating_add(1))
        .cloned()
        .ok_or_else(not_in_views)?;
    let file_name = segments.last().ok_or_else(not_in_views)?;
    if file_name.is_empty() {
        return Err(not_in_views());
    }
    let file_stem = Path::new(file_name)
        .file_stem()
        .map_or_else(|| return file_name.clone(), |s| return s.to_string_lossy().into_owned());

    let views_root = join_prefix(segments.get(..=views_idx).ok_or_else(not_in_views)?);
    let last_dir = segments.len().saturating_sub(1);
    let view_dir = join_prefix(segments.get(..last_dir).ok_or_else(not_in_views)?);

    return Ok(ViewLocation {
        controller_id,
        file_stem,
        module: module_before(&segments, views_idx, &config.modules_dir),
        view_dir,
        views_root,
    });
}

/// Build the resolver context for render calls made from a controller file.
///
/// `protected/controllers/PostController.php` renders from `views/post`;
/// `controllers/admin/UserController.php` from `views/admin/user`; a
/// controller under `modules/<name>/controllers` uses that module's views root
/// for `/` references and its view directory.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if the path has no controllers segment.
pub fn for_controller(controller_path: &Path, project: &Project) -> Result<ViewContext, Error> {
    let config = &project.config;
    let segments = segments_of(controller_path);
    let not_in_controllers = || {
        return Error::NotInConventionDirectory {
            expected: config.controllers_dir.clone(),
            path: controller_path.to_path_buf(),
        };
    };

    let controllers_idx = segments
        .iter()
        .rposition(|s| return s == &config.controllers_dir)
        .filter(|idx| return idx.saturating_add(1) < segments.len())
        .ok_or_else(not_in_controllers)?;

    let file_name = segments.last().ok_or_else(not_in_controllers)?;
    let stem = Path::new(file_name)
        .file_stem()
        .map_or_else(String::new, |s| return s.to_string_lossy().into_owned());
    let short_name = stem.strip_suffix(config.controller_suffix.as_str()).unwrap_or(&stem);
    if short_name.is_empty() {
        return Err(not_in_controllers());
    }

    let last_dir = segments.len().saturating_sub(1);
    let sub_dirs = segments
        .get(controllers_idx.saturating_add(1)..last_dir)
        .unwrap_or_default();

    let base_dir = project.app_views_dir();
    // Only `<modules_dir>/<name>/<controllers_dir>` counts as a module controller.
    let parent_is_module = controllers_idx
        .checked_sub(2)
        .and_then(|idx| return segments.get(idx))
        .is_some_and(|s| return s == &config.modules_dir);
    let module_view_dir = match module_before(&segments, controllers_idx, &config.modules_dir) {
        Some(module) if parent_is_module => module.root.join(&config.views_dir),
        _ => base_dir.clone(),
    };

    let view_dir = sub_dirs
        .iter()
        .fold(module_view_dir.clone(), |path, dir| return path.join(dir))
        .join(lower_first(short_name));
    tracing::debug!(
        "controller {} renders from {}",
        controller_path.display(),
        view_dir.display()
    );

    return Ok(ViewContext {
        base_dir,
        module_view_dir,
        view_dir,
        workspace_root: project.root.clone(),
    });
}

/// Build the resolver context for render calls made from inside a view file.
/// Bare names resolve next to the view itself.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if the path is not under a views directory.
pub fn for_view(view_path: &Path, project: &Project) -> Result<ViewContext, Error> {
    let location = locate_view(view_path, project)?;
    let base_dir = project.app_views_dir();
    let module_view_dir = match location.module {
        Some(_) => location.views_root,
        None => base_dir.clone(),
    };

    return Ok(ViewContext {
        base_dir,
        module_view_dir,
        view_dir: location.view_dir,
        workspace_root: project.root.clone(),
    });
}
