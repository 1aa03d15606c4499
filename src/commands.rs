//! CLI commands for yiiref: actions, views, resolve, controller, check.

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;
use walkdir::WalkDir;

use yiiref::config::Project;
use yiiref::diagnostics::{self, ViewDiagnostic};
use yiiref::error::Error;
use yiiref::fs::{Disk, DocumentSource as _, FileOracle as _};
use yiiref::source::{Position, SourceText};
use yiiref::types::{BodyEnd, MatchKind, ResolvedView, ViewReference, ViewTarget};
use yiiref::{catalog, locator, navigator, view_ref};

/// One action in `actions --json` output.
#[derive(Serialize)]
struct ActionJson {
    /// One-based line of the closing brace, absent when unterminated.
    end_line: Option<u32>,
    /// One-based line of the declaration.
    line: u32,
    /// Method name.
    name: String,
}

/// `controller --json` output.
#[derive(Serialize)]
struct ControllerJson {
    /// Matched action, if any.
    action: Option<String>,
    /// Controller class file.
    controller: String,
    /// One-based declaration line of the matched action.
    line: Option<u32>,
    /// How the action was matched.
    matched_by: Option<MatchKind>,
}

/// One file's findings in `check --json` output.
#[derive(Serialize)]
struct CheckJson<'a> {
    /// Problems found in the file.
    diagnostics: &'a [ViewDiagnostic],
    /// File that was checked.
    file: String,
}

/// List the actions declared in a controller file.
///
/// # Errors
///
/// Returns errors from config loading, file reading, or JSON serialization.
pub fn actions(root: &Path, file: &Path, json: bool) -> Result<(), Error> {
    let project = Project::load(root)?;
    let source = SourceText::new(Disk.read_text(file)?);
    let actions = catalog::find_all_actions(source.as_str(), &project.config);

    let rows: Vec<ActionJson> = actions
        .iter()
        .map(|action| {
            let end_line = match action.body_end {
                BodyEnd::Bounded(end) => Some(one_based(source.position(end.saturating_sub(1)))),
                BodyEnd::Unbounded => None,
            };
            return ActionJson {
                end_line,
                line: one_based(source.position(action.declaration_offset)),
                name: action.name.clone(),
            };
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        eprintln!("No actions in {}", file.display());
    }
    for row in &rows {
        match row.end_line {
            Some(end) => println!("{}:{}-{}  {}", file.display(), row.line, end, row.name),
            None => println!("{}:{}-EOF  {}  (unterminated body)", file.display(), row.line, row.name),
        }
    }
    return Ok(());
}

/// Walk the protected directory and report every broken render target.
/// Exit code: 0 when clean, 1 when anything is missing or unresolvable.
///
/// # Errors
///
/// Returns errors from config loading, file reading, or JSON serialization.
pub fn check(root: &Path, json: bool) -> Result<ExitCode, Error> {
    let project = Project::load(root)?;
    let mut findings: Vec<(String, Vec<ViewDiagnostic>)> = Vec::new();
    let mut checked = 0_usize;

    for entry in WalkDir::new(project.protected_root())
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "php"))
    {
        let path = entry.path();
        let Ok(text) = Disk.read_text(path) else {
            tracing::warn!("skipping unreadable {}", path.display());
            continue;
        };
        let source = SourceText::new(text);
        let found = match diagnostics::missing_views(path, &source, &project, &Disk) {
            Err(Error::NotInConventionDirectory { .. }) => continue,
            Err(e) => return Err(e),
            Ok(found) => found,
        };
        checked = checked.saturating_add(1);
        if !found.is_empty() {
            findings.push((path.display().to_string(), found));
        }
    }

    let problem_count: usize = findings.iter().map(|(_, found)| return found.len()).sum();

    if json {
        let report: Vec<CheckJson<'_>> = findings
            .iter()
            .map(|(file, found)| return CheckJson { diagnostics: found, file: file.clone() })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (file, found) in &findings {
            for diagnostic in found {
                println!("{}", diagnostics::format_diagnostic(Path::new(file), diagnostic));
            }
        }
        if problem_count > 0 {
            println!();
            println!("{problem_count} broken render targets in {} files", findings.len());
        } else {
            println!("All render targets in {checked} files resolve");
        }
    }

    if problem_count > 0 {
        return Ok(ExitCode::from(1));
    }
    return Ok(ExitCode::SUCCESS);
}

/// Find the controller and action rendering a view file.
///
/// # Errors
///
/// Returns locator errors (not in a views directory, controller not found,
/// unreadable controller) or JSON serialization errors.
pub fn controller(root: &Path, view: &Path, json: bool) -> Result<(), Error> {
    let project = Project::load(root)?;
    let found = locator::find_controller_and_action(view, &project, &Disk, &Disk)?;

    let line = found
        .action
        .as_ref()
        .map(|action| return one_based(action.declaration_position));
    let controller = found.controller_path.display().to_string();

    if json {
        let out = ControllerJson {
            action: found.action.as_ref().map(|a| return a.name.clone()),
            controller,
            line,
            matched_by: found.action.as_ref().map(|a| return a.matched_by),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match (&found.action, line) {
        (Some(action), Some(line)) => println!("{controller}:{line}  {}", action.name),
        _ => {
            println!("{controller}");
            eprintln!("No action renders {}", view.display());
        },
    }
    return Ok(());
}

/// Resolve a single view name as if rendered from `file`.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if `file` is neither a controller
/// nor a view, or `Error::UnresolvableReference` for a bad name.
pub fn resolve(root: &Path, file: &Path, name: &str, partial: bool) -> Result<(), Error> {
    let project = Project::load(root)?;
    let ctx = navigator::context_for_document(file, &project)?;
    let reference = ViewReference::new(name, partial);
    let path = view_ref::resolve(&reference, &ctx, &project.config, &Disk)?;

    if Disk.exists(&path) {
        println!("{}", path.display());
    } else {
        println!("{}  (missing)", path.display());
    }
    return Ok(());
}

/// Resolve the render calls of a file, or of one action in it.
///
/// # Errors
///
/// Returns errors from config loading, file reading, context derivation,
/// or JSON serialization.
pub fn views(root: &Path, file: &Path, line: Option<u32>, json: bool) -> Result<(), Error> {
    let project = Project::load(root)?;
    let source = SourceText::new(Disk.read_text(file)?);

    let resolved = match line {
        None => navigator::views_for_document(file, source.as_str(), &project, &Disk)?,
        Some(line) => {
            let offset = line_end_offset(&source, line);
            navigator::views_for_action(file, source.as_str(), offset, &project, &Disk)?
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    if resolved.is_empty() {
        eprintln!("No render calls found");
    }
    for view in &resolved {
        println!("{}", describe_view(file, &source, view));
    }
    return Ok(());
}

/// One line of `views` text output.
fn describe_view(file: &Path, source: &SourceText, view: &ResolvedView) -> String {
    let at = one_based(source.position(view.call.offset));
    let name = &view.call.reference.raw_name;
    return match &view.target {
        ViewTarget::Exists { path } => format!("{}:{at}  {name} -> {}", file.display(), path.display()),
        ViewTarget::Missing { path } => {
            format!("{}:{at}  {name} -> {}  (missing)", file.display(), path.display())
        },
        ViewTarget::Unresolvable { reason } => {
            format!("{}:{at}  {name}  (unresolvable: {reason})", file.display())
        },
    };
}

/// Offset of the last character on a one-based line, so a declaration line
/// ending in `{` falls inside the body. Lines past the end map to the text end.
fn line_end_offset(source: &SourceText, line: u32) -> usize {
    let next_line = Position { column: 0, line };
    return source
        .offset(next_line)
        .map_or(source.as_str().len(), |next_start| return next_start.saturating_sub(1));
}

/// One-based line number of a position.
const fn one_based(position: Position) -> u32 {
    return position.line.saturating_add(1);
}
