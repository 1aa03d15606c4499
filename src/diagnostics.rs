use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{CONFIG_FILE, Project};
use crate::error::Error;
use crate::fs::FileOracle;
use crate::navigator;
use crate::source::{Position, SourceText};
use crate::types::ViewTarget;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// A render call in a document whose view cannot be opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewDiagnostic {
    /// What is wrong.
    pub kind: DiagnosticKind,
    /// Line and column of the view name inside its quotes.
    pub position: Position,
    /// The view name as written.
    pub view_name: String,
}

/// The two ways a render target can be broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DiagnosticKind {
    /// The reference resolves, but no file is at the expected path.
    MissingView {
        /// Where the view is expected.
        expected: PathBuf,
    },
    /// The reference cannot be turned into a path.
    UnresolvableView {
        /// Why resolution gave up.
        reason: String,
    },
}

/// Report every render call in `source` whose target is missing or unresolvable.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if `path` is neither a controller nor a view.
pub fn missing_views(
    path: &Path,
    source: &SourceText,
    project: &Project,
    oracle: &dyn FileOracle,
) -> Result<Vec<ViewDiagnostic>, Error> {
    let resolved = navigator::views_for_document(path, source.as_str(), project, oracle)?;

    return Ok(resolved
        .into_iter()
        .filter_map(|view| {
            let kind = match view.target {
                ViewTarget::Exists { .. } => return None,
                ViewTarget::Missing { path } => DiagnosticKind::MissingView { expected: path },
                ViewTarget::Unresolvable { reason } => DiagnosticKind::UnresolvableView { reason },
            };
            return Some(ViewDiagnostic {
                kind,
                position: source.position(view.call.offset),
                view_name: view.call.reference.raw_name,
            });
        })
        .collect());
}

/// One-line `file:line:col` form of a diagnostic, lines and columns one-based.
pub fn format_diagnostic(file: &Path, diagnostic: &ViewDiagnostic) -> String {
    let line = diagnostic.position.line.saturating_add(1);
    let column = diagnostic.position.column.saturating_add(1);
    let name = &diagnostic.view_name;

    return match &diagnostic.kind {
        DiagnosticKind::MissingView { expected } => format!(
            "{}:{line}:{column}  missing view `{name}` (expected {})",
            file.display(),
            expected.display()
        ),
        DiagnosticKind::UnresolvableView { reason } => {
            format!("{}:{line}:{column}  unresolvable view `{name}` ({reason})", file.display())
        },
    };
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic: what happened and how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::NotInConventionDirectory { expected, path } => render_not_in_convention_directory(expected, path),
        Error::ResourceNotFound { path } => render_resource_not_found(path),
        Error::UnresolvableReference { reason, reference } => render_unresolvable_reference(reference, reason),
        Error::ConfigInvalid { reason } => format!(
            "\
# Error: Invalid Config

{reason}

## Fix

Correct the `[conventions]` table in `{CONFIG_FILE}`.
"
        ),
        _ => render_generic(e),
    };
}

/// Variants with no specific advice.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::Io(inner) => format!(
            "\
# Error: I/O

{inner}
"
        ),
        Error::TomlDe(inner) => format!(
            "\
# Error: Invalid TOML

{inner}
"
        ),
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// Markdown for a path outside the convention layout.
fn render_not_in_convention_directory(expected: &str, path: &Path) -> String {
    return format!(
        "\
# Error: Not In A `{expected}` Directory

`{}` has no `{expected}` segment where the convention needs one.

## Fix

Point at a file under `protected/{expected}/`, or set `{expected}_dir` in `{CONFIG_FILE}`:

    [conventions]
    {expected}_dir = \"{expected}\"
",
        path.display()
    );
}

/// Markdown for a missing controller or view file.
fn render_resource_not_found(path: &Path) -> String {
    let mut out = format!(
        "\
# Error: Not Found

`{}` does not exist.
",
        path.display()
    );

    if let Some(name) = path.file_name().map(|n| return n.to_string_lossy().into_owned()) {
        let _ = write!(
            out,
            "\n## Fix\n\nCreate `{name}`, or check that the controller class file uses the expected casing.\n"
        );
    }
    return out;
}

/// Markdown for a reference that cannot become a path.
fn render_unresolvable_reference(reference: &str, reason: &str) -> String {
    return format!(
        "\
# Error: Unresolvable View Reference

`{reference}`: {reason}

## Supported forms

- `name` or `../dir/name`: relative to the controller's view directory
- `/dir/name`: under the current module's views
- `//dir/name`: under the application's views
- `application.*`, `system.*`, `zii.*`, `ext.*`, `webroot.*`: path aliases
"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConventionConfig;
    use crate::fs::MemoryFs;

    fn project() -> Project {
        return Project::new(PathBuf::from("/w"), ConventionConfig::default());
    }

    #[test]
    fn reports_position_of_missing_view() {
        let text = "<?php\nclass PostController {\n  function actionShow() {\n    $this->render('show');\n  }\n}\n";
        let source = SourceText::new(text.to_string());
        let path = Path::new("/w/protected/controllers/PostController.php");

        let diagnostics = missing_views(path, &source, &project(), &MemoryFs::new()).unwrap();
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.view_name, "show");
        assert_eq!(diagnostic.position, Position { line: 3, column: 19 });
        assert_eq!(
            diagnostic.kind,
            DiagnosticKind::MissingView { expected: PathBuf::from("/w/protected/views/post/show.php") }
        );
        assert_eq!(
            format_diagnostic(path, diagnostic),
            "/w/protected/controllers/PostController.php:4:20  missing view `show` (expected /w/protected/views/post/show.php)"
        );
    }

    #[test]
    fn existing_views_are_not_reported() {
        let text = "<?php function actionShow() { $this->render('show'); $this->render('foo.bar'); }";
        let source = SourceText::new(text.to_string());
        let mut fs = MemoryFs::new();
        fs.insert("/w/protected/views/post/show.php", "");
        let path = Path::new("/w/protected/controllers/PostController.php");

        let diagnostics = missing_views(path, &source, &project(), &fs).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0].kind, DiagnosticKind::UnresolvableView { .. }));
    }

    #[test]
    fn dead_render_calls_are_not_reported() {
        let text = "<?php\nfunction actionShow() {\n    /* $this->render('gone'); */\n    // $this->render('old');\n    echo '$this->render(\"quoted\")';\n}\n";
        let source = SourceText::new(text.to_string());
        let path = Path::new("/w/protected/controllers/PostController.php");

        let diagnostics = missing_views(path, &source, &project(), &MemoryFs::new()).unwrap();
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
    }

    #[test]
    fn renders_markdown_for_core_errors() {
        let md = render_error(&Error::ResourceNotFound { path: PathBuf::from("/w/x/PostController.php") });
        assert!(md.starts_with("# Error: Not Found"));
        assert!(md.contains("PostController.php"));

        let md = render_error(&Error::UnresolvableReference {
            reason: "unknown alias root `foo`".to_string(),
            reference: "foo.bar".to_string(),
        });
        assert!(md.contains("`foo.bar`: unknown alias root `foo`"));

        let md = render_error(&Error::NotInConventionDirectory {
            expected: "views".to_string(),
            path: PathBuf::from("/w/a.php"),
        });
        assert!(md.contains("views_dir"));
    }
}
