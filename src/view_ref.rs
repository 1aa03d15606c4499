//! View reference classification and resolution.
//!
//! Mirrors the framework's runtime view lookup using nothing but string and
//! path manipulation:
//!
//! | reference                  | resolves under            |
//! |----------------------------|---------------------------|
//! | `//layouts/main`           | application views root    |
//! | `/site/index`              | current module views root |
//! | `application.views.x`      | alias table               |
//! | `../shared/_header`, `new` | controller view directory |
//!
//! Path aliases are a fixed table of namespace roots. Aliases registered at
//! runtime by the application's bootstrap are not visible and do not resolve.

use std::path::{Component, Path, PathBuf};

use crate::config::ConventionConfig;
use crate::error::Error;
use crate::fs::FileOracle;
use crate::types::{ViewKind, ViewReference};

/// Directories a reference can resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContext {
    /// Application views root, used by `//` references regardless of module.
    pub base_dir: PathBuf,
    /// Views root of the current module; equals `base_dir` outside a module.
    pub module_view_dir: PathBuf,
    /// The controller's own view directory, for bare and relative names.
    pub view_dir: PathBuf,
    /// Workspace root, the anchor of every alias.
    pub workspace_root: PathBuf,
}

/// What to do about file existence once a candidate path is known.
///
/// Full views want "the path you should create"; partials need to choose
/// between the `_name` and `name` conventions, which only the disk can settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Return the candidate unconditionally; the caller checks existence.
    ExpectedPath,
    /// Probe `_name` then `name`; if neither exists, return `_name`.
    PreferUnderscore,
}

impl ResolvePolicy {
    /// `PreferUnderscore` for `renderPartial` references, `ExpectedPath` otherwise.
    pub const fn for_reference(reference: &ViewReference) -> Self {
        if reference.is_partial {
            return Self::PreferUnderscore;
        }
        return Self::ExpectedPath;
    }
}

/// Where an alias namespace root points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AliasBase {
    /// The protected (application) directory, with views/modules sub-rules.
    Application,
    /// `<protected>/extensions`.
    Extensions,
    /// The framework checkout.
    Framework,
    /// `<framework>/zii`.
    FrameworkZii,
    /// The workspace root.
    Webroot,
}

/// Recognized alias namespace roots.
const ALIAS_ROOTS: &[(&str, AliasBase)] = &[
    ("application", AliasBase::Application),
    ("ext", AliasBase::Extensions),
    ("system", AliasBase::Framework),
    ("webroot", AliasBase::Webroot),
    ("zii", AliasBase::FrameworkZii),
];

/// Classify a raw view name by its prefix.
///
/// `//` is tested before `/`. A leading `./` or `../` is relative even though
/// it contains a dot; any other dot past the first character makes an alias.
pub fn classify(raw: &str) -> ViewKind {
    if raw.starts_with("//") {
        return ViewKind::RootAbsolute;
    }
    if raw.starts_with('/') {
        return ViewKind::Absolute;
    }
    if raw.starts_with("./") || raw.starts_with("../") {
        return ViewKind::Relative;
    }
    if raw.char_indices().any(|(idx, c)| return c == '.' && idx > 0) {
        return ViewKind::DotNotation;
    }
    return ViewKind::Bare;
}

/// Resolve a reference with the policy its render variant implies.
///
/// # Errors
///
/// Returns `Error::UnresolvableReference` for an empty name or an unknown alias root.
pub fn resolve(
    reference: &ViewReference,
    ctx: &ViewContext,
    config: &ConventionConfig,
    oracle: &dyn FileOracle,
) -> Result<PathBuf, Error> {
    return resolve_with_policy(reference, ctx, config, oracle, ResolvePolicy::for_reference(reference));
}

/// Resolve a reference to a view file path under an explicit existence policy.
///
/// # Errors
///
/// Returns `Error::UnresolvableReference` for an empty name or an unknown alias root.
pub fn resolve_with_policy(
    reference: &ViewReference,
    ctx: &ViewContext,
    config: &ConventionConfig,
    oracle: &dyn FileOracle,
    policy: ResolvePolicy,
) -> Result<PathBuf, Error> {
    let raw = reference.raw_name.trim();
    if raw.is_empty() {
        return Err(Error::UnresolvableReference {
            reason: "empty view name".to_string(),
            reference: reference.raw_name.clone(),
        });
    }

    let located = match reference.kind {
        ViewKind::RootAbsolute => join_segments(&ctx.base_dir, raw),
        ViewKind::Absolute => join_segments(&ctx.module_view_dir, raw),
        ViewKind::DotNotation => expand_alias(raw, ctx, config)?,
        ViewKind::Relative | ViewKind::Bare => join_segments(&ctx.view_dir, raw),
    };
    let candidate = normalize_path(&located);
    tracing::debug!(
        "view `{raw}` ({:?}) located at {}",
        reference.kind,
        candidate.display()
    );

    return Ok(match policy {
        ResolvePolicy::ExpectedPath => with_extension(&candidate, &config.view_extension),
        ResolvePolicy::PreferUnderscore => {
            probe_partial_candidates(&candidate, &config.view_extension, oracle)
        },
    });
}

/// Expand a dotted alias through the alias table.
///
/// # Errors
///
/// Returns `Error::UnresolvableReference` if the root is unknown, a segment is
/// empty, or nothing follows the root.
fn expand_alias(raw: &str, ctx: &ViewContext, config: &ConventionConfig) -> Result<PathBuf, Error> {
    let unresolvable = |reason: String| {
        return Error::UnresolvableReference { reason, reference: raw.to_string() };
    };

    let segments: Vec<&str> = raw.split('.').collect();
    if segments.iter().any(|s| return s.is_empty()) {
        return Err(unresolvable("alias has an empty segment".to_string()));
    }
    let Some((root, rest)) = segments.split_first() else {
        return Err(unresolvable("empty alias".to_string()));
    };
    if rest.is_empty() {
        return Err(unresolvable(format!("alias `{root}` names no file")));
    }
    let Some(&(_, base)) = ALIAS_ROOTS.iter().find(|(name, _)| return name == root) else {
        return Err(unresolvable(format!("unknown alias root `{root}`")));
    };

    let protected = ctx.workspace_root.join(&config.protected_dir);
    let framework = ctx.workspace_root.join(&config.framework_dir);

    let (dir, tail): (PathBuf, &[&str]) = match base {
        AliasBase::Application => application_alias_dir(&protected, rest, config),
        AliasBase::Extensions => (protected.join("extensions"), rest),
        AliasBase::Framework => (framework, rest),
        AliasBase::FrameworkZii => (framework.join("zii"), rest),
        AliasBase::Webroot => (ctx.workspace_root.clone(), rest),
    };
    tracing::trace!("alias root `{root}` -> {}", dir.display());

    return Ok(tail.iter().fold(dir, |path, segment| return path.join(segment)));
}

/// Split an `application.*` alias into its base directory and remaining segments.
///
/// `views.…` goes under the application views root, `modules.<name>.views.…`
/// under that module's views root, anything else under the protected dir.
fn application_alias_dir<'a, 'b>(
    protected: &Path,
    rest: &'a [&'b str],
    config: &ConventionConfig,
) -> (PathBuf, &'a [&'b str]) {
    match rest {
        [first, tail @ ..] if *first == config.views_dir => {
            return (protected.join(&config.views_dir), tail);
        },
        [first, module, views, tail @ ..]
            if *first == config.modules_dir && *views == config.views_dir =>
        {
            let dir = protected
                .join(&config.modules_dir)
                .join(module)
                .join(&config.views_dir);
            return (dir, tail);
        },
        _ => return (protected.to_path_buf(), rest),
    }
}

/// Append slash-separated `raw` under `base`. Leading slashes and either
/// separator style are accepted; `Path::join` would discard `base` for `/x`.
fn join_segments(base: &Path, raw: &str) -> PathBuf {
    return raw
        .split(['/', '\\'])
        .filter(|segment| return !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| return path.join(segment));
}

/// Collapse `.` and `..` components without touching the filesystem.
/// Leading `..` survives on relative paths; a root is never popped.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Handle a single path component during normalization.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => match components.last() {
            Some(Component::Normal(_)) => {
                components.pop();
            },
            Some(Component::RootDir | Component::Prefix(_)) => {},
            _ => components.push(component),
        },
        other => components.push(other),
    }
}

/// Append `ext` to the file name unless it already ends with it.
fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    if !path.to_string_lossy().ends_with(ext) {
        raw.push(ext);
    }
    return PathBuf::from(raw);
}

/// Choose between `_name` and `name` for a partial, preferring whichever exists.
fn probe_partial_candidates(candidate: &Path, ext: &str, oracle: &dyn FileOracle) -> PathBuf {
    let Some(file_name) = candidate.file_name().map(|n| return n.to_string_lossy().into_owned()) else {
        return with_extension(candidate, ext);
    };
    let parent = candidate.parent().unwrap_or_else(|| return Path::new(""));

    let (prefixed, plain) = match file_name.strip_prefix('_') {
        Some(stripped) => (file_name.clone(), stripped.to_string()),
        None => (format!("_{file_name}"), file_name.clone()),
    };
    let prefixed = with_extension(&parent.join(prefixed), ext);
    let plain = with_extension(&parent.join(plain), ext);

    for path in [&prefixed, &plain] {
        if oracle.exists(path) {
            tracing::debug!("partial probe hit {}", path.display());
            return path.clone();
        }
    }
    tracing::debug!("partial probe missed, expecting {}", prefixed.display());
    return prefixed;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;

    fn ctx() -> ViewContext {
        return ViewContext {
            base_dir: PathBuf::from("/w/protected/views"),
            module_view_dir: PathBuf::from("/w/protected/views"),
            view_dir: PathBuf::from("/w/protected/views/post"),
            workspace_root: PathBuf::from("/w"),
        };
    }

    fn module_ctx() -> ViewContext {
        return ViewContext {
            base_dir: PathBuf::from("/w/protected/views"),
            module_view_dir: PathBuf::from("/w/protected/modules/blog/views"),
            view_dir: PathBuf::from("/w/protected/modules/blog/views/post"),
            workspace_root: PathBuf::from("/w"),
        };
    }

    fn full(raw: &str, ctx: &ViewContext) -> Result<PathBuf, Error> {
        let reference = ViewReference::new(raw, false);
        return resolve(&reference, ctx, &ConventionConfig::default(), &MemoryFs::new());
    }

    fn partial(raw: &str, fs: &MemoryFs) -> PathBuf {
        let reference = ViewReference::new(raw, true);
        return resolve(&reference, &ctx(), &ConventionConfig::default(), fs).unwrap();
    }

    #[test]
    fn classification() {
        assert_eq!(classify("//layouts/main"), ViewKind::RootAbsolute);
        assert_eq!(classify("/site/index"), ViewKind::Absolute);
        assert_eq!(classify("application.views.layouts.main"), ViewKind::DotNotation);
        assert_eq!(classify("../shared/_header"), ViewKind::Relative);
        assert_eq!(classify("./_form"), ViewKind::Relative);
        assert_eq!(classify("create"), ViewKind::Bare);
        assert_eq!(classify("sub/create"), ViewKind::Bare);
    }

    #[test]
    fn root_absolute_ignores_module() {
        let path = full("//layouts/main", &module_ctx()).unwrap();
        assert_eq!(path, PathBuf::from("/w/protected/views/layouts/main.php"));
    }

    #[test]
    fn absolute_uses_module_views_root() {
        let path = full("/site/index", &module_ctx()).unwrap();
        assert_eq!(path, PathBuf::from("/w/protected/modules/blog/views/site/index.php"));
        let path = full("/site/index", &ctx()).unwrap();
        assert_eq!(path, PathBuf::from("/w/protected/views/site/index.php"));
    }

    #[test]
    fn bare_and_relative_use_view_dir() {
        assert_eq!(full("create", &ctx()).unwrap(), PathBuf::from("/w/protected/views/post/create.php"));
        assert_eq!(
            full("../shared/_header", &ctx()).unwrap(),
            PathBuf::from("/w/protected/views/shared/_header.php")
        );
    }

    #[test]
    fn backslashes_are_normalized() {
        assert_eq!(
            full("sub\\create", &ctx()).unwrap(),
            PathBuf::from("/w/protected/views/post/sub/create.php")
        );
    }

    #[test]
    fn dot_notation_module_views() {
        let path = full("application.modules.Blog.views.post.index", &ctx()).unwrap();
        assert_eq!(path, PathBuf::from("/w/protected/modules/Blog/views/post/index.php"));
    }

    #[test]
    fn dot_notation_application_roots() {
        assert_eq!(
            full("application.views.layouts.main", &ctx()).unwrap(),
            PathBuf::from("/w/protected/views/layouts/main.php")
        );
        assert_eq!(
            full("application.components.views.menu", &ctx()).unwrap(),
            PathBuf::from("/w/protected/components/views/menu.php")
        );
    }

    #[test]
    fn dot_notation_framework_roots() {
        assert_eq!(
            full("zii.widgets.views.detail", &ctx()).unwrap(),
            PathBuf::from("/w/framework/zii/widgets/views/detail.php")
        );
        assert_eq!(
            full("system.views.error", &ctx()).unwrap(),
            PathBuf::from("/w/framework/views/error.php")
        );
        assert_eq!(
            full("webroot.themes.x", &ctx()).unwrap(),
            PathBuf::from("/w/themes/x.php")
        );
    }

    #[test]
    fn unknown_alias_root_is_unresolvable() {
        let err = full("vendor.foo.bar", &ctx()).unwrap_err();
        assert!(matches!(err, Error::UnresolvableReference { .. }));
        assert!(err.to_string().contains("unknown alias root `vendor`"));
    }

    #[test]
    fn empty_names_and_segments_are_unresolvable() {
        assert!(matches!(full("", &ctx()), Err(Error::UnresolvableReference { .. })));
        assert!(matches!(full("  ", &ctx()), Err(Error::UnresolvableReference { .. })));
        assert!(matches!(full("application..x", &ctx()), Err(Error::UnresolvableReference { .. })));
    }

    #[test]
    fn extension_is_not_doubled() {
        assert_eq!(
            full("/site/index.php", &ctx()).unwrap(),
            PathBuf::from("/w/protected/views/site/index.php")
        );
    }

    #[test]
    fn parent_dirs_stop_at_root() {
        assert_eq!(
            full("../../../../../x", &ctx()).unwrap(),
            PathBuf::from("/x.php")
        );
    }

    #[test]
    fn partial_missing_both_returns_prefixed() {
        assert_eq!(partial("foo", &MemoryFs::new()), PathBuf::from("/w/protected/views/post/_foo.php"));
    }

    #[test]
    fn partial_prefers_prefixed_when_both_exist() {
        let mut fs = MemoryFs::new();
        fs.insert("/w/protected/views/post/_foo.php", "")
            .insert("/w/protected/views/post/foo.php", "");
        assert_eq!(partial("foo", &fs), PathBuf::from("/w/protected/views/post/_foo.php"));
    }

    #[test]
    fn partial_falls_back_to_plain() {
        let mut fs = MemoryFs::new();
        fs.insert("/w/protected/views/post/foo.php", "");
        assert_eq!(partial("foo", &fs), PathBuf::from("/w/protected/views/post/foo.php"));
    }

    #[test]
    fn partial_already_prefixed_probes_stripped_form() {
        let mut fs = MemoryFs::new();
        fs.insert("/w/protected/views/post/form.php", "");
        assert_eq!(partial("_form", &fs), PathBuf::from("/w/protected/views/post/form.php"));
        assert_eq!(partial("_form", &MemoryFs::new()), PathBuf::from("/w/protected/views/post/_form.php"));
    }

    #[test]
    fn denied_probe_counts_as_missing() {
        let mut fs = MemoryFs::new();
        fs.insert("/w/protected/views/post/_foo.php", "")
            .deny("/w/protected/views/post/_foo.php")
            .insert("/w/protected/views/post/foo.php", "");
        assert_eq!(partial("foo", &fs), PathBuf::from("/w/protected/views/post/foo.php"));
    }

    #[test]
    fn full_view_path_is_returned_without_probing() {
        let reference = ViewReference::new("missing", false);
        let path = resolve(&reference, &ctx(), &ConventionConfig::default(), &MemoryFs::new()).unwrap();
        assert_eq!(path, PathBuf::from("/w/protected/views/post/missing.php"));
    }

    #[test]
    fn explicit_policy_overrides_render_variant() {
        let reference = ViewReference::new("foo", false);
        let path = resolve_with_policy(
            &reference,
            &ctx(),
            &ConventionConfig::default(),
            &MemoryFs::new(),
            ResolvePolicy::PreferUnderscore,
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/w/protected/views/post/_foo.php"));
    }
}
