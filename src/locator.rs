//! From a view file back to the controller and action that render it.

use std::path::{Path, PathBuf};

use crate::catalog;
use crate::config::{ConventionConfig, Project};
use crate::context::{self, lower_first};
use crate::error::Error;
use crate::fs::{DocumentSource, FileOracle};
use crate::render_calls;
use crate::source::SourceText;
use crate::types::{ActionMatch, ActionRecord, ControllerAction, MatchKind};
use crate::view_ref;

/// Controller classes live in PHP files whatever the view extension is.
const CLASS_FILE_EXTENSION: &str = ".php";

/// Find the controller owning `view_path` and, when possible, the action rendering it.
///
/// The controller comes from the path alone: the segment after the views
/// directory names it, and a preceding modules segment scopes it to that
/// module's controllers directory. The action is the first (in declaration
/// order) whose body renders the view by exact name; failing that, the first
/// whose name matches the view file name. No action match still returns the
/// controller.
///
/// # Errors
///
/// Returns `Error::NotInConventionDirectory` if the view is not under a views
/// directory, `Error::ResourceNotFound` if no controller file candidate exists,
/// or errors from reading the controller document.
pub fn find_controller_and_action(
    view_path: &Path,
    project: &Project,
    oracle: &dyn FileOracle,
    documents: &dyn DocumentSource,
) -> Result<ControllerAction, Error> {
    let config = &project.config;
    let location = context::locate_view(view_path, project)?;

    let controllers_dir = view_ref::normalize_path(&match &location.module {
        Some(module) => module.root.join(&config.controllers_dir),
        None => project.app_controllers_dir(),
    });
    let controller_path = find_controller_file(&controllers_dir, &location.controller_id, config, oracle)?;

    let source = SourceText::new(documents.read_text(&controller_path)?);
    let actions = catalog::find_all_actions(source.as_str(), config);
    let view_name = location
        .file_stem
        .strip_prefix('_')
        .unwrap_or(&location.file_stem);

    let action = match_by_render_call(source.as_str(), &actions, view_name)
        .map(|action| return to_match(action, MatchKind::RenderCall, &source))
        .or_else(|| {
            return match_by_name(&actions, view_name, config)
                .map(|action| return to_match(action, MatchKind::NameConvention, &source));
        });
    match &action {
        Some(found) => tracing::debug!("view `{view_name}` -> {} ({:?})", found.name, found.matched_by),
        None => tracing::debug!("view `{view_name}` matched no action in {}", controller_path.display()),
    }

    return Ok(ControllerAction { action, controller_path });
}

/// Class-file candidates for a controller id, in probe order:
/// `user_profile` gives `UserProfileController.php`, then `userProfileController.php`.
pub fn controller_file_names(controller_id: &str, config: &ConventionConfig) -> Vec<String> {
    let class: String = controller_id
        .split('_')
        .filter(|part| return !part.is_empty())
        .map(capitalize)
        .collect();
    let suffix = &config.controller_suffix;
    let ext = CLASS_FILE_EXTENSION;

    let primary = format!("{class}{suffix}{ext}");
    let lower = format!("{}{suffix}{ext}", lower_first(&class));
    if lower == primary {
        return vec![primary];
    }
    return vec![primary, lower];
}

/// Probe the candidates under `dir` and return the first that exists.
///
/// # Errors
///
/// Returns `Error::ResourceNotFound` naming the preferred candidate.
fn find_controller_file(
    dir: &Path,
    controller_id: &str,
    config: &ConventionConfig,
    oracle: &dyn FileOracle,
) -> Result<PathBuf, Error> {
    let candidates: Vec<PathBuf> = controller_file_names(controller_id, config)
        .into_iter()
        .map(|name| return dir.join(name))
        .collect();

    if let Some(found) = candidates.iter().find(|path| return oracle.exists(path)) {
        tracing::debug!("controller for `{controller_id}` at {}", found.display());
        return Ok(found.clone());
    }

    let expected = candidates
        .into_iter()
        .next()
        .unwrap_or_else(|| return dir.to_path_buf());
    return Err(Error::ResourceNotFound { path: expected });
}

/// First action whose body renders `view_name` or `_view_name` verbatim.
/// Calls inside comments and strings do not count.
fn match_by_render_call<'a>(
    text: &str,
    actions: &'a [ActionRecord],
    view_name: &str,
) -> Option<&'a ActionRecord> {
    let prefixed = format!("_{view_name}");

    return actions
        .iter()
        .find(|action| {
            let calls = render_calls::find_render_calls(text, action.body_range(text.len()));
            return calls.iter().any(|call| {
                let raw = call.reference.raw_name.as_str();
                return raw == view_name || raw == prefixed;
            });
        });
}

/// First action whose name, minus the prefix, matches the view name.
///
/// Matches if the lower-cased name equals the view name verbatim
/// (`actionShow` ~ `show`) or if its snake_case form does
/// (`actionUserProfile` ~ `user_profile`).
fn match_by_name<'a>(
    actions: &'a [ActionRecord],
    view_name: &str,
    config: &ConventionConfig,
) -> Option<&'a ActionRecord> {
    return actions.iter().find(|action| {
        let Some(stripped) = action.name.strip_prefix(config.action_prefix.as_str()) else {
            return false;
        };
        return stripped.to_lowercase() == view_name || to_snake_case(stripped) == view_name;
    });
}

/// Record a cataloged action as a locator match.
fn to_match(action: &ActionRecord, matched_by: MatchKind, source: &SourceText) -> ActionMatch {
    return ActionMatch {
        declaration_offset: action.declaration_offset,
        declaration_position: source.position(action.declaration_offset),
        matched_by,
        name: action.name.clone(),
    };
}

/// Upper-case the first character.
fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    return match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    };
}

/// `UserProfile` -> `user_profile`: an underscore before every capital but the first.
fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len().saturating_add(4));
    for (idx, c) in name.chars().enumerate() {
        if c.is_uppercase() && idx > 0 {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    return out;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::source::Position;

    const POST_CONTROLLER: &str = "<?php
class PostController extends Controller
{
    public function actionIndex()
    {
        $this->render('index');
    }

    public function actionShow($id)
    {
        $this->render('show', array('model' => $this->load($id)));
    }

    public function actionCreate()
    {
        $this->render('create');
    }

    public function actionUpdate($id)
    {
        $this->renderPartial('_form');
        $this->render('update');
    }

    public function actionUserProfile()
    {
        $this->render('//layouts/profile');
    }
}
";

    fn project() -> Project {
        return Project::new(PathBuf::from("/w"), ConventionConfig::default());
    }

    fn fs_with(path: &str, text: &str) -> MemoryFs {
        let mut fs = MemoryFs::new();
        fs.insert(path, text);
        return fs;
    }

    fn locate(view: &str, fs: &MemoryFs) -> Result<ControllerAction, Error> {
        return find_controller_and_action(Path::new(view), &project(), fs, fs);
    }

    #[test]
    fn finds_action_by_render_call() {
        let fs = fs_with("/w/protected/controllers/PostController.php", POST_CONTROLLER);
        let found = locate("/w/protected/views/post/show.php", &fs).unwrap();
        assert_eq!(found.controller_path, PathBuf::from("/w/protected/controllers/PostController.php"));
        let action = found.action.unwrap();
        assert_eq!(action.name, "actionShow");
        assert_eq!(action.matched_by, MatchKind::RenderCall);
        assert!(POST_CONTROLLER[action.declaration_offset..].starts_with("function actionShow"));
    }

    #[test]
    fn minimal_round_trip() {
        let fs = fs_with(
            "/w/protected/controllers/PostController.php",
            "<?php class PostController { function actionShow(){ $this->render('show'); } }",
        );
        let found = locate("/w/protected/views/post/show.php", &fs).unwrap();
        assert_eq!(found.controller_path, PathBuf::from("/w/protected/controllers/PostController.php"));
        assert_eq!(found.action.unwrap().name, "actionShow");
    }

    #[test]
    fn partial_view_matches_prefixed_render_call() {
        let fs = fs_with("/w/protected/controllers/PostController.php", POST_CONTROLLER);
        let found = locate("/w/protected/views/post/_form.php", &fs).unwrap();
        assert_eq!(found.action.unwrap().name, "actionUpdate");
    }

    #[test]
    fn falls_back_to_snake_case_name() {
        let fs = fs_with("/w/protected/controllers/PostController.php", POST_CONTROLLER);
        let action = locate("/w/protected/views/post/user_profile.php", &fs).unwrap().action.unwrap();
        assert_eq!(action.name, "actionUserProfile");
        assert_eq!(action.matched_by, MatchKind::NameConvention);
    }

    #[test]
    fn falls_back_to_case_insensitive_name() {
        let fs = fs_with("/w/protected/controllers/PostController.php", POST_CONTROLLER);
        let action = locate("/w/protected/views/post/userprofile.php", &fs).unwrap().action.unwrap();
        assert_eq!(action.name, "actionUserProfile");
    }

    #[test]
    fn capitalized_view_name_does_not_match() {
        let fs = fs_with("/w/protected/controllers/PostController.php", POST_CONTROLLER);
        let found = locate("/w/protected/views/post/UserProfile.php", &fs).unwrap();
        assert_eq!(found.action, None);
    }

    #[test]
    fn commented_render_call_does_not_claim_the_view() {
        let text = "<?php
class PostController extends Controller
{
    public function actionLegacy()
    {
        // $this->render('show');
        $this->render('legacy');
    }

    /*
    public function actionOld() { $this->render('show'); }
    */

    public function actionShow()
    {
        $this->render('show');
    }
}";
        let fs = fs_with("/w/protected/controllers/PostController.php", text);
        let action = locate("/w/protected/views/post/show.php", &fs).unwrap().action.unwrap();
        assert_eq!(action.name, "actionShow");
        assert_eq!(action.matched_by, MatchKind::RenderCall);
        assert_eq!(action.declaration_position, Position { column: 11, line: 13 });
    }

    #[test]
    fn unmatched_view_still_returns_controller() {
        let fs = fs_with("/w/protected/controllers/PostController.php", POST_CONTROLLER);
        let found = locate("/w/protected/views/post/orphan.php", &fs).unwrap();
        assert_eq!(found.controller_path, PathBuf::from("/w/protected/controllers/PostController.php"));
        assert_eq!(found.action, None);
    }

    #[test]
    fn lower_camel_controller_file_fallback() {
        let fs = fs_with("/w/protected/controllers/postController.php", POST_CONTROLLER);
        let found = locate("/w/protected/views/post/show.php", &fs).unwrap();
        assert_eq!(found.controller_path, PathBuf::from("/w/protected/controllers/postController.php"));
    }

    #[test]
    fn pascal_case_wins_when_both_exist() {
        let mut fs = fs_with("/w/protected/controllers/postController.php", POST_CONTROLLER);
        fs.insert("/w/protected/controllers/PostController.php", POST_CONTROLLER);
        let found = locate("/w/protected/views/post/show.php", &fs).unwrap();
        assert_eq!(found.controller_path, PathBuf::from("/w/protected/controllers/PostController.php"));
    }

    #[test]
    fn module_views_use_module_controllers() {
        let fs = fs_with("/w/protected/modules/blog/controllers/PostController.php", POST_CONTROLLER);
        let found = locate("/w/protected/modules/blog/views/post/create.php", &fs).unwrap();
        assert_eq!(
            found.controller_path,
            PathBuf::from("/w/protected/modules/blog/controllers/PostController.php")
        );
        assert_eq!(found.action.unwrap().name, "actionCreate");
    }

    #[test]
    fn underscored_controller_id_is_pascal_cased() {
        let fs = fs_with("/w/protected/controllers/UserProfileController.php", "<?php");
        let found = locate("/w/protected/views/user_profile/index.php", &fs).unwrap();
        assert_eq!(
            found.controller_path,
            PathBuf::from("/w/protected/controllers/UserProfileController.php")
        );
    }

    #[test]
    fn missing_controller_reports_preferred_candidate() {
        let err = locate("/w/protected/views/post/show.php", &MemoryFs::new()).unwrap_err();
        let Error::ResourceNotFound { path } = err else { panic!("wrong error: {err}") };
        assert_eq!(path, PathBuf::from("/w/protected/controllers/PostController.php"));
    }

    #[test]
    fn view_outside_views_dir_is_rejected() {
        let err = locate("/w/protected/components/Menu.php", &MemoryFs::new()).unwrap_err();
        assert!(matches!(err, Error::NotInConventionDirectory { .. }));
    }

    #[test]
    fn first_render_match_in_declaration_order_wins() {
        let text = "<?php
function actionA() { $this->render('shared'); }
function actionB() { $this->render('shared'); }";
        let fs = fs_with("/w/protected/controllers/PostController.php", text);
        let found = locate("/w/protected/views/post/shared.php", &fs).unwrap();
        assert_eq!(found.action.unwrap().name, "actionA");
    }

    #[test]
    fn render_call_beats_name_convention() {
        let text = "<?php
function actionShow() { $this->render('details'); }
function actionDisplay() { $this->render('show'); }";
        let fs = fs_with("/w/protected/controllers/PostController.php", text);
        let found = locate("/w/protected/views/post/show.php", &fs).unwrap();
        assert_eq!(found.action.unwrap().name, "actionDisplay");
    }

    #[test]
    fn candidate_names() {
        let config = ConventionConfig::default();
        assert_eq!(
            controller_file_names("user_profile", &config),
            vec!["UserProfileController.php", "userProfileController.php"]
        );
        assert_eq!(controller_file_names("post", &config), vec!["PostController.php", "postController.php"]);
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("UserProfile"), "user_profile");
        assert_eq!(to_snake_case("Index"), "index");
        assert_eq!(to_snake_case(""), "");
    }
}
