//! Source patch transform.
//!
//! Rewrites third-party files on their way into the build graph. Rules are
//! gated on a path suffix anchored at a `/` boundary, and a rule whose target
//! text is no longer present leaves the file untouched.

use crate::error::{VirtModError, VirtModResult};
use crate::text::normalize_path;
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Maps old text to new text, or `None` when there is nothing to patch.
pub type PatchFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Serialized form of a patch rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub path_suffix: String,
    #[serde(flatten)]
    pub action: PatchAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchAction {
    RemoveLine {
        #[serde(rename = "removeLine")]
        remove_line: String,
    },
    Replace {
        find: String,
        replace: String,
    },
}

#[derive(Clone)]
pub struct PatchRule {
    name: String,
    path_pattern: Regex,
    transform: PatchFn,
}

impl fmt::Debug for PatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRule")
            .field("name", &self.name)
            .field("path_pattern", &self.path_pattern.as_str())
            .finish()
    }
}

impl PatchRule {
    pub fn new(name: impl Into<String>, path_pattern: Regex, transform: PatchFn) -> Self {
        Self {
            name: name.into(),
            path_pattern,
            transform,
        }
    }

    /// Rule applying to files whose normalized path ends with `suffix`.
    pub fn for_suffix(
        name: impl Into<String>,
        suffix: &str,
        transform: PatchFn,
    ) -> VirtModResult<Self> {
        Ok(Self::new(name, suffix_pattern(suffix)?, transform))
    }

    /// Removes every line equal to `line` (ignoring surrounding whitespace).
    pub fn remove_line(name: impl Into<String>, suffix: &str, line: &str) -> VirtModResult<Self> {
        let target = line.trim().to_string();
        if target.is_empty() {
            return Err(VirtModError::Config(
                "patch removeLine must not be empty".to_string(),
            ));
        }
        Self::for_suffix(
            name,
            suffix,
            Arc::new(move |text: &str| remove_matching_lines(text, &target)),
        )
    }

    /// Replaces every match of `find` with `replace` (regex syntax, `$1` groups).
    pub fn replace(
        name: impl Into<String>,
        suffix: &str,
        find: &str,
        replace: &str,
    ) -> VirtModResult<Self> {
        let find = Regex::new(find)?;
        let replace = replace.to_string();
        Self::for_suffix(
            name,
            suffix,
            Arc::new(move |text: &str| {
                if find.is_match(text) {
                    Some(find.replace_all(text, replace.as_str()).into_owned())
                } else {
                    None
                }
            }),
        )
    }

    pub fn from_config(config: &PatchConfig) -> VirtModResult<Self> {
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| config.path_suffix.clone());
        match &config.action {
            PatchAction::RemoveLine { remove_line } => {
                Self::remove_line(name, &config.path_suffix, remove_line)
            }
            PatchAction::Replace { find, replace } => {
                Self::replace(name, &config.path_suffix, find, replace)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.path_pattern.is_match(&normalize_path(path))
    }
}

fn suffix_pattern(suffix: &str) -> VirtModResult<Regex> {
    let suffix = suffix.replace('\\', "/");
    let suffix = suffix.trim_start_matches('/');
    if suffix.is_empty() {
        return Err(VirtModError::Config(
            "patch pathSuffix must not be empty".to_string(),
        ));
    }
    Ok(Regex::new(&format!("(?:^|/){}$", regex::escape(suffix)))?)
}

fn remove_matching_lines(text: &str, target: &str) -> Option<String> {
    if !text.lines().any(|line| line.trim() == target) {
        return None;
    }
    let mut out = String::with_capacity(text.len());
    for segment in text.split_inclusive('\n') {
        if segment.trim() != target {
            out.push_str(segment);
        }
    }
    Some(out)
}

/// Ordered collection of patch rules for one session.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    rules: Vec<PatchRule>,
}

impl PatchSet {
    pub fn new(rules: Vec<PatchRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(configs: &[PatchConfig]) -> VirtModResult<Self> {
        let rules = configs
            .iter()
            .map(PatchRule::from_config)
            .collect::<VirtModResult<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[PatchRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule matching `path`, in order.
    pub fn maybe_transform<'a>(&self, path: &Path, text: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);
        for rule in self.rules.iter().filter(|r| r.matches(path)) {
            match (rule.transform)(&*current) {
                Some(patched) => {
                    debug!("Applied patch `{}` to {}", rule.name, path.display());
                    current = Cow::Owned(patched);
                }
                None => warn!(
                    "Patch `{}` matched {} but its target text is absent, leaving it unchanged",
                    rule.name,
                    path.display()
                ),
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const SOURCE: &str = "import a from './a';\nimport './polyfill.css';\nexport default a;\n";

    fn rule() -> PatchRule {
        PatchRule::remove_line(
            "drop-polyfill-css",
            "node_modules/some-lib/dist/index.js",
            "import './polyfill.css';",
        )
        .unwrap()
    }

    #[test]
    fn test_matching_path_is_patched() {
        let set = PatchSet::new(vec![rule()]);
        let path = PathBuf::from("/app/node_modules/some-lib/dist/index.js");
        assert_eq!(
            set.maybe_transform(&path, SOURCE),
            "import a from './a';\nexport default a;\n"
        );
    }

    #[test]
    fn test_unrelated_path_is_untouched() {
        let set = PatchSet::new(vec![rule()]);
        for path in [
            "/app/node_modules/other-lib/dist/index.js",
            "/app/node_modules/not-some-lib/dist/index.js",
            "/app/node_modules/some-lib/dist/index.js.map",
        ] {
            let out = set.maybe_transform(Path::new(path), SOURCE);
            assert!(matches!(out, Cow::Borrowed(_)), "{}", path);
        }
    }

    #[test]
    fn test_windows_paths_match() {
        assert!(rule().matches(Path::new(
            r"C:\app\node_modules\some-lib\dist\index.js"
        )));
    }

    #[test]
    fn test_patch_is_idempotent() {
        let set = PatchSet::new(vec![rule()]);
        let path = PathBuf::from("/app/node_modules/some-lib/dist/index.js");
        let once = set.maybe_transform(&path, SOURCE).into_owned();
        let twice = set.maybe_transform(&path, &once);
        assert_eq!(twice, once);
        assert!(matches!(twice, Cow::Borrowed(_)));
    }

    #[test]
    fn test_absent_target_is_noop() {
        let set = PatchSet::new(vec![rule()]);
        let path = PathBuf::from("/app/node_modules/some-lib/dist/index.js");
        assert_eq!(set.maybe_transform(&path, "export {};\n"), "export {};\n");
    }

    #[test]
    fn test_replace_rule() {
        let rule = PatchRule::replace(
            "pin-version",
            "lib/version.js",
            r#"VERSION = "([0-9.]+)-dev""#,
            r#"VERSION = "$1""#,
        )
        .unwrap();
        let set = PatchSet::new(vec![rule]);
        let out = set.maybe_transform(
            Path::new("/x/lib/version.js"),
            "export const VERSION = \"1.2.0-dev\";",
        );
        assert_eq!(out, "export const VERSION = \"1.2.0\";");
    }

    #[test]
    fn test_config_deserialization() {
        let configs: Vec<PatchConfig> = serde_json::from_str(
            r#"[
                {"pathSuffix": "a/b.js", "removeLine": "import 'x';"},
                {"name": "r", "pathSuffix": "c.js", "find": "foo", "replace": "bar"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            configs[0].action,
            PatchAction::RemoveLine {
                remove_line: "import 'x';".to_string()
            }
        );
        let set = PatchSet::from_config(&configs).unwrap();
        assert_eq!(set.rules()[0].name(), "a/b.js");
        assert_eq!(set.rules()[1].name(), "r");
    }

    #[test]
    fn test_empty_rules_are_rejected() {
        assert!(PatchRule::remove_line("x", "a.js", "   ").is_err());
        assert!(PatchRule::remove_line("x", "/", "import 'a';").is_err());
    }
}
