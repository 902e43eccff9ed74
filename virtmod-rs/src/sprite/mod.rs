//! SVG sprite builder.
//!
//! Scans the configured icon directories and turns every `.svg` file into a
//! `<symbol>` inside a single hidden sprite container:
//!
//! - directories are visited in configured order, files within a directory in
//!   file-name order
//! - `symbolId` is `<prefix>-<stem>` (`<prefix>-<dir>-<stem>` for nested files
//!   in recursive mode)
//! - duplicate ids are resolved by [`DuplicatePolicy`], first-wins by default
//! - malformed icons and unreadable directories are skipped with a
//!   [`SpriteWarning`] unless `strict` is set
//! - prefixes declared on an icon's root stay declared on its `<symbol>`

mod store;

pub use store::{PublishOutcome, RebuildReport, RebuildTicket, SpriteStore};

use crate::error::{VirtModError, VirtModResult};
use crate::text::{escape_xml_attr, strip_bom};
use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONTAINER_ID: &str = "__svg__icons__dom__";
pub const DEFAULT_PREFIX: &str = "icon";
pub const DEFAULT_COLOR: &str = "#333";

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Root `<svg>` attributes that do not carry over to the `<symbol>`.
const DROPPED_ROOT_ATTRS: &[&str] = &["width", "height", "id", "x", "y", "version"];

lazy_static! {
    static ref LENGTH_RE: Regex = Regex::new(r"^\s*([0-9]*\.?[0-9]+)\s*(px)?\s*$").unwrap();
}

/// Which icon keeps a symbol id claimed by more than one file.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    #[default]
    FirstWins,
    LastWins,
}

/// Where the registration script places the sprite container in `<body>`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InjectPosition {
    #[default]
    BodyFirst,
    BodyLast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpriteOptions {
    /// Icon directories, scanned in order.
    pub dirs: Vec<PathBuf>,
    pub prefix: String,
    /// Default fill used by icon references.
    pub color: String,
    pub recursive: bool,
    pub strict: bool,
    pub duplicates: DuplicatePolicy,
    pub container_id: String,
    pub inject: InjectPosition,
}

impl Default for SpriteOptions {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            color: DEFAULT_COLOR.to_string(),
            recursive: false,
            strict: false,
            duplicates: DuplicatePolicy::default(),
            container_id: DEFAULT_CONTAINER_ID.to_string(),
            inject: InjectPosition::default(),
        }
    }
}

impl SpriteOptions {
    /// Derives the symbol id for an icon `stem` found under `dirs` (relative
    /// sub-directories, empty for top-level icons).
    pub fn symbol_id(&self, dirs: &[String], stem: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(dirs.len() + 2);
        if !self.prefix.is_empty() {
            parts.push(&self.prefix);
        }
        parts.extend(dirs.iter().map(String::as_str));
        parts.push(stem);
        parts.join("-")
    }
}

/// Recoverable condition recorded while building a sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteWarning {
    MalformedIcon {
        path: PathBuf,
        reason: String,
    },
    DuplicateSymbol {
        symbol_id: String,
        kept: PathBuf,
        dropped: PathBuf,
    },
    MissingDirectory {
        path: PathBuf,
    },
    UnreadableDirectory {
        path: PathBuf,
        reason: String,
    },
}

impl fmt::Display for SpriteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteWarning::MalformedIcon { path, reason } => {
                write!(f, "skipping malformed icon {}: {}", path.display(), reason)
            }
            SpriteWarning::DuplicateSymbol {
                symbol_id,
                kept,
                dropped,
            } => write!(
                f,
                "duplicate symbol id `{}`: keeping {}, dropping {}",
                symbol_id,
                kept.display(),
                dropped.display()
            ),
            SpriteWarning::MissingDirectory { path } => {
                write!(f, "icon directory {} does not exist", path.display())
            }
            SpriteWarning::UnreadableDirectory { path, reason } => {
                write!(f, "skipping unreadable directory {}: {}", path.display(), reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSymbol {
    pub symbol_id: String,
    /// Complete `<symbol ...>...</symbol>` element.
    pub markup: String,
    pub source: PathBuf,
}

/// Immutable aggregate of every icon discovered in one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteDocument {
    container_id: String,
    symbols: Vec<SpriteSymbol>,
    warnings: Vec<SpriteWarning>,
    markup: String,
}

impl SpriteDocument {
    pub fn new(
        container_id: impl Into<String>,
        symbols: Vec<SpriteSymbol>,
        warnings: Vec<SpriteWarning>,
    ) -> Self {
        let container_id = container_id.into();
        let markup = render_container(&container_id, &symbols);
        Self {
            container_id,
            symbols,
            warnings,
            markup,
        }
    }

    pub fn empty(container_id: impl Into<String>) -> Self {
        Self::new(container_id, Vec::new(), Vec::new())
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn symbols(&self) -> &[SpriteSymbol] {
        &self.symbols
    }

    pub fn symbol_ids(&self) -> Vec<&str> {
        self.symbols.iter().map(|s| s.symbol_id.as_str()).collect()
    }

    pub fn get(&self, symbol_id: &str) -> Option<&SpriteSymbol> {
        self.symbols.iter().find(|s| s.symbol_id == symbol_id)
    }

    pub fn contains(&self, symbol_id: &str) -> bool {
        self.get(symbol_id).is_some()
    }

    pub fn warnings(&self) -> &[SpriteWarning] {
        &self.warnings
    }

    /// Hidden `<svg>` container holding every symbol.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn render_container(container_id: &str, symbols: &[SpriteSymbol]) -> String {
    let mut markup = format!(
        r#"<svg xmlns="{SVG_NS}" xmlns:xlink="{XLINK_NS}" style="position: absolute; width: 0; height: 0" aria-hidden="true" id="{}">"#,
        escape_xml_attr(container_id)
    );
    for symbol in symbols {
        markup.push_str(&symbol.markup);
    }
    markup.push_str("</svg>");
    markup
}

/// Scans `options.dirs` and builds a sprite document.
pub fn build_sprite(options: &SpriteOptions) -> VirtModResult<SpriteDocument> {
    let mut symbols: Vec<SpriteSymbol> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut warnings = Vec::new();

    for dir in &options.dirs {
        if !dir.is_dir() {
            if options.strict {
                return Err(VirtModError::io(
                    dir,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "icon directory not found"),
                ));
            }
            record(
                &mut warnings,
                SpriteWarning::MissingDirectory { path: dir.clone() },
            );
            continue;
        }

        let mut scan = DirectoryScan {
            options,
            files: Vec::new(),
            visited: HashSet::new(),
            warnings: &mut warnings,
        };
        scan.collect(dir, &mut Vec::new())?;
        let files = scan.files;

        for (path, sub_dirs) in files {
            let converted = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| "file name is not valid UTF-8".to_string())
                .map(|stem| options.symbol_id(&sub_dirs, stem))
                .and_then(|symbol_id| {
                    let source = fs::read_to_string(&path).map_err(|err| err.to_string())?;
                    icon_to_symbol(&source, &symbol_id).map(|markup| (symbol_id, markup))
                });
            let (symbol_id, markup) = match converted {
                Ok(converted) => converted,
                Err(reason) => {
                    if options.strict {
                        return Err(VirtModError::InvalidIcon { path, reason });
                    }
                    record(
                        &mut warnings,
                        SpriteWarning::MalformedIcon { path, reason },
                    );
                    continue;
                }
            };

            let symbol = SpriteSymbol {
                symbol_id: symbol_id.clone(),
                markup,
                source: path,
            };

            match index.get(&symbol_id).copied() {
                None => {
                    index.insert(symbol_id, symbols.len());
                    symbols.push(symbol);
                }
                Some(existing) => match options.duplicates {
                    DuplicatePolicy::FirstWins => record(
                        &mut warnings,
                        SpriteWarning::DuplicateSymbol {
                            symbol_id,
                            kept: symbols[existing].source.clone(),
                            dropped: symbol.source,
                        },
                    ),
                    DuplicatePolicy::LastWins => {
                        let previous = std::mem::replace(&mut symbols[existing], symbol);
                        record(
                            &mut warnings,
                            SpriteWarning::DuplicateSymbol {
                                symbol_id,
                                kept: symbols[existing].source.clone(),
                                dropped: previous.source,
                            },
                        );
                    }
                },
            }
        }
    }

    debug!(
        "Built sprite `{}` with {} symbols ({} warnings)",
        options.container_id,
        symbols.len(),
        warnings.len()
    );
    Ok(SpriteDocument::new(
        options.container_id.clone(),
        symbols,
        warnings,
    ))
}

fn record(warnings: &mut Vec<SpriteWarning>, warning: SpriteWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}

/// Walks one configured icon directory.
struct DirectoryScan<'a> {
    options: &'a SpriteOptions,
    files: Vec<(PathBuf, Vec<String>)>,
    /// Canonical directories already walked, so symlink cycles end.
    visited: HashSet<PathBuf>,
    warnings: &'a mut Vec<SpriteWarning>,
}

impl DirectoryScan<'_> {
    /// Collects `.svg` files under `dir` in file-name order, depth first.
    ///
    /// Outside strict mode a directory or entry that cannot be read is
    /// recorded as a warning and skipped.
    fn collect(&mut self, dir: &Path, sub_dirs: &mut Vec<String>) -> VirtModResult<()> {
        let entries = match fs::canonicalize(dir).and_then(|canonical| {
            let entries = fs::read_dir(dir)?;
            Ok((canonical, entries))
        }) {
            Ok((canonical, entries)) => {
                if !self.visited.insert(canonical) {
                    debug!("Skipping already scanned directory {}", dir.display());
                    return Ok(());
                }
                entries
            }
            Err(err) => return self.unreadable(dir, err),
        };

        let mut paths = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => paths.push(entry.path()),
                Err(err) => self.unreadable(dir, err)?,
            }
        }
        paths.sort();

        for path in paths {
            if path.is_dir() {
                if self.options.recursive {
                    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                        sub_dirs.push(name.to_string());
                        let result = self.collect(&path, sub_dirs);
                        sub_dirs.pop();
                        result?;
                    }
                }
            } else if is_svg_file(&path) {
                self.files.push((path, sub_dirs.clone()));
            }
        }
        Ok(())
    }

    fn unreadable(&mut self, dir: &Path, err: std::io::Error) -> VirtModResult<()> {
        if self.options.strict {
            return Err(VirtModError::io(dir, err));
        }
        record(
            self.warnings,
            SpriteWarning::UnreadableDirectory {
                path: dir.to_path_buf(),
                reason: err.to_string(),
            },
        );
        Ok(())
    }
}

fn is_svg_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// Rewrites an icon's root `<svg>` element into a `<symbol>` with `symbol_id`.
///
/// Internal markup is kept byte for byte. Returns the reason on failure.
pub fn icon_to_symbol(source: &str, symbol_id: &str) -> Result<String, String> {
    let text = strip_bom(source);
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, options).map_err(|e| e.to_string())?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        ));
    }

    let mut attrs = format!(r#"id="{}""#, escape_xml_attr(symbol_id));

    // Prefixes declared on the root may be used by the copied children. The
    // container already binds the default SVG namespace and `xlink`.
    for ns in root.namespaces() {
        let Some(prefix) = ns.name() else {
            continue;
        };
        if prefix == "xml" || (prefix == "xlink" && ns.uri() == XLINK_NS) {
            continue;
        }
        attrs.push_str(&format!(
            r#" xmlns:{}="{}""#,
            prefix,
            escape_xml_attr(ns.uri())
        ));
    }

    let mut has_view_box = false;
    for attr in root.attributes() {
        // Editor metadata on the root (inkscape:*, xml:space) is not carried over
        if attr.namespace().is_some() || DROPPED_ROOT_ATTRS.contains(&attr.name()) {
            continue;
        }
        if attr.name() == "viewBox" {
            has_view_box = true;
        }
        attrs.push_str(&format!(
            r#" {}="{}""#,
            attr.name(),
            escape_xml_attr(attr.value())
        ));
    }

    if !has_view_box {
        if let (Some(width), Some(height)) = (
            root.attribute("width").and_then(parse_length),
            root.attribute("height").and_then(parse_length),
        ) {
            attrs.push_str(&format!(r#" viewBox="0 0 {} {}""#, width, height));
        }
    }

    let inner = match (root.first_child(), root.last_child()) {
        (Some(first), Some(last)) => text[first.range().start..last.range().end].trim(),
        _ => "",
    };

    Ok(format!("<symbol {}>{}</symbol>", attrs, inner))
}

fn parse_length(value: &str) -> Option<&str> {
    LENGTH_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
