//! Cross-module type locator.
//!
//! Maps module paths (`crate::models`, `billing::invoice`) to the source files that
//! implement them. A file's own `use` items are collected into a [`ModuleLocation`],
//! which turns a file-local alias into a canonical module path; [`TypeLocator`] then
//! searches the working tree for that module in three tiers, stopping at the first
//! tier that yields anything:
//!
//! 1. the exact path derived from the module path (`src/models.rs`, `src/models/mod.rs`,
//!    or a workspace crate `crates/billing/src/lib.rs`)
//! 2. conventional layout directories (`src/handlers`, `src/api`, `src/models`, ...)
//! 3. a depth-bounded search under conventional roots, accepting a candidate only if
//!    its parent declares the module (checked with a text scan, not a full parse)

use crate::scanner::FileScanner;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use syn::UseTree;

/// Crate prefix used for the analysed root crate
pub const ROOT_CRATE: &str = "crate";

/// Directories probed in the second tier, relative to the working tree
const CONVENTIONAL_DIRS: &[&str] = &[
    "src/handlers",
    "handlers",
    "src/api/handlers",
    "src/http/handlers",
    "api/handlers",
    "src/api",
    "src/models",
    "src/dto",
];

/// Roots searched in the third tier
const SEARCH_ROOTS: &[&str] = &["src", "crates", "internal", "lib", "app"];

/// Path prefixes that never resolve to project sources
const EXTERNAL_CRATES: &[&str] = &["std", "core", "alloc"];

static PACKAGE_NAME: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*name\s*=\s*"([^"]+)""#).ok());

/// Import aliases of one source file: alias -> canonical path of the imported item.
///
/// Built per file and never shared between files, since aliases are file-local.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleLocation {
    aliases: HashMap<String, String>,
    globs: Vec<String>,
}

impl ModuleLocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `use` item, canonicalizing paths against `module_path`
    pub fn add_use(&mut self, item: &syn::ItemUse, module_path: &str, child_modules: &HashSet<String>) {
        let mut collected = Vec::new();
        collect_use_tree(&item.tree, &mut Vec::new(), &mut collected);

        for (alias, segments) in collected {
            let Some(path) = canonicalize(&segments, module_path, child_modules) else {
                continue;
            };
            match alias {
                Some(alias) => {
                    debug!("Import alias {} -> {}", alias, path);
                    self.aliases.insert(alias, path);
                }
                None => self.globs.push(path),
            }
        }
    }

    /// Canonical path an alias stands for
    pub fn resolve_alias(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Modules imported with `*`
    pub fn globs(&self) -> &[String] {
        &self.globs
    }

    pub fn len(&self) -> usize {
        self.aliases.len() + self.globs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty() && self.globs.is_empty()
    }
}

/// Flatten a use tree into `(alias, path)` pairs; globs get no alias
fn collect_use_tree(
    tree: &UseTree,
    prefix: &mut Vec<String>,
    out: &mut Vec<(Option<String>, Vec<String>)>,
) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            collect_use_tree(&path.tree, prefix, out);
            prefix.pop();
        }
        UseTree::Name(name) => {
            if name.ident == "self" {
                if let Some(last) = prefix.last() {
                    out.push((Some(last.clone()), prefix.clone()));
                }
            } else {
                let mut segments = prefix.clone();
                segments.push(name.ident.to_string());
                out.push((Some(name.ident.to_string()), segments));
            }
        }
        UseTree::Rename(rename) => {
            if rename.rename == "_" {
                return;
            }
            let mut segments = prefix.clone();
            if rename.ident != "self" {
                segments.push(rename.ident.to_string());
            }
            out.push((Some(rename.rename.to_string()), segments));
        }
        UseTree::Glob(_) => {
            if !prefix.is_empty() {
                out.push((None, prefix.clone()));
            }
        }
        UseTree::Group(group) => {
            for item in &group.items {
                collect_use_tree(item, prefix, out);
            }
        }
    }
}

/// Rewrite a path relative to the module it appears in.
///
/// `crate`, `self` and `super` are resolved against `module_path`; a leading child
/// module of the current file is prefixed with the current module. Anything else
/// (an external or workspace crate) is kept as written.
pub fn canonicalize(
    segments: &[String],
    module_path: &str,
    child_modules: &HashSet<String>,
) -> Option<String> {
    let first = segments.first()?;
    let mut base: Vec<&str> = module_path.split("::").collect();

    let rest = match first.as_str() {
        "crate" => {
            base.truncate(1);
            &segments[1..]
        }
        "self" => &segments[1..],
        "super" => {
            let supers = segments.iter().take_while(|s| *s == "super").count();
            for _ in 0..supers {
                if base.len() <= 1 {
                    return None;
                }
                base.pop();
            }
            &segments[supers..]
        }
        name if child_modules.contains(name) => segments,
        _ => return Some(segments.join("::")),
    };

    let mut joined: Vec<&str> = base;
    joined.extend(rest.iter().map(String::as_str));
    Some(joined.join("::"))
}

/// Whether a module path points into the standard library
pub fn is_external(module_path: &str) -> bool {
    let first = module_path.split("::").next().unwrap_or_default();
    EXTERNAL_CRATES.contains(&first)
}

/// Canonical module path of a source file.
///
/// Files of the root crate (`<root>/src/...`) map to `crate::...`; files of a
/// workspace member (`<root>/crates/billing/src/...`) map to `billing::...`.
pub fn module_path_for_file(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let components: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(os) => Some(os.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let src_index = components.iter().rposition(|c| c == "src");
    let (crate_name, module_parts) = match src_index {
        Some(0) | None => (ROOT_CRATE.to_string(), &components[src_index.map_or(0, |i| i + 1)..]),
        Some(i) => (components[i - 1].replace('-', "_"), &components[i + 1..]),
    };

    let mut segments = vec![crate_name];
    for (idx, part) in module_parts.iter().enumerate() {
        let is_file = idx + 1 == module_parts.len();
        if is_file {
            let stem = part.strip_suffix(".rs").unwrap_or(part);
            if !matches!(stem, "mod" | "lib" | "main") {
                segments.push(stem.to_string());
            }
        } else {
            segments.push(part.clone());
        }
    }
    segments.join("::")
}

/// Finds the source files of a module
#[derive(Debug)]
pub struct TypeLocator {
    root: PathBuf,
    located: RwLock<HashMap<String, Vec<PathBuf>>>,
}

impl TypeLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            located: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files for a module path, from the first tier that finds any.
    ///
    /// Results, including empty ones, are cached per module path.
    pub fn locate(&self, module_path: &str) -> Vec<PathBuf> {
        if is_external(module_path) {
            return Vec::new();
        }
        if let Some(files) = self.located.read().get(module_path) {
            return files.clone();
        }

        let segments: Vec<&str> = module_path.split("::").filter(|s| !s.is_empty()).collect();
        let mut files = self.exact_candidates(&segments);
        if files.is_empty() {
            files = self.conventional_candidates(&segments);
        }
        if files.is_empty() {
            files = self.searched_candidates(&segments);
        }
        dedup(&mut files);

        debug!("Located module {}: {:?}", module_path, files);
        self.located
            .write()
            .insert(module_path.to_string(), files.clone());
        files
    }

    /// Number of cached module lookups
    pub fn cached_lookups(&self) -> usize {
        self.located.read().len()
    }

    pub fn clear(&self) {
        self.located.write().clear();
    }

    /// Tier 1: paths derived directly from the module path
    fn exact_candidates(&self, segments: &[&str]) -> Vec<PathBuf> {
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };

        let mut bases: Vec<(PathBuf, &[&str])> = Vec::new();
        if *first == ROOT_CRATE {
            bases.push((self.root.join("src"), rest));
        } else {
            let dashed = first.replace('_', "-");
            for name in [first.to_string(), dashed] {
                bases.push((self.root.join("crates").join(&name).join("src"), rest));
                bases.push((self.root.join(&name).join("src"), rest));
            }
            bases.push((self.root.join("src"), segments));
            bases.push((self.root.clone(), segments));
        }

        bases
            .into_iter()
            .flat_map(|(base, rel)| module_files(&base, rel))
            .collect()
    }

    /// Tier 2: conventional layout directories
    fn conventional_candidates(&self, segments: &[&str]) -> Vec<PathBuf> {
        let Some(last) = segments.last().copied() else {
            return Vec::new();
        };
        CONVENTIONAL_DIRS
            .iter()
            .flat_map(|dir| module_files(&self.root.join(dir), &[last]))
            .collect()
    }

    /// Tier 3: bounded search, verified against the declaring parent
    fn searched_candidates(&self, segments: &[&str]) -> Vec<PathBuf> {
        let Some(last) = segments.last().copied() else {
            return Vec::new();
        };
        let mut found = Vec::new();

        for root in SEARCH_ROOTS {
            let search_root = self.root.join(root);
            if !search_root.is_dir() {
                continue;
            }
            let scanner = FileScanner::new(search_root);

            for dir in scanner.find_dirs_named(last) {
                let mod_rs = dir.join("mod.rs");
                if mod_rs.is_file() && parent_declares(&dir, last) {
                    found.push(mod_rs);
                }
                let lib_rs = dir.join("src").join("lib.rs");
                if lib_rs.is_file() && package_name_matches(&dir, last) {
                    found.push(lib_rs);
                }
            }

            for file in scanner.find_files_named(&format!("{}.rs", last)) {
                if let Some(dir) = file.parent() {
                    if dir_declares(dir, last) {
                        found.push(file);
                    }
                }
            }
        }

        found
    }
}

/// `<base>/<rel>.rs` and `<base>/<rel>/mod.rs`, or the crate root when `rel` is empty
fn module_files(base: &Path, rel: &[&str]) -> Vec<PathBuf> {
    let candidates = if rel.is_empty() {
        vec![base.join("lib.rs"), base.join("main.rs")]
    } else {
        let joined: PathBuf = rel.iter().collect();
        vec![joined.with_extension("rs"), joined.join("mod.rs")]
            .into_iter()
            .map(|p| base.join(p))
            .collect()
    };
    candidates.into_iter().filter(|p| p.is_file()).collect()
}

/// Whether the module owning `dir` declares `mod name;`
fn dir_declares(dir: &Path, name: &str) -> bool {
    let mut declarers = vec![dir.join("mod.rs"), dir.join("lib.rs"), dir.join("main.rs")];
    if let (Some(parent), Some(dir_name)) = (dir.parent(), dir.file_name()) {
        declarers.push(parent.join(format!("{}.rs", dir_name.to_string_lossy())));
    }
    declarers.iter().any(|file| declares_module(file, name))
}

/// Whether the parent of a module directory declares it
fn parent_declares(module_dir: &Path, name: &str) -> bool {
    module_dir
        .parent()
        .is_some_and(|parent| dir_declares(parent, name))
}

/// Header scan for `mod name;` / `pub mod name {`, without building a syntax tree
pub fn declares_module(file: &Path, name: &str) -> bool {
    let Ok(content) = fs::read_to_string(file) else {
        return false;
    };
    let pattern = format!(
        r"(?m)^\s*(pub(\s*\([^)]*\))?\s+)?mod\s+(r#)?{}\s*[;{{]",
        regex::escape(name)
    );
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(&content),
        Err(_) => false,
    }
}

fn package_name_matches(crate_dir: &Path, name: &str) -> bool {
    let Ok(manifest) = fs::read_to_string(crate_dir.join("Cargo.toml")) else {
        return false;
    };
    let Some(re) = PACKAGE_NAME.as_ref() else {
        return false;
    };
    re.captures(&manifest)
        .and_then(|c| c.get(1))
        .is_some_and(|m| m.as_str().replace('-', "_") == name.replace('-', "_"))
}

fn dedup(files: &mut Vec<PathBuf>) {
    let mut seen = HashSet::new();
    files.retain(|f| seen.insert(f.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn location_of(code: &str, module_path: &str, children: &[&str]) -> ModuleLocation {
        let file = syn::parse_file(code).unwrap();
        let children: HashSet<String> = children.iter().map(|s| s.to_string()).collect();
        let mut location = ModuleLocation::new();
        for item in &file.items {
            if let syn::Item::Use(item_use) = item {
                location.add_use(item_use, module_path, &children);
            }
        }
        location
    }

    #[test]
    fn test_use_tree_aliases() {
        let location = location_of(
            r#"
            use crate::models::{self, User, Role as UserRole};
            use super::dto::*;
            use serde_json::Value;
            use std::collections::HashMap;
            use crate::traits::Validate as _;
            "#,
            "crate::api::handlers",
            &[],
        );

        assert_eq!(location.resolve_alias("models"), Some("crate::models"));
        assert_eq!(location.resolve_alias("User"), Some("crate::models::User"));
        assert_eq!(location.resolve_alias("UserRole"), Some("crate::models::Role"));
        assert_eq!(location.resolve_alias("Role"), None);
        assert_eq!(location.resolve_alias("Value"), Some("serde_json::Value"));
        assert_eq!(
            location.resolve_alias("HashMap"),
            Some("std::collections::HashMap")
        );
        assert_eq!(location.resolve_alias("_"), None);
        assert_eq!(location.globs(), &["crate::api::dto".to_string()]);
    }

    #[test]
    fn test_child_module_and_self_imports() {
        let location = location_of(
            "use models::User; use self::dto::Page;",
            "crate::api",
            &["models"],
        );
        assert_eq!(location.resolve_alias("User"), Some("crate::api::models::User"));
        assert_eq!(location.resolve_alias("Page"), Some("crate::api::dto::Page"));
    }

    #[test]
    fn test_canonicalize() {
        let seg = |s: &str| s.split("::").map(String::from).collect::<Vec<_>>();
        let none = HashSet::new();
        assert_eq!(
            canonicalize(&seg("super::super::x::Y"), "crate::a::b", &none),
            Some("crate::x::Y".to_string())
        );
        assert_eq!(canonicalize(&seg("super::Y"), "crate", &none), None);
        assert_eq!(
            canonicalize(&seg("crate::m::Y"), "billing::invoice", &none),
            Some("billing::m::Y".to_string())
        );
        assert_eq!(
            canonicalize(&seg("chrono::DateTime"), "crate::a", &none),
            Some("chrono::DateTime".to_string())
        );
    }

    #[test]
    fn test_module_path_for_file() {
        let root = Path::new("/work");
        assert_eq!(module_path_for_file(root, Path::new("/work/src/main.rs")), "crate");
        assert_eq!(
            module_path_for_file(root, Path::new("/work/src/models/user.rs")),
            "crate::models::user"
        );
        assert_eq!(
            module_path_for_file(root, Path::new("/work/src/models/mod.rs")),
            "crate::models"
        );
        assert_eq!(
            module_path_for_file(root, Path::new("/work/crates/billing-core/src/lib.rs")),
            "billing_core"
        );
        assert_eq!(
            module_path_for_file(root, Path::new("/work/handlers.rs")),
            "crate::handlers"
        );
    }

    #[test]
    fn test_locate_exact() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let file = write(root, "src/models/user.rs", "pub struct User;");
        let dir_module = write(root, "src/dto/mod.rs", "pub struct Page;");
        let member = write(root, "crates/billing-core/src/lib.rs", "pub struct Invoice;");

        let locator = TypeLocator::new(root);
        assert_eq!(locator.locate("crate::models::user"), vec![file]);
        assert_eq!(locator.locate("crate::dto"), vec![dir_module]);
        assert_eq!(locator.locate("billing_core"), vec![member]);
    }

    #[test]
    fn test_locate_conventional_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let file = write(root, "src/api/handlers/users.rs", "pub struct Query;");

        let locator = TypeLocator::new(root);
        assert_eq!(locator.locate("users"), vec![file]);
    }

    #[test]
    fn test_locate_bounded_search_requires_declaration() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "src/domain/mod.rs", "pub mod orders;\n");
        let declared = write(root, "src/domain/orders/mod.rs", "pub struct Order;");
        write(root, "src/legacy/orders.rs", "pub struct Order;");

        let locator = TypeLocator::new(root);
        assert_eq!(locator.locate("crate::shop::orders"), vec![declared]);
    }

    #[test]
    fn test_locate_workspace_crate() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(
            root,
            "crates/ledger/Cargo.toml",
            "[package]\nname = \"ledger\"\nversion = \"0.1.0\"\n",
        );
        let lib = write(root, "crates/ledger/src/lib.rs", "pub struct Entry;");

        let locator = TypeLocator::new(root);
        assert_eq!(locator.locate("ledger"), vec![lib]);
    }

    #[test]
    fn test_negative_results_are_cached() {
        let temp_dir = TempDir::new().unwrap();
        let locator = TypeLocator::new(temp_dir.path());
        assert!(locator.locate("crate::missing").is_empty());
        assert_eq!(locator.cached_lookups(), 1);
        assert!(locator.locate("std::collections").is_empty());
        assert_eq!(locator.cached_lookups(), 1);
    }

    #[test]
    fn test_declares_module() {
        let temp_dir = TempDir::new().unwrap();
        let file = write(
            temp_dir.path(),
            "lib.rs",
            "pub(crate) mod users;\nmod orders {\n}\n// mod ghosts;\n",
        );
        assert!(declares_module(&file, "users"));
        assert!(declares_module(&file, "orders"));
        assert!(!declares_module(&file, "ghosts"));
        assert!(!declares_module(&file, "user"));
    }
}
