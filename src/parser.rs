use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use syn::{Item, Type};

/// Turns Rust source text into `syn` trees for the static resolver.
///
/// Trees are short-lived: the resolver reads the declaration it needs, converts it into
/// a [`TypeDescriptor`](crate::descriptor::TypeDescriptor) and drops the tree. `syn`
/// trees are not `Send`, so they never end up in shared caches.
///
/// ```no_run
/// use handler_schema::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/models.rs")).unwrap();
/// assert!(parsed.find_declaration("User").is_some());
/// ```
pub struct AstParser;

/// A parsed source file
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub syntax_tree: syn::File,
}

impl ParsedFile {
    /// Top-level struct, enum or type alias named `name`.
    ///
    /// Items inside inline modules and function bodies are not visible here.
    pub fn find_declaration(&self, name: &str) -> Option<&Item> {
        self.syntax_tree.items.iter().find(|item| match item {
            Item::Struct(s) => s.ident == name,
            Item::Enum(e) => e.ident == name,
            Item::Type(t) => t.ident == name,
            _ => false,
        })
    }
}

impl AstParser {
    /// Read and parse a source file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid Rust.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file: {}", path.display()))?;
        Self::parse_source(path, &content)
    }

    /// Parse source text that claims to come from `path`
    pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content)
            .with_context(|| format!("Invalid Rust syntax in {}", path.display()))?;
        debug!(
            "Parsed {} ({} top-level items)",
            path.display(),
            syntax_tree.items.len()
        );
        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }

    /// Parse a type expression such as `Vec<models::User>`
    pub fn parse_type_expr(expr: &str) -> Result<Type> {
        syn::parse_str::<Type>(expr)
            .with_context(|| format!("Invalid type expression `{}`", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MODELS: &str = r#"
        use crate::shared::Audit;

        /// A registered account
        #[derive(Serialize)]
        pub struct User<T = ()> { pub id: u64, pub extra: T }
        pub enum Role { Admin, Member }
        pub type Users = Vec<User>;
        pub fn User() {}
        impl User { fn Hidden() {} }
        mod inner {
            pub struct Hidden;
        }
    "#;

    #[test]
    fn test_parse_file_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("models.rs");
        fs::write(&path, MODELS).unwrap();

        let parsed = AstParser::parse_file(&path).unwrap();
        assert_eq!(parsed.path, path);
        assert_eq!(parsed.syntax_tree.items.len(), 7);
    }

    #[test]
    fn test_find_declaration() {
        let parsed = AstParser::parse_source(Path::new("models.rs"), MODELS).unwrap();

        assert!(matches!(parsed.find_declaration("User"), Some(Item::Struct(_))));
        assert!(matches!(parsed.find_declaration("Role"), Some(Item::Enum(_))));
        assert!(matches!(parsed.find_declaration("Users"), Some(Item::Type(_))));
        assert!(parsed.find_declaration("Hidden").is_none());
        assert!(parsed.find_declaration("Audit").is_none());
    }

    #[test]
    fn test_errors_name_the_file() {
        let err = AstParser::parse_source(Path::new("src/broken.rs"), "pub struct User {")
            .unwrap_err()
            .to_string();
        assert!(err.contains("Invalid Rust syntax in src/broken.rs"));

        let err = AstParser::parse_file(Path::new("/nonexistent/file.rs"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Failed to read source file"));
    }

    #[test]
    fn test_parse_type_expr() {
        assert!(matches!(
            AstParser::parse_type_expr("Vec<models::User>").unwrap(),
            Type::Path(_)
        ));
        assert!(matches!(
            AstParser::parse_type_expr("&[u8]").unwrap(),
            Type::Reference(_)
        ));
        assert!(AstParser::parse_type_expr("Vec<").is_err());
    }
}
