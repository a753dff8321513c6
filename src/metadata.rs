//! Field metadata extraction.
//!
//! Per-field annotations arrive in two representations: `syn::Attribute`s when a
//! declaration is read from source text, and attribute-syntax tag strings
//! (`"validate(length(min = 1), email)"`) when a live type describes itself. Both are
//! normalized into `syn::Meta` and folded into a [`FieldMetadata`].
//!
//! Recognized namespaces:
//!
//! - `serde`: `rename`, `skip`, `skip_serializing`, `skip_deserializing`,
//!   `skip_serializing_if`, `default`, `flatten`, and the container-level `rename_all`
//! - `validate`: `required`, `email`, `url`, `length(min, max, equal)`,
//!   `range(min, max)`, `regex`, `pattern`, `one_of`
//! - `schema`: `rename`, `ignore`, `required`, `optional`, `format`, `pattern`,
//!   `example`, `description`, `one_of`, `min_length`, `max_length`, `minimum`, `maximum`
//! - `doc`: doc comments become descriptions
//!
//! Unknown keys are skipped so that one unfamiliar option does not hide the others.

use crate::schema::{SchemaNode, SchemaType};
use log::{debug, warn};
use serde_json::Value;
use syn::meta::ParseNestedMeta;
use syn::{Expr, ExprLit, Lit, Meta, UnOp};

/// How the compiler decides which properties are required
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequiredPolicy {
    /// Only fields carrying an explicit `required` tag
    #[default]
    Tagged,
    /// Every field that is neither `Option<T>` nor marked omit-if-empty
    NonOptional,
}

/// Container-level casing rule, as understood by `serde(rename_all = "...")`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "lowercase" => Some(RenameRule::Lower),
            "UPPERCASE" => Some(RenameRule::Upper),
            "PascalCase" => Some(RenameRule::Pascal),
            "camelCase" => Some(RenameRule::Camel),
            "snake_case" => Some(RenameRule::Snake),
            "SCREAMING_SNAKE_CASE" => Some(RenameRule::ScreamingSnake),
            "kebab-case" => Some(RenameRule::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(RenameRule::ScreamingKebab),
            _ => None,
        }
    }

    /// Apply the rule to a field name
    pub fn apply_to_field(&self, name: &str) -> String {
        let snake = to_snake_case(name);
        let words = snake.split('_').filter(|w| !w.is_empty());
        match self {
            RenameRule::Lower | RenameRule::Snake => snake,
            RenameRule::Upper | RenameRule::ScreamingSnake => snake.to_ascii_uppercase(),
            RenameRule::Kebab => snake.replace('_', "-"),
            RenameRule::ScreamingKebab => snake.replace('_', "-").to_ascii_uppercase(),
            RenameRule::Pascal => words.map(capitalize).collect(),
            RenameRule::Camel => {
                let mut out = String::new();
                for (i, word) in words.enumerate() {
                    if i == 0 {
                        out.push_str(word);
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
        }
    }

    /// Apply the rule to an enum variant name (declared in PascalCase)
    pub fn apply_to_variant(&self, name: &str) -> String {
        match self {
            RenameRule::Lower => name.to_ascii_lowercase(),
            RenameRule::Upper => name.to_ascii_uppercase(),
            RenameRule::Pascal => name.to_string(),
            _ => self.apply_to_field(name),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase-with-underscores form of an identifier.
///
/// `ID` -> `id`, `UserName` -> `user_name`, `HTTPServer` -> `http_server`,
/// `user_id` is left untouched.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                let boundary = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower);
                if boundary && !out.ends_with('_') {
                    out.push('_');
                }
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

/// Annotations of a single field (or enum variant)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMetadata {
    /// Explicit external name
    pub rename: Option<String>,
    /// Excluded from the schema entirely
    pub ignore: bool,
    /// Omitted when empty / defaulted; never required
    pub omit_empty: bool,
    /// Properties of the nested record are merged into the parent
    pub flatten: bool,
    /// Explicitly mandatory
    pub required: bool,
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub enum_values: Option<Vec<String>>,
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl FieldMetadata {
    /// Extract metadata from source attributes
    pub fn from_attributes(attrs: &[syn::Attribute]) -> Self {
        let mut metadata = Self::default();
        let mut docs = Vec::new();
        for attr in attrs {
            metadata.absorb(&attr.meta, &mut docs);
        }
        metadata.finish_docs(docs);
        metadata
    }

    /// Extract metadata from attribute-syntax tag strings, e.g. `serde(rename = "id")`
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut metadata = Self::default();
        let mut docs = Vec::new();
        for tag in tags {
            let tag = tag.as_ref();
            match syn::parse_str::<Meta>(tag) {
                Ok(meta) => metadata.absorb(&meta, &mut docs),
                Err(e) => warn!("Ignoring malformed field tag `{}`: {}", tag, e),
            }
        }
        metadata.finish_docs(docs);
        metadata
    }

    fn finish_docs(&mut self, docs: Vec<String>) {
        if self.description.is_none() {
            self.description = join_docs(docs);
        }
    }

    fn absorb(&mut self, meta: &Meta, docs: &mut Vec<String>) {
        let path = meta.path();
        if path.is_ident("doc") {
            if let Some(line) = doc_line(meta) {
                docs.push(line);
            }
            return;
        }

        let Meta::List(list) = meta else {
            return;
        };

        let result = if path.is_ident("serde") {
            list.parse_nested_meta(|item| self.serde_item(&item))
        } else if path.is_ident("validate") {
            list.parse_nested_meta(|item| self.validate_item(&item))
        } else if path.is_ident("schema") {
            list.parse_nested_meta(|item| self.schema_item(&item))
        } else {
            Ok(())
        };

        if let Err(e) = result {
            debug!("Partially parsed field attribute: {}", e);
        }
    }

    fn serde_item(&mut self, item: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if item.path.is_ident("rename") {
            if let Some(name) = string_or_serialize(item)? {
                self.rename = Some(name);
            }
        } else if item.path.is_ident("skip") {
            self.ignore = true;
        } else if item.path.is_ident("skip_serializing_if")
            || item.path.is_ident("default")
        {
            self.omit_empty = true;
            skip_value(item)?;
        } else if item.path.is_ident("skip_serializing") || item.path.is_ident("skip_deserializing")
        {
            self.omit_empty = true;
        } else if item.path.is_ident("flatten") {
            self.flatten = true;
        } else {
            skip_value(item)?;
        }
        Ok(())
    }

    fn validate_item(&mut self, item: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if item.path.is_ident("required") {
            self.required = true;
        } else if item.path.is_ident("email") {
            self.format = Some("email".to_string());
            skip_value(item)?;
        } else if item.path.is_ident("url") {
            self.format = Some("uri".to_string());
            skip_value(item)?;
        } else if item.path.is_ident("length") {
            item.parse_nested_meta(|nested| {
                if nested.path.is_ident("min") {
                    self.min_length = Some(length_value(&nested)?);
                } else if nested.path.is_ident("max") {
                    self.max_length = Some(length_value(&nested)?);
                } else if nested.path.is_ident("equal") {
                    let n = length_value(&nested)?;
                    self.min_length = Some(n);
                    self.max_length = Some(n);
                } else {
                    skip_value(&nested)?;
                }
                Ok(())
            })?;
        } else if item.path.is_ident("range") {
            item.parse_nested_meta(|nested| {
                if nested.path.is_ident("min") {
                    self.minimum = Some(number_value(&nested)?);
                } else if nested.path.is_ident("max") {
                    self.maximum = Some(number_value(&nested)?);
                } else {
                    skip_value(&nested)?;
                }
                Ok(())
            })?;
        } else if item.path.is_ident("regex") || item.path.is_ident("pattern") {
            // `regex(path = ...)` points at a static, which cannot be read from here
            if item.input.peek(syn::Token![=]) {
                self.pattern = Some(string_value(item)?);
            } else {
                skip_value(item)?;
            }
        } else if item.path.is_ident("one_of") {
            self.enum_values = Some(split_list(&string_value(item)?));
        } else {
            skip_value(item)?;
        }
        Ok(())
    }

    fn schema_item(&mut self, item: &ParseNestedMeta<'_>) -> syn::Result<()> {
        if item.path.is_ident("rename") {
            self.rename = Some(string_value(item)?);
        } else if item.path.is_ident("ignore") || item.path.is_ident("skip") {
            self.ignore = true;
        } else if item.path.is_ident("required") {
            self.required = true;
        } else if item.path.is_ident("optional") {
            self.omit_empty = true;
        } else if item.path.is_ident("format") {
            self.format = Some(string_value(item)?);
        } else if item.path.is_ident("pattern") {
            self.pattern = Some(string_value(item)?);
        } else if item.path.is_ident("description") {
            self.description = Some(string_value(item)?);
        } else if item.path.is_ident("example") {
            self.example = Some(example_value(item)?);
        } else if item.path.is_ident("one_of") {
            self.enum_values = Some(split_list(&string_value(item)?));
        } else if item.path.is_ident("min_length") {
            self.min_length = Some(length_value(item)?);
        } else if item.path.is_ident("max_length") {
            self.max_length = Some(length_value(item)?);
        } else if item.path.is_ident("minimum") {
            self.minimum = Some(number_value(item)?);
        } else if item.path.is_ident("maximum") {
            self.maximum = Some(number_value(item)?);
        } else {
            skip_value(item)?;
        }
        Ok(())
    }

    /// Externally visible property name.
    ///
    /// An explicit rename always wins; otherwise the container rule, otherwise the
    /// snake_case form of the declared name.
    pub fn external_name(&self, declared: &str, rename_all: Option<RenameRule>) -> String {
        if let Some(name) = &self.rename {
            return name.clone();
        }
        match rename_all {
            Some(rule) => rule.apply_to_field(declared),
            None => to_snake_case(declared),
        }
    }

    /// Whether the property belongs in the parent's `required` list.
    ///
    /// Omission and optional markers take precedence over a `required` tag.
    pub fn is_required(&self, declared_optional: bool, policy: RequiredPolicy) -> bool {
        if self.omit_empty || declared_optional {
            return false;
        }
        match policy {
            RequiredPolicy::Tagged => self.required,
            RequiredPolicy::NonOptional => true,
        }
    }

    /// Copy validation constraints onto a compiled property node
    pub fn apply_constraints(&self, node: &mut SchemaNode) {
        if let Some(format) = &self.format {
            node.format = Some(format.clone());
        }
        if let Some(pattern) = &self.pattern {
            node.pattern = Some(pattern.clone());
        }
        if self.minimum.is_some() {
            node.minimum = self.minimum;
        }
        if self.maximum.is_some() {
            node.maximum = self.maximum;
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            if node.schema_type == Some(SchemaType::String) {
                node.min_length = self.min_length.or(node.min_length);
                node.max_length = self.max_length.or(node.max_length);
            } else {
                debug!("Length bounds ignored on non-string property");
            }
        }
        if let Some(values) = &self.enum_values {
            let numeric = matches!(
                node.schema_type,
                Some(SchemaType::Integer) | Some(SchemaType::Number)
            );
            node.enum_values = Some(
                values
                    .iter()
                    .map(|v| {
                        if numeric {
                            serde_json::from_str::<Value>(v)
                                .unwrap_or_else(|_| Value::String(v.clone()))
                        } else {
                            Value::String(v.clone())
                        }
                    })
                    .collect(),
            );
        }
        if let Some(description) = &self.description {
            if !node.is_guard_placeholder() {
                node.description = Some(description.clone());
            }
        }
        if let Some(example) = &self.example {
            node.example = Some(example.clone());
        }
    }
}

/// Annotations of a record or enum declaration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerMetadata {
    pub rename_all: Option<RenameRule>,
    pub description: Option<String>,
}

impl ContainerMetadata {
    pub fn from_attributes(attrs: &[syn::Attribute]) -> Self {
        let metas: Vec<&Meta> = attrs.iter().map(|a| &a.meta).collect();
        Self::from_metas(&metas)
    }

    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let parsed: Vec<Meta> = tags
            .iter()
            .filter_map(|tag| match syn::parse_str::<Meta>(tag.as_ref()) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!("Ignoring malformed container tag `{}`: {}", tag.as_ref(), e);
                    None
                }
            })
            .collect();
        let metas: Vec<&Meta> = parsed.iter().collect();
        Self::from_metas(&metas)
    }

    fn from_metas(metas: &[&Meta]) -> Self {
        let mut container = Self::default();
        let mut docs = Vec::new();

        for meta in metas {
            if meta.path().is_ident("doc") {
                if let Some(line) = doc_line(meta) {
                    docs.push(line);
                }
                continue;
            }
            if !meta.path().is_ident("serde") {
                continue;
            }
            if let Meta::List(list) = meta {
                let result = list.parse_nested_meta(|item| {
                    if item.path.is_ident("rename_all") {
                        if let Some(rule) = string_or_serialize(&item)? {
                            container.rename_all = RenameRule::parse(&rule);
                            if container.rename_all.is_none() {
                                warn!("Unknown rename_all rule: {}", rule);
                            }
                        }
                    } else {
                        skip_value(&item)?;
                    }
                    Ok(())
                });
                if let Err(e) = result {
                    debug!("Partially parsed container attribute: {}", e);
                }
            }
        }

        container.description = join_docs(docs);
        container
    }
}

fn doc_line(meta: &Meta) -> Option<String> {
    if let Meta::NameValue(nv) = meta {
        if let Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) = &nv.value
        {
            return Some(s.value().trim().to_string());
        }
    }
    None
}

fn join_docs(docs: Vec<String>) -> Option<String> {
    let text = docs
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Consume whatever follows an unrecognized key
fn skip_value(item: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if item.input.peek(syn::Token![=]) {
        item.value()?.parse::<Expr>()?;
    } else if item.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in item.input);
        content.step(|cursor| {
            let mut rest = *cursor;
            while let Some((_, next)) = rest.token_tree() {
                rest = next;
            }
            Ok(((), rest))
        })?;
    }
    Ok(())
}

fn string_value(item: &ParseNestedMeta<'_>) -> syn::Result<String> {
    let lit: syn::LitStr = item.value()?.parse()?;
    Ok(lit.value())
}

/// `key = "x"` or `key(serialize = "x", deserialize = "y")`, preferring the serialize side
fn string_or_serialize(item: &ParseNestedMeta<'_>) -> syn::Result<Option<String>> {
    if item.input.peek(syn::Token![=]) {
        return string_value(item).map(Some);
    }
    let mut found = None;
    item.parse_nested_meta(|nested| {
        if nested.path.is_ident("serialize") {
            found = Some(string_value(&nested)?);
        } else if nested.path.is_ident("deserialize") {
            let value = string_value(&nested)?;
            found.get_or_insert(value);
        } else {
            skip_value(&nested)?;
        }
        Ok(())
    })?;
    Ok(found)
}

fn number_value(item: &ParseNestedMeta<'_>) -> syn::Result<f64> {
    let expr: Expr = item.value()?.parse()?;
    expr_number(&expr).ok_or_else(|| item.error("expected a numeric literal"))
}

fn length_value(item: &ParseNestedMeta<'_>) -> syn::Result<u64> {
    let n = number_value(item)?;
    if n < 0.0 {
        return Err(item.error("length bounds must be non-negative"));
    }
    Ok(n as u64)
}

fn example_value(item: &ParseNestedMeta<'_>) -> syn::Result<Value> {
    let expr: Expr = item.value()?.parse()?;
    if let Expr::Lit(ExprLit { lit, .. }) = &expr {
        match lit {
            Lit::Str(s) => {
                let raw = s.value();
                return Ok(serde_json::from_str(&raw).unwrap_or(Value::String(raw)));
            }
            Lit::Bool(b) => return Ok(Value::Bool(b.value)),
            _ => {}
        }
    }
    expr_number(&expr)
        .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
        .ok_or_else(|| item.error("unsupported example literal"))
}

fn expr_number(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Int(i) => i.base10_parse::<f64>().ok(),
            Lit::Float(f) => f.base10_parse::<f64>().ok(),
            Lit::Str(s) => s.value().trim().parse().ok(),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
            expr_number(&unary.expr).map(|v| -v)
        }
        Expr::Paren(paren) => expr_number(&paren.expr),
        Expr::Group(group) => expr_number(&group.expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_attrs(code: &str) -> Vec<syn::Attribute> {
        let item: syn::ItemStruct = syn::parse_str(code).unwrap();
        match item.fields {
            syn::Fields::Named(named) => named.named.into_iter().next().unwrap().attrs,
            _ => panic!("expected named fields"),
        }
    }

    #[test]
    fn test_snake_case_fallback() {
        assert_eq!(to_snake_case("ID"), "id");
        assert_eq!(to_snake_case("Name"), "name");
        assert_eq!(to_snake_case("UserName"), "user_name");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("userID"), "user_id");
        assert_eq!(to_snake_case("created_at"), "created_at");
        assert_eq!(to_snake_case("Address2Line"), "address2_line");
    }

    #[test]
    fn test_rename_rules() {
        assert_eq!(RenameRule::Camel.apply_to_field("user_name"), "userName");
        assert_eq!(RenameRule::Pascal.apply_to_field("user_name"), "UserName");
        assert_eq!(RenameRule::Kebab.apply_to_field("user_name"), "user-name");
        assert_eq!(
            RenameRule::ScreamingSnake.apply_to_field("user_name"),
            "USER_NAME"
        );
        assert_eq!(RenameRule::Snake.apply_to_variant("InProgress"), "in_progress");
        assert_eq!(RenameRule::Lower.apply_to_variant("InProgress"), "inprogress");
        assert_eq!(RenameRule::parse("camelCase"), Some(RenameRule::Camel));
        assert_eq!(RenameRule::parse("Title Case"), None);
    }

    #[test]
    fn test_serde_attributes() {
        let attrs = field_attrs(
            r#"struct S {
                #[serde(rename = "userName", skip_serializing_if = "Option::is_none")]
                name: Option<String>,
            }"#,
        );
        let md = FieldMetadata::from_attributes(&attrs);
        assert_eq!(md.rename.as_deref(), Some("userName"));
        assert!(md.omit_empty);
        assert!(!md.ignore);
    }

    #[test]
    fn test_serde_skip_and_flatten() {
        let skip = FieldMetadata::from_tags(&["serde(skip)"]);
        assert!(skip.ignore);
        let flatten = FieldMetadata::from_tags(&["serde(flatten)"]);
        assert!(flatten.flatten);
        let default = FieldMetadata::from_tags(&["serde(default = \"defaults::page\")"]);
        assert!(default.omit_empty);
    }

    #[test]
    fn test_validate_attributes() {
        let attrs = field_attrs(
            r#"struct S {
                #[validate(required, length(min = 3, max = 50), email)]
                #[validate(range(min = -1, max = 10.5), custom(function = "check"))]
                email: String,
            }"#,
        );
        let md = FieldMetadata::from_attributes(&attrs);
        assert!(md.required);
        assert_eq!(md.min_length, Some(3));
        assert_eq!(md.max_length, Some(50));
        assert_eq!(md.format.as_deref(), Some("email"));
        assert_eq!(md.minimum, Some(-1.0));
        assert_eq!(md.maximum, Some(10.5));
    }

    #[test]
    fn test_unknown_keys_do_not_hide_known_ones() {
        let md = FieldMetadata::from_tags(&[
            "validate(contains(pattern = \"x\"), required, nested, one_of = \"draft, published\")",
        ]);
        assert!(md.required);
        assert_eq!(
            md.enum_values,
            Some(vec!["draft".to_string(), "published".to_string()])
        );
    }

    #[test]
    fn test_schema_namespace() {
        let md = FieldMetadata::from_tags(&[
            r#"schema(format = "date", example = "2024-01-01", description = "Birthday")"#,
            "schema(optional, min_length = 1)",
        ]);
        assert_eq!(md.format.as_deref(), Some("date"));
        assert_eq!(md.example, Some(Value::String("2024-01-01".to_string())));
        assert_eq!(md.description.as_deref(), Some("Birthday"));
        assert!(md.omit_empty);
        assert_eq!(md.min_length, Some(1));
    }

    #[test]
    fn test_doc_comments_become_description() {
        let attrs = field_attrs(
            r#"struct S {
                /// Display name
                /// shown in the UI.
                name: String,
            }"#,
        );
        let md = FieldMetadata::from_attributes(&attrs);
        assert_eq!(md.description.as_deref(), Some("Display name shown in the UI."));
    }

    #[test]
    fn test_malformed_tag_is_ignored() {
        let md = FieldMetadata::from_tags(&["validate(required", "schema(required)"]);
        assert!(md.required);
    }

    #[test]
    fn test_override_wins_over_casing() {
        let md = FieldMetadata {
            rename: Some("ident".to_string()),
            ..Default::default()
        };
        assert_eq!(md.external_name("ID", None), "ident");
        assert_eq!(md.external_name("ID", Some(RenameRule::Camel)), "ident");

        let plain = FieldMetadata::default();
        assert_eq!(plain.external_name("ID", None), "id");
        assert_eq!(
            plain.external_name("created_at", Some(RenameRule::Camel)),
            "createdAt"
        );
    }

    #[test]
    fn test_optional_markers_beat_required() {
        let md = FieldMetadata::from_tags(&[
            "validate(required)",
            "serde(skip_serializing_if = \"String::is_empty\")",
        ]);
        assert!(!md.is_required(false, RequiredPolicy::Tagged));

        let tagged = FieldMetadata::from_tags(&["validate(required)"]);
        assert!(tagged.is_required(false, RequiredPolicy::Tagged));
        assert!(!tagged.is_required(true, RequiredPolicy::Tagged));

        let plain = FieldMetadata::default();
        assert!(!plain.is_required(false, RequiredPolicy::Tagged));
        assert!(plain.is_required(false, RequiredPolicy::NonOptional));
    }

    #[test]
    fn test_container_rename_all() {
        let item: syn::ItemStruct = syn::parse_str(
            r#"
            /// A user account.
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase", deny_unknown_fields)]
            struct User { user_name: String }
            "#,
        )
        .unwrap();
        let container = ContainerMetadata::from_attributes(&item.attrs);
        assert_eq!(container.rename_all, Some(RenameRule::Camel));
        assert_eq!(container.description.as_deref(), Some("A user account."));
    }

    #[test]
    fn test_apply_constraints() {
        let md = FieldMetadata::from_tags(&[
            "validate(length(min = 2, max = 8), regex = \"^[a-z]+$\")",
            "schema(one_of = \"a, b\")",
        ]);
        let mut node = SchemaNode::of_type(SchemaType::String);
        md.apply_constraints(&mut node);
        assert_eq!(node.min_length, Some(2));
        assert_eq!(node.max_length, Some(8));
        assert_eq!(node.pattern.as_deref(), Some("^[a-z]+$"));
        assert_eq!(
            node.enum_values,
            Some(vec![Value::String("a".into()), Value::String("b".into())])
        );

        let mut array = SchemaNode::array(SchemaNode::of_type(SchemaType::String));
        md.apply_constraints(&mut array);
        assert_eq!(array.min_length, None);
    }

    #[test]
    fn test_numeric_enum_values() {
        let md = FieldMetadata::from_tags(&["schema(one_of = \"1 2 3\")"]);
        let mut node = SchemaNode::of_type(SchemaType::Integer);
        md.apply_constraints(&mut node);
        assert_eq!(
            node.enum_values,
            Some(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
    }
}
