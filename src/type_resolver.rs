//! Static source resolver.
//!
//! Builds [`TypeDescriptor`]s from Rust source text without compiling it. A declaration
//! is parsed with `syn`, its fields are walked structurally, and every named type they
//! mention becomes a deferred reference that is located (through the file's imports and
//! the [`TypeLocator`]) eagerly but expanded only when the schema compiler descends
//! into it.
//!
//! Only plain data is cached between calls: per-file scopes (module path, imports,
//! declared names) and located module files. Syntax trees are dropped after use.

use crate::descriptor::{
    DeferredType, FieldDescriptor, Kind, PrimitiveKind, TypeDescriptor, TypeRef, Variant,
};
use crate::error::{Error, Result};
use crate::locator::{canonicalize, is_external, module_path_for_file, ModuleLocation, TypeLocator};
use crate::metadata::{ContainerMetadata, FieldMetadata};
use crate::parser::{AstParser, ParsedFile};
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use syn::visit::Visit;
use syn::{Fields, GenericArgument, PathArguments, Type};

/// How many imports may be followed from one reference to its declaration
pub const MAX_IMPORT_HOPS: usize = 4;

/// Reason prefix of descriptors for names that could not be located
const UNRESOLVED: &str = "unresolved type";

type GenericEnv = HashMap<String, TypeRef>;

/// Plain-data summary of one source file
#[derive(Debug, Clone)]
pub struct FileScope {
    pub path: PathBuf,
    pub module_path: String,
    pub imports: ModuleLocation,
    /// Top-level structs, enums and type aliases
    pub declared: HashSet<String>,
    /// `mod` items of this file
    pub child_modules: HashSet<String>,
}

/// Collects the top level of a file; bodies of functions, impls and inline modules
/// are not entered
#[derive(Default)]
struct ScopeCollector<'ast> {
    uses: Vec<&'ast syn::ItemUse>,
    declared: HashSet<String>,
    child_modules: HashSet<String>,
}

impl<'ast> Visit<'ast> for ScopeCollector<'ast> {
    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.uses.push(node);
    }

    fn visit_item_struct(&mut self, node: &'ast syn::ItemStruct) {
        self.declared.insert(node.ident.to_string());
    }

    fn visit_item_enum(&mut self, node: &'ast syn::ItemEnum) {
        self.declared.insert(node.ident.to_string());
    }

    fn visit_item_type(&mut self, node: &'ast syn::ItemType) {
        self.declared.insert(node.ident.to_string());
    }

    fn visit_item_mod(&mut self, node: &'ast syn::ItemMod) {
        self.child_modules.insert(node.ident.to_string());
    }

    fn visit_item_fn(&mut self, _node: &'ast syn::ItemFn) {}

    fn visit_item_impl(&mut self, _node: &'ast syn::ItemImpl) {}

    fn visit_item_trait(&mut self, _node: &'ast syn::ItemTrait) {}
}

impl FileScope {
    fn collect(root: &Path, parsed: &ParsedFile) -> Self {
        let mut collector = ScopeCollector::default();
        collector.visit_file(&parsed.syntax_tree);

        let module_path = module_path_for_file(root, &parsed.path);
        let mut imports = ModuleLocation::new();
        for item in &collector.uses {
            imports.add_use(item, &module_path, &collector.child_modules);
        }

        debug!(
            "Scope of {} ({}): {} declarations, {} imports",
            parsed.path.display(),
            module_path,
            collector.declared.len(),
            imports.len()
        );

        Self {
            path: parsed.path.clone(),
            module_path,
            imports,
            declared: collector.declared,
            child_modules: collector.child_modules,
        }
    }
}

/// Where a named type is declared
#[derive(Debug, Clone, PartialEq)]
struct Declaration {
    file: PathBuf,
    module_path: String,
    name: String,
}

impl Declaration {
    fn in_scope(scope: &FileScope, name: &str) -> Self {
        Self {
            file: scope.path.clone(),
            module_path: scope.module_path.clone(),
            name: name.to_string(),
        }
    }

    /// Canonical identity, including type arguments when present
    fn identity(&self, args: &[TypeRef]) -> String {
        let base = format!("{}::{}", self.module_path, self.name);
        if args.is_empty() {
            base
        } else {
            let args: Vec<&str> = args.iter().map(TypeRef::identity).collect();
            format!("{}<{}>", base, args.join(", "))
        }
    }
}

struct ResolverState {
    root: PathBuf,
    locator: TypeLocator,
    scopes: RwLock<HashMap<PathBuf, Option<Arc<FileScope>>>>,
}

/// Static source resolver - resolves type declarations from Rust source text.
///
/// Cheap to clone; clones share caches.
#[derive(Clone)]
pub struct StaticResolver {
    state: Arc<ResolverState>,
}

/// Deferred reference to a located declaration
struct StaticRef {
    resolver: StaticResolver,
    declaration: Declaration,
    args: Vec<TypeRef>,
    identity: String,
}

impl StaticRef {
    fn new(resolver: &StaticResolver, declaration: Declaration, args: Vec<TypeRef>) -> TypeRef {
        let identity = declaration.identity(&args);
        TypeRef::deferred(StaticRef {
            resolver: resolver.clone(),
            declaration,
            args,
            identity,
        })
    }
}

impl DeferredType for StaticRef {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn resolve(&self) -> TypeDescriptor {
        match self.resolver.build(&self.declaration, &self.args) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!("Failed to resolve {}: {}", self.identity, e);
                TypeDescriptor::unsupported(self.identity.clone(), e.to_string())
            }
        }
    }
}

impl StaticResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!("Initializing StaticResolver at {}", root.display());
        Self {
            state: Arc::new(ResolverState {
                locator: TypeLocator::new(root.clone()),
                root,
                scopes: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.state.root
    }

    pub fn locator(&self) -> &TypeLocator {
        &self.state.locator
    }

    /// Resolve a type declared in `file`.
    ///
    /// Fails with a recoverable error when the file is missing, does not parse, or
    /// does not declare `type_name`.
    pub fn resolve_from_source(&self, file: &Path, type_name: &str) -> Result<TypeDescriptor> {
        debug!("Resolving {} from {}", type_name, file.display());
        let scope = self.scope(file)?;
        if !scope.declared.contains(type_name) {
            return Err(Error::NotFound(format!(
                "type `{}` is not declared in {}",
                type_name,
                file.display()
            )));
        }
        self.build(&Declaration::in_scope(&scope, type_name), &[])
    }

    /// Resolve a type expression (`User`, `models::User`, `Vec<Page<User>>`) as it
    /// would be understood inside `file`, following the file's imports.
    pub fn resolve_type_expr(&self, file: &Path, expr: &str) -> Result<TypeDescriptor> {
        let ty = AstParser::parse_type_expr(expr).map_err(|e| Error::ParseFailure {
            file: file.to_path_buf(),
            message: format!("{:#}", e),
        })?;
        let scope = self.scope(file)?;
        let descriptor = self.walk(&ty, &scope, &GenericEnv::new()).load();

        match &descriptor.kind {
            Kind::Unsupported(reason) if reason.starts_with(UNRESOLVED) => {
                Err(Error::NotFound(reason.clone()))
            }
            Kind::Unsupported(reason) => Err(Error::UnsupportedShape(reason.clone())),
            _ => Ok((*descriptor).clone()),
        }
    }

    /// Drop cached scopes and located modules
    pub fn clear_caches(&self) {
        self.state.scopes.write().clear();
        self.state.locator.clear();
    }

    fn parse(&self, file: &Path) -> Result<ParsedFile> {
        if !file.is_file() {
            return Err(Error::NotFound(format!(
                "source file {} does not exist",
                file.display()
            )));
        }
        AstParser::parse_file(file).map_err(|e| Error::ParseFailure {
            file: file.to_path_buf(),
            message: format!("{:#}", e),
        })
    }

    /// Scope summary of a file, parsed once and cached (failures included)
    pub fn scope(&self, file: &Path) -> Result<Arc<FileScope>> {
        if let Some(cached) = self.state.scopes.read().get(file) {
            return cached.clone().ok_or_else(|| Error::ParseFailure {
                file: file.to_path_buf(),
                message: "file could not be parsed".to_string(),
            });
        }

        let result = self
            .parse(file)
            .map(|parsed| Arc::new(FileScope::collect(&self.state.root, &parsed)));

        match &result {
            Ok(scope) => {
                self.state
                    .scopes
                    .write()
                    .insert(file.to_path_buf(), Some(Arc::clone(scope)));
            }
            Err(Error::ParseFailure { .. }) => {
                self.state.scopes.write().insert(file.to_path_buf(), None);
            }
            Err(_) => {}
        }
        result
    }

    /// Find the declaration a path refers to from inside `scope`
    fn lookup(&self, scope: &FileScope, segments: &[String]) -> Option<Declaration> {
        match segments {
            [] => None,
            [name] => {
                if scope.declared.contains(name) {
                    return Some(Declaration::in_scope(scope, name));
                }
                if let Some(target) = scope.imports.resolve_alias(name) {
                    return self.lookup_absolute(target, 0);
                }
                self.lookup_in_globs(scope, name)
            }
            [first, rest @ ..] => {
                let path = match scope.imports.resolve_alias(first) {
                    Some(target) => format!("{}::{}", target, rest.join("::")),
                    None => canonicalize(segments, &scope.module_path, &scope.child_modules)?,
                };
                self.lookup_absolute(&path, 0)
            }
        }
    }

    fn lookup_in_globs(&self, scope: &FileScope, name: &str) -> Option<Declaration> {
        scope
            .imports
            .globs()
            .iter()
            .find_map(|glob| self.lookup_absolute(&format!("{}::{}", glob, name), 0))
    }

    /// Find the declaration behind a canonical path, following re-exports
    fn lookup_absolute(&self, path: &str, hops: usize) -> Option<Declaration> {
        if hops > MAX_IMPORT_HOPS {
            warn!("Gave up following imports for {} after {} hops", path, hops);
            return None;
        }
        let (module, name) = path.rsplit_once("::")?;
        if is_external(module) {
            return None;
        }

        let scopes: Vec<Arc<FileScope>> = self
            .state
            .locator
            .locate(module)
            .iter()
            .filter_map(|file| match self.scope(file) {
                Ok(scope) => Some(scope),
                Err(e) => {
                    debug!("Skipping candidate {}: {}", file.display(), e);
                    None
                }
            })
            .collect();

        if let Some(scope) = scopes.iter().find(|s| s.declared.contains(name)) {
            return Some(Declaration::in_scope(scope, name));
        }

        for scope in &scopes {
            if let Some(target) = scope.imports.resolve_alias(name) {
                if target != path {
                    if let Some(found) = self.lookup_absolute(target, hops + 1) {
                        return Some(found);
                    }
                }
            }
            for glob in scope.imports.globs() {
                let candidate = format!("{}::{}", glob, name);
                if let Some(found) = self.lookup_absolute(&candidate, hops + 1) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Build the descriptor of a located declaration with the given type arguments
    fn build(&self, declaration: &Declaration, args: &[TypeRef]) -> Result<TypeDescriptor> {
        let parsed = self.parse(&declaration.file)?;
        let scope = self.scope(&declaration.file)?;
        let item = parsed.find_declaration(&declaration.name).ok_or_else(|| {
            Error::NotFound(format!(
                "type `{}` is not declared in {}",
                declaration.name,
                declaration.file.display()
            ))
        })?;
        let identity = declaration.identity(args);
        debug!("Building descriptor for {}", identity);

        let env_for = |generics: &syn::Generics| {
            let mut env = generic_env(generics, args);
            env.insert(
                "Self".to_string(),
                StaticRef::new(self, declaration.clone(), args.to_vec()),
            );
            env
        };

        let descriptor = match item {
            syn::Item::Struct(item) => {
                self.build_struct(item, identity, &scope, &env_for(&item.generics))
            }
            syn::Item::Enum(item) => {
                self.build_enum(item, identity, &scope, &env_for(&item.generics))
            }
            syn::Item::Type(item) => {
                let container = ContainerMetadata::from_attributes(&item.attrs);
                let env = env_for(&item.generics);
                TypeDescriptor::pointer(self.walk(&item.ty, &scope, &env))
                    .with_identity(identity)
                    .with_description(container.description)
            }
            _ => {
                return Err(Error::UnsupportedShape(format!(
                    "`{}` is not a data type",
                    declaration.name
                )))
            }
        };
        Ok(descriptor)
    }

    fn build_struct(
        &self,
        item: &syn::ItemStruct,
        identity: String,
        scope: &FileScope,
        env: &GenericEnv,
    ) -> TypeDescriptor {
        let container = ContainerMetadata::from_attributes(&item.attrs);
        let descriptor = match &item.fields {
            Fields::Named(named) => TypeDescriptor::record(
                identity,
                self.named_fields(named, scope, env),
                container.rename_all,
            ),
            Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                TypeDescriptor::pointer(self.walk(&unnamed.unnamed[0].ty, scope, env))
                    .with_identity(identity)
            }
            Fields::Unnamed(unnamed) => TypeDescriptor::unsupported(
                identity,
                format!("tuple struct with {} fields", unnamed.unnamed.len()),
            ),
            Fields::Unit => TypeDescriptor::unsupported(identity, "unit struct carries no data"),
        };
        descriptor.with_description(container.description)
    }

    fn build_enum(
        &self,
        item: &syn::ItemEnum,
        identity: String,
        scope: &FileScope,
        env: &GenericEnv,
    ) -> TypeDescriptor {
        let container = ContainerMetadata::from_attributes(&item.attrs);
        let mut variants = Vec::new();

        for variant in &item.variants {
            let metadata = FieldMetadata::from_attributes(&variant.attrs);
            if metadata.ignore {
                continue;
            }
            let declared = variant.ident.to_string();
            let name = match (&metadata.rename, container.rename_all) {
                (Some(rename), _) => rename.clone(),
                (None, Some(rule)) => rule.apply_to_variant(&declared),
                (None, None) => declared.clone(),
            };
            let variant_identity = format!("{}::{}", identity, declared);

            let payload = match &variant.fields {
                Fields::Unit => None,
                Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                    Some(self.walk(&unnamed.unnamed[0].ty, scope, env))
                }
                Fields::Unnamed(unnamed) => Some(TypeRef::ready(TypeDescriptor::unsupported(
                    variant_identity,
                    format!("tuple variant with {} fields", unnamed.unnamed.len()),
                ))),
                Fields::Named(named) => Some(TypeRef::ready(TypeDescriptor::record(
                    variant_identity,
                    self.named_fields(named, scope, env),
                    None,
                ))),
            };

            variants.push(match payload {
                Some(payload) => Variant::with_payload(name, payload),
                None => Variant::unit(name),
            });
        }

        TypeDescriptor::enumeration(identity, variants).with_description(container.description)
    }

    fn named_fields(
        &self,
        named: &syn::FieldsNamed,
        scope: &FileScope,
        env: &GenericEnv,
    ) -> Vec<FieldDescriptor> {
        named
            .named
            .iter()
            .filter_map(|field| {
                let ident = field.ident.as_ref()?.to_string();
                let name = ident.strip_prefix("r#").unwrap_or(&ident).to_string();
                let ty = self.walk(&field.ty, scope, env);
                let optional = is_optional(&ty);
                Some(
                    FieldDescriptor::new(name, ty)
                        .with_metadata(FieldMetadata::from_attributes(&field.attrs))
                        .optional(optional),
                )
            })
            .collect()
    }

    /// Walk a syntactic type into a reference
    fn walk(&self, ty: &Type, scope: &FileScope, env: &GenericEnv) -> TypeRef {
        match ty {
            Type::Path(type_path) if type_path.qself.is_none() => {
                self.walk_path(&type_path.path, scope, env)
            }
            Type::Reference(reference) => {
                TypeRef::ready(TypeDescriptor::pointer(self.walk(&reference.elem, scope, env)))
            }
            Type::Ptr(ptr) => TypeRef::ready(TypeDescriptor::pointer(self.walk(&ptr.elem, scope, env))),
            Type::Slice(slice) => {
                TypeRef::ready(TypeDescriptor::list(self.walk(&slice.elem, scope, env)))
            }
            Type::Array(array) => {
                TypeRef::ready(TypeDescriptor::list(self.walk(&array.elem, scope, env)))
            }
            Type::Paren(paren) => self.walk(&paren.elem, scope, env),
            Type::Group(group) => self.walk(&group.elem, scope, env),
            Type::Tuple(tuple) if tuple.elems.is_empty() => unsupported(ty, "unit type carries no data"),
            Type::Tuple(_) => unsupported(ty, "tuple"),
            Type::BareFn(_) => unsupported(ty, "function-typed value"),
            Type::TraitObject(_) | Type::ImplTrait(_) => unsupported(ty, "trait object"),
            Type::Path(_) => unsupported(ty, "qualified associated type"),
            _ => unsupported(ty, "unrecognized type syntax"),
        }
    }

    fn walk_path(&self, path: &syn::Path, scope: &FileScope, env: &GenericEnv) -> TypeRef {
        let Some(last) = path.segments.last() else {
            return TypeRef::ready(TypeDescriptor::unsupported("", "empty path"));
        };
        let name = last.ident.to_string();
        let args = type_args(last);
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();

        if segments.len() == 1 && args.is_empty() {
            if let Some(bound) = env.get(&name) {
                return bound.clone();
            }
        }

        let origin = if segments.len() == 1 {
            scope.imports.resolve_alias(&name).map(str::to_string)
        } else {
            Some(segments.join("::"))
        };
        let project_owned = (segments.len() == 1 && scope.declared.contains(&name))
            || origin.as_deref().is_some_and(|o| is_project_path(o, scope));

        if !project_owned {
            let walk_arg = |idx: usize| match args.get(idx) {
                Some(arg) => self.walk(arg, scope, env),
                None => TypeRef::ready(TypeDescriptor::dynamic("_")),
            };
            if let Some(known) = well_known(&name, origin.as_deref(), walk_arg) {
                // A project type pulled in by `use crate::dto::*` shadows the well-known one
                let glob_owned = segments.len() == 1
                    && origin.is_none()
                    && self.lookup_in_globs(scope, &name).is_some();
                if !glob_owned {
                    return known;
                }
                debug!("{} comes from a glob import in {}", name, scope.path.display());
            }
        }

        match self.lookup(scope, &segments) {
            Some(declaration) => {
                let args = args.iter().map(|a| self.walk(a, scope, env)).collect();
                StaticRef::new(self, declaration, args)
            }
            None => {
                let display = display_path(path);
                warn!("Could not resolve type: {} (in {})", display, scope.path.display());
                TypeRef::ready(TypeDescriptor::unsupported(
                    display.clone(),
                    format!("{} `{}`", UNRESOLVED, display),
                ))
            }
        }
    }
}

fn is_project_path(path: &str, scope: &FileScope) -> bool {
    let crate_name = scope.module_path.split("::").next().unwrap_or_default();
    path.starts_with("crate::") || path.split("::").next() == Some(crate_name)
}

fn is_optional(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Ready(descriptor) => matches!(descriptor.kind, Kind::Pointer { optional: true, .. }),
        TypeRef::Deferred(_) => false,
    }
}

fn generic_env(generics: &syn::Generics, args: &[TypeRef]) -> GenericEnv {
    generics
        .type_params()
        .enumerate()
        .map(|(idx, param)| {
            let name = param.ident.to_string();
            let bound = args
                .get(idx)
                .cloned()
                .unwrap_or_else(|| TypeRef::ready(TypeDescriptor::dynamic(name.clone())));
            (name, bound)
        })
        .collect()
}

/// Standard library, serde_json and common ecosystem types
///
/// Type arguments are walked through `arg` only for the shapes that use them.
fn well_known(name: &str, origin: Option<&str>, arg: impl Fn(usize) -> TypeRef) -> Option<TypeRef> {
    let from_serde_json = origin.is_some_and(|o| o.starts_with("serde_json::"));

    let descriptor = match name {
        "Option" => TypeDescriptor::optional(arg(0)),
        "Box" | "Rc" | "Arc" | "Cow" | "Cell" | "RefCell" | "Mutex" | "RwLock" => {
            TypeDescriptor::pointer(arg(0))
        }
        "Vec" | "VecDeque" | "LinkedList" | "BinaryHeap" | "HashSet" | "BTreeSet" | "IndexSet" => {
            TypeDescriptor::list(arg(0))
        }
        "HashMap" | "BTreeMap" | "IndexMap" => TypeDescriptor::map(arg(0), arg(1)),
        "String" | "str" => TypeDescriptor::primitive(name, PrimitiveKind::String),
        "char" => TypeDescriptor::primitive(name, PrimitiveKind::Char),
        "bool" => TypeDescriptor::primitive(name, PrimitiveKind::Boolean),
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => {
            TypeDescriptor::primitive(name, PrimitiveKind::Integer { unsigned: false })
        }
        "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => {
            TypeDescriptor::primitive(name, PrimitiveKind::Integer { unsigned: true })
        }
        "f32" | "f64" => TypeDescriptor::primitive(name, PrimitiveKind::Float),
        "Uuid" => TypeDescriptor::primitive(name, PrimitiveKind::Uuid),
        "DateTime" | "NaiveDateTime" | "SystemTime" | "OffsetDateTime" | "PrimitiveDateTime"
        | "Timestamp" => TypeDescriptor::primitive(name, PrimitiveKind::Instant),
        "NaiveDate" | "Date" => TypeDescriptor::primitive(name, PrimitiveKind::Date),
        "Value" if from_serde_json => TypeDescriptor::dynamic("serde_json::Value"),
        "Map" if from_serde_json => TypeDescriptor::map(
            TypeRef::ready(TypeDescriptor::primitive("String", PrimitiveKind::String)),
            TypeRef::ready(TypeDescriptor::dynamic("serde_json::Value")),
        ),
        _ => return None,
    };
    Some(TypeRef::ready(descriptor))
}

fn type_args(segment: &syn::PathSegment) -> Vec<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(angle) => angle
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn unsupported(ty: &Type, reason: &str) -> TypeRef {
    TypeRef::ready(TypeDescriptor::unsupported(display_type(ty), reason))
}

/// Readable rendering of a type, used for identities of unresolvable shapes
fn display_type(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) => display_path(&type_path.path),
        Type::Reference(reference) => format!("&{}", display_type(&reference.elem)),
        Type::Ptr(ptr) => format!("*{}", display_type(&ptr.elem)),
        Type::Slice(slice) => format!("[{}]", display_type(&slice.elem)),
        Type::Array(array) => format!("[{}; _]", display_type(&array.elem)),
        Type::Paren(paren) => display_type(&paren.elem),
        Type::Group(group) => display_type(&group.elem),
        Type::Tuple(tuple) => format!("({})", join_types(tuple.elems.iter())),
        Type::BareFn(bare_fn) => format!("fn({})", join_types(bare_fn.inputs.iter().map(|a| &a.ty))),
        Type::TraitObject(object) => {
            let bound = object.bounds.iter().find_map(|b| match b {
                syn::TypeParamBound::Trait(t) => Some(display_path(&t.path)),
                _ => None,
            });
            format!("dyn {}", bound.unwrap_or_default())
        }
        Type::ImplTrait(_) => "impl Trait".to_string(),
        Type::Never(_) => "!".to_string(),
        _ => "_".to_string(),
    }
}

fn display_path(path: &syn::Path) -> String {
    path.segments
        .iter()
        .map(|segment| {
            let args = type_args(segment);
            if args.is_empty() {
                segment.ident.to_string()
            } else {
                format!("{}<{}>", segment.ident, join_types(args.into_iter()))
            }
        })
        .collect::<Vec<_>>()
        .join("::")
}

fn join_types<'a>(types: impl Iterator<Item = &'a Type>) -> String {
    types.map(display_type).collect::<Vec<_>>().join(", ")
}
