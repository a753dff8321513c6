use crate::cache::SchemaCache;
use crate::descriptor::{FieldDescriptor, Kind, PrimitiveKind, TypeDescriptor, TypeRef, Variant};
use crate::metadata::{RenameRule, RequiredPolicy};
use crate::schema::{SchemaNode, SchemaType};
use log::{debug, warn};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Recursion bound for one top-level compilation
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Call-scoped state of one top-level compilation
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Identities currently being expanded
    pub visited: HashSet<String>,
    /// Module of the record being expanded, when known
    pub current_module_path: Option<String>,
    /// Root of the source tree, for diagnostics
    pub root_search_path: PathBuf,
    pub depth: usize,
    pub max_depth: usize,
    /// Number of times a cycle or depth guard fired
    guard_hits: usize,
}

impl ResolutionContext {
    pub fn new(root_search_path: impl Into<PathBuf>) -> Self {
        Self {
            visited: HashSet::new(),
            current_module_path: None,
            root_search_path: root_search_path.into(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            guard_hits: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether any guard fired so far in this compilation
    pub fn was_truncated(&self) -> bool {
        self.guard_hits > 0
    }
}

/// Schema compiler - turns type descriptors into schema nodes
pub struct SchemaCompiler {
    cache: Arc<SchemaCache>,
    required_policy: RequiredPolicy,
}

impl SchemaCompiler {
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        debug!("Initializing SchemaCompiler");
        Self {
            cache,
            required_policy: RequiredPolicy::default(),
        }
    }

    pub fn with_required_policy(mut self, policy: RequiredPolicy) -> Self {
        self.required_policy = policy;
        self
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Compile a descriptor
    pub fn compile(&self, descriptor: &TypeDescriptor, ctx: &mut ResolutionContext) -> SchemaNode {
        if let Some(node) = self.guard(&descriptor.identity, ctx) {
            return node;
        }
        self.expand(descriptor, ctx)
    }

    /// Compile a nested reference, consulting the guards before resolving it
    pub fn compile_ref(&self, ty: &TypeRef, ctx: &mut ResolutionContext) -> SchemaNode {
        if let Some(node) = self.guard(ty.identity(), ctx) {
            return node;
        }
        let descriptor = ty.load();
        self.expand(&descriptor, ctx)
    }

    /// Required sets differ per policy, so non-default policies get their own entries
    fn cache_key<'a>(&self, identity: &'a str) -> Cow<'a, str> {
        match self.required_policy {
            RequiredPolicy::Tagged => Cow::Borrowed(identity),
            RequiredPolicy::NonOptional => Cow::Owned(format!("{}@non_optional", identity)),
        }
    }

    fn guard(&self, identity: &str, ctx: &mut ResolutionContext) -> Option<SchemaNode> {
        if let Some(cached) = self.cache.get(&self.cache_key(identity)) {
            debug!("Schema for {} found in cache", identity);
            return Some(cached);
        }
        if ctx.visited.contains(identity) {
            warn!("Circular reference detected for type: {}", identity);
            ctx.guard_hits += 1;
            return Some(SchemaNode::circular_reference(identity));
        }
        if ctx.depth >= ctx.max_depth {
            warn!(
                "Max depth {} reached at {} (module {:?})",
                ctx.max_depth, identity, ctx.current_module_path
            );
            ctx.guard_hits += 1;
            return Some(SchemaNode::max_depth_reached());
        }
        None
    }

    fn expand(&self, descriptor: &TypeDescriptor, ctx: &mut ResolutionContext) -> SchemaNode {
        let identity = descriptor.identity.as_str();
        debug!("Compiling schema for: {} (depth {})", identity, ctx.depth);

        ctx.visited.insert(identity.to_string());
        ctx.depth += 1;
        let hits_before = ctx.guard_hits;
        let outer_module = match (&descriptor.kind, descriptor.module_path()) {
            (Kind::Record { .. }, Some(module)) => {
                ctx.current_module_path.replace(module.to_string())
            }
            _ => ctx.current_module_path.clone(),
        };

        let mut node = match &descriptor.kind {
            Kind::Primitive(kind) => Self::compile_primitive(*kind),
            Kind::Record { fields, rename_all } => self.compile_record(fields, *rename_all, ctx),
            Kind::List(element) => SchemaNode::array(self.compile_ref(element, ctx)),
            Kind::Map { key, value } => self.compile_map(key, value, ctx),
            Kind::Pointer { target, .. } => self.compile_ref(target, ctx),
            Kind::Enum(variants) => self.compile_enum(variants, ctx),
            Kind::Dynamic => SchemaNode::dynamic(),
            Kind::Unsupported(reason) => {
                debug!("Unsupported shape for {}: {}", identity, reason);
                SchemaNode::annotated_object(format!("unsupported type: {}", reason))
            }
        };

        if let Some(description) = &descriptor.description {
            if node.description.is_none() {
                node.description = Some(description.clone());
            }
        }

        ctx.current_module_path = outer_module;
        ctx.depth -= 1;
        ctx.visited.remove(identity);

        // A guard inside this expansion makes the result depend on the call path.
        if ctx.guard_hits == hits_before {
            self.cache.insert(&self.cache_key(identity), node.clone());
        } else {
            debug!("Not caching {}: expansion was truncated", identity);
        }

        node
    }

    fn compile_primitive(kind: PrimitiveKind) -> SchemaNode {
        match kind {
            PrimitiveKind::String => SchemaNode::of_type(SchemaType::String),
            PrimitiveKind::Char => {
                let mut node = SchemaNode::of_type(SchemaType::String);
                node.min_length = Some(1);
                node.max_length = Some(1);
                node
            }
            PrimitiveKind::Boolean => SchemaNode::of_type(SchemaType::Boolean),
            PrimitiveKind::Integer { unsigned } => {
                let mut node = SchemaNode::of_type(SchemaType::Integer);
                if unsigned {
                    node.minimum = Some(0.0);
                }
                node
            }
            PrimitiveKind::Float => SchemaNode::of_type(SchemaType::Number),
            PrimitiveKind::Instant => Self::formatted_string("date-time"),
            PrimitiveKind::Date => Self::formatted_string("date"),
            PrimitiveKind::Uuid => Self::formatted_string("uuid"),
        }
    }

    fn formatted_string(format: &str) -> SchemaNode {
        let mut node = SchemaNode::of_type(SchemaType::String);
        node.format = Some(format.to_string());
        node
    }

    fn compile_record(
        &self,
        fields: &[FieldDescriptor],
        rename_all: Option<RenameRule>,
        ctx: &mut ResolutionContext,
    ) -> SchemaNode {
        let mut properties = BTreeMap::new();
        let mut required: Vec<String> = Vec::new();

        for field in fields {
            let metadata = &field.metadata;
            if metadata.ignore {
                debug!("Skipping ignored field: {}", field.name);
                continue;
            }

            let mut node = self.compile_ref(&field.ty, ctx);

            if metadata.flatten {
                if let Some(inner) = node.properties.take() {
                    let inner_required = node.required.take().unwrap_or_default();
                    properties.extend(inner);
                    if !field.optional && !metadata.omit_empty {
                        for name in inner_required {
                            if !required.contains(&name) {
                                required.push(name);
                            }
                        }
                    }
                    continue;
                }
                debug!("Field {} is flattened but is not a record", field.name);
            }

            let name = metadata.external_name(&field.name, rename_all);
            metadata.apply_constraints(&mut node);
            if metadata.is_required(field.optional, self.required_policy) && !required.contains(&name)
            {
                required.push(name.clone());
            }
            properties.insert(name, node);
        }

        SchemaNode::object(properties, required)
    }

    fn compile_map(&self, key: &TypeRef, value: &TypeRef, ctx: &mut ResolutionContext) -> SchemaNode {
        let values = self.compile_ref(value, ctx);
        let node = SchemaNode::map(values);
        if key.load().is_string_key() {
            node
        } else {
            debug!("Map key type {} is not string-like", key.identity());
            node.with_description(format!(
                "unsupported map key type `{}`: keys are not strings",
                key.identity()
            ))
        }
    }

    fn compile_enum(&self, variants: &[Variant], ctx: &mut ResolutionContext) -> SchemaNode {
        if variants.iter().all(|v| v.payload.is_none()) {
            let mut node = SchemaNode::of_type(SchemaType::String);
            node.enum_values = Some(
                variants
                    .iter()
                    .map(|v| Value::String(v.name.clone()))
                    .collect(),
            );
            return node;
        }

        let mut properties = BTreeMap::new();
        let mut unit_variants = Vec::new();
        for variant in variants {
            match &variant.payload {
                Some(payload) => {
                    properties.insert(variant.name.clone(), self.compile_ref(payload, ctx));
                }
                None => unit_variants.push(variant.name.as_str()),
            }
        }

        let mut description =
            "exactly one of the listed properties is present".to_string();
        if !unit_variants.is_empty() {
            description.push_str(&format!(
                ", or the value is one of the strings: {}",
                unit_variants.join(", ")
            ));
        }
        SchemaNode::object(properties, Vec::new()).with_description(description)
    }
}
