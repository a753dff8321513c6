//! Resolution strategy chain.
//!
//! Every compilation request walks the stages in a fixed order and commits to the
//! first one that produces a schema:
//!
//! 1. reflection over a live type handle,
//! 2. a pre-generated schema loaded from the schema directory,
//! 3. static analysis of the handler's source file,
//! 4. the degraded placeholder.
//!
//! Nothing in the chain returns an error to the caller. Failures are logged and the
//! request falls through to the next stage.

use crate::cache::SchemaCache;
use crate::config::EngineConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::reflect::{LiveType, ReflectionResolver};
use crate::scanner::FileScanner;
use crate::schema::SchemaNode;
use crate::schema_compiler::{ResolutionContext, SchemaCompiler};
use crate::serializer::SchemaStore;
use crate::type_resolver::StaticResolver;
use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a handler's payload types are declared in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Source file, absolute or relative to the engine root
    pub file: PathBuf,
    /// Type expression of the request body, as written in `file`
    pub request_type: Option<String>,
    pub response_type: Option<String>,
}

impl SourceRef {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            request_type: None,
            response_type: None,
        }
    }

    pub fn with_request(mut self, type_expr: impl Into<String>) -> Self {
        self.request_type = Some(type_expr.into());
        self
    }

    pub fn with_response(mut self, type_expr: impl Into<String>) -> Self {
        self.response_type = Some(type_expr.into());
        self
    }
}

/// Everything the route enumerator knows about one handler
#[derive(Debug, Clone)]
pub struct HandlerRef {
    pub name: String,
    pub request: Option<LiveType>,
    pub response: Option<LiveType>,
    pub source: Option<SourceRef>,
}

impl HandlerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request: None,
            response: None,
            source: None,
        }
    }

    pub fn with_request(mut self, live: LiveType) -> Self {
        self.request = Some(live);
        self
    }

    pub fn with_response(mut self, live: LiveType) -> Self {
        self.response = Some(live);
        self
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }
}

/// Which side of a handler is being compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    Request,
    Response,
}

impl Payload {
    fn live(self, handler: &HandlerRef) -> Option<&LiveType> {
        match self {
            Payload::Request => handler.request.as_ref(),
            Payload::Response => handler.response.as_ref(),
        }
    }

    fn source_type(self, source: &SourceRef) -> Option<&str> {
        match self {
            Payload::Request => source.request_type.as_deref(),
            Payload::Response => source.response_type.as_deref(),
        }
    }
}

/// Stage of the chain that produced a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reflection,
    Stored,
    Static,
    Fallback,
}

/// Stages that may decline; the fallback placeholder follows them and never declines
#[derive(Debug, Clone, Copy)]
enum Attempt {
    Reflection,
    Stored,
    Static,
}

impl From<Attempt> for Stage {
    fn from(attempt: Attempt) -> Self {
        match attempt {
            Attempt::Reflection => Stage::Reflection,
            Attempt::Stored => Stage::Stored,
            Attempt::Static => Stage::Static,
        }
    }
}

const CHAIN: [Attempt; 3] = [Attempt::Reflection, Attempt::Stored, Attempt::Static];

/// A compiled schema together with the stage that committed to it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub node: SchemaNode,
    pub stage: Stage,
}

/// Entry point used by the document assembler.
///
/// `SchemaEngine` is `Send + Sync`; handlers may be compiled from many threads at once.
pub struct SchemaEngine {
    config: EngineConfig,
    compiler: SchemaCompiler,
    reflection: ReflectionResolver,
    static_resolver: StaticResolver,
    store: SchemaStore,
    sources_present: OnceCell<bool>,
}

impl SchemaEngine {
    /// Create an engine backed by the process-wide schema cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::error::Error::InvalidConfig) when the
    /// configuration is unusable or the schema directory cannot be read.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_cache(config, SchemaCache::global())
    }

    pub fn with_cache(config: EngineConfig, cache: Arc<SchemaCache>) -> Result<Self> {
        config.validate()?;

        let store = match &config.schema_dir {
            Some(dir) => SchemaStore::load_dir(dir)?,
            None => SchemaStore::new(),
        };
        if config.require_stored_schemas && store.is_empty() {
            warn!("Stored schemas are required but none were loaded");
        }

        info!(
            "Schema engine ready (root: {}, static analysis: {}, stored schemas: {})",
            config.root.display(),
            config.static_enabled(),
            store.len()
        );

        Ok(Self {
            compiler: SchemaCompiler::new(cache).with_required_policy(config.required_policy),
            reflection: ReflectionResolver::new(),
            static_resolver: StaticResolver::new(config.root.clone()),
            store,
            sources_present: OnceCell::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    pub fn static_resolver(&self) -> &StaticResolver {
        &self.static_resolver
    }

    pub fn compile_request_schema(&self, handler: &HandlerRef) -> SchemaNode {
        self.resolve(handler, Payload::Request).node
    }

    pub fn compile_response_schema(&self, handler: &HandlerRef) -> SchemaNode {
        self.resolve(handler, Payload::Response).node
    }

    /// Run the chain for one payload of one handler
    pub fn resolve(&self, handler: &HandlerRef, payload: Payload) -> Resolution {
        CHAIN
            .iter()
            .find_map(|&attempt| {
                self.attempt(attempt, handler, payload).map(|node| Resolution {
                    node,
                    stage: attempt.into(),
                })
            })
            .unwrap_or_else(|| {
                warn!(
                    "No schema for {:?} of handler {}, using placeholder",
                    payload, handler.name
                );
                Resolution {
                    node: SchemaNode::unavailable(),
                    stage: Stage::Fallback,
                }
            })
    }

    fn attempt(
        &self,
        attempt: Attempt,
        handler: &HandlerRef,
        payload: Payload,
    ) -> Option<SchemaNode> {
        match attempt {
            Attempt::Reflection => self.try_reflection(payload.live(handler)?),
            Attempt::Stored => self.try_stored(&handler.name, payload),
            Attempt::Static => {
                let source = handler.source.as_ref()?;
                self.try_static(&source.file, payload.source_type(source)?)
            }
        }
    }

    fn try_reflection(&self, live: &LiveType) -> Option<SchemaNode> {
        let descriptor = self.reflection.resolve(live);
        if !descriptor.is_resolvable() {
            debug!("Reflection of {} yielded no usable structure", live.name());
            return None;
        }
        Some(self.compile(&descriptor))
    }

    fn try_stored(&self, handler_name: &str, payload: Payload) -> Option<SchemaNode> {
        let node = match payload {
            Payload::Request => self.store.request_schema(handler_name),
            Payload::Response => self.store.response_schema(handler_name),
        }?;
        debug!("Using stored {:?} schema for {}", payload, handler_name);
        Some(node.clone())
    }

    fn try_static(&self, file: &Path, type_expr: &str) -> Option<SchemaNode> {
        if !self.static_available() {
            return None;
        }
        match self.resolve_static_schema(file, type_expr) {
            Ok(node) => Some(node),
            Err(e) if e.is_recoverable() => {
                debug!("Static resolution of {} failed: {}", type_expr, e);
                None
            }
            Err(e) => {
                warn!("Static resolution of {} failed: {}", type_expr, e);
                None
            }
        }
    }

    /// Whether the static stage may run: enabled, not production, and sources exist.
    ///
    /// The source probe runs once per engine.
    pub fn static_available(&self) -> bool {
        self.config.static_enabled()
            && *self.sources_present.get_or_init(|| {
                FileScanner::new(self.config.root.clone()).has_source_files()
            })
    }

    /// Compile a type expression found in `file` with the static strategy only.
    ///
    /// Used by the offline generator; ignores the production flag.
    pub fn resolve_static_schema(&self, file: &Path, type_expr: &str) -> Result<SchemaNode> {
        let file = if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.config.root.join(file)
        };
        let descriptor = self.static_resolver.resolve_type_expr(&file, type_expr)?;
        Ok(self.compile(&descriptor))
    }

    fn compile(&self, descriptor: &TypeDescriptor) -> SchemaNode {
        let mut ctx =
            ResolutionContext::new(self.config.root.clone()).with_max_depth(self.config.max_depth);
        let node = self.compiler.compile(descriptor, &mut ctx);
        if ctx.was_truncated() {
            debug!("Schema for {} was truncated by a guard", descriptor.identity);
        }
        node
    }

    /// Forget every cached schema, scope, and located module
    pub fn clear_caches(&self) {
        self.compiler.cache().clear();
        self.static_resolver.clear_caches();
    }
}
