use crate::cache::SchemaCache;
use crate::config::EngineConfig;
use crate::schema::SchemaNode;
use crate::schema_compiler::DEFAULT_MAX_DEPTH;
use crate::serializer::{write_schema_file, SchemaFile, SchemaFormat};
use crate::strategy::SchemaEngine;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handler schema generator - compile handler payload types into schema files
#[derive(Parser, Debug)]
#[command(name = "handler-schema")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Handler to compile, as NAME=FILE:REQUEST_TYPE:RESPONSE_TYPE (types may be empty)
    #[arg(
        short = 'H',
        long = "handler",
        value_name = "NAME=FILE:REQUEST:RESPONSE",
        value_parser = parse_handler_arg
    )]
    pub handlers: Vec<HandlerEntry>,

    /// JSON or YAML file listing handlers
    #[arg(short = 'm', long = "manifest", value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory the schema files are written to
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Maximum nesting depth of compiled schemas
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl From<OutputFormat> for SchemaFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => SchemaFormat::Json,
            OutputFormat::Yaml => SchemaFormat::Yaml,
        }
    }
}

/// One handler to compile: where its payload types are declared
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandlerEntry {
    pub name: String,
    pub file: PathBuf,
    #[serde(default)]
    pub request: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

/// Split at the first lone `:` so that type paths like `models::User` stay intact
fn split_field(input: &str) -> (&str, Option<&str>) {
    let bytes = input.as_bytes();
    let position = (0..bytes.len()).find(|&i| {
        bytes[i] == b':'
            && (i == 0 || bytes[i - 1] != b':')
            && bytes.get(i + 1) != Some(&b':')
    });
    match position {
        Some(i) => (&input[..i], Some(&input[i + 1..])),
        None => (input, None),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse a `NAME=FILE:REQUEST:RESPONSE` handler argument
pub fn parse_handler_arg(arg: &str) -> std::result::Result<HandlerEntry, String> {
    let (name, rest) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=FILE:REQUEST:RESPONSE, got `{}`", arg))?;
    let name = non_empty(name).ok_or_else(|| format!("missing handler name in `{}`", arg))?;

    let (file, types) = match rest.split_once(':') {
        Some((file, types)) => (file, Some(types)),
        None => (rest, None),
    };
    let file = non_empty(file).ok_or_else(|| format!("missing source file in `{}`", arg))?;
    let (request, response) = match types {
        Some(types) => {
            let (request, response) = split_field(types);
            (non_empty(request), response.and_then(non_empty))
        }
        None => (None, None),
    };

    Ok(HandlerEntry {
        name,
        file: PathBuf::from(file),
        request,
        response,
    })
}

/// Read a handler manifest; the format follows the file extension
pub fn load_manifest(path: &Path) -> Result<Vec<HandlerEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let handlers = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML manifest: {}", path.display()))?,
        _ => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON manifest: {}", path.display()))?,
    };
    Ok(handlers)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    if args.handlers.is_empty() && args.manifest.is_none() {
        anyhow::bail!("No handlers given: pass --handler or --manifest");
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output directory: {}", args.output_dir.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref manifest) = args.manifest {
        info!("Manifest: {}", manifest.display());
    }

    Ok(args)
}

/// Run the offline generation workflow.
///
/// Payloads that cannot be resolved are left out of the schema file so the runtime
/// chain can still try its other stages for them.
pub fn run(args: CliArgs) -> Result<()> {
    let mut handlers = args.handlers.clone();
    if let Some(ref manifest) = args.manifest {
        handlers.extend(load_manifest(manifest)?);
    }
    if handlers.is_empty() {
        anyhow::bail!("No handlers to compile");
    }

    let config = EngineConfig::new(args.project_path.clone())
        .with_static_analysis(true)
        .with_production(false)
        .with_max_depth(args.max_depth);
    let engine = SchemaEngine::with_cache(config, Arc::new(SchemaCache::new()))
        .context("Failed to initialize schema engine")?;

    info!("Compiling {} handler(s)...", handlers.len());
    let format = SchemaFormat::from(args.output_format);
    let mut unresolved = 0;

    for handler in &handlers {
        let compile = |type_expr: &Option<String>| -> Option<SchemaNode> {
            let type_expr = type_expr.as_deref()?;
            match engine.resolve_static_schema(&handler.file, type_expr) {
                Ok(node) => Some(node),
                Err(e) => {
                    warn!("{}: cannot resolve `{}`: {}", handler.name, type_expr, e);
                    None
                }
            }
        };

        let request_schema = compile(&handler.request);
        let response_schema = compile(&handler.response);
        if (handler.request.is_some() && request_schema.is_none())
            || (handler.response.is_some() && response_schema.is_none())
        {
            unresolved += 1;
        }

        let file = SchemaFile::new(handler.name.clone(), request_schema, response_schema);
        let path = write_schema_file(&args.output_dir, &file, format)?;
        info!("  {} -> {}", handler.name, path.display());
    }

    info!(
        "Wrote {} schema file(s) to {}",
        handlers.len(),
        args.output_dir.display()
    );
    if unresolved > 0 {
        warn!("{} handler(s) have unresolved payload types", unresolved);
    }

    Ok(())
}
