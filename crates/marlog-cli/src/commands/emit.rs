//! Emit command
//!
//! Usage: marlog emit <MESSAGE> [--level LEVEL] [--ctx KEY=VALUE]... [--option KEY=VALUE]...

use super::{options_map, split_pair};
use anyhow::Result;
use clap::Args;
use marlog_core::{Context, Level, Logger, Settings, Value};
use marlog_core_types::schema::{META_ORIGIN, ORIGIN_SYSTEM};
use marlog_store::FileSink;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct EmitArgs {
    /// Log message
    pub message: String,

    /// Severity (debug .. emergency)
    #[arg(long, default_value = "info")]
    pub level: String,

    /// Context entry; JSON values are parsed, anything else is text
    #[arg(long = "ctx", value_name = "KEY=VALUE")]
    pub context: Vec<String>,

    /// Settings entry, e.g. `max_log_bytes=5MB`
    #[arg(long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Directory for log files
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Deployment environment
    #[arg(long)]
    pub env: Option<String>,

    /// Correlation id for the record
    #[arg(long)]
    pub request_id: Option<String>,

    /// Mark the record as system-originated
    #[arg(long)]
    pub system: bool,
}

/// Execute emit command
pub fn execute(args: EmitArgs) -> Result<()> {
    let level: Level = args.level.parse()?;

    let mut options = options_map(&args.options)?;
    if let Some(path) = &args.log_path {
        options.insert(
            "log_path".to_string(),
            JsonValue::String(path.to_string_lossy().into_owned()),
        );
    }
    if let Some(env) = &args.env {
        options.insert("env".to_string(), JsonValue::String(env.clone()));
    }
    let settings = Arc::new(Settings::make(&options));

    let mut context = parse_context(&args.context)?;
    if args.system {
        context.insert(META_ORIGIN.to_string(), Value::from(ORIGIN_SYSTEM));
    }

    let sink = Arc::new(FileSink::from_settings(&settings));
    let logger = Logger::builder(settings.clone()).sink(sink.clone()).build();
    logger.set_request_id(args.request_id.as_deref());

    if let Some(reason) = logger.rejection(level, &context) {
        println!("Dropped ({})", reason.as_str());
        return Ok(());
    }

    logger.log(level, &args.message, context);
    println!("✓ Logged {} to {}", level, sink.dir().display());
    Ok(())
}

fn parse_context(pairs: &[String]) -> Result<Context> {
    let mut context = Context::new();
    for raw in pairs {
        let (key, value) = split_pair(raw)?;
        let value = serde_json::from_str::<JsonValue>(&value)
            .unwrap_or_else(|_| JsonValue::String(value));
        context.insert(key, Value::from(value));
    }
    Ok(context)
}
