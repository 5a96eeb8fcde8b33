//! File steps: `file.read`, `file.write`, and `csv.write`.

use std::path::Path;

use anyhow::{bail, Context as _};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

use super::{require_params, resolve_params, resolve_path};
use crate::error::Result;
use crate::steps::{ExecutionContext, Step, StepHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum FileFormat {
    Text,
    Json,
}

impl FileFormat {
    fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    path: String,
    #[serde(default)]
    format: Option<FileFormat>,
}

struct ReadStep {
    params: Value,
}

#[async_trait]
impl StepHandler for ReadStep {
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        let params: ReadParams = resolve_params(&self.params, &input, ctx)?;
        let path = resolve_path(ctx, &params.path);

        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let content = match params.format.unwrap_or_else(|| FileFormat::infer(&path)) {
            FileFormat::Text => Value::String(text),
            FileFormat::Json => serde_json::from_str(&text)
                .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        };

        Ok(json!({
            "path": path.display().to_string(),
            "content": content,
        }))
    }
}

pub(crate) fn build_read(name: &str, params: &Value) -> Result<Step> {
    require_params(name, "file.read", params, &["path"])?;
    Ok(Step::new(
        name,
        ReadStep {
            params: params.clone(),
        },
    ))
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct WriteParams {
    path: String,
    /// Defaults to the step input.
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    append: bool,
    #[serde(default = "default_true")]
    create_dirs: bool,
}

struct WriteStep {
    params: Value,
}

#[async_trait]
impl StepHandler for WriteStep {
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        let params: WriteParams = resolve_params(&self.params, &input, ctx)?;
        let path = resolve_path(ctx, &params.path);

        let body = match params.content.unwrap_or(input) {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => serde_json::to_string_pretty(&other)?,
        };

        write_file(&path, body.as_bytes(), params.append, params.create_dirs).await?;

        Ok(json!({
            "path": path.display().to_string(),
            "bytes": body.len(),
        }))
    }
}

pub(crate) fn build_write(name: &str, params: &Value) -> Result<Step> {
    require_params(name, "file.write", params, &["path"])?;
    Ok(Step::new(
        name,
        WriteStep {
            params: params.clone(),
        },
    ))
}

async fn write_file(path: &Path, bytes: &[u8], append: bool, create_dirs: bool) -> anyhow::Result<()> {
    if create_dirs {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct CsvParams {
    path: String,
    /// Defaults to the step input.
    #[serde(default)]
    rows: Option<Value>,
    /// Defaults to the keys of the first row.
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default = "default_true")]
    create_dirs: bool,
}

struct CsvStep {
    params: Value,
}

#[async_trait]
impl StepHandler for CsvStep {
    async fn run(&self, input: Value, ctx: &ExecutionContext) -> anyhow::Result<Value> {
        let params: CsvParams = resolve_params(&self.params, &input, ctx)?;
        let path = resolve_path(ctx, &params.path);

        let rows = match params.rows.unwrap_or(input) {
            Value::Array(rows) => rows,
            other => bail!("csv.write expects an array of objects, got {}", kind_of(&other)),
        };

        let columns = match params.columns {
            Some(columns) => columns,
            None => match rows.first() {
                Some(Value::Object(first)) => first.keys().cloned().collect(),
                Some(other) => bail!("csv.write expects objects, got {}", kind_of(other)),
                None => Vec::new(),
            },
        };

        let csv = to_csv(&columns, &rows)?;
        write_file(&path, csv.as_bytes(), false, params.create_dirs).await?;

        Ok(json!({
            "path": path.display().to_string(),
            "rows": rows.len(),
            "columns": columns,
        }))
    }
}

pub(crate) fn build_csv(name: &str, params: &Value) -> Result<Step> {
    require_params(name, "csv.write", params, &["path"])?;
    Ok(Step::new(
        name,
        CsvStep {
            params: params.clone(),
        },
    ))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn to_csv(columns: &[String], rows: &[Value]) -> anyhow::Result<String> {
    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(columns)?;
    for (index, row) in rows.iter().enumerate() {
        let Value::Object(map) = row else {
            bail!("csv.write row {} is {}, expected an object", index, kind_of(row));
        };
        let cells = columns.iter().map(|column| match map.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(cells)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
