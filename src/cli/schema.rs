//! Schema command implementation for configuration validation and JSON schema generation

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use schemars::schema_for;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::{DialogOptions, Settings};

/// Generate and validate configuration schemas
#[derive(Debug, Args)]
pub struct SchemaCommand {
    /// Output format for schema generation
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: SchemaFormat,

    /// Which document the schema describes
    #[arg(short, long, value_enum, default_value = "settings")]
    pub target: SchemaTarget,

    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty print the output
    #[arg(short, long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Option<SchemaSubcommand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaTarget {
    /// Application settings file
    Settings,
    /// Dialog options object
    Dialog,
}

#[derive(Debug, Subcommand)]
pub enum SchemaSubcommand {
    /// Generate the JSON schema
    Generate,
    /// Validate a JSON or YAML file against the schema
    Validate {
        file: PathBuf,
    },
    /// Show configuration documentation
    Docs,
}

impl SchemaCommand {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Some(SchemaSubcommand::Generate) | None => self.generate_schema().await,
            Some(SchemaSubcommand::Validate { file }) => self.validate_file(file).await,
            Some(SchemaSubcommand::Docs) => {
                print!("{}", docs());
                Ok(())
            }
        }
    }

    fn schema(&self) -> Result<Value> {
        let (schema, title) = match self.target {
            SchemaTarget::Settings => (schema_for!(Settings), "modal-frame settings"),
            SchemaTarget::Dialog => (schema_for!(DialogOptions), "modal-frame dialog options"),
        };

        let mut value = serde_json::to_value(schema).context("Failed to convert schema to JSON value")?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("title".to_string(), Value::String(title.to_string()));
        }
        Ok(value)
    }

    fn render(&self, schema: &Value) -> Result<String> {
        let output = match self.format {
            SchemaFormat::Json if self.pretty => serde_json::to_string_pretty(schema)?,
            SchemaFormat::Json => serde_json::to_string(schema)?,
            SchemaFormat::Yaml => serde_yaml::to_string(schema).context("Failed to convert schema to YAML")?,
        };
        Ok(output)
    }

    async fn generate_schema(&self) -> Result<()> {
        let output = self.render(&self.schema()?)?;

        if let Some(output_path) = &self.output {
            tokio::fs::write(output_path, output)
                .await
                .with_context(|| format!("Failed to write schema to: {}", output_path.display()))?;
            println!("Schema written to: {}", output_path.display());
        } else {
            println!("{}", output);
        }

        Ok(())
    }

    async fn validate_file(&self, file: &Path) -> Result<()> {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read file: {}", file.display()))?;

        let errors = self.check(file, &content)?;
        if errors.is_empty() {
            println!("{} is valid", file.display());
            return Ok(());
        }

        println!("{} failed validation:", file.display());
        for error in &errors {
            println!("  - {}", error);
        }
        Err(anyhow::anyhow!("Validation failed with {} error(s)", errors.len()))
    }

    /// Schema and semantic errors found in `content`
    fn check(&self, file: &Path, content: &str) -> Result<Vec<String>> {
        let is_yaml = matches!(
            file.extension().and_then(|ext| ext.to_str()),
            Some("yaml") | Some("yml")
        );
        let value: Value = if is_yaml {
            serde_yaml::from_str(content).with_context(|| format!("Failed to parse YAML: {}", file.display()))?
        } else {
            serde_json::from_str(content).with_context(|| format!("Failed to parse JSON: {}", file.display()))?
        };

        let schema = self.schema()?;
        let compiled = jsonschema::JSONSchema::compile(&schema)
            .map_err(|e| anyhow::anyhow!("Failed to compile JSON schema: {}", e))?;

        if let Err(errors) = compiled.validate(&value) {
            return Ok(errors
                .map(|error| format!("{}: {}", error.instance_path, error))
                .collect());
        }

        // Schema-valid documents can still carry invalid values
        let semantic = match self.target {
            SchemaTarget::Settings => serde_json::from_value::<Settings>(value)
                .map_err(anyhow::Error::from)
                .and_then(|settings| settings.validate()),
            SchemaTarget::Dialog => serde_json::from_value::<DialogOptions>(value)
                .map_err(anyhow::Error::from)
                .and_then(|options| options.validate().map_err(anyhow::Error::from)),
        };

        Ok(semantic.err().map(|e| e.to_string()).into_iter().collect())
    }
}

fn docs() -> String {
    let mut out = String::new();
    out.push_str("modal-frame configuration\n\n");

    out.push_str("Configuration files (first found wins):\n");
    for path in Settings::config_paths() {
        out.push_str(&format!("  {}\n", path.display()));
    }

    out.push_str("\nEnvironment variables (override files, .env is loaded first):\n");
    out.push_str("  MODAL_FRAME_BASE_URL          Base URL for relative content URLs\n");
    out.push_str("  MODAL_FRAME_USER_AGENT        User agent sent with requests\n");
    out.push_str("  MODAL_FRAME_TIMEOUT_SECS      Request timeout in seconds\n");
    out.push_str("  MODAL_FRAME_OVERLAY_DELAY_MS  Delay before the loading overlay shows\n");
    out.push_str("  MODAL_FRAME_FILL_ON_ERROR     Render failures inside frames (true/false)\n");
    out.push_str("  RUST_LOG                      Log filter, e.g. modal_frame=debug\n");

    out.push_str("\nExample:\n");
    out.push_str(EXAMPLE_SETTINGS);
    out.push('\n');
    out
}

const EXAMPLE_SETTINGS: &str = r#"{
  "baseUrl": "http://localhost:8000/",
  "timeoutSecs": 10,
  "overlayDelayMs": 100,
  "dialog": {
    "width": 800,
    "scroll": "background",
    "closeLabel": "Close"
  }
}"#;
