//! `classify` command: run the content classifier on a file or stdin

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::content::{classify, RawContent};

#[derive(Debug, Args)]
pub struct ClassifyCommand {
    /// File to classify; stdin when omitted or "-"
    pub input: Option<PathBuf>,

    /// Declared content type, e.g. text/html or application/json
    #[arg(short = 't', long = "type")]
    pub content_type: Option<String>,

    /// Treat the input as a JSON value instead of a string
    #[arg(long)]
    pub json: bool,

    /// Pretty print the output
    #[arg(short, long)]
    pub pretty: bool,
}

impl ClassifyCommand {
    pub async fn execute(&self) -> Result<()> {
        let input = self.read_input().await?;
        println!("{}", self.render(&input)?);
        Ok(())
    }

    async fn read_input(&self) -> Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read input file: {}", path.display())),
            _ => {
                let mut input = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut input)
                    .await
                    .context("Failed to read stdin")?;
                Ok(input)
            }
        }
    }

    /// Classification of `input` as JSON text
    fn render(&self, input: &str) -> Result<String> {
        let raw: RawContent = if self.json {
            serde_json::from_str::<Value>(input)
                .context("Input is not valid JSON")?
                .into()
        } else {
            input.into()
        };

        let classification = classify(raw, self.content_type.as_deref());

        let output = if self.pretty {
            serde_json::to_string_pretty(&classification)?
        } else {
            serde_json::to_string(&classification)?
        };
        Ok(output)
    }
}
