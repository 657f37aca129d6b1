use formpilot_config::Config;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct ExtractInput {
    /// Memory JSON file, `-` for stdin.
    pub file: PathBuf,
    /// Key-path extraction, no engine calls.
    pub offline: bool,
    /// Print with display defaults applied.
    pub display: bool,
}

/// Strategy for one-off extraction from a memory file.
#[derive(Debug, Clone, Copy)]
pub struct ExtractStrategy;

fn read_memory(file: &Path) -> anyhow::Result<Value> {
    let content = if file.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(file)?
    };
    Ok(serde_json::from_str(&content)?)
}

impl super::CommandStrategy for ExtractStrategy {
    type Input = ExtractInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load_or_default()?;
        let service = super::build_service(&config, input.offline);

        let memory = read_memory(&input.file)?;
        info!("Extracting from {}", input.file.display());

        let form = service.extract_form(&memory).await?;
        let output = if input.display {
            form.with_display_defaults(service.registry())
        } else {
            form.to_json()
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
