//! Result rendering

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Render `value` in the requested format
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    Ok(rendered.trim_end().to_string())
}

pub fn print<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_json() {
        let value = json!({"message": "API running."});
        assert_eq!(
            render(&value, OutputFormat::Json).unwrap(),
            "{\n  \"message\": \"API running.\"\n}"
        );
    }

    #[test]
    fn test_render_yaml() {
        let value = json!({"state": "idle"});
        assert_eq!(render(&value, OutputFormat::Yaml).unwrap(), "state: idle");
    }
}
