//! Argument and document parsing

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Parse an optional JSON object argument; absent means empty
pub fn parse_object(raw: Option<&str>, what: &str) -> Result<Map<String, Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(raw) => serde_json::from_str(raw)
            .with_context(|| format!("{} must be a JSON object", what)),
    }
}

/// Parse a lookback window such as `90s`, `30m`, `24h` or `7d`
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let Some(unit) = raw.chars().last() else {
        bail!("empty duration");
    };
    let amount: i64 = raw[..raw.len() - unit.len_utf8()]
        .parse()
        .with_context(|| format!("invalid duration: {}", raw))?;
    if amount <= 0 {
        bail!("duration must be positive: {}", raw);
    }

    match unit {
        's' => Ok(Duration::seconds(amount)),
        'm' => Ok(Duration::minutes(amount)),
        'h' => Ok(Duration::hours(amount)),
        'd' => Ok(Duration::days(amount)),
        _ => bail!("invalid duration unit in {} (expected s, m, h or d)", raw),
    }
}

/// Read a JSON or YAML document from `file`, or from stdin when no file is given
pub fn read_document<T: DeserializeOwned>(file: Option<&Path>) -> Result<T> {
    let content = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("reading stdin")?;
            content
        }
    };
    parse_document(&content)
}

/// Decode `content` as JSON, falling back to YAML
pub fn parse_document<T: DeserializeOwned>(content: &str) -> Result<T> {
    if content.trim().is_empty() {
        bail!("no configuration provided (use --file or pipe to stdin)");
    }
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(_) => serde_yaml::from_str(content).context("parse config (tried JSON and YAML)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("10w").is_err());
        assert!(parse_duration("0h").is_err());
        assert!(parse_duration("-1d").is_err());
    }

    #[test]
    fn test_parse_object() {
        assert!(parse_object(Some("[1, 2]"), "--data").is_err());
        assert!(parse_object(None, "--data").unwrap().is_empty());
        assert_eq!(
            parse_object(Some(r#"{"a": 1}"#), "--data").unwrap()["a"],
            json!(1)
        );
    }

    #[test]
    fn test_parse_document_json_and_yaml() {
        let from_json: Value = parse_document(r#"{"alias": "Morning"}"#).unwrap();
        let from_yaml: Value = parse_document("alias: Morning\ntrigger: []\n").unwrap();

        assert_eq!(from_json["alias"], "Morning");
        assert_eq!(from_yaml["alias"], "Morning");
        assert_eq!(from_yaml["trigger"], json!([]));
        assert!(parse_document::<Value>("  \n").is_err());
    }

    #[test]
    fn test_read_document_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "views:\n  - title: Home").unwrap();

        let config: Value = read_document(Some(file.path())).unwrap();
        assert_eq!(config["views"][0]["title"], "Home");
    }
}
