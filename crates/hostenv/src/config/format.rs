//! Configuration file formats.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};

const TOML_EXTENSION: &str = "toml";

/// Syntax a configuration file is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// TOML, chosen by the `.toml` extension.
    Toml,
    /// YAML, the default. Plain JSON documents parse as YAML too.
    Yaml,
}

impl Format {
    /// Picks the format from the file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use hostenv::config::Format;
    ///
    /// assert_eq!(Format::from_path(Path::new("etc/api/config.toml")), Format::Toml);
    /// assert_eq!(Format::from_path(Path::new(".api.conf")), Format::Yaml);
    /// ```
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case(TOML_EXTENSION) => Self::Toml,
            _ => Self::Yaml,
        }
    }

    /// Parses `text` into a value tree.
    ///
    /// A document that is empty or only whitespace yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns the parser's message when the text is not valid for the
    /// format.
    pub fn parse(self, text: &str) -> Result<Value, String> {
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        match self {
            Self::Toml => text
                .parse::<toml::Table>()
                .map(|table| toml_to_json(toml::Value::Table(table)))
                .map_err(|e| e.to_string()),
            Self::Yaml => match serde_yaml::from_str::<Value>(text) {
                Ok(Value::Null) => Ok(Value::Object(Map::new())),
                Ok(value) => Ok(value),
                Err(e) => Err(e.to_string()),
            },
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        })
    }
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::from(number),
        toml::Value::Float(number) => Value::from(number),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, item)| (key, toml_to_json(item)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("config.toml", Format::Toml)]
    #[case("config.TOML", Format::Toml)]
    #[case("config.yaml", Format::Yaml)]
    #[case("config.yml", Format::Yaml)]
    #[case("config.json", Format::Yaml)]
    #[case("config", Format::Yaml)]
    #[case(".api.conf", Format::Yaml)]
    fn format_follows_extension(#[case] name: &str, #[case] expected: Format) {
        assert_eq!(Format::from_path(Path::new(name)), expected);
    }

    #[rstest]
    #[case(Format::Yaml, "")]
    #[case(Format::Yaml, "  \n")]
    #[case(Format::Toml, "")]
    fn empty_documents_become_empty_maps(#[case] format: Format, #[case] text: &str) {
        assert_eq!(format.parse(text), Ok(json!({})));
    }

    #[rstest]
    fn yaml_parses_json_documents() {
        let value = Format::Yaml
            .parse(r#"{"name": "api", "port": 8080}"#)
            .expect("json is yaml");
        assert_eq!(value, json!({ "name": "api", "port": 8080 }));
    }

    #[rstest]
    fn toml_tables_and_datetimes_convert() {
        let text = "name = \"api\"\nstarted = 1979-05-27T07:32:00Z\n[limits]\nrate = 1.5\n";
        let value = Format::Toml.parse(text).expect("valid toml");
        assert_eq!(
            value,
            json!({
                "name": "api",
                "started": "1979-05-27T07:32:00Z",
                "limits": { "rate": 1.5 },
            })
        );
    }

    #[rstest]
    #[case(Format::Yaml, "name: [unclosed")]
    #[case(Format::Toml, "name = ")]
    fn syntax_errors_carry_parser_message(#[case] format: Format, #[case] text: &str) {
        let message = format.parse(text).expect_err("invalid syntax");
        assert!(!message.is_empty());
    }
}
