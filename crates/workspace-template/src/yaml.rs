//! Decoding and encoding of template documents in the YAML and JSON formats
use std::io::Write;

use serde::{Serialize, de::DeserializeOwned};
use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to decode YAML document"))]
    DecodeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to serialize YAML"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to serialize JSON"))]
    SerializeJson { source: serde_json::Error },

    #[snafu(display("failed to write YAML document separator"))]
    WriteDocumentSeparator { source: std::io::Error },

    #[snafu(display("failed to parse bytes as valid UTF-8 string"))]
    ParseUtf8Bytes { source: std::string::FromUtf8Error },
}

/// The formats a document can be written in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

/// Decodes a YAML document. JSON documents are valid YAML and decode the same way.
pub fn decode<T: DeserializeOwned>(input: &str) -> Result<T> {
    serde_yaml::from_str(input).context(DecodeYamlSnafu)
}

/// Serializes the given data structure as an explicit YAML document (with a leading `---`) and
/// writes it to a [`Writer`](Write).
pub fn serialize<T, W>(value: &T, mut writer: W) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    writer
        .write_all(b"---\n")
        .context(WriteDocumentSeparatorSnafu)?;
    value
        .serialize(&mut serde_yaml::Serializer::new(writer))
        .context(SerializeYamlSnafu)
}

/// Serializes the given data structure into a string in the requested format
pub fn to_string<T: Serialize>(value: &T, format: Format) -> Result<String> {
    match format {
        Format::Yaml => {
            let mut buffer = Vec::new();
            serialize(value, &mut buffer)?;
            String::from_utf8(buffer).context(ParseUtf8BytesSnafu)
        }
        Format::Json => {
            let mut json = serde_json::to_string_pretty(value).context(SerializeJsonSnafu)?;
            json.push('\n');
            Ok(json)
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use super::*;
    use crate::model::{EnvVar, TemplateSpecContent};

    #[rstest]
    #[case::block("name: A\nvalue: '1'")]
    #[case::json(r#"{"name": "A", "value": "1"}"#)]
    #[case::flow("{name: A, value: '1'}")]
    #[case::explicit_document("---\nname: A\nvalue: '1'")]
    fn decode_both_formats(#[case] input: &str) {
        let decoded: EnvVar = decode(input).unwrap();
        assert_eq!(
            decoded,
            EnvVar {
                name: "A".to_string(),
                value: "1".to_string(),
            }
        );
    }

    #[test]
    fn decode_flow_style_template() {
        let content: TemplateSpecContent =
            decode("{attributes: {version: main}, commands: [{id: run, exec: {commandLine: make}}]}")
                .unwrap();
        assert_eq!(content.attributes["version"], "main");
        assert_eq!(content.commands[0].id, "run");
    }

    #[rstest]
    #[case("{\"value\": 1")]
    #[case("value: [")]
    fn decode_errors_are_reported(#[case] input: &str) {
        assert!(matches!(
            decode::<EnvVar>(input).unwrap_err(),
            Error::DecodeYaml { .. }
        ));
    }

    #[test]
    fn yaml_output_is_an_explicit_document() {
        let content = TemplateSpecContent {
            attributes: [("version".to_string(), "1".to_string())].into(),
            ..Default::default()
        };
        assert_eq!(
            to_string(&content, Format::Yaml).unwrap(),
            indoc! {"
                ---
                attributes:
                  version: '1'
            "}
        );
        assert_eq!(
            to_string(&content, Format::Json).unwrap(),
            "{\n  \"attributes\": {\n    \"version\": \"1\"\n  }\n}\n"
        );
    }
}
