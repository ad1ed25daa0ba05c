//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{ResponsesFile, ServerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and validate server configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = read(path)?;
    let config: ServerConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load a responses file. `.toml` files are read as TOML, everything else as YAML.
pub fn load_responses(path: &Path) -> Result<ResponsesFile, ConfigError> {
    let content = read(path)?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        return Ok(toml::from_str(&content)?);
    }

    // An empty YAML document deserializes to unit, not an empty mapping.
    if content.trim().is_empty() {
        return Ok(ResponsesFile::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::LogFormat;
    use crate::config::schema::HeaderValueConfig;
    use std::io::Write;

    fn file_with(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_partial_server_config_with_defaults() {
        let file = file_with(
            ".toml",
            r#"
[listener]
bind_address = "127.0.0.1:9000"

[log]
format = "json"

[capture]
buffer_size = 16
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.capture.buffer_size, 16);
        assert_eq!(config.response.status, 200);
        assert!(!config.listener.tls_self_signed);
    }

    #[test]
    fn rejects_invalid_server_config() {
        let file = file_with(".toml", "[capture]\nbuffer_size = 0\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let error = load_config(Path::new("/no/such/httplog.toml")).unwrap_err();
        assert!(error.to_string().contains("/no/such/httplog.toml"));
    }

    #[test]
    fn loads_yaml_responses_file() {
        let file = file_with(
            ".yaml",
            r#"
headers:
  X-Server: httplog
  Set-Cookie: [a=1, b=2]
notFound:
  status: 404
  body: not here
responses:
  - method: GET
    path: /users/{id}
    body: '{"id": 1}'
    headers:
      Content-Type: application/json
  - path: /download
    file: ./payload.bin
"#,
        );

        let responses = load_responses(file.path()).unwrap();
        assert_eq!(responses.responses.len(), 2);
        assert_eq!(responses.responses[0].method.as_deref(), Some("GET"));
        assert_eq!(responses.responses[1].file.as_deref(), Some(Path::new("./payload.bin")));
        assert_eq!(
            responses.headers["Set-Cookie"],
            HeaderValueConfig::Many(vec!["a=1".into(), "b=2".into()])
        );
        assert_eq!(responses.not_found.unwrap().status, 404);
        assert!(responses.method_not_allowed.is_none());
    }

    #[test]
    fn loads_toml_responses_file() {
        let file = file_with(
            ".toml",
            r#"
[methodNotAllowed]
status = 405

[[responses]]
method = "POST"
path = "/a"
status = 201
"#,
        );

        let responses = load_responses(file.path()).unwrap();
        assert_eq!(responses.responses[0].status, 201);
        assert_eq!(responses.method_not_allowed.unwrap().status, 405);
    }

    #[test]
    fn empty_yaml_is_an_empty_rule_set() {
        let file = file_with(".yml", "\n");
        let responses = load_responses(file.path()).unwrap();
        assert!(responses.responses.is_empty());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let file = file_with(".yaml", "responses: [\n");
        assert!(matches!(load_responses(file.path()), Err(ConfigError::Yaml(_))));
    }
}
