//! Application configuration.
//!
//! ```json
//! { "name": "shop", "root": "/api", "bind_location": "0.0.0.0:7070" }
//! ```
//!
//! The PascalCase spellings `Name`, `Root` and `BindLocation` are accepted too.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(alias = "Name")]
    pub name: String,
    /// Path prefix every route is mounted under.
    #[serde(alias = "Root", default = "default_root")]
    pub root: String,
    /// `host:port` the server listens on.
    #[serde(alias = "BindLocation")]
    pub bind_location: String,
}

fn default_root() -> String {
    "/".to_owned()
}

impl Config {
    pub fn new(name: &str, root: &str, bind_location: &str) -> Self {
        Self {
            name: name.to_owned(),
            root: root.to_owned(),
            bind_location: bind_location.to_owned(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn snake_case_fields() {
        let config = Config::from_json_str(
            r#"{"name":"Test Application","root":"/app","bind_location":"0.0.0.0:7070"}"#,
        )
        .unwrap();
        assert_eq!(config, Config::new("Test Application", "/app", "0.0.0.0:7070"));
    }

    #[test]
    fn pascal_case_fields_and_default_root() {
        let config =
            Config::from_json_str(r#"{"Name":"legacy","BindLocation":"127.0.0.1:80"}"#).unwrap();
        assert_eq!(config.name, "legacy");
        assert_eq!(config.root, "/");
        assert_eq!(config.bind_location, "127.0.0.1:80");
    }

    #[test]
    fn reads_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name":"f","root":"/","bind_location":"[::]:8080"}}"#).unwrap();
        let config = Config::from_json_file(file.path()).unwrap();
        assert_eq!(config.bind_location, "[::]:8080");
    }

    #[test]
    fn malformed_and_missing_files_fail() {
        assert!(matches!(Config::from_json_str("{not json"), Err(Error::Config(_))));
        assert!(matches!(Config::from_json_str(r#"{"name":"x"}"#), Err(Error::Config(_))));
        assert!(matches!(
            Config::from_json_file("/definitely/not/here.json"),
            Err(Error::Io(_))
        ));
    }
}
