use serde_yaml::Value;
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("Bad entry in {path} at line {line}: {reason}")]
    ListEntry {
        path: String,
        line: usize,
        reason: String,
    },
}

/// Anything backed by a YAML document.
pub trait Configurable {
    fn config(&self) -> &Value;

    /// Parse a YAML file. An empty file is `Value::Null`.
    fn load_config(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Read a list file: one entry per line, blank lines and `#` comments
    /// skipped, surrounding whitespace trimmed.
    ///
    /// Entries must not contain inner whitespace.
    fn load_list_file(path: impl AsRef<Path>) -> Result<Vec<String>, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut entries = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            if entry.contains(char::is_whitespace) {
                return Err(ConfigError::ListEntry {
                    path: path.display().to_string(),
                    line: idx + 1,
                    reason: format!("unexpected whitespace in {entry:?}"),
                });
            }
            entries.push(entry.to_string());
        }
        Ok(entries)
    }

    /// Look a value up with dot notation, i.e. "worker.cache_version".
    fn get_config_value(&self, key: &str) -> Option<&Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.')
            .try_fold(self.config(), |node, part| node.as_mapping()?.get(part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct Document(Value);

    impl Configurable for Document {
        fn config(&self) -> &Value {
            &self.0
        }
    }

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folio.yml");
        std::fs::write(&path, "worker:\n  cache_version: book-v2\n").unwrap();

        let config = Document::load_config(&path).unwrap();
        assert_eq!(config["worker"]["cache_version"].as_str(), Some("book-v2"));

        std::fs::write(&path, "").unwrap();
        assert!(Document::load_config(&path).unwrap().is_null());
    }

    #[test]
    fn test_load_config_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folio.yml");
        std::fs::write(&path, "worker: : [").unwrap();
        assert!(matches!(
            Document::load_config(&path),
            Err(ConfigError::YamlParse(_))
        ));
        assert!(matches!(
            Document::load_config(dir.path().join("missing.yml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_load_list_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chapters.txt");
        std::fs::write(
            &path,
            "# appendix\n/chapters/chapter5.html\n\n  /chapters/chapter6.html  \n",
        )
        .unwrap();

        let entries = Document::load_list_file(&path).unwrap();
        assert_eq!(
            entries,
            vec!["/chapters/chapter5.html", "/chapters/chapter6.html"]
        );
    }

    #[test]
    fn test_load_list_file_rejects_inner_whitespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chapters.txt");
        std::fs::write(&path, "/chapters/chapter5.html\n/chapters/chapter 6.html\n")
            .unwrap();

        match Document::load_list_file(&path) {
            Err(ConfigError::ListEntry { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_get_config_value() {
        let yaml = concat!(
            "worker:\n  origin: http://book.test\n",
            "server:\n  listen: 127.0.0.1:9000\n",
        );
        let config: Value = serde_yaml::from_str(yaml).unwrap();
        let doc = Document(config);

        assert_eq!(
            doc.get_config_value("server.listen").and_then(Value::as_str),
            Some("127.0.0.1:9000")
        );
        assert!(doc.get_config_value("worker").is_some());
        assert_eq!(doc.get_config_value("worker.origin.host"), None);
        assert_eq!(doc.get_config_value("logging.json"), None);
        assert_eq!(doc.get_config_value(""), None);
    }
}
