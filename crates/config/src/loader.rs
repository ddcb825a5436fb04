use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{Error, Result, env_subst::substitute_env, schema::MsgkitConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["msgkit.toml", "msgkit.yaml", "msgkit.yml", "msgkit.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<MsgkitConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./msgkit.{toml,yaml,yml,json}` (project-local)
/// 2. `msgkit.{toml,yaml,yml,json}` in the user config dir
///
/// Returns `MsgkitConfig::default()` if no config file is found or it fails to load.
pub fn discover_and_load() -> MsgkitConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    MsgkitConfig::default()
}

fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// The user-global config directory (`~/.config/msgkit/` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "msgkit").map(|d| d.config_dir().to_path_buf())
}

/// Apply `OPENAI_API_KEY`, `MSGKIT_MODEL` and `MSG_LOG` from the environment.
pub fn apply_env_overrides(config: &mut MsgkitConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut MsgkitConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
        config.agent.api_key = Some(Secret::new(key));
    }
    if let Some(model) = lookup("MSGKIT_MODEL").filter(|m| !m.trim().is_empty()) {
        config.agent.model = model;
    }
    if let Some(flag) = lookup("MSG_LOG") {
        config.bot.log_messages = matches!(flag.trim(), "1" | "true" | "TRUE" | "yes");
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<MsgkitConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        _ => Err(Error::UnsupportedFormat {
            ext: ext.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, secrecy::ExposeSecret, std::io::Write};

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let toml = write(&dir, "msgkit.toml", "[bot]\nmax_intent_depth = 3\n");
        let yaml = write(&dir, "msgkit.yaml", "bot:\n  max_intent_depth: 4\n");
        let json = write(&dir, "msgkit.json", r#"{"bot": {"max_intent_depth": 6}}"#);
        assert_eq!(load_config(&toml).unwrap().bot.max_intent_depth, 3);
        assert_eq!(load_config(&yaml).unwrap().bot.max_intent_depth, 4);
        assert_eq!(load_config(&json).unwrap().bot.max_intent_depth, 6);
    }

    #[test]
    fn substitutes_env_defaults_in_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "msgkit.toml",
            "[agent]\nmodel = \"${MSGKIT_TEST_UNSET_MODEL_VAR:-gpt-4.1}\"\n",
        );
        assert_eq!(load_config(&path).unwrap().agent.model, "gpt-4.1");
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "msgkit.toml", "[bot\n");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("msgkit.toml"));
    }

    #[test]
    fn rejects_unknown_extensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "msgkit.ini", "");
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { ext }) if ext == "ini"
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn env_overrides_fill_agent_and_bot() {
        let mut config = MsgkitConfig::default();
        apply_env_overrides_with(&mut config, |name| match name {
            "OPENAI_API_KEY" => Some("sk-env".into()),
            "MSGKIT_MODEL" => Some("gpt-4o".into()),
            "MSG_LOG" => Some("true".into()),
            _ => None,
        });
        assert_eq!(
            config.agent.api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("sk-env")
        );
        assert_eq!(config.agent.model, "gpt-4o");
        assert!(config.bot.log_messages);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = MsgkitConfig::default();
        apply_env_overrides_with(&mut config, |name| match name {
            "OPENAI_API_KEY" | "MSGKIT_MODEL" => Some("  ".into()),
            _ => None,
        });
        assert!(config.agent.api_key.is_none());
        assert_eq!(config.agent.model, "gpt-4o-mini");
        assert!(!config.bot.log_messages);
    }
}
