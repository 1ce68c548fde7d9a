//! The `CommandConfig` value type: a hook or project command slot that
//! accepts a single command string, an ordered list of commands, or a named
//! table of commands, all three serializing naturally in TOML.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One or more shell commands attached to a hook or project command slot.
///
/// TOML authors can write any of:
/// ```toml
/// post-create-command = "npm install"
/// post-create-command = ["npm install", "npm run build"]
/// [post-create-command]
/// install = "npm install"
/// build = "npm run build"
/// ```
/// The table form names each command (surfaced in hook-failure messages);
/// the string and array forms run unnamed, in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CommandConfig {
    Single(String),
    Sequence(Vec<String>),
    Named(IndexMap<String, String>),
}

impl CommandConfig {
    /// Flatten to an ordered list of `(label, command)` pairs. Unnamed
    /// commands are labeled by their position, one-indexed, matching how
    /// the hook pipeline reports which step of a sequence failed.
    pub fn commands(&self) -> Vec<(String, String)> {
        match self {
            CommandConfig::Single(cmd) => vec![("1".to_string(), cmd.clone())],
            CommandConfig::Sequence(cmds) => cmds
                .iter()
                .enumerate()
                .map(|(i, cmd)| ((i + 1).to_string(), cmd.clone()))
                .collect(),
            CommandConfig::Named(named) => {
                named.iter().map(|(name, cmd)| (name.clone(), cmd.clone())).collect()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CommandConfig::Single(cmd) => cmd.trim().is_empty(),
            CommandConfig::Sequence(cmds) => cmds.is_empty(),
            CommandConfig::Named(named) => named.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_command_flattens_to_one_pair() {
        let config = CommandConfig::Single("npm install".to_string());
        assert_eq!(config.commands(), vec![("1".to_string(), "npm install".to_string())]);
    }

    #[test]
    fn sequence_is_labeled_by_position() {
        let config = CommandConfig::Sequence(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            config.commands(),
            vec![("1".to_string(), "a".to_string()), ("2".to_string(), "b".to_string())]
        );
    }

    #[test]
    fn named_preserves_insertion_order() {
        let mut named = IndexMap::new();
        named.insert("install".to_string(), "npm install".to_string());
        named.insert("build".to_string(), "npm run build".to_string());
        let config = CommandConfig::Named(named);
        assert_eq!(
            config.commands(),
            vec![
                ("install".to_string(), "npm install".to_string()),
                ("build".to_string(), "npm run build".to_string())
            ]
        );
    }

    #[test]
    fn deserializes_from_toml_string_form() {
        let config: CommandConfig = toml::from_str("cmd = \"npm install\"")
            .map(|t: toml::Table| CommandConfig::deserialize(t["cmd"].clone()).unwrap())
            .unwrap();
        assert_eq!(config, CommandConfig::Single("npm install".to_string()));
    }

    #[test]
    fn empty_sequence_is_empty() {
        assert!(CommandConfig::Sequence(Vec::new()).is_empty());
        assert!(!CommandConfig::Single("x".to_string()).is_empty());
    }
}
