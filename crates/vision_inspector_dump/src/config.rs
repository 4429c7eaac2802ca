use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "vision_inspector_dump";
const CONFIG_NAME: &str = "profiles.json";
pub const DEFAULT_OUTPUT: &str = "out.csv";
pub const DEFAULT_ENCODING: &str = "utf-8";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_encoding() -> String {
    DEFAULT_ENCODING.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Saved connection settings. Passwords are never written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub show_all: bool,
}

impl Profile {
    pub fn apply_defaults(&mut self) {
        if self.output.trim().is_empty() {
            self.output = default_output();
        }
        if self.encoding.trim().is_empty() {
            self.encoding = default_encoding();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output)
    }
}

#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<Profile>,
}

impl ProfileStore {
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self> {
        let path = custom_path.unwrap_or_else(default_config_path);
        let mut profiles: Vec<Profile> = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read profiles from {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse profiles in {}", path.display()))?
        } else {
            Vec::new()
        };
        profiles.iter_mut().for_each(Profile::apply_defaults);
        Ok(Self { path, profiles })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.profiles)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn find(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.name == name)
    }

    /// Replaces the profile with the same name, or appends it.
    pub fn upsert(&mut self, mut profile: Profile) -> Result<()> {
        profile.apply_defaults();
        match self
            .profiles
            .iter_mut()
            .find(|existing| existing.name == profile.name)
        {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        self.save()
    }
}

fn default_config_path() -> PathBuf {
    let mut base = config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push(APP_DIR);
    base.push(CONFIG_NAME);
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, url: &str) -> Profile {
        Profile {
            name: name.to_string(),
            url: url.to_string(),
            user: Some("admin".to_string()),
            output: "line1.csv".to_string(),
            dataset_id: None,
            encoding: DEFAULT_ENCODING.to_string(),
            timeout_secs: 10,
            show_all: false,
        }
    }

    #[test]
    fn missing_file_loads_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ProfileStore::load(Some(dir.path().join("none.json"))).expect("load");
        assert!(store.profiles().is_empty());
    }

    #[test]
    fn upsert_replaces_by_name_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg").join("profiles.json");
        let mut store = ProfileStore::load(Some(path.clone())).expect("load");
        store.upsert(profile("plant", "https://a/vision")).expect("first");
        store.upsert(profile("plant", "https://b/vision")).expect("replace");
        store.upsert(profile("lab", "https://c/vision")).expect("second");

        let reloaded = ProfileStore::load(Some(path)).expect("reload");
        assert_eq!(reloaded.profiles().len(), 2);
        assert_eq!(
            reloaded.find("plant").map(|p| p.url.as_str()),
            Some("https://b/vision")
        );
        assert!(reloaded.find("missing").is_none());
    }

    #[test]
    fn sparse_profile_gets_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("profiles.json");
        fs::write(&path, r#"[{"name": "min", "url": "http://v", "encoding": ""}]"#).expect("write");
        let store = ProfileStore::load(Some(path)).expect("load");
        let min = store.find("min").expect("profile");
        assert_eq!(min.output, DEFAULT_OUTPUT);
        assert_eq!(min.encoding, DEFAULT_ENCODING);
        assert_eq!(min.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(!min.show_all);
    }
}
