// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::parse_identity_list;
use crate::domain::constants::DEFAULT_DATABASE_URL;
use crate::domain::error::AppError;
use crate::infrastructure::notify::DeliveryPolicy;
use crate::services::ledger::AdminPolicy;
use config::{Config, Environment, File};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,

    // Store
    pub database_url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    // Access
    /// Transport identities allowed to run admin operations.
    #[serde(default, deserialize_with = "deserialize_identity_list")]
    pub admin_ids: Vec<String>,
    /// Identity the operator console acts as; defaults to the first admin.
    pub operator_id: Option<String>,

    // Notifications
    #[serde(default = "default_notify_retry_attempts")]
    pub notify_retry_attempts: usize,
    #[serde(default = "default_notify_retry_delay_ms")]
    pub notify_retry_delay_ms: u64,
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_false() -> bool {
    false
}
fn default_max_connections() -> u32 {
    5
}
fn default_notify_retry_attempts() -> usize {
    3
}
fn default_notify_retry_delay_ms() -> u64 {
    200
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdentityValue {
    Text(String),
    Number(i64),
}

impl IdentityValue {
    fn into_string(self) -> String {
        match self {
            IdentityValue::Text(s) => s,
            IdentityValue::Number(n) => n.to_string(),
        }
    }
}

fn deserialize_identity_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{Error, SeqAccess, Visitor};
    use std::fmt;

    struct IdentityVisitor;

    impl<'de> Visitor<'de> for IdentityVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a sequence of identities or a comma-separated string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(parse_identity_list(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some(elem) = seq.next_element::<IdentityValue>()? {
                let id = elem.into_string();
                let id = id.trim();
                if !id.is_empty() {
                    out.push(id.to_string());
                }
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(IdentityVisitor)
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let selected_config = resolve_config_path(path);
        let mut builder = Config::builder();

        if let Some(ref selected_path) = selected_config {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > selected profile file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        tracing::debug!(
            target: "config",
            file = selected_config.as_deref().unwrap_or("config (optional)"),
            admins = settings.admin_ids.len(),
            "Settings loaded"
        );
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.admin_policy().is_empty() {
            return Err(AppError::Config("ADMIN_IDS is missing".to_string()));
        }
        if let Some(op) = &self.operator_id
            && !self.admin_ids.iter().any(|id| id == op.trim())
        {
            return Err(AppError::Config(format!(
                "operator_id {op} is not listed in admin_ids"
            )));
        }
        Ok(())
    }

    pub fn database_url(&self) -> String {
        std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }

    pub fn admin_policy(&self) -> AdminPolicy {
        AdminPolicy::new(self.admin_ids.iter().cloned())
    }

    pub fn operator_identity(&self) -> Result<String, AppError> {
        self.operator_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| self.admin_ids.first().map(String::as_str))
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Config("No operator identity configured".into()))
    }

    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            attempts: self.notify_retry_attempts.max(1),
            initial_delay: Duration::from_millis(self.notify_retry_delay_ms),
        }
    }
}

fn resolve_config_path(path: Option<&str>) -> Option<String> {
    if let Some(path) = path {
        return Some(path.to_string());
    }
    detect_active_config_file()
}

fn detect_active_config_file() -> Option<String> {
    let priority_files = ["config.prod.toml", "config.dev.toml", "config.toml"];

    for file in priority_files.iter() {
        if let Some(true) = config_has_active_flag(file) {
            return Some((*file).to_string());
        }
    }

    // Fallback: scan current dir for config.*.toml with THIS_ACTIVE = true
    if let Ok(entries) = fs::read_dir(".") {
        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().to_str().map(ToString::to_string))
            .filter(|name| name.starts_with("config.") && name.ends_with(".toml"))
            .collect();
        names.sort();
        return names
            .into_iter()
            .find(|name| config_has_active_flag(name) == Some(true));
    }

    None
}

fn config_has_active_flag(path: &str) -> Option<bool> {
    let p = Path::new(path);
    if !p.exists() {
        return None;
    }

    Config::builder()
        .add_source(File::from(p))
        .build()
        .ok()?
        .get_bool("THIS_ACTIVE")
        .ok()
}
