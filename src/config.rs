//! SDK and widget configuration
//!
//! Both configs deserialize from TOML or JSON with camelCase keys and
//! fall back to defaults for everything except the ids they bind to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{CanistError, Result};
use crate::logger::LogLevel;

/// Which replica network the backend lives on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Local,
    Ic,
}

impl Network {
    /// Default gateway host for this network
    pub fn default_host(&self) -> &'static str {
        match self {
            Network::Local => "http://127.0.0.1:4943",
            Network::Ic => "https://icp0.io",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "auto",
        }
    }

    /// Resolve `auto` against the agent's preferred theme, defaulting to light
    pub fn resolve(&self, agent_theme: Option<&str>) -> Theme {
        match self {
            Theme::Auto => match agent_theme {
                Some("dark") => Theme::Dark,
                _ => Theme::Light,
            },
            other => *other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
    Center,
    Inline,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::BottomRight => "bottom-right",
            Position::BottomLeft => "bottom-left",
            Position::TopRight => "top-right",
            Position::TopLeft => "top-left",
            Position::Center => "center",
            Position::Inline => "inline",
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Position::Inline)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Widget panel size: a preset or explicit CSS dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetSize {
    Preset(SizePreset),
    Custom { width: String, height: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizePreset {
    Small,
    #[default]
    Medium,
    Large,
}

impl Default for WidgetSize {
    fn default() -> Self {
        WidgetSize::Preset(SizePreset::default())
    }
}

impl WidgetSize {
    /// (width, height) as CSS lengths
    pub fn dimensions(&self) -> (String, String) {
        match self {
            WidgetSize::Preset(SizePreset::Small) => ("300px".into(), "400px".into()),
            WidgetSize::Preset(SizePreset::Medium) => ("350px".into(), "500px".into()),
            WidgetSize::Preset(SizePreset::Large) => ("400px".into(), "600px".into()),
            WidgetSize::Custom { width, height } => (width.clone(), height.clone()),
        }
    }
}

/// Configuration for one embedded chat widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Agent this widget talks to
    pub agent_id: String,

    /// Backend identity of the agent manager service
    pub agent_manager_canister_id: String,

    /// Id of the host element the widget renders into
    #[serde(default = "default_container_id")]
    pub container_id: String,

    #[serde(default)]
    pub network: Network,

    /// Gateway host override (defaults per network)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub size: WidgetSize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// CSS property → value overrides applied to the widget root
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_styles: BTreeMap<String, String>,
}

fn default_container_id() -> String {
    "canistchat-widget".to_string()
}

impl WidgetConfig {
    pub fn new(agent_id: impl Into<String>, agent_manager_canister_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_manager_canister_id: agent_manager_canister_id.into(),
            container_id: default_container_id(),
            network: Network::default(),
            host: None,
            theme: Theme::default(),
            position: Position::default(),
            size: WidgetSize::default(),
            api_key: None,
            custom_styles: BTreeMap::new(),
        }
    }

    pub fn with_container(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = container_id.into();
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_styles.insert(property.into(), value.into());
        self
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CanistError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent_id.trim().is_empty() {
            return Err(CanistError::Config("agentId must not be empty".into()));
        }
        if self.agent_manager_canister_id.trim().is_empty() {
            return Err(CanistError::Config(
                "agentManagerCanisterId must not be empty".into(),
            ));
        }
        if self.container_id.trim().is_empty() {
            return Err(CanistError::Config("containerId must not be empty".into()));
        }
        Ok(())
    }

    /// SDK configuration derived from this widget's settings
    pub fn sdk_config(&self) -> SdkConfig {
        SdkConfig {
            agent_manager_canister_id: self.agent_manager_canister_id.clone(),
            llm_processor_canister_id: None,
            network: self.network,
            host: self.host.clone(),
            request_timeout_secs: None,
            api_key: self.api_key.clone(),
            log_level: LogLevel::default(),
        }
    }
}

/// Configuration for one SDK facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdkConfig {
    pub agent_manager_canister_id: String,

    /// Processing service id; defaults to the agent manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_processor_canister_id: Option<String>,

    #[serde(default)]
    pub network: Network,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Per-request timeout. None leaves calls unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Forwarded with every chat call when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default)]
    pub log_level: LogLevel,
}

impl SdkConfig {
    pub fn new(agent_manager_canister_id: impl Into<String>) -> Self {
        Self {
            agent_manager_canister_id: agent_manager_canister_id.into(),
            llm_processor_canister_id: None,
            network: Network::default(),
            host: None,
            request_timeout_secs: None,
            api_key: None,
            log_level: LogLevel::default(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        if config.agent_manager_canister_id.trim().is_empty() {
            return Err(CanistError::Config(
                "agentManagerCanisterId must not be empty".into(),
            ));
        }
        Ok(config)
    }

    /// Gateway base URL without trailing slash
    pub fn host(&self) -> String {
        self.host
            .as_deref()
            .unwrap_or(self.network.default_host())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn llm_processor(&self) -> &str {
        self.llm_processor_canister_id
            .as_deref()
            .unwrap_or(&self.agent_manager_canister_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_config_defaults() {
        let config = WidgetConfig::new("agent-1", "rrkah-fqaaa");
        assert_eq!(config.container_id, "canistchat-widget");
        assert_eq!(config.position, Position::BottomRight);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.size.dimensions(), ("350px".to_string(), "500px".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_widget_config_from_toml() {
        let toml_str = r#"
            agentId = "agent-7"
            agentManagerCanisterId = "be2us-64aaa"
            containerId = "chat"
            network = "ic"
            theme = "dark"
            position = "top-left"
            size = "large"

            [customStyles]
            "border-radius" = "4px"
        "#;
        let config = WidgetConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.network, Network::Ic);
        assert_eq!(config.position, Position::TopLeft);
        assert_eq!(config.size, WidgetSize::Preset(SizePreset::Large));
        assert_eq!(config.custom_styles["border-radius"], "4px");
    }

    #[test]
    fn test_widget_config_from_json_custom_size() {
        let json = r#"{
            "agentId": "a",
            "agentManagerCanisterId": "c",
            "position": "inline",
            "size": {"width": "100%", "height": "480px"}
        }"#;
        let config = WidgetConfig::from_json_str(json).unwrap();
        assert!(config.position.is_inline());
        assert_eq!(config.size.dimensions(), ("100%".to_string(), "480px".to_string()));
    }

    #[test]
    fn test_widget_config_rejects_empty_agent() {
        let err = WidgetConfig::new("  ", "c").validate().unwrap_err();
        assert!(matches!(err, CanistError::Config(_)));
    }

    #[test]
    fn test_widget_config_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widget.toml");
        std::fs::write(&path, "agentId = \"a\"\nagentManagerCanisterId = \"c\"\n").unwrap();

        let config = WidgetConfig::load(&path).unwrap();
        assert_eq!(config.agent_id, "a");
        assert!(WidgetConfig::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_sdk_config_host_and_processor() {
        let mut config = SdkConfig::new("am-1");
        assert_eq!(config.host(), "http://127.0.0.1:4943");
        assert_eq!(config.llm_processor(), "am-1");

        config.network = Network::Ic;
        assert_eq!(config.host(), "https://icp0.io");

        config.host = Some("https://gateway.example/".into());
        config.llm_processor_canister_id = Some("llm-1".into());
        assert_eq!(config.host(), "https://gateway.example");
        assert_eq!(config.llm_processor(), "llm-1");
    }

    #[test]
    fn test_sdk_config_from_toml() {
        let config = SdkConfig::from_toml_str(
            "agentManagerCanisterId = \"am\"\nlogLevel = \"debug\"\nrequestTimeoutSecs = 30\n",
        )
        .unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.request_timeout_secs, Some(30));
    }

    #[test]
    fn test_theme_resolution() {
        assert_eq!(Theme::Auto.resolve(Some("dark")), Theme::Dark);
        assert_eq!(Theme::Auto.resolve(None), Theme::Light);
        assert_eq!(Theme::Light.resolve(Some("dark")), Theme::Light);
    }
}
