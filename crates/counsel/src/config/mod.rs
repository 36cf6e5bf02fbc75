use crate::modules::ModuleId;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub api_key: String,
    pub memory_path: PathBuf,
    /// Optional path to a routing-table file; the built-in table is used
    /// when absent.
    pub heuristics_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let api_key = env::var("APP_API_KEY").unwrap_or_else(|_| "change-me".to_string());
        let memory_path = PathBuf::from(
            env::var("APP_MEMORY_PATH").unwrap_or_else(|_| "memory_store.jsonl".to_string()),
        );
        let heuristics_path = env::var("APP_HEURISTICS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            api_key,
            memory_path,
            heuristics_path,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// One named intent: trigger keywords plus the modules it invokes when it
/// wins the routing decision.
#[derive(Debug, Clone)]
pub struct IntentSpec {
    pub name: String,
    pub keywords: Vec<String>,
    pub modules: Vec<ModuleId>,
}

/// Policy values applied to every routing decision.
#[derive(Debug, Clone)]
pub struct RoutingPolicies {
    pub default_modules: Vec<ModuleId>,
    pub max_modules: usize,
    pub confidence_threshold: f64,
    pub auto_detect: bool,
}

/// Declarative routing table. Loaded once at startup; configuration errors
/// fail fast rather than surfacing per request.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub intents: Vec<IntentSpec>,
    pub policies: RoutingPolicies,
}

impl RoutingConfig {
    /// The built-in intent table.
    pub fn standard() -> Self {
        Self {
            intents: vec![
                IntentSpec {
                    name: "strategic".to_string(),
                    keywords: lowered(&[
                        "strategy", "plan", "roadmap", "vision", "goal", "prioritize",
                        "quarter",
                    ]),
                    modules: vec![ModuleId::Structure, ModuleId::StrategyMcda],
                },
                IntentSpec {
                    name: "decision".to_string(),
                    keywords: lowered(&[
                        "decide", "decision", "choose", "compare", "options", "tradeoff",
                        "alternative",
                    ]),
                    modules: vec![ModuleId::StrategyMcda, ModuleId::Structure],
                },
                IntentSpec {
                    name: "risk".to_string(),
                    keywords: lowered(&[
                        "risk", "risks", "exposure", "mitigation", "loss", "failure",
                        "downside",
                    ]),
                    modules: vec![ModuleId::RiskExpectedLoss, ModuleId::Structure],
                },
            ],
            policies: RoutingPolicies {
                default_modules: vec![ModuleId::Structure],
                max_modules: 3,
                confidence_threshold: 0.55,
                auto_detect: true,
            },
        }
    }

    /// Built-in table, or the file at `path` when one is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::standard()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::HeuristicsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed: RawRoutingConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::HeuristicsParse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_raw(parsed)
    }

    fn from_raw(raw: RawRoutingConfig) -> Result<Self, ConfigError> {
        if raw.intents.is_empty() {
            return Err(ConfigError::EmptyIntents);
        }
        if raw.policies.max_modules == 0 {
            return Err(ConfigError::InvalidMaxModules);
        }
        if !(0.0..=1.0).contains(&raw.policies.confidence_threshold) {
            return Err(ConfigError::InvalidThreshold);
        }

        let mut intents = Vec::with_capacity(raw.intents.len());
        for intent in raw.intents {
            if intent.keywords.is_empty() {
                return Err(ConfigError::EmptyKeywords {
                    intent: intent.name,
                });
            }
            let modules = resolve_modules(&intent.name, &intent.modules)?;
            intents.push(IntentSpec {
                keywords: intent
                    .keywords
                    .iter()
                    .map(|k| k.to_lowercase())
                    .collect(),
                name: intent.name,
                modules,
            });
        }

        let default_modules = resolve_modules("policies", &raw.policies.default_modules)?;

        Ok(Self {
            intents,
            policies: RoutingPolicies {
                default_modules,
                max_modules: raw.policies.max_modules,
                confidence_threshold: raw.policies.confidence_threshold,
                auto_detect: raw.policies.auto_detect,
            },
        })
    }
}

fn resolve_modules(intent: &str, names: &[String]) -> Result<Vec<ModuleId>, ConfigError> {
    names
        .iter()
        .map(|name| {
            ModuleId::from_name(name).ok_or_else(|| ConfigError::UnknownModule {
                intent: intent.to_string(),
                module: name.clone(),
            })
        })
        .collect()
}

fn lowered(keywords: &[&str]) -> Vec<String> {
    keywords.iter().map(|k| k.to_lowercase()).collect()
}

#[derive(Debug, Deserialize)]
struct RawRoutingConfig {
    intents: Vec<RawIntent>,
    policies: RawPolicies,
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    name: String,
    keywords: Vec<String>,
    modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPolicies {
    default_modules: Vec<String>,
    #[serde(default = "default_max_modules")]
    max_modules: usize,
    #[serde(default = "default_confidence_threshold")]
    confidence_threshold: f64,
    #[serde(default = "default_auto_detect")]
    auto_detect: bool,
}

fn default_max_modules() -> usize {
    3
}

fn default_confidence_threshold() -> f64 {
    0.55
}

fn default_auto_detect() -> bool {
    true
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    UnknownModule { intent: String, module: String },
    EmptyIntents,
    EmptyKeywords { intent: String },
    InvalidThreshold,
    InvalidMaxModules,
    HeuristicsIo { path: PathBuf, source: std::io::Error },
    HeuristicsParse { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::UnknownModule { intent, module } => {
                write!(f, "intent '{intent}' references unknown module '{module}'")
            }
            ConfigError::EmptyIntents => write!(f, "routing table declares no intents"),
            ConfigError::EmptyKeywords { intent } => {
                write!(f, "intent '{intent}' declares no keywords")
            }
            ConfigError::InvalidThreshold => {
                write!(f, "confidence_threshold must be within 0..1")
            }
            ConfigError::InvalidMaxModules => write!(f, "max_modules must be at least 1"),
            ConfigError::HeuristicsIo { path, .. } => {
                write!(f, "cannot read routing table at {}", path.display())
            }
            ConfigError::HeuristicsParse { path, .. } => {
                write!(f, "cannot parse routing table at {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::HeuristicsIo { source, .. } => Some(source),
            ConfigError::HeuristicsParse { source, .. } => Some(source),
            _ => None,
        }
    }
}
