use crate::error::GenerationError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api/generate-image";
pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to generate image. Please try again.";

/// What `trigger` does when a request is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerPolicy {
    /// Overlapping triggers are rejected; history order equals submission order.
    #[default]
    RejectWhileInFlight,
    /// Overlapping triggers proceed; history order follows response arrival.
    AllowConcurrent,
}

impl FromStr for TriggerPolicy {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" | "serial" | "reject-while-in-flight" => Ok(TriggerPolicy::RejectWhileInFlight),
            "concurrent" | "allow-concurrent" => Ok(TriggerPolicy::AllowConcurrent),
            other => Err(GenerationError::ConfigError(format!(
                "unknown trigger policy `{}`",
                other
            ))),
        }
    }
}

/// How `select_latest` treats URLs that are not in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    #[default]
    Strict,
    Trusted,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub trigger_policy: TriggerPolicy,
    pub selection_policy: SelectionPolicy,
    pub failure_message: String,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub client: ClientConfig,
    pub orchestrator: OrchestratorConfig,
    pub log_level: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let endpoint = env::var("IMAGEGEN_ENDPOINT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout = env::var("IMAGEGEN_TIMEOUT_SECS")
            .ok()
            .and_then(|s| parse_timeout(&s));

        ClientConfig { endpoint, timeout }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            trigger_policy: TriggerPolicy::default(),
            selection_policy: SelectionPolicy::default(),
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let trigger_policy = match env::var("IMAGEGEN_TRIGGER_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("{}, falling back to reject-while-in-flight", e);
                TriggerPolicy::default()
            }),
            Err(_) => TriggerPolicy::default(),
        };
        let selection_policy = env::var("IMAGEGEN_STRICT_SELECTION")
            .ok()
            .map_or(SelectionPolicy::Strict, |val| parse_selection(&val));
        let failure_message = env::var("IMAGEGEN_FAILURE_MESSAGE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());

        OrchestratorConfig {
            trigger_policy,
            selection_policy,
            failure_message,
        }
    }

    pub fn with_trigger_policy(mut self, policy: TriggerPolicy) -> Self {
        self.trigger_policy = policy;
        self
    }

    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    /// Ignored when blank; the error field must never hold an empty message.
    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.failure_message = message;
        }
        self
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            client: ClientConfig::from_env(),
            orchestrator: OrchestratorConfig::from_env(),
            log_level: env::var("IMAGEGEN_LOG_LEVEL").ok(),
        }
    }

    pub fn with_client(mut self, config: ClientConfig) -> Self {
        self.client = config;
        self
    }

    pub fn with_orchestrator(mut self, config: OrchestratorConfig) -> Self {
        self.orchestrator = config;
        self
    }
}

fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            log::warn!("IMAGEGEN_TIMEOUT_SECS=`{}` is not a number, no timeout applied", raw);
            None
        }
    }
}

fn parse_selection(raw: &str) -> SelectionPolicy {
    match raw.trim().to_ascii_lowercase().as_str() {
        "false" | "0" | "no" => SelectionPolicy::Trusted,
        _ => SelectionPolicy::Strict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_policy_parsing() {
        assert_eq!(
            "reject".parse::<TriggerPolicy>().unwrap(),
            TriggerPolicy::RejectWhileInFlight
        );
        assert_eq!(
            " Concurrent ".parse::<TriggerPolicy>().unwrap(),
            TriggerPolicy::AllowConcurrent
        );
        assert!("sometimes".parse::<TriggerPolicy>().is_err());
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_timeout("30"), Some(Duration::from_secs(30)));
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("soon"), None);
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!(parse_selection("false"), SelectionPolicy::Trusted);
        assert_eq!(parse_selection("true"), SelectionPolicy::Strict);
        assert_eq!(parse_selection("anything"), SelectionPolicy::Strict);
    }

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.client.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(
            config.orchestrator.trigger_policy,
            TriggerPolicy::RejectWhileInFlight
        );
        assert_eq!(config.orchestrator.selection_policy, SelectionPolicy::Strict);
        assert_eq!(config.orchestrator.failure_message, DEFAULT_FAILURE_MESSAGE);
    }

    #[test]
    fn test_blank_failure_message_is_ignored() {
        let config = OrchestratorConfig::new().with_failure_message("  ");
        assert_eq!(config.failure_message, DEFAULT_FAILURE_MESSAGE);

        let config = OrchestratorConfig::new().with_failure_message("Something broke");
        assert_eq!(config.failure_message, "Something broke");
    }
}
