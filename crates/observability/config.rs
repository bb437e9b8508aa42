use std::env;

#[derive(Debug, Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Full,
    Compact,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) default_directive: String,
    pub(crate) format: LogFormat,
    /// Warnings captured during config parsing so they can be logged after tracing is initialized.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    fn from_lookup(component: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let component = component.trim().to_string();
        let mut warnings = Vec::new();

        let service_name = lookup("SERVICE_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| component.clone());

        let environment = lookup("STAGE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let default_directive = match lookup("LOG_LEVEL") {
            Some(raw) if !raw.trim().is_empty() => match parse_level(&raw) {
                Some(level) => level.to_string(),
                None => {
                    warnings.push(format!("LOG_LEVEL is invalid (value: {raw}); defaulting to info"));
                    "info".to_string()
                }
            },
            _ => "info".to_string(),
        };

        let format = match lookup("LOG_FORMAT") {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" | "full" => LogFormat::Full,
                "compact" => LogFormat::Compact,
                _ => {
                    warnings.push(format!("LOG_FORMAT is invalid (value: {raw}); defaulting to full"));
                    LogFormat::Full
                }
            },
            None => LogFormat::Full,
        };

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            default_directive,
            format,
            warnings,
        }
    }
}

fn parse_level(input: &str) -> Option<&'static str> {
    match input.trim().to_ascii_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(component: &str, vars: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilityConfig::from_lookup(component, |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_component_name_and_info() {
        let config = config_with(" backend ", &[]);

        assert_eq!(config.service_context.service_name, "backend");
        assert_eq!(config.service_context.environment, "unknown");
        assert_eq!(config.default_directive, "info");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn reads_overrides() {
        let config = config_with(
            "worker",
            &[
                ("SERVICE_NAME", "gosholo-worker"),
                ("STAGE", "production"),
                ("LOG_LEVEL", "WARNING"),
                ("LOG_FORMAT", "compact"),
            ],
        );

        assert_eq!(config.service_context.service_name, "gosholo-worker");
        assert_eq!(config.service_context.environment, "production");
        assert_eq!(config.default_directive, "warn");
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn invalid_values_fall_back_with_warnings() {
        let config = config_with("backend", &[("LOG_LEVEL", "loud"), ("LOG_FORMAT", "xml")]);

        assert_eq!(config.default_directive, "info");
        assert_eq!(config.format, LogFormat::Full);
        assert_eq!(config.warnings.len(), 2);
    }
}
