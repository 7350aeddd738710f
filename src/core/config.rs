use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Closed set of provider family implementations that can back a configured
/// provider key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    Standard,
    StandardTrembita,
    Trembita,
    Signer,
}

impl ProviderFamily {
    /// Parse the `provider` field of a dynamic provider entry. Unknown values
    /// are rejected by the caller at registry build time.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::Standard),
            "standardTrembita" => Some(Self::StandardTrembita),
            "trembita" => Some(Self::Trembita),
            "signer" => Some(Self::Signer),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::StandardTrembita => "standardTrembita",
            Self::Trembita => "trembita",
            Self::Signer => "signer",
        };
        write!(f, "{}", name)
    }
}

/// Dynamically configured provider entry. The key it is registered under is
/// arbitrary; `provider` names the family implementation backing it.
#[derive(Debug, Clone, Deserialize)]
pub struct DynamicProviderConfig {
    pub provider: String,
}

/// X-Road subsystem identity quadruple used in envelope headers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct XroadIdentity {
    #[serde(rename = "xRoadInstance")]
    pub instance: String,
    #[serde(rename = "memberClass")]
    pub member_class: String,
    #[serde(rename = "memberCode")]
    pub member_code: String,
    #[serde(rename = "subsystemCode")]
    pub subsystem_code: String,
}

/// Header block for one target service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrembitaHeaderConfig {
    pub client: XroadIdentity,
    pub service: XroadIdentity,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "bodyNamespace", default)]
    pub body_namespace: Option<String>,
}

/// Trembita-specific configuration block: a default header plus per-service
/// overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrembitaConfig {
    #[serde(rename = "trembitaHeader", default)]
    pub header: Option<TrembitaHeaderConfig>,
    #[serde(rename = "serviceList", default)]
    pub service_list: HashMap<String, TrembitaHeaderConfig>,
}

impl TrembitaConfig {
    /// Header for the given target service, falling back to the default
    /// header. Having neither is a fatal configuration error.
    pub fn header_for(&self, service: &str) -> Result<&TrembitaHeaderConfig, AppError> {
        self.service_list
            .get(service)
            .or(self.header.as_ref())
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ConfigurationError,
                    format!("no trembita header configured for service '{}'", service),
                )
                .with_code("PGW-CFG-002")
            })
    }
}

/// Operational configuration consumed by the decorator registry. An explicit
/// value threaded through construction; decorator logic performs no ambient
/// config lookups.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub providers: HashMap<String, DynamicProviderConfig>,
    #[serde(default)]
    pub trembita: TrembitaConfig,
}

impl GatewayConfig {
    /// Load and validate gateway configuration from a YAML file.
    pub fn load_from_file(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|err| {
            AppError::new(
                ErrorCategory::ConfigurationError,
                format!("failed to read {}: {}", path.display(), err),
            )
            .with_code("PGW-CFG-001")
        })?;
        let config: GatewayConfig = serde_yaml::from_str(&text).map_err(|err| {
            AppError::new(
                ErrorCategory::ConfigurationError,
                format!("failed to parse {}: {}", path.display(), err),
            )
            .with_code("PGW-CFG-001")
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject unknown provider families eagerly, before the registry is built.
    pub fn validate(&self) -> Result<(), AppError> {
        for (key, entry) in &self.providers {
            if ProviderFamily::parse(&entry.provider).is_none() {
                return Err(AppError::new(
                    ErrorCategory::ConfigurationError,
                    format!(
                        "provider '{}' names unknown family '{}'",
                        key, entry.provider
                    ),
                )
                .with_code("PGW-REG-001"));
            }
        }
        Ok(())
    }
}
