use std::{collections::HashSet, net::SocketAddr};

use eyre::Result;

use crate::config::models::{AuthConfig, GatewayConfig, RouteBindingConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum length accepted for the shared verification secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Route conflict detected: {message}")]
    RouteConflict { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Gateway configuration validator.
///
/// Runs once at startup; any error here is fatal and the process refuses to
/// serve. Serving with an undefined route table or a weak secret is never an
/// option.
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire gateway configuration
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        // Validate listen address
        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        // Validate routes
        if config.routes.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "routes".to_string(),
            });
        } else {
            for binding in &config.routes {
                if let Err(mut route_errors) = Self::validate_single_route(binding) {
                    errors.append(&mut route_errors);
                }
            }
        }

        if let Err(conflict_error_list) = Self::check_route_conflicts(&config.routes) {
            errors.extend(conflict_error_list);
        }

        if let Err(mut auth_errors) = Self::validate_auth_config(&config.auth) {
            errors.append(&mut auth_errors);
        }

        if config.upstream.response_timeout_secs == 0 {
            errors.push(ValidationError::InvalidField {
                field: "upstream.response_timeout_secs".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Validate a single route binding
    fn validate_single_route(binding: &RouteBindingConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let prefix = &binding.public_prefix;

        if !prefix.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: format!("route public_prefix: {prefix}"),
                message: "Public prefixes must start with '/'".to_string(),
            });
        }

        if binding.upstream.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("route '{prefix}' upstream"),
            });
        } else if let Err(e) =
            Self::validate_url(&binding.upstream, &format!("route '{prefix}' upstream"))
        {
            errors.push(e);
        }

        // Empty internal prefix means pure prefix-stripping and is valid.
        if !binding.internal_prefix.is_empty() && !binding.internal_prefix.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: format!("route '{prefix}' internal_prefix"),
                message: "Internal prefixes must be empty or start with '/'".to_string(),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate URL format
    fn validate_url(url_str: &str, context: &str) -> ValidationResult<()> {
        match url::Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: format!(
                            "URL scheme must be 'http' or 'https', got '{}'",
                            url.scheme()
                        ),
                    });
                }

                if url.host().is_none() {
                    return Err(ValidationError::InvalidField {
                        field: context.to_string(),
                        message: "URL must have a valid host".to_string(),
                    });
                }

                Ok(())
            }
            Err(e) => Err(ValidationError::InvalidField {
                field: context.to_string(),
                message: format!("Invalid URL format: {e}"),
            }),
        }
    }

    /// Public prefixes must be unique across the table; longest-prefix-match
    /// would otherwise be ambiguous.
    fn check_route_conflicts(
        routes: &[RouteBindingConfig],
    ) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for binding in routes {
            if !seen.insert(binding.public_prefix.as_str()) {
                errors.push(ValidationError::RouteConflict {
                    message: format!(
                        "public_prefix '{}' is bound more than once",
                        binding.public_prefix
                    ),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_auth_config(auth: &AuthConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if auth.secret.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "auth.secret".to_string(),
            });
        } else if auth.secret.len() < MIN_SECRET_LEN {
            errors.push(ValidationError::InvalidField {
                field: "auth.secret".to_string(),
                message: format!("Secret must be at least {MIN_SECRET_LEN} bytes"),
            });
        }

        for prefix in &auth.exempt_prefixes {
            if !prefix.starts_with('/') {
                errors.push(ValidationError::InvalidField {
                    field: format!("auth.exempt_prefixes: {prefix}"),
                    message: "Exempt prefixes must start with '/'".to_string(),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Format multiple errors into a readable message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        let mut message = format!("{} error(s) found:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {error}\n", i + 1));
        }
        message
    }
}
