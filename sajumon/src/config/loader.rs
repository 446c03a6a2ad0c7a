// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

use std::net::IpAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use sha2::{Digest, Sha256};

use super::defaults::*;
use super::error::ConfigError;
use super::interpolation::{resolve_variables, ProcessEnv, VarLookup};
use super::raw;
use super::source::ConfigSource;
use super::types::*;

/// Load and validate the service config, resolving `${VAR}` from the
/// process environment.
pub fn load_config(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    load_config_with(source, &ProcessEnv)
}

/// Load and validate the service config with an explicit variable lookup.
///
/// Steps:
/// 1. Read raw YAML from source
/// 2. Fingerprint it (SHA256)
/// 3. Parse into raw deserialization types
/// 4. Check the version marker
/// 5. Resolve interpolation, apply defaults and validate each section
pub fn load_config_with(
    source: &dyn ConfigSource,
    vars: &dyn VarLookup,
) -> Result<Config, ConfigError> {
    let raw_yaml = source.load()?;
    let fingerprint = compute_hash(&raw_yaml);

    let raw: raw::RawConfig = serde_yaml::from_str(&raw_yaml)?;

    if raw.sajumon != "v1" {
        return Err(ConfigError::Validation(format!(
            "unsupported config version \"{}\", expected \"v1\"",
            raw.sajumon
        )));
    }

    Ok(Config {
        version: raw.sajumon,
        server: build_server_config(raw.server)?,
        cors: build_cors_config(raw.cors, vars)?,
        upstream: build_upstream_config(raw.upstream, vars)?,
        prompts: build_prompt_config(raw.prompts)?,
        fingerprint,
    })
}

pub fn compute_hash(raw_yaml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_yaml.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}

fn build_server_config(raw: Option<raw::RawServerConfig>) -> Result<ServerConfig, ConfigError> {
    let (host, port) = match raw {
        Some(s) => (s.host, s.port),
        None => (None, None),
    };
    let host_str = host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let host: IpAddr = host_str.parse().map_err(|_| {
        ConfigError::Validation(format!("server.host \"{host_str}\" is not an IP address"))
    })?;
    Ok(ServerConfig {
        host,
        port: port.unwrap_or(DEFAULT_PORT),
    })
}

fn build_cors_config(
    raw: Option<raw::RawCorsConfig>,
    vars: &dyn VarLookup,
) -> Result<CorsConfig, ConfigError> {
    let raw = raw.unwrap_or(raw::RawCorsConfig {
        allowed_origins: None,
        allowed_methods: None,
        allowed_headers: None,
        allow_credentials: None,
    });

    let origins = raw
        .allowed_origins
        .unwrap_or_else(|| owned(DEFAULT_ALLOWED_ORIGINS));
    let mut allowed_origins = Vec::with_capacity(origins.len());
    for origin in &origins {
        let origin = resolve_variables(origin, vars)?;
        if origin == "*" {
            return Err(ConfigError::Validation(
                "cors.allowed_origins must list explicit origins, \"*\" is not allowed".into(),
            ));
        }
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "cors origin \"{origin}\" must start with http:// or https://"
            )));
        }
        let value = HeaderValue::from_str(origin.trim_end_matches('/')).map_err(|_| {
            ConfigError::Validation(format!("cors origin \"{origin}\" is not a valid header value"))
        })?;
        allowed_origins.push(value);
    }

    let allowed_methods = raw
        .allowed_methods
        .unwrap_or_else(|| owned(DEFAULT_ALLOWED_METHODS))
        .iter()
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes()).map_err(|_| {
                ConfigError::Validation(format!("cors method \"{m}\" is not an HTTP method"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let allowed_headers = raw
        .allowed_headers
        .unwrap_or_else(|| owned(DEFAULT_ALLOWED_HEADERS))
        .iter()
        .map(|h| {
            HeaderName::from_bytes(h.to_ascii_lowercase().as_bytes()).map_err(|_| {
                ConfigError::Validation(format!("cors header \"{h}\" is not a header name"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsConfig {
        allowed_origins,
        allowed_methods,
        allowed_headers,
        allow_credentials: raw.allow_credentials.unwrap_or(false),
    })
}

fn build_upstream_config(
    raw: Option<raw::RawUpstreamConfig>,
    vars: &dyn VarLookup,
) -> Result<UpstreamConfig, ConfigError> {
    let raw = raw.unwrap_or(raw::RawUpstreamConfig {
        base_url: None,
        wire: None,
        model: None,
        api_key: None,
        connect_timeout_ms: None,
        error_body_limit: None,
    });

    let base_url = resolve_variables(raw.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL), vars)?;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!(
            "upstream.base_url \"{base_url}\" must start with http:// or https://"
        )));
    }

    let wire = match raw.wire.as_deref().unwrap_or(DEFAULT_WIRE) {
        "responses" => WireFormat::Responses,
        "chat_completions" => WireFormat::ChatCompletions,
        other => {
            return Err(ConfigError::Validation(format!(
                "unknown upstream.wire \"{other}\", expected \"responses\" or \"chat_completions\""
            )))
        }
    };

    let model = resolve_variables(raw.model.as_deref().unwrap_or(DEFAULT_MODEL), vars)?;
    if model.trim().is_empty() {
        return Err(ConfigError::Validation("upstream.model must not be empty".into()));
    }

    let api_key = resolve_variables(raw.api_key.as_deref().unwrap_or(DEFAULT_API_KEY), vars)?;

    if raw.connect_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "upstream.connect_timeout_ms must be greater than 0".into(),
        ));
    }

    Ok(UpstreamConfig {
        base_url: base_url.trim_end_matches('/').to_string(),
        wire,
        model,
        api_key,
        connect_timeout_ms: raw.connect_timeout_ms,
        error_body_limit: raw.error_body_limit.unwrap_or(DEFAULT_ERROR_BODY_LIMIT),
    })
}

fn build_prompt_config(raw: Option<raw::RawPromptConfig>) -> Result<PromptConfig, ConfigError> {
    let (en, ko) = match raw {
        Some(p) => (p.en, p.ko),
        None => (None, None),
    };
    let prompts = PromptConfig {
        en: en.unwrap_or_else(|| DEFAULT_PROMPT_EN.to_string()),
        ko: ko.unwrap_or_else(|| DEFAULT_PROMPT_KO.to_string()),
    };
    if prompts.en.trim().is_empty() || prompts.ko.trim().is_empty() {
        return Err(ConfigError::Validation("prompts must not be empty".into()));
    }
    Ok(prompts)
}
