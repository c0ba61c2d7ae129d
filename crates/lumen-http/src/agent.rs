use once_cell::sync::Lazy;

/// Environment variable overriding the default user agent.
pub const AGENT_ENV_VAR: &str = "HTTP_AGENT";

static DEFAULT_USER_AGENT: Lazy<String> =
    Lazy::new(|| agent_from(std::env::var(AGENT_ENV_VAR).ok()));

/// The process-wide default `User-Agent` value.
///
/// Read once from [`AGENT_ENV_VAR`] on first use and fixed afterwards. When the
/// variable is unset or blank, `lumen/<version> (<os>; <arch>)` is used.
pub fn default_user_agent() -> &'static str {
    &DEFAULT_USER_AGENT
}

fn agent_from(env_value: Option<String>) -> String {
    match env_value {
        Some(value) if !value.trim().is_empty() => value,
        _ => format!(
            "lumen/{} ({}; {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        ),
    }
}
