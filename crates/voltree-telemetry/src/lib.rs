//! OpenTelemetry integration for voltree.
//!
//! Provides the OTel tracing layer and a sampler that keeps every browser
//! session and zip download span while thinning out the per-directory and
//! per-file spans a large walk produces.
//!
//! # Activation
//!
//! Build with the `telemetry` feature. Export then activates when standard
//! OTel environment variables are set:
//!
//! ```bash
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://localhost:4317 voltree zip /data
//!
//! OTEL_SERVICE_NAME=voltree \
//! OTEL_EXPORTER_OTLP_ENDPOINT=http://jaeger:4317 \
//! OTEL_TRACES_EXPORTER=otlp \
//! voltree ls /data --depth 2
//! ```
//!
//! Set `OTEL_SDK_DISABLED=true` to disable even when the endpoint is set.

#[cfg(feature = "telemetry")]
mod otel;

#[cfg(feature = "telemetry")]
pub use otel::{OtelGuard, otel_layer};

/// Failure to set up span export.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(String),
    #[error("failed to start exporter runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Check whether OTel export should be enabled.
///
/// True when `OTEL_SDK_DISABLED` is not `"true"` and either
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set or `OTEL_TRACES_EXPORTER` is set to
/// something other than `"none"`.
pub fn otel_enabled() -> bool {
    enabled_from(|key| std::env::var(key).ok())
}

fn enabled_from(var: impl Fn(&str) -> Option<String>) -> bool {
    if var("OTEL_SDK_DISABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        return false;
    }

    if var("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        return true;
    }

    match var("OTEL_TRACES_EXPORTER") {
        Some(exporter) => !exporter.eq_ignore_ascii_case("none"),
        None => false,
    }
}

/// Sampling rate for a span name, before parent and error overrides.
///
/// | Prefix       | Rate |
/// |--------------|------|
/// | `browser.*`  | 100% |
/// | `zip.read`   |   1% |
/// | `zip.*`      | 100% |
/// | `listing.*`  |  10% |
/// | other        |  10% |
pub fn sample_rate(name: &str) -> f64 {
    if name.starts_with("zip.read") {
        0.01
    } else if name.starts_with("browser") || name.starts_with("zip") {
        1.0
    } else {
        0.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_disabled_without_env() {
        assert!(!enabled_from(env(&[])));
    }

    #[test]
    fn test_endpoint_enables() {
        assert!(enabled_from(env(&[(
            "OTEL_EXPORTER_OTLP_ENDPOINT",
            "http://localhost:4317"
        )])));
    }

    #[test]
    fn test_sdk_disabled_wins() {
        assert!(!enabled_from(env(&[
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
            ("OTEL_SDK_DISABLED", "TRUE"),
        ])));
    }

    #[test]
    fn test_traces_exporter_none() {
        assert!(!enabled_from(env(&[("OTEL_TRACES_EXPORTER", "none")])));
        assert!(enabled_from(env(&[("OTEL_TRACES_EXPORTER", "otlp")])));
    }

    #[test]
    fn test_sample_rates() {
        assert_eq!(sample_rate("browser.open"), 1.0);
        assert_eq!(sample_rate("zip.walk"), 1.0);
        assert_eq!(sample_rate("zip.read"), 0.01);
        assert_eq!(sample_rate("listing.fetch"), 0.1);
        assert_eq!(sample_rate("something"), 0.1);
    }
}
