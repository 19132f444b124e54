//! Configuration validation engine.
//!
//! Validates TOML, YAML and JSON configuration files against the known
//! schema, detects unknown/misspelled fields, and reports settings that would
//! make every scrape fail.

use std::{collections::HashMap, path::Path};

use {crate::schema::TicketscopeConfig, secrecy::ExposeSecret};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "portal", "security"
    pub category: &'static str,
    /// Dotted path, e.g. "portal.timeouts.login_ms"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration file.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    let server = Struct(HashMap::from([("bind", Leaf), ("port", Leaf)]));

    let browser = Struct(HashMap::from([
        ("chrome_path", Leaf),
        ("headless", Leaf),
        ("viewport_width", Leaf),
        ("viewport_height", Leaf),
        ("request_timeout_ms", Leaf),
        ("user_agent", Leaf),
        ("chrome_args", Leaf),
        ("ignore_certificate_errors", Leaf),
    ]));

    let timeouts = Struct(HashMap::from([
        ("navigation_ms", Leaf),
        ("login_ms", Leaf),
        ("quiescence_ms", Leaf),
        ("option_ms", Leaf),
        ("download_ms", Leaf),
    ]));

    let portal = Struct(HashMap::from([
        ("url", Leaf),
        ("username", Leaf),
        ("password", Leaf),
        ("job_context", Leaf),
        ("timeouts", timeouts),
        ("max_paging_steps", Leaf),
    ]));

    Struct(HashMap::from([
        ("server", server),
        ("browser", browser),
        ("portal", portal),
    ]))
}

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_len]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or discover the default config
/// file location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(ref actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "syntax",
                path: String::new(),
                message: "no config file found; using defaults and OSS_* environment".into(),
            }],
            config_path: None,
        };
    };

    let format = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml")
        .to_owned();

    match std::fs::read_to_string(actual_path) {
        Ok(content) => {
            let mut result = validate_str(&content, &format);
            result.config_path = Some(actual_path.clone());
            result
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: Some(actual_path.clone()),
        },
    }
}

/// Validate a TOML string without touching the filesystem.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    validate_str(toml_str, "toml")
}

/// Validate config text in the format named by `format` (a file extension:
/// `toml`, `yaml`, `yml` or `json`).
#[must_use]
pub fn validate_str(raw: &str, format: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let parsed: Result<serde_json::Value, String> = match format {
        "toml" => toml::from_str(raw).map_err(|e| format!("TOML syntax error: {e}")),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| format!("YAML syntax error: {e}")),
        "json" => serde_json::from_str(raw).map_err(|e| format!("JSON syntax error: {e}")),
        other => Err(format!("unsupported config format: .{other}")),
    };

    let value = match parsed {
        // An empty YAML document parses to null; treat it like an empty table.
        Ok(serde_json::Value::Null) => serde_json::Value::Object(serde_json::Map::new()),
        Ok(v) => v,
        Err(message) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message,
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &build_schema_map(), "", &mut diagnostics);

    match serde_json::from_value::<TicketscopeConfig>(value) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &serde_json::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (serde_json::Value::Object(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };

    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message,
        });
    }
}

fn check_semantics(config: &TicketscopeConfig, diagnostics: &mut Vec<Diagnostic>) {
    let portal = &config.portal;

    match portal.url.as_deref() {
        Some(raw) if !raw.contains("${") => match url::Url::parse(raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {},
            Ok(parsed) => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "portal",
                path: "portal.url".into(),
                message: format!("unsupported URL scheme '{}'", parsed.scheme()),
            }),
            Err(e) => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "portal",
                path: "portal.url".into(),
                message: format!("invalid URL: {e}"),
            }),
        },
        Some(_) => {},
        None => diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "portal",
            path: "portal.url".into(),
            message: "not set; OSS_URL must be provided in the environment".into(),
        }),
    }

    if portal.username.is_none() {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "portal",
            path: "portal.username".into(),
            message: "not set; OSS_USERNAME must be provided in the environment".into(),
        });
    }

    match portal.password.as_ref().map(|p| p.expose_secret().contains("${")) {
        None => diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "portal",
            path: "portal.password".into(),
            message: "not set; OSS_PASSWORD must be provided in the environment".into(),
        }),
        Some(true) => {},
        Some(false) => diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "security",
            path: "portal.password".into(),
            message: "password stored in the config file; prefer ${OSS_PASSWORD}".into(),
        }),
    }

    if portal.job_context.trim().is_empty() {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "portal",
            path: "portal.job_context".into(),
            message: "job context label must not be empty".into(),
        });
    }

    let timeouts = [
        ("navigation_ms", portal.timeouts.navigation_ms),
        ("login_ms", portal.timeouts.login_ms),
        ("quiescence_ms", portal.timeouts.quiescence_ms),
        ("option_ms", portal.timeouts.option_ms),
        ("download_ms", portal.timeouts.download_ms),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "portal",
                path: format!("portal.timeouts.{name}"),
                message: "wait budget must be greater than zero".into(),
            });
        }
    }

    if portal.max_paging_steps == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "portal",
            path: "portal.max_paging_steps".into(),
            message: "calendar paging needs at least one step".into(),
        });
    }

    let is_localhost = matches!(
        config.server.bind.as_str(),
        "127.0.0.1" | "localhost" | "::1"
    );
    if !is_localhost {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "security",
            path: "server.bind".into(),
            message: format!(
                "binding to {} exposes portal data without authentication",
                config.server.bind
            ),
        });
    }
}
