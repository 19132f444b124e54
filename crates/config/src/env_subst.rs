/// Replace `${ENV_VAR}` placeholders in config string values.
///
/// `${ENV_VAR:-fallback}` yields `fallback` when the variable is unset or
/// empty. Unresolvable placeholders without a fallback are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable lookup, so tests never touch
/// the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next(); // '{'

        let mut body = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            body.push(c);
        }

        if !closed || body.is_empty() {
            // Malformed, emit literally.
            result.push_str("${");
            result.push_str(&body);
            continue;
        }

        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body.as_str(), None),
        };

        match (lookup(name).filter(|v| !v.is_empty()), fallback) {
            (Some(value), _) => result.push_str(&value),
            (None, Some(fallback)) => result.push_str(fallback),
            (None, None) => {
                result.push_str("${");
                result.push_str(&body);
                result.push('}');
            },
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "OSS_URL" => Some("https://oss.example.net".into()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env_with("url = \"${OSS_URL}/login\"", lookup),
            "url = \"https://oss.example.net/login\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(substitute_env_with("${OSS_NOPE}", lookup), "${OSS_NOPE}");
    }

    #[test]
    fn fallback_used_for_missing_or_empty() {
        assert_eq!(substitute_env_with("${OSS_NOPE:-guest}", lookup), "guest");
        assert_eq!(substitute_env_with("${EMPTY:-guest}", lookup), "guest");
        assert_eq!(
            substitute_env_with("${OSS_URL:-unused}", lookup),
            "https://oss.example.net"
        );
    }

    #[test]
    fn malformed_placeholder_is_literal() {
        assert_eq!(
            substitute_env_with("cost: ${unterminated", lookup),
            "cost: ${unterminated"
        );
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain $text"), "plain $text");
    }
}
