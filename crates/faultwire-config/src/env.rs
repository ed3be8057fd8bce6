use std::sync::OnceLock;

use regex::Regex;

/// Expand `{{ env.VAR }}` placeholders in raw TOML
///
/// `{{ env.VAR | default("fallback") }}` substitutes the fallback when the
/// variable is unset. Comment lines are left untouched so that disabled
/// settings do not require their variables.
pub fn expand_env(input: &str) -> Result<String, String> {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
                .expect("must be valid regex")
        })
    }

    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut last_end = 0;
        for captures in re().captures_iter(line) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&line[last_end..whole.start()]);

            let var_name = key
                .as_str()
                .strip_prefix("env.")
                .filter(|name| !name.is_empty() && !name.contains('.'))
                .ok_or_else(|| format!("only `env.` placeholders are supported: `{}`", key.as_str()))?;

            match (std::env::var(var_name), captures.get(2)) {
                (Ok(value), _) => output.push_str(&value),
                (Err(_), Some(default)) => output.push_str(default.as_str()),
                (Err(_), None) => return Err(format!("environment variable not set: `{var_name}`")),
            }

            last_end = whole.end();
        }
        output.push_str(&line[last_end..]);
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_plain_text() {
        let input = "application = \"pets\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn substitutes_variables() {
        temp_env::with_var("FAULTWIRE_APP", Some("pet-store"), || {
            let result = expand_env("application = \"{{ env.FAULTWIRE_APP }}\"").unwrap();
            assert_eq!(result, "application = \"pet-store\"");
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        temp_env::with_var_unset("FAULTWIRE_MISSING", || {
            let err = expand_env("application = \"{{ env.FAULTWIRE_MISSING }}\"").unwrap_err();
            assert!(err.contains("FAULTWIRE_MISSING"));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("FAULTWIRE_CHARSET", || {
            let result = expand_env("charset = \"{{ env.FAULTWIRE_CHARSET | default(\"utf-8\") }}\"").unwrap();
            assert_eq!(result, "charset = \"utf-8\"");
        });
        temp_env::with_var("FAULTWIRE_CHARSET", Some("latin1"), || {
            let result = expand_env("charset = \"{{ env.FAULTWIRE_CHARSET | default(\"utf-8\") }}\"").unwrap();
            assert_eq!(result, "charset = \"latin1\"");
        });
    }

    #[test]
    fn rejects_other_scopes() {
        let err = expand_env("x = \"{{ vault.SECRET }}\"").unwrap_err();
        assert!(err.contains("only `env.`"));
    }

    #[test]
    fn comments_are_not_expanded() {
        temp_env::with_var_unset("FAULTWIRE_MISSING", || {
            let input = "  # application = \"{{ env.FAULTWIRE_MISSING }}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }
}
