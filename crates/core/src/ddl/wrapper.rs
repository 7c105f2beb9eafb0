use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// A bare shell token: letters, digits, and a handful of punctuation marks
/// that no shell treats specially on their own (spec §4.4).
static BARE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_./:@=+-]+$").expect("valid regex"));
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Z_]+)\}").expect("valid regex"));

/// Values substitutable into a `host-wrapper`/`ddl-wrapper`/`alter-wrapper`
/// template (spec §4.4). Each field corresponds to one `{PLACEHOLDER}`.
#[derive(Debug, Clone, Default)]
pub struct WrapperContext {
    pub ddl: Option<String>,
    pub table: Option<String>,
    pub schema: Option<String>,
    pub r#type: Option<String>,
    pub size: Option<String>,
    pub clauses: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub socket: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// `{PASSWORDX}`: the same secret, masked for printable/log-safe display.
    pub password_masked: Option<String>,
    pub connect_options: Option<String>,
    pub dirname: Option<String>,
    pub dirpath: Option<String>,
    pub environment: Option<String>,
}

impl WrapperContext {
    fn lookup(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "DDL" => self.ddl.as_deref(),
            "TABLE" => self.table.as_deref(),
            "SCHEMA" => self.schema.as_deref(),
            "TYPE" => self.r#type.as_deref(),
            "SIZE" => self.size.as_deref(),
            "CLAUSES" => self.clauses.as_deref(),
            "HOST" => self.host.as_deref(),
            "PORT" => self.port.as_deref(),
            "SOCKET" => self.socket.as_deref(),
            "USER" => self.user.as_deref(),
            "PASSWORD" => self.password.as_deref(),
            "PASSWORDX" => self.password_masked.as_deref(),
            "CONNOPTS" => self.connect_options.as_deref(),
            "DIRNAME" => self.dirname.as_deref(),
            "DIRPATH" => self.dirpath.as_deref(),
            "ENVIRONMENT" => self.environment.as_deref(),
            _ => None,
        }
    }
}

/// Expands a wrapper template's `{PLACEHOLDER}` tokens, shell-quoting each
/// substituted value unless the whole value is already a bare token (spec
/// §4.4). An undefined placeholder is an error rather than a silent empty
/// substitution, since a dropped `{PASSWORD}` would otherwise run the
/// wrapper command against the wrong instance silently.
pub fn wrap(template: &str, context: &WrapperContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut last_end = 0;

    for capture in PLACEHOLDER.captures_iter(template) {
        let whole = capture.get(0).expect("capture 0 always present");
        let placeholder = &capture[1];
        out.push_str(&template[last_end..whole.start()]);

        let value = context
            .lookup(placeholder)
            .ok_or_else(|| Error::wrapper_interpolation(template, placeholder))?;
        out.push_str(&shell_quote(value));

        last_end = whole.end();
    }
    out.push_str(&template[last_end..]);

    Ok(out)
}

/// Splits a wrapper template into argv tokens and substitutes each token's
/// `{PLACEHOLDER}`s with the raw (unquoted) value. This is what actually runs
/// via `std::process::Command`, which already treats each argv element as one
/// opaque argument — no shell is ever invoked, so there is nothing to quote
/// against (spec §4.4 Non-goal: no shell metacharacter interpretation).
pub fn wrap_argv(template: &str, context: &WrapperContext) -> Result<Vec<String>> {
    template.split_whitespace().map(|token| substitute_token(token, context)).collect()
}

fn substitute_token(token: &str, context: &WrapperContext) -> Result<String> {
    let mut out = String::with_capacity(token.len());
    let mut last_end = 0;

    for capture in PLACEHOLDER.captures_iter(token) {
        let whole = capture.get(0).expect("capture 0 always present");
        let placeholder = &capture[1];
        out.push_str(&token[last_end..whole.start()]);

        let value = context.lookup(placeholder).ok_or_else(|| Error::wrapper_interpolation(token, placeholder))?;
        out.push_str(value);

        last_end = whole.end();
    }
    out.push_str(&token[last_end..]);

    Ok(out)
}

fn shell_quote(value: &str) -> String {
    if !value.is_empty() && BARE_TOKEN.is_match(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_values_are_not_quoted() {
        let template = "mysql -h {HOST} -P {PORT} -u {USER}";
        let context = WrapperContext {
            host: Some("db1.internal".to_string()),
            port: Some("3306".to_string()),
            user: Some("root".to_string()),
            ..WrapperContext::default()
        };
        assert_eq!(wrap(template, &context).unwrap(), "mysql -h db1.internal -P 3306 -u root");
    }

    #[test]
    fn values_with_spaces_are_single_quoted() {
        let template = "echo {DDL}";
        let context = WrapperContext {
            ddl: Some("ALTER TABLE `t1` ADD COLUMN `x` int".to_string()),
            ..WrapperContext::default()
        };
        let rendered = wrap(template, &context).unwrap();
        assert_eq!(rendered, "echo 'ALTER TABLE `t1` ADD COLUMN `x` int'");
    }

    #[test]
    fn embedded_single_quotes_are_escaped() {
        let template = "echo {DDL}";
        let context = WrapperContext { ddl: Some("it's here".to_string()), ..WrapperContext::default() };
        assert_eq!(wrap(template, &context).unwrap(), r"echo 'it'\''s here'");
    }

    #[test]
    fn undefined_placeholder_is_an_error() {
        let template = "echo {NOT_A_FIELD}";
        let err = wrap(template, &WrapperContext::default()).unwrap_err();
        assert!(matches!(err, Error::WrapperInterpolation { .. }));
    }
}
