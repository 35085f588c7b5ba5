use std::env;

use crate::telemetry::config::json_mode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl OutputConfig {
    /// `SHOP_OUTPUT_FORMAT` wins; otherwise `--json` selects JSON.
    pub fn from_env() -> Self {
        let format = parse_format(env::var("SHOP_OUTPUT_FORMAT").ok().as_deref(), json_mode());
        let pretty = parse_flag(env::var("SHOP_OUTPUT_PRETTY").ok().as_deref());
        OutputConfig { format, pretty }
    }
}

fn parse_format(v: Option<&str>, json_flag: bool) -> OutputFormat {
    match v {
        Some("json") => OutputFormat::Json,
        Some("text") => OutputFormat::Text,
        _ if json_flag => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

fn parse_flag(v: Option<&str>) -> bool {
    matches!(v, Some(v) if v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_format_overrides_flag() {
        assert_eq!(parse_format(Some("text"), true), OutputFormat::Text);
        assert_eq!(parse_format(Some("json"), false), OutputFormat::Json);
        assert_eq!(parse_format(None, true), OutputFormat::Json);
        assert_eq!(parse_format(Some("yaml"), false), OutputFormat::Text);
    }

    #[test]
    fn pretty_flag_values() {
        assert!(parse_flag(Some("TRUE")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("no")));
        assert!(!parse_flag(None));
    }
}
