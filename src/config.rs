//! Run configuration.

use std::env;
use std::ffi::OsStr;

use crate::model::TestUnit;

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Colour pass/fail lines with ANSI escapes
    pub color: bool,
    /// Print the discovery count and each unit before it runs
    pub verbose: bool,
    /// Run only units tagged with one of these categories (all units when empty)
    pub categories: Vec<String>,
    /// Run only units whose `Class.method` contains this substring
    pub keyword: Option<String>,
    /// Stop after the first failed unit
    pub fail_fast: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            color: true,
            verbose: false,
            categories: Vec::new(),
            keyword: None,
            fail_fast: false,
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, with colour turned off when `NO_COLOR` is set.
    pub fn from_env() -> Self {
        Self::default().with_color(color_allowed(env::var_os("NO_COLOR").as_deref()))
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Whether `unit` passes the category and keyword filters.
    pub fn matches(&self, unit: &TestUnit) -> bool {
        let category_ok = self.categories.is_empty() || self.categories.iter().any(|c| unit.has_category(c));
        let keyword_ok = self
            .keyword
            .as_deref()
            .is_none_or(|k| unit.qualified_name().contains(k));
        category_ok && keyword_ok
    }
}

/// `NO_COLOR` disables colour when present and non-empty.
fn color_allowed(no_color: Option<&OsStr>) -> bool {
    no_color.is_none_or(OsStr::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitKind;
    use crate::value::Value;

    fn unit(class: &str, method: &str, categories: &[&str]) -> TestUnit {
        TestUnit {
            class_name: class.to_string(),
            method_name: method.to_string(),
            method_index: 0,
            is_static: true,
            kind: UnitKind::Call {
                args: Vec::new(),
                expected: Value::Null,
            },
            timeout: None,
            expected_exception: None,
            expected_output: None,
            comparer: None,
            ignored: false,
            categories: categories.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert!(config.color);
        assert!(!config.verbose);
        assert!(!config.fail_fast);
        assert!(config.matches(&unit("Calculator", "echo", &[])));
    }

    #[test]
    fn test_category_filter() {
        let config = RunConfig::new().with_category("Simple").with_category("Fast");
        assert!(config.matches(&unit("Calculator", "double_value", &["Simple"])));
        assert!(config.matches(&unit("Calculator", "fast_test", &["Slow", "Fast"])));
        assert!(!config.matches(&unit("Calculator", "echo", &[])));
    }

    #[test]
    fn test_keyword_filter_on_qualified_name() {
        let config = RunConfig::new().with_keyword("Calculator.ec");
        assert!(config.matches(&unit("Calculator", "echo", &[])));
        assert!(!config.matches(&unit("MathOps", "echo", &[])));
    }

    #[test]
    fn test_filters_combine() {
        let config = RunConfig::new().with_category("Simple").with_keyword("double");
        assert!(config.matches(&unit("Calculator", "double_value", &["Simple"])));
        assert!(!config.matches(&unit("Calculator", "double_value", &[])));
        assert!(!config.matches(&unit("Calculator", "echo", &["Simple"])));
    }

    #[test]
    fn test_no_color_variable() {
        assert!(color_allowed(None));
        assert!(color_allowed(Some(OsStr::new(""))));
        assert!(!color_allowed(Some(OsStr::new("1"))));
    }
}
