use ahash::AHashSet;
use regex::Regex;
use serde_json::Value;

/// Finds the workflow variables a value refers to.
pub trait ReferenceExtractor: Send + Sync {
    /// Returns every referenced variable key, written in `${name}` form, found anywhere
    /// inside `value` (strings nested in arrays and objects included).
    fn extract_refs(&self, value: &Value) -> AHashSet<String>;
}

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "for", "lambda", "True", "False", "None",
];

/// The default extractor for `${...}` expressions.
///
/// Every identifier inside an expression counts as a reference, except keywords,
/// quoted text, and names that follow a `.` (attribute and method access). So
/// `${a + b.upper()}` refers to `${a}` and `${b}`.
///
/// An expression body may hold one level of braces, such as a dict literal in
/// `${ {'k': a}['k'] }`. Deeper nesting ends the match early and the expression is
/// skipped, so variables used only there are not seen.
pub struct TokenExtractor {
    expression: Regex,
    quoted: Regex,
    identifier: Regex,
}

impl TokenExtractor {
    pub fn new() -> Self {
        Self {
            expression: Regex::new(r"\$\{((?:[^{}]|\{[^{}]*\})*)\}").expect("valid expression pattern"),
            quoted: Regex::new(r#""[^"]*"|'[^']*'"#).expect("valid quote pattern"),
            identifier: Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*").expect("valid identifier pattern"),
        }
    }

    fn scan_str(&self, text: &str, refs: &mut AHashSet<String>) {
        for cap in self.expression.captures_iter(text) {
            let body = self.quoted.replace_all(&cap[1], " ");
            for m in self.identifier.find_iter(&body) {
                let name = m.as_str();
                if KEYWORDS.contains(&name) {
                    continue;
                }
                if body[..m.start()].trim_end().ends_with('.') {
                    continue;
                }
                refs.insert(format!("${{{}}}", name));
            }
        }
    }

    fn scan(&self, value: &Value, refs: &mut AHashSet<String>) {
        match value {
            Value::String(s) => self.scan_str(s, refs),
            Value::Array(items) => items.iter().for_each(|v| self.scan(v, refs)),
            Value::Object(map) => map.values().for_each(|v| self.scan(v, refs)),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor for TokenExtractor {
    fn extract_refs(&self, value: &Value) -> AHashSet<String> {
        let mut refs = AHashSet::new();
        self.scan(value, &mut refs);
        refs
    }
}
