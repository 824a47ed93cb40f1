//! Macros, the macro environment and recursive macro expansion
//!
//! A macro body is plain text containing references of the form `$name` or
//! `$name(arg, ...)`. Expansion resolves each reference against the call's
//! own parameters first and the [`Environment`] second.

use crate::template::error::TemplateError;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

/// Character introducing a macro reference
pub const SIGIL: char = '$';

/// Reference tolerated when undefined; left in the output untouched
pub const IGNORED_MARKER: &str = "$Id";

/// Maximum nesting of parameterized macro calls
pub const MAX_EXPANSION_DEPTH: usize = 64;

/// `$name` optionally followed by `(args)`
///
/// Group 1 is the name including the sigil, group 2 the raw argument list.
static MACRO_EXPRESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$[A-Za-z0-9_]+)(?:\(([^)]*)\))?").expect("macro expression pattern")
});

/// A whole string that is exactly one macro call
static MACRO_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\$[A-Za-z0-9_]+)\s*(?:\(([^)]*)\))?\s*$").expect("macro call pattern")
});

/// Add the sigil to `name` unless it is already there
pub fn with_sigil(name: &str) -> String {
    if name.starts_with(SIGIL) {
        name.to_string()
    } else {
        format!("{}{}", SIGIL, name)
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_identifier_char)
}

fn validate_name(name: &str) -> Result<String, TemplateError> {
    let name = with_sigil(name.trim());
    if !is_identifier(&name[SIGIL.len_utf8()..]) {
        return Err(TemplateError::InvalidMacro {
            reason: format!("'{}' is not a valid macro name", name),
        });
    }
    Ok(name)
}

/// A named, optionally parameterized text template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    name: String,
    body: String,
    params: Vec<String>,
}

impl Macro {
    /// Create a macro. Name and parameter names get the sigil added if missing.
    pub fn new<S: AsRef<str>>(
        name: &str,
        body: impl Into<String>,
        params: &[S],
    ) -> Result<Self, TemplateError> {
        if name.trim().is_empty() {
            return Err(TemplateError::InvalidMacro {
                reason: "macro name must not be empty".to_string(),
            });
        }

        let name = validate_name(name)?;
        let params = params
            .iter()
            .map(|p| validate_name(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            body: body.into(),
            params,
        })
    }

    /// Create a macro without parameters
    pub fn constant(name: &str, body: impl Into<String>) -> Result<Self, TemplateError> {
        Self::new::<&str>(name, body, &[])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Expand the body with `args` bound to the formal parameters
    ///
    /// Returns the empty string when the body contains no macro reference at
    /// all. The environment is never modified.
    ///
    /// # Errors
    ///
    /// - `ArityMismatch` if `args` and the parameter list differ in length
    /// - `UndefinedMacro` for a reference that is neither a parameter nor in `env`
    /// - `MacroCycle` / `ExpansionTooDeep` for runaway recursion
    pub fn evaluate<S: AsRef<str>>(
        &self,
        args: &[S],
        env: &Environment,
    ) -> Result<String, TemplateError> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        let mut stack = vec![self.name.clone()];
        self.expand(&args, env, &mut stack)
    }

    fn call(
        &self,
        args: &[&str],
        env: &Environment,
        stack: &mut Vec<String>,
    ) -> Result<String, TemplateError> {
        if stack.iter().any(|active| active == &self.name) {
            let mut chain = stack.clone();
            chain.push(self.name.clone());
            return Err(TemplateError::MacroCycle { chain });
        }
        if stack.len() >= MAX_EXPANSION_DEPTH {
            return Err(TemplateError::ExpansionTooDeep {
                name: self.name.clone(),
                limit: MAX_EXPANSION_DEPTH,
            });
        }

        stack.push(self.name.clone());
        let result = self.expand(args, env, stack);
        stack.pop();
        result
    }

    fn expand(
        &self,
        args: &[&str],
        env: &Environment,
        stack: &mut Vec<String>,
    ) -> Result<String, TemplateError> {
        if self.params.len() != args.len() {
            return Err(TemplateError::ArityMismatch {
                name: self.name.clone(),
                expected: self.params.len(),
                got: args.len(),
            });
        }

        let bindings: HashMap<&str, &str> = self
            .params
            .iter()
            .map(String::as_str)
            .zip(args.iter().copied())
            .collect();

        // Distinct token texts in order of first occurrence, with their
        // expansion; `None` keeps the token verbatim.
        let mut expansions: Vec<(&str, Option<String>)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut found = false;

        for caps in MACRO_EXPRESSION.captures_iter(&self.body) {
            found = true;
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let (token, name) = (token.as_str(), name.as_str());
            if !seen.insert(token) {
                continue;
            }

            let expanded = if let Some(value) = bindings.get(name) {
                Some(value.to_string())
            } else if let Some(callee) = env.get(name) {
                if callee.params.is_empty() {
                    Some(callee.body.clone())
                } else {
                    let call_args = caps
                        .get(2)
                        .map(|m| split_arguments(m.as_str()))
                        .unwrap_or_default();
                    let call_args: Vec<&str> = call_args.iter().map(String::as_str).collect();
                    Some(callee.call(&call_args, env, stack)?)
                }
            } else if name == IGNORED_MARKER {
                None
            } else {
                return Err(TemplateError::UndefinedMacro {
                    name: name.to_string(),
                });
            };

            expansions.push((token, expanded));
        }

        if !found {
            return Ok(String::new());
        }

        let mut expanded = self.body.clone();
        for (token, expansion) in &expansions {
            if let Some(text) = expansion {
                expanded = replace_token(&expanded, token, text);
            }
        }

        Ok(expanded)
    }
}

/// Replace every occurrence of `token` in `text` with `expansion`
///
/// An occurrence directly followed by an identifier character is part of a
/// longer reference (`$a` inside `$ab`) and is kept.
fn replace_token(text: &str, token: &str, expansion: &str) -> String {
    let guarded = token.ends_with(is_identifier_char);
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for (start, _) in text.match_indices(token) {
        let end = start + token.len();
        if guarded && text[end..].starts_with(is_identifier_char) {
            continue;
        }
        out.push_str(&text[last..start]);
        out.push_str(expansion);
        last = end;
    }
    out.push_str(&text[last..]);

    out
}

/// Split a call's argument list on top-level commas
///
/// Each argument is trimmed; one surrounding pair of double quotes or square
/// brackets is removed. Commas inside quotes or brackets do not split.
pub fn split_arguments(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut depth = 0usize;

    for c in list.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '[' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            ']' if !in_quotes => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if !in_quotes && depth == 0 => {
                args.push(unwrap_argument(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    args.push(unwrap_argument(&current));

    args
}

fn unwrap_argument(raw: &str) -> String {
    let arg = raw.trim();
    if arg.len() >= 2
        && ((arg.starts_with('"') && arg.ends_with('"'))
            || (arg.starts_with('[') && arg.ends_with(']')))
    {
        arg[1..arg.len() - 1].trim().to_string()
    } else {
        arg.to_string()
    }
}

/// A parsed invocation: callee name plus literal arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCall {
    pub name: String,
    pub args: Vec<String>,
}

impl MacroCall {
    /// Parse text consisting of exactly one `$name` or `$name(args)` call
    pub fn parse(text: &str) -> Option<Self> {
        let caps = MACRO_CALL.captures(text)?;
        let name = caps.get(1)?.as_str().to_string();
        let args = caps
            .get(2)
            .map(|m| split_arguments(m.as_str()))
            .unwrap_or_default();
        Some(Self { name, args })
    }

    /// Evaluate the callee from `env` with this call's arguments
    pub fn expand(&self, env: &Environment) -> Result<String, TemplateError> {
        let callee = env
            .get(&self.name)
            .ok_or_else(|| TemplateError::UndefinedMacro {
                name: self.name.clone(),
            })?;
        callee.evaluate(&self.args, env)
    }
}

/// Global macro namespace, keyed by name (sigil included)
#[derive(Debug, Clone, Default)]
pub struct Environment {
    macros: BTreeMap<String, Macro>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a macro, returning the one it replaced
    pub fn define(&mut self, mac: Macro) -> Option<Macro> {
        self.macros.insert(mac.name.clone(), mac)
    }

    /// Look up a macro; the sigil may be omitted
    pub fn get(&self, name: &str) -> Option<&Macro> {
        if name.starts_with(SIGIL) {
            self.macros.get(name)
        } else {
            self.macros.get(&with_sigil(name))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    /// Macros in name order
    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }
}

impl Extend<Macro> for Environment {
    fn extend<I: IntoIterator<Item = Macro>>(&mut self, iter: I) {
        for mac in iter {
            self.define(mac);
        }
    }
}

impl FromIterator<Macro> for Environment {
    fn from_iter<I: IntoIterator<Item = Macro>>(iter: I) -> Self {
        let mut env = Environment::new();
        env.extend(iter);
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(macros: Vec<Macro>) -> Environment {
        macros.into_iter().collect()
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Macro::constant("", "");
        assert!(matches!(result, Err(TemplateError::InvalidMacro { .. })));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let result = Macro::constant("$foo bar", "x");
        assert!(matches!(result, Err(TemplateError::InvalidMacro { .. })));
    }

    #[test]
    fn test_sigil_added_to_names() {
        let m = Macro::new("foo", "$a", &["a"]).unwrap();
        assert_eq!(m.name(), "$foo");
        assert_eq!(m.params(), &["$a".to_string()]);
    }

    #[test]
    fn test_body_without_references_expands_to_empty() {
        let m = Macro::constant("foo", "int main(void) { return 0; }").unwrap();
        let result = m.evaluate::<&str>(&[], &Environment::new()).unwrap();
        assert_eq!(result, "");
    }

    #[test]
    fn test_wrong_argument_count() {
        let m = Macro::new("foo", "bar", &["a", "b"]).unwrap();
        let env = Environment::new();

        for args in [vec![], vec!["c"], vec!["c", "d", "e"]] {
            match m.evaluate(&args, &env) {
                Err(TemplateError::ArityMismatch {
                    name,
                    expected,
                    got,
                }) => {
                    assert_eq!(name, "$foo");
                    assert_eq!(expected, 2);
                    assert_eq!(got, args.len());
                }
                other => panic!("Expected ArityMismatch, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_evaluate_parameter() {
        let m = Macro::new("foo", "Hello $name", &["$name"]).unwrap();
        let result = m.evaluate(&["John"], &Environment::new()).unwrap();
        assert_eq!(result, "Hello John");
    }

    #[test]
    fn test_evaluate_multiline() {
        let m = Macro::new("foo", "I'm $name\nI'm from $country", &["$name", "$country"]).unwrap();
        let result = m.evaluate(&["Tom", "Canada"], &Environment::new()).unwrap();
        assert_eq!(result, "I'm Tom\nI'm from Canada");
    }

    #[test]
    fn test_evaluate_constant_from_env() {
        let m = Macro::constant("foo", "Hello $name").unwrap();
        let env = env_with(vec![Macro::constant("$name", "John").unwrap()]);
        assert_eq!(m.evaluate::<&str>(&[], &env).unwrap(), "Hello John");
    }

    #[test]
    fn test_constant_body_is_not_expanded() {
        let m = Macro::constant("foo", "x = $outer").unwrap();
        let env = env_with(vec![Macro::constant("$outer", "$undefined_inner").unwrap()]);
        assert_eq!(m.evaluate::<&str>(&[], &env).unwrap(), "x = $undefined_inner");
    }

    #[test]
    fn test_evaluate_parameterized_from_env() {
        let m = Macro::constant("foo", r#"$print("John", "Smith")"#).unwrap();
        let env = env_with(vec![
            Macro::new("$print", "printf($family, $last)", &["$family", "$last"]).unwrap(),
        ]);
        assert_eq!(m.evaluate::<&str>(&[], &env).unwrap(), "printf(John, Smith)");
    }

    #[test]
    fn test_nested_parameterized_calls() {
        let env = env_with(vec![
            Macro::new("$add", "($x + $y)", &["$x", "$y"]).unwrap(),
            Macro::new("$check", "if ($add(a, b) != $want) fail();", &["$want"]).unwrap(),
            Macro::new("$a", "$unused", &["$unused"]).unwrap(),
        ]);
        let m = Macro::constant("test", "$check(3)").unwrap();
        assert_eq!(m.evaluate::<&str>(&[], &env).unwrap(), "if ((a + b) != 3) fail();");
    }

    #[test]
    fn test_parameter_shadows_environment() {
        let env = env_with(vec![Macro::constant("$x", "global").unwrap()]);
        let m = Macro::new("foo", "$x", &["$x"]).unwrap();
        assert_eq!(m.evaluate(&["local"], &env).unwrap(), "local");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let m = Macro::new("foo", "$v + $v == 2 * $v", &["$v"]).unwrap();
        assert_eq!(m.evaluate(&["1"], &Environment::new()).unwrap(), "1 + 1 == 2 * 1");
    }

    #[test]
    fn test_prefix_tokens_are_distinct() {
        let m = Macro::new("foo", "$a $ab", &["$a", "$ab"]).unwrap();
        assert_eq!(m.evaluate(&["1", "2"], &Environment::new()).unwrap(), "1 2");
    }

    #[test]
    fn test_tokens_replaced_in_order_of_appearance() {
        // the expansion of `$x` is rewritten by the later `$y` replacement
        let m = Macro::new("foo", "$x $y", &["$x", "$y"]).unwrap();
        assert_eq!(m.evaluate(&["$y", "Q"], &Environment::new()).unwrap(), "Q Q");
    }

    #[test]
    fn test_replace_token_keeps_longer_references() {
        assert_eq!(replace_token("$a $ab $a_1 $a.", "$a", "X"), "X $ab $a_1 X.");
        assert_eq!(replace_token("f($f(1)) $f(1)", "$f(1)", "ok"), "f(ok) ok");
    }

    #[test]
    fn test_undefined_macro() {
        let m = Macro::constant("foo", "value: $missing").unwrap();
        match m.evaluate::<&str>(&[], &Environment::new()) {
            Err(TemplateError::UndefinedMacro { name }) => assert_eq!(name, "$missing"),
            other => panic!("Expected UndefinedMacro, got {:?}", other),
        }
    }

    #[test]
    fn test_ignored_marker_left_verbatim() {
        let m = Macro::new("foo", "/* $Id */ $v", &["$v"]).unwrap();
        assert_eq!(m.evaluate(&["1"], &Environment::new()).unwrap(), "/* $Id */ 1");
    }

    #[test]
    fn test_only_one_marker_is_ignored() {
        let m = Macro::constant("foo", "$Revision").unwrap();
        assert!(matches!(
            m.evaluate::<&str>(&[], &Environment::new()),
            Err(TemplateError::UndefinedMacro { .. })
        ));
    }

    #[test]
    fn test_self_recursion_detected() {
        let env = env_with(vec![Macro::new("$loop", "$loop($n)", &["$n"]).unwrap()]);
        let m = env.get("$loop").unwrap();
        match m.evaluate(&["1"], &env) {
            Err(TemplateError::MacroCycle { chain }) => {
                assert_eq!(chain, vec!["$loop".to_string(), "$loop".to_string()]);
            }
            other => panic!("Expected MacroCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_mutual_recursion_detected() {
        let env = env_with(vec![
            Macro::new("$a", "$b($x)", &["$x"]).unwrap(),
            Macro::new("$b", "$a($y)", &["$y"]).unwrap(),
        ]);
        let m = Macro::constant("top", "$a(1)").unwrap();
        match m.evaluate::<&str>(&[], &env) {
            Err(TemplateError::MacroCycle { chain }) => {
                assert_eq!(chain, vec!["$top", "$a", "$b", "$a"]);
            }
            other => panic!("Expected MacroCycle, got {:?}", other),
        }
    }

    #[test]
    fn test_expansion_depth_limited() {
        let count = MAX_EXPANSION_DEPTH + 5;
        let env: Environment = (0..count)
            .map(|i| {
                let body = if i + 1 == count {
                    "$p".to_string()
                } else {
                    format!("$m{}(x)", i + 1)
                };
                Macro::new(&format!("m{}", i), body, &["$p"]).unwrap()
            })
            .collect();

        let m = env.get("$m0").unwrap();
        match m.evaluate(&["x"], &env) {
            Err(TemplateError::ExpansionTooDeep { name, limit }) => {
                assert_eq!(name, format!("$m{}", MAX_EXPANSION_DEPTH));
                assert_eq!(limit, MAX_EXPANSION_DEPTH);
            }
            other => panic!("Expected ExpansionTooDeep, got {:?}", other),
        }
    }

    #[test]
    fn test_environment_not_mutated() {
        let env = env_with(vec![Macro::new("$f", "<$x>", &["$x"]).unwrap()]);
        let m = Macro::constant("top", "$f(1)").unwrap();
        m.evaluate::<&str>(&[], &env).unwrap();
        assert_eq!(env.len(), 1);
        assert!(!env.contains("$x"));
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(split_arguments(""), Vec::<String>::new());
        assert_eq!(split_arguments(" a , b "), vec!["a", "b"]);
        assert_eq!(split_arguments(r#""x, y", z"#), vec!["x, y", "z"]);
        assert_eq!(split_arguments("[1, 2], 3"), vec!["1, 2", "3"]);
        assert_eq!(split_arguments("a,"), vec!["a", ""]);
    }

    #[test]
    fn test_macro_call_parse() {
        let call = MacroCall::parse("$test_add(int, 1, 2)").unwrap();
        assert_eq!(call.name, "$test_add");
        assert_eq!(call.args, vec!["int", "1", "2"]);

        let bare = MacroCall::parse(" $plain ").unwrap();
        assert!(bare.args.is_empty());

        assert!(MacroCall::parse("test(1)").is_none());
        assert!(MacroCall::parse("$a(1) trailing").is_none());
    }

    #[test]
    fn test_environment_redefine_replaces() {
        let mut env = Environment::new();
        assert!(env.define(Macro::constant("x", "1").unwrap()).is_none());
        let old = env.define(Macro::constant("$x", "2").unwrap()).unwrap();
        assert_eq!(old.body(), "1");
        assert_eq!(env.get("x").unwrap().body(), "2");
    }
}
