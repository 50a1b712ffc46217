//! Variable emission sink.
//!
//! All resolved configuration leaves the engine through an [`Emitter`]:
//!
//! - `set`:    `NAME=tok tok`   (overwrite)
//! - `append`: `NAME+=tok tok`  (accumulate, call order preserved)
//! - `big`:    an indented conditional block, dedented before output
//! - `raw`:    a pre-formatted block, written verbatim
//!
//! Output is buffered; callers flush it only after the whole resolution
//! succeeded.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::errors::{ConfResult, ConfigureError};

/// Conversion of a value into output tokens.
///
/// Strings are taken as-is, integers in decimal, booleans as `yes`/`no`.
/// `None` contributes nothing and sequences flatten.
pub trait ToTokens {
    fn push_tokens(&self, out: &mut Vec<String>);

    fn to_tokens(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.push_tokens(&mut out);
        out
    }
}

impl ToTokens for str {
    fn push_tokens(&self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl ToTokens for String {
    fn push_tokens(&self, out: &mut Vec<String>) {
        out.push(self.clone());
    }
}

impl ToTokens for bool {
    fn push_tokens(&self, out: &mut Vec<String>) {
        out.push(if *self { "yes" } else { "no" }.to_string());
    }
}

impl ToTokens for i64 {
    fn push_tokens(&self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl ToTokens for u32 {
    fn push_tokens(&self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl ToTokens for () {
    fn push_tokens(&self, _out: &mut Vec<String>) {}
}

impl<T: ToTokens> ToTokens for Option<T> {
    fn push_tokens(&self, out: &mut Vec<String>) {
        if let Some(value) = self {
            value.push_tokens(out);
        }
    }
}

impl<T: ToTokens> ToTokens for [T] {
    fn push_tokens(&self, out: &mut Vec<String>) {
        for value in self {
            value.push_tokens(out);
        }
    }
}

impl<T: ToTokens, const N: usize> ToTokens for [T; N] {
    fn push_tokens(&self, out: &mut Vec<String>) {
        self.as_slice().push_tokens(out);
    }
}

impl<T: ToTokens> ToTokens for Vec<T> {
    fn push_tokens(&self, out: &mut Vec<String>) {
        self.as_slice().push_tokens(out);
    }
}

impl<T: ToTokens + ?Sized> ToTokens for &T {
    fn push_tokens(&self, out: &mut Vec<String>) {
        (**self).push_tokens(out);
    }
}

/// Collect heterogeneous values into one token list.
///
/// ```ignore
/// em.append("CFLAGS", tokens![c_flags, "$DEBUG_INFO_FLAGS", optimize]);
/// ```
macro_rules! tokens {
    ($($value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut out: Vec<String> = Vec::new();
        $( $crate::emit::ToTokens::push_tokens(&$value, &mut out); )*
        out
    }};
}

pub(crate) use tokens;

/// Convert a raw JSON parameter into tokens.
///
/// Only strings, integers, booleans, `null` and arrays of those are
/// accepted; anything else is a fatal error.
pub fn json_tokens(value: &Value) -> ConfResult<Vec<String>> {
    let mut out = Vec::new();
    push_json(value, &mut out)?;
    Ok(out)
}

fn push_json(value: &Value, out: &mut Vec<String>) -> ConfResult<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => b.push_tokens(out),
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.push_tokens(out),
            None => {
                return Err(ConfigureError::UnsupportedValue {
                    kind: "float",
                    value: n.to_string(),
                })
            }
        },
        Value::Array(items) => {
            for item in items {
                push_json(item, out)?;
            }
        }
        Value::Object(_) => {
            return Err(ConfigureError::UnsupportedValue {
                kind: "object",
                value: value.to_string(),
            })
        }
    }
    Ok(())
}

/// Strip the indentation of the first non-empty line from a block.
///
/// Leading empty lines are dropped and the block is prefixed with a single
/// empty line. An all-empty block renders as nothing.
pub fn dedent(text: &str) -> String {
    let mut output = String::new();
    let mut prefix: Option<usize> = None;

    for line in text.split('\n') {
        let width = match prefix {
            Some(width) => width,
            None => {
                if line.is_empty() {
                    continue;
                }
                let width = line.chars().take_while(|c| *c == ' ').count();
                prefix = Some(width);
                output.push('\n');
                width
            }
        };

        output.push_str(line.get(width..).unwrap_or(""));
        output.push('\n');
    }

    output
}

/// Buffered line-oriented output.
#[derive(Debug, Default, Clone)]
pub struct Emitter {
    out: String,
}

impl Emitter {
    /// Create an empty emitter.
    pub fn new() -> Self {
        Emitter::default()
    }

    /// `NAME=tokens`
    pub fn set(&mut self, name: &str, value: impl ToTokens) {
        self.write_assignment(name, "=", &value.to_tokens());
    }

    /// `NAME=` with no value.
    pub fn set_empty(&mut self, name: &str) {
        self.write_assignment(name, "=", &[]);
    }

    /// `NAME+=tokens`
    pub fn append(&mut self, name: &str, value: impl ToTokens) {
        self.write_assignment(name, "+=", &value.to_tokens());
    }

    /// Emit an indented block after stripping its common indentation.
    pub fn big(&mut self, text: &str) {
        self.out.push_str(&dedent(text));
    }

    /// Emit a pre-formatted block verbatim.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Emitted text so far.
    pub fn as_str(&self) -> &str {
        &self.out
    }

    /// Consume the emitter and return the rendered text.
    pub fn into_string(self) -> String {
        self.out
    }

    fn write_assignment(&mut self, name: &str, op: &str, tokens: &[String]) {
        self.out.push_str(name);
        self.out.push_str(op);
        self.out.push_str(&tokens.join(" "));
        self.out.push('\n');
    }
}

/// A named set of variables dumped in sorted order.
///
/// A variable may be declared absent; absent variables render as `NAME=`
/// unless replaced by a sentinel with [`VariableSet::reset_if_any_absent`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VariableSet {
    vars: BTreeMap<String, Option<Vec<String>>>,
}

impl VariableSet {
    /// Create an empty variable set.
    pub fn new() -> Self {
        VariableSet::default()
    }

    /// Replace a variable's tokens.
    pub fn set(&mut self, name: impl Into<String>, value: impl ToTokens) {
        self.vars.insert(name.into(), Some(value.to_tokens()));
    }

    /// Extend a variable's tokens, creating it if needed.
    pub fn append(&mut self, name: impl Into<String>, value: impl ToTokens) {
        let slot = self.vars.entry(name.into()).or_insert(None);
        slot.get_or_insert_with(Vec::new)
            .extend(value.to_tokens());
    }

    /// Declare a variable without a value.
    pub fn declare_absent(&mut self, name: impl Into<String>) {
        self.vars.insert(name.into(), None);
    }

    /// Set or clear a variable from an optional value.
    pub fn set_opt(&mut self, name: impl Into<String>, value: Option<impl ToTokens>) {
        match value {
            Some(value) => self.set(name, value),
            None => self.declare_absent(name),
        }
    }

    /// Tokens of a variable, `None` if unknown or absent.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.vars.get(name).and_then(|v| v.as_deref())
    }

    /// Variable names in dump order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Replace each variable for which `lookup` yields a value.
    pub fn override_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for (name, value) in self.vars.iter_mut() {
            if let Some(replacement) = lookup(name) {
                *value = Some(vec![replacement]);
            }
        }
    }

    /// If any variable is absent, set every variable to `sentinel`.
    pub fn reset_if_any_absent(&mut self, sentinel: &str) {
        if self.vars.values().any(Option::is_none) {
            for value in self.vars.values_mut() {
                *value = Some(vec![sentinel.to_string()]);
            }
        }
    }

    /// Emit every variable as `NAME=...` in sorted name order.
    pub fn dump(&self, em: &mut Emitter) {
        for (name, value) in &self.vars {
            match value {
                Some(tokens) => em.set(name, tokens),
                None => em.set_empty(name),
            }
        }
    }
}
