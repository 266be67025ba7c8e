use crate::strings::quoted;
use crate::types::Object;
use itertools::Itertools;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// Strings are quoted and escaped, as they would be written in source.
    ReadableRepresentation,
    /// Strings are written out verbatim, as `print` does.
    Directly,
}

pub fn pr_str(object: &Object, mode: PrintMode) -> String {
    use Object::*;
    let readable = |obj: &Object| pr_str(obj, PrintMode::ReadableRepresentation);
    match object {
        Integer(value) => value.to_string(),
        Boolean(value) => value.to_string(),
        String(s) => match mode {
            PrintMode::ReadableRepresentation => quoted(s),
            PrintMode::Directly => s.clone(),
        },
        Null => "null".into(),
        ReturnValue(inner) => pr_str(inner, mode),
        Error(message) => format!("ERROR: {}", message),
        Array(elements) => format!("[{}]", elements.borrow().iter().map(readable).join(", ")),
        Hash(pairs) => format!(
            "{{{}}}",
            pairs
                .values()
                .map(|pair| format!("{}: {}", readable(&pair.key), readable(&pair.value)))
                .join(", ")
        ),
        Function(closure) => format!("fn{}", closure),
        Macro(closure) => format!("macro{}", closure),
        Builtin(builtin) => format!("builtin function {}", builtin.name),
        Quote(node) => format!("QUOTE({})", node),
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", pr_str(self, PrintMode::ReadableRepresentation))
    }
}
