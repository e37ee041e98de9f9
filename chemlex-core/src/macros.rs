//! `%name%` macro expansion for grammar text

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// Substitute every `%name%` reference, recursively. `%%` is a literal `%`.
pub fn expand(text: &str, macros: &BTreeMap<String, String>) -> Result<String> {
    let mut active = Vec::new();
    expand_inner(text, macros, &mut active)
}

fn expand_inner(
    text: &str,
    macros: &BTreeMap<String, String>,
    active: &mut Vec<String>,
) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('%') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('%') else {
            return Err(CoreError::malformed(
                text,
                text.len() - rest.len() + open,
                "unterminated macro reference",
            ));
        };
        let name = &after[..close];
        if name.is_empty() {
            out.push('%');
        } else {
            if active.iter().any(|a| a == name) {
                return Err(CoreError::RecursiveMacro {
                    name: name.to_string(),
                });
            }
            let body = macros.get(name).ok_or_else(|| CoreError::UndefinedMacro {
                name: name.to_string(),
            })?;
            active.push(name.to_string());
            let expanded = expand_inner(body, macros, active)?;
            active.pop();
            out.push_str(&expanded);
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
