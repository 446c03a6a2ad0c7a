// Copyright 2026 The Sajumon Project
// SPDX-License-Identifier: Apache-2.0

use super::error::ConfigError;

/// Lookup used to resolve `${NAME}` references. Production reads the process
/// environment; tests pass a closure over a fixed map.
pub trait VarLookup {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads variables from the process environment.
pub struct ProcessEnv;

impl VarLookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> VarLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Expand `${NAME}` and `${NAME:-fallback}` references.
///
/// `${NAME}` with `NAME` unset is an error; the `:-` form substitutes the
/// fallback (possibly empty) instead. An unterminated `${` is kept literally.
pub fn resolve_variables(input: &str, vars: &dyn VarLookup) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let expr = &after[..end];
        let (name, fallback) = match expr.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (expr, None),
        };

        if name.is_empty() {
            out.push_str(&rest[start..start + 2 + end + 1]);
        } else {
            match (vars.get(name), fallback) {
                (Some(value), _) => out.push_str(&value),
                (None, Some(fallback)) => out.push_str(fallback),
                (None, None) => {
                    return Err(ConfigError::UndefinedVariable {
                        name: name.to_string(),
                    })
                }
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
