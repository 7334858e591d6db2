//! Polaris CLI argument handling.
//!
//! The argument string from the build-step configuration is split into
//! arguments on whitespace, honouring single quotes, double quotes and
//! backslash escapes. Outside single quotes it may reference build
//! environment variables as `${NAME}` or `$NAME`; `$$` produces a literal
//! `$`. References to unknown variables are left untouched.
//!
//! Variables are substituted while splitting, so a value is always literal
//! text inside the argument it appears in: quotes or spaces in a value never
//! start a new argument or a quoted section.
//!
//! # Example
//!
//! ```
//! use polaris_step::config::prepare_arguments;
//! use std::collections::HashMap;
//!
//! let vars = HashMap::from([
//!     ("BRANCH".to_string(), "main".to_string()),
//!     ("PROJECT".to_string(), "my project".to_string()),
//! ]);
//! let args = prepare_arguments("analyze -w --branch ${BRANCH} --name $PROJECT", &vars).unwrap();
//! assert_eq!(args, vec!["analyze", "-w", "--branch", "main", "--name", "my project"]);
//! ```

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{PolarisError, Result};

/// Expand variable references against `vars`.
pub fn expand_variables(input: &str, vars: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            expand_reference(&mut chars, vars, &mut result);
        } else {
            result.push(c);
        }
    }

    result
}

/// Expand the reference following a `$` that was just consumed.
fn expand_reference(chars: &mut Peekable<Chars<'_>>, vars: &HashMap<String, String>, out: &mut String) {
    match chars.peek() {
        Some('$') => {
            chars.next();
            out.push('$');
        }
        Some('{') => {
            chars.next();
            let mut name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            match vars.get(&name) {
                Some(value) if closed => out.push_str(value),
                _ => {
                    out.push_str("${");
                    out.push_str(&name);
                    if closed {
                        out.push('}');
                    }
                }
            }
        }
        Some(&next) if next == '_' || next.is_ascii_alphabetic() => {
            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '_' || c.is_ascii_alphanumeric() {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            match vars.get(&name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('$');
                    out.push_str(&name);
                }
            }
        }
        _ => out.push('$'),
    }
}

/// Split an argument string into arguments without expanding variables.
///
/// # Errors
///
/// Returns `InvalidArguments` for an unterminated quote or a trailing
/// backslash.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    split(input, None)
}

/// Split an argument string into arguments, expanding variables from `vars`.
///
/// Whether an argument string is well formed never depends on `vars`.
///
/// # Errors
///
/// Returns `InvalidArguments` for an unterminated quote or a trailing
/// backslash.
pub fn prepare_arguments(input: &str, vars: &HashMap<String, String>) -> Result<Vec<String>> {
    split(input, Some(vars))
}

fn split(input: &str, vars: Option<&HashMap<String, String>>) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, vars) {
            ('\'', _) => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(invalid("unterminated single quote")),
                    }
                }
            }
            ('"', _) => {
                in_arg = true;
                loop {
                    match (chars.next(), vars) {
                        (Some('"'), _) => break,
                        (Some('\\'), _) => match chars.next() {
                            Some(escaped @ ('"' | '\\' | '$')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(invalid("unterminated double quote")),
                        },
                        (Some('$'), Some(vars)) => expand_reference(&mut chars, vars, &mut current),
                        (Some(c), _) => current.push(c),
                        (None, _) => return Err(invalid("unterminated double quote")),
                    }
                }
            }
            ('\\', _) => {
                in_arg = true;
                match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => return Err(invalid("trailing backslash")),
                }
            }
            ('$', Some(vars)) => {
                let before = current.len();
                expand_reference(&mut chars, vars, &mut current);
                // An unquoted reference to an empty value adds no argument.
                in_arg |= current.len() > before;
            }
            (c, _) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (c, _) => {
                in_arg = true;
                current.push(c);
            }
        }
    }

    if in_arg {
        args.push(current);
    }

    Ok(args)
}

fn invalid(message: &str) -> PolarisError {
    PolarisError::InvalidArguments {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<String, String> {
        HashMap::from([
            ("BUILD_NUMBER".to_string(), "42".to_string()),
            ("PROJECT".to_string(), "my project".to_string()),
        ])
    }

    #[test]
    fn expands_braced_and_bare_variables() {
        assert_eq!(
            expand_variables("--build ${BUILD_NUMBER} --n $BUILD_NUMBER.", &vars()),
            "--build 42 --n 42."
        );
    }

    #[test]
    fn leaves_unknown_variables_untouched() {
        assert_eq!(expand_variables("${MISSING} $ALSO_MISSING", &vars()), "${MISSING} $ALSO_MISSING");
    }

    #[test]
    fn double_dollar_is_literal() {
        assert_eq!(expand_variables("$${BUILD_NUMBER} $$", &vars()), "${BUILD_NUMBER} $");
    }

    #[test]
    fn unterminated_brace_is_kept() {
        assert_eq!(expand_variables("x ${BUILD_NUMBER", &vars()), "x ${BUILD_NUMBER");
    }

    #[test]
    fn lone_dollar_is_kept() {
        assert_eq!(expand_variables("cost $5 $", &vars()), "cost $5 $");
    }

    #[test]
    fn tokenizes_on_whitespace() {
        assert_eq!(
            tokenize("  analyze   -w\t--issue ").unwrap(),
            vec!["analyze", "-w", "--issue"]
        );
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            tokenize(r#"--name "my project" --tag 'a b' x"y z""#).unwrap(),
            vec!["--name", "my project", "--tag", "a b", "xy z"]
        );
    }

    #[test]
    fn empty_quotes_produce_empty_argument() {
        assert_eq!(tokenize(r#"--empty """#).unwrap(), vec!["--empty", ""]);
    }

    #[test]
    fn backslash_escapes() {
        assert_eq!(
            tokenize(r#"a\ b "c\"d" 'e\f'"#).unwrap(),
            vec!["a b", "c\"d", "e\\f"]
        );
    }

    #[test]
    fn unterminated_quote_is_error() {
        let err = tokenize("--name 'oops").unwrap_err();
        assert!(err.to_string().contains("unterminated single quote"));
        assert!(tokenize("\"oops").is_err());
        assert!(tokenize("trailing\\").is_err());
    }

    #[test]
    fn blank_input_has_no_arguments() {
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn variable_values_stay_in_one_argument() {
        assert_eq!(
            prepare_arguments("--name ${PROJECT}", &vars()).unwrap(),
            vec!["--name", "my project"]
        );
        assert_eq!(
            prepare_arguments("--name \"${PROJECT} ${BUILD_NUMBER}\" --n=$BUILD_NUMBER", &vars()).unwrap(),
            vec!["--name", "my project 42", "--n=42"]
        );
    }

    #[test]
    fn quotes_in_variable_values_are_literal() {
        let vars = HashMap::from([("MESSAGE".to_string(), "it's \"done".to_string())]);
        assert_eq!(
            prepare_arguments("--co project.description=$MESSAGE analyze", &vars).unwrap(),
            vec!["--co", "project.description=it's \"done", "analyze"]
        );
    }

    #[test]
    fn single_quotes_and_escapes_suppress_expansion() {
        assert_eq!(
            prepare_arguments(r#"'${BUILD_NUMBER}' \$BUILD_NUMBER "\$BUILD_NUMBER" $$BUILD_NUMBER"#, &vars()).unwrap(),
            vec!["${BUILD_NUMBER}", "$BUILD_NUMBER", "$BUILD_NUMBER", "$BUILD_NUMBER"]
        );
    }

    #[test]
    fn empty_unquoted_value_adds_no_argument() {
        let vars = HashMap::from([("EMPTY".to_string(), String::new())]);
        assert_eq!(prepare_arguments("a $EMPTY b \"$EMPTY\"", &vars).unwrap(), vec!["a", "b", ""]);
    }

    #[test]
    fn syntax_errors_do_not_depend_on_variables() {
        let vars = HashMap::from([("QUOTE".to_string(), "'".to_string())]);
        assert!(prepare_arguments("--x $QUOTE", &vars).is_ok());
        assert!(prepare_arguments("--x '$QUOTE", &vars).is_err());
        assert!(prepare_arguments("--x '$QUOTE", &HashMap::new()).is_err());
    }
}
