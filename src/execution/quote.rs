//! Joining argument vectors into shell command lines.

use std::borrow::Cow;

use crate::Result;

/// Join arguments into one line a POSIX shell splits back into the same words.
///
/// Arguments are left bare when they only contain safe characters and quoted
/// otherwise (empty strings, whitespace, quotes, `$`, globs, newlines, ...).
/// Fails for arguments containing NUL bytes, which no shell can pass on.
pub fn join_posix<S: AsRef<str>>(args: &[S]) -> Result<String> {
    Ok(shlex::try_join(args.iter().map(AsRef::as_ref))?)
}

/// Quote one argument for a POSIX shell.
pub fn quote_posix(arg: &str) -> Result<Cow<'_, str>> {
    Ok(shlex::try_quote(arg)?)
}

fn is_powershell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '\\' | ':')
}

// PowerShell treats the typographic single quotes like `'`.
fn is_powershell_single_quote(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}

/// Quote one argument for PowerShell.
///
/// Unsafe arguments become single-quoted literals with embedded single quotes
/// doubled, so no variable expansion or escape processing happens.
pub fn quote_powershell(arg: &str) -> Cow<'_, str> {
    if !arg.is_empty() && arg.chars().all(is_powershell_safe) {
        return Cow::Borrowed(arg);
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if is_powershell_single_quote(c) {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}

/// Join arguments into one PowerShell command line.
///
/// A quoted program name is invoked with the call operator `&`, otherwise
/// PowerShell would just echo the string.
pub fn join_powershell<S: AsRef<str>>(args: &[S]) -> String {
    let mut parts: Vec<Cow<'_, str>> = args.iter().map(|a| quote_powershell(a.as_ref())).collect();
    if let (Some(first), Some(program)) = (parts.first_mut(), args.first()) {
        if first.as_ref() != program.as_ref() {
            *first = Cow::Owned(format!("& {}", first));
        }
    }
    parts.join(" ")
}
