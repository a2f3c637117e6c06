/// Turns raw command lines into a resolved command plus arguments
use crate::command::{Command, Registry};
use std::sync::Arc;

/// The deepest command reached and the tokens it did not consume
#[derive(Debug, Clone)]
pub struct Resolved {
    pub command: Arc<Command>,
    /// Canonical names from the top-level command down to `command`
    pub path: Vec<String>,
    pub args: Vec<String>,
}

/// Split a line into tokens after `prefix`.
///
/// Returns `None` when the line does not start with the prefix or has nothing
/// after it.
pub fn tokenize(line: &str, prefix: &str) -> Option<Vec<String>> {
    let body = line.strip_prefix(prefix)?;
    let tokens: Vec<String> = body.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

/// Walk `registry` with `tokens`.
///
/// The first token must match a top-level name or alias, otherwise the result
/// is `None`. Each following token descends one level for as long as it names
/// a subcommand of the command reached so far; the first non-matching token
/// and everything after it become the arguments.
pub fn resolve<S: AsRef<str>>(registry: &Registry, tokens: &[S]) -> Option<Resolved> {
    let (first, rest) = tokens.split_first()?;
    let mut command = Arc::clone(registry.get(first.as_ref())?);
    let mut path = vec![command.name.clone()];
    let mut consumed = 1;

    for token in rest {
        if command.subcommands.is_empty() {
            break;
        }
        let Some(sub) = command.subcommands.get(token.as_ref()).map(Arc::clone) else {
            break;
        };
        path.push(sub.name.clone());
        command = sub;
        consumed += 1;
    }

    Some(Resolved {
        command,
        path,
        args: tokens[consumed..]
            .iter()
            .map(|t| t.as_ref().to_string())
            .collect(),
    })
}
