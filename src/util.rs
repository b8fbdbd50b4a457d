use std::{
    future::Future,
    io,
    path::{Component, Path, PathBuf},
};

use crate::{constant, platform::InteractionContext};

/// Runs the [body] and tells the user that something went wrong if it fails.
///
/// The error itself is only logged; the user receives a generic ephemeral reply.
pub async fn run_and_report_error(
    interaction: &dyn InteractionContext,
    command: &str,
    body: impl Future<Output = anyhow::Result<()>>,
) {
    if let Err(err) = body.await {
        error!(command, "Error while executing command: {err:?}");

        if let Err(err) = interaction
            .reply(constant::message::EXECUTION_ERROR, true)
            .await
        {
            warn!(command, "Failed to report the error to the user: {err:?}");
        }
    }
}

/// Makes `path` absolute and resolves `.` and `..` without touching the filesystem.
pub fn normalize(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    Ok(normalized)
}

/// Whether `symbol` ends with `discriminator`, ignoring case.
pub fn has_discriminator(symbol: &str, discriminator: &str) -> bool {
    symbol
        .to_lowercase()
        .ends_with(&discriminator.to_lowercase())
}

/// `symbol` without its trailing `discriminator`, if it has one.
pub fn strip_discriminator<'a>(symbol: &'a str, discriminator: &str) -> &'a str {
    let Some(split) = symbol.len().checked_sub(discriminator.len()) else {
        return symbol;
    };

    match (symbol.get(..split), symbol.get(split..)) {
        (Some(head), Some(tail)) if tail.eq_ignore_ascii_case(discriminator) => head,
        _ => symbol,
    }
}

/// `PingPong` -> `ping-pong`, `HTTPStatus` -> `http-status`
pub fn kebab_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ') {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }

        if c.is_uppercase() && !out.is_empty() && !out.ends_with('-') {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());

            if prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower)
            {
                out.push('-');
            }
        }

        out.extend(c.to_lowercase());
    }

    out
}

/// `MessageCreate` -> `messageCreate`
pub fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `OwnerOnly` -> `Owner only`
pub fn display_name(name: &str) -> String {
    let words = kebab_case(name).replace('-', " ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether `content` is a prefixed invocation of any of the `variants`.
///
/// Multi-word variants match in their dashed, underscored and joined forms,
/// so `"say hello"` is triggered by `.say-hello`, `.say_hello` and `.sayhello`.
pub fn variants_message_trigger(content: &str, variants: &[&str]) -> bool {
    let Some(rest) = content.strip_prefix(constant::MESSAGE_PREFIX) else {
        return false;
    };
    let rest = rest.to_lowercase();

    variants
        .iter()
        .flat_map(|variant| {
            let words: Vec<_> = variant
                .to_lowercase()
                .split(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | '.' | ','))
                .filter(|word| !word.is_empty())
                .map(str::to_owned)
                .collect();

            match words.len() {
                0 => vec![],
                1 => words,
                _ => vec![words.join("-"), words.join("_"), words.join("")],
            }
        })
        .any(|word| rest.starts_with(&word))
}
