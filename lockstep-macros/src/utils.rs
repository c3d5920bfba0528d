use proc_macro::{TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Only top-level commas separate arguments; commas nested inside
/// delimited groups belong to their group token.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Converts a slice of tokens back into Rust source.
///
/// A space is inserted between consecutive identifiers so that `move x`
/// does not collapse into `movex`.
pub(crate) fn tokens_to_string(tokens: &[TokenTree]) -> String {
    let mut out = String::new();
    let mut prev_was_ident = false;

    for t in tokens {
        let is_ident = matches!(t, TokenTree::Ident(_));

        if prev_was_ident && is_ident {
            out.push(' ');
        }

        out.push_str(&t.to_string());
        prev_was_ident = is_ident;
    }

    out
}

/// Parses generated source, turning a lexer failure into a `compile_error!`
/// that names the macro.
pub(crate) fn parse_or_compile_error(name: &str, source: &str) -> TokenStream {
    source.parse().unwrap_or_else(|err| {
        let msg = format!("{name} macro error: {err}");
        format!("compile_error!({msg:?});").parse().unwrap()
    })
}

/// Renders the `RuntimeBuilder` expression for `#[main]` and `#[test]`.
///
/// The only recognised option is `worker_threads = N`; anything else is
/// ignored and leaves the builder defaults in place.
pub(crate) fn runtime_builder(attr: &str) -> String {
    let mut builder = String::from("::lockstep::RuntimeBuilder::new()");

    for part in attr.split(',') {
        let Some(value) = part.trim().strip_prefix("worker_threads") else {
            continue;
        };

        if let Ok(n) = value.trim_start_matches([' ', '=']).trim().parse::<usize>() {
            builder.push_str(&format!(".worker_threads({n})"));
        }
    }

    builder.push_str(".build()");
    builder
}

fn is_arrow(tokens: &[TokenTree], i: usize) -> bool {
    matches!(
        (tokens.get(i), tokens.get(i + 1)),
        (Some(TokenTree::Punct(p1)), Some(TokenTree::Punct(p2)))
            if p1.as_char() == '=' && p2.as_char() == '>'
    )
}

/// Parses `future => handler` branches.
///
/// Branches missing either side are skipped.
pub(crate) fn parse_select_branches(input: TokenStream) -> Vec<(String, String)> {
    let mut branches = Vec::new();

    for tokens in split_args(input) {
        let split = (0..tokens.len()).find(|&i| is_arrow(&tokens, i));

        let Some(arrow) = split else {
            continue;
        };

        let future = tokens_to_string(&tokens[..arrow]);
        let handler = tokens_to_string(&tokens[arrow + 2..]);

        if !future.trim().is_empty() && !handler.trim().is_empty() {
            branches.push((future, handler));
        }
    }

    branches
}
