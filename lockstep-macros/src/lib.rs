mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Polls every future concurrently inside the current task and resolves to a
/// tuple of their outputs once all of them are ready.
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let args = utils::split_args(input);

    match args.len() {
        0 => return "()".parse().unwrap(),
        1 => {
            let expr = utils::tokens_to_string(&args[0]);
            return format!("{{ {expr}.await }}").parse().unwrap();
        }
        _ => {}
    }

    let mut out = String::from("{\n");

    for (i, expr_tokens) in args.iter().enumerate() {
        let expr = utils::tokens_to_string(expr_tokens);
        out.push_str(&format!(
            "let mut __join{i} = (::std::boxed::Box::pin({expr}), ::core::option::Option::None::<_>);\n"
        ));
    }

    out.push_str("::std::future::poll_fn(move |cx| {\n");
    out.push_str("    use ::std::future::Future;\n");
    out.push_str("    use ::std::task::Poll;\n");
    out.push_str("    let mut __pending = false;\n");

    for i in 0..args.len() {
        out.push_str(&format!(
            "    if __join{i}.1.is_none() {{\n\
                     match __join{i}.0.as_mut().poll(cx) {{\n\
                         Poll::Ready(val) => __join{i}.1 = ::core::option::Option::Some(val),\n\
                         Poll::Pending => __pending = true,\n\
                     }}\n\
                 }}\n"
        ));
    }

    out.push_str("    if __pending {\n");
    out.push_str("        return Poll::Pending;\n");
    out.push_str("    }\n");
    out.push_str("    Poll::Ready((\n");
    for i in 0..args.len() {
        out.push_str(&format!("        __join{i}.1.take().unwrap(),\n"));
    }
    out.push_str("    ))\n");
    out.push_str("}).await\n");
    out.push_str("}\n");

    utils::parse_or_compile_error("join", &out)
}

/// Resolves with the handler of the first branch whose future completes.
///
/// Branches have the form `future => handler`, where `handler` is a closure
/// receiving the branch output. Losing branches are dropped.
#[proc_macro]
pub fn select(input: TokenStream) -> TokenStream {
    let branches = utils::parse_select_branches(input);

    if branches.is_empty() {
        return "()".parse().unwrap();
    }

    let generics = (0..branches.len())
        .map(|i| format!("__T{i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::from("{\n");

    out.push_str(&format!("enum __Selected<{generics}> {{\n"));
    for i in 0..branches.len() {
        out.push_str(&format!("    __B{i}(__T{i}),\n"));
    }
    out.push_str("}\n");

    for (i, (future, _)) in branches.iter().enumerate() {
        out.push_str(&format!(
            "let mut __select{i} = ::std::boxed::Box::pin({future});\n"
        ));
    }

    out.push_str("let __winner = ::std::future::poll_fn(move |cx| {\n");
    out.push_str("    use ::std::future::Future;\n");
    out.push_str("    use ::std::task::Poll;\n");
    for i in 0..branches.len() {
        out.push_str(&format!(
            "    if let Poll::Ready(val) = __select{i}.as_mut().poll(cx) {{\n\
                     return Poll::Ready(__Selected::__B{i}(val));\n\
                 }}\n"
        ));
    }
    out.push_str("    Poll::Pending\n");
    out.push_str("}).await;\n");

    out.push_str("match __winner {\n");
    for (i, (_, handler)) in branches.iter().enumerate() {
        out.push_str(&format!("    __Selected::__B{i}(val) => ({handler})(val),\n"));
    }
    out.push_str("}\n");
    out.push_str("}\n");

    utils::parse_or_compile_error("select", &out)
}

/// Turns `async fn main` into a synchronous entry point driven by a
/// `lockstep` runtime.
///
/// Accepts `worker_threads = N`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let builder = utils::runtime_builder(&attr.to_string());

    wrap_body(item, |body| {
        format!(
            "{{
                let runtime = {builder};
                runtime.block_on(async move {{ {body} }})
            }}"
        )
    })
}

/// Runs an `async fn` test on a fresh `lockstep` runtime.
///
/// Accepts `worker_threads = N`, like [`macro@main`].
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let builder = utils::runtime_builder(&attr.to_string());

    let wrapped = wrap_body(item, |body| {
        format!(
            "{{
                let runtime = {builder};
                runtime.block_on(async move {{ {body} }});
            }}"
        )
    });

    let mut out: TokenStream = "#[test]".parse().unwrap();
    out.extend(wrapped);
    out
}

/// Strips the `async` keyword from a function item and replaces its body
/// with the block produced by `render`.
fn wrap_body(item: TokenStream, render: impl FnOnce(String) -> String) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return "compile_error!(\"expected a function body\");".parse().unwrap();
    };

    let body = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let block = match render(body).parse::<TokenStream>() {
        Ok(block) => block,
        Err(err) => {
            let msg = format!("invalid function body: {err}");
            return format!("compile_error!({msg:?});").parse().unwrap();
        }
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, block));
    tokens.into_iter().collect()
}
