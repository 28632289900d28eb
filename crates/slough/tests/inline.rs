use pretty_assertions::assert_eq;
use slough::{INLINE_DEPTH_LIMIT, RewriteError, fold_module, inline_module, parse};

/// Inlines `source` and asserts the result parses equal to `expect`.
fn assert_inlines(source: &str, expect: &str) {
    let inlined = inline_module(parse(source, "test").unwrap()).unwrap();
    let expected = parse(expect, "test").unwrap();
    assert_eq!(inlined, expected, "inlining {source:?}");
}

/// Asserts inlining leaves `source` exactly as parsed.
fn assert_unchanged(source: &str) {
    let parsed = parse(source, "test").unwrap();
    let inlined = inline_module(parsed.clone()).unwrap();
    assert_eq!(inlined, parsed, "{source:?} should not inline");
}

#[test]
fn single_return_function_inlines_at_the_call_site() {
    assert_inlines(
        "def double(x):\n    return x * 2\ny = double(5)\n",
        "def double(x):\n    return x * 2\ny = 5 * 2\n",
    );
}

#[test]
fn inlining_then_folding_computes_the_result() {
    let source = "def double(x):\n    return x * 2\ny = double(5)\n";
    let module = fold_module(inline_module(parse(source, "test").unwrap()).unwrap());
    let expected = parse("def double(x):\n    return x * 2\ny = 10\n", "test").unwrap();
    assert_eq!(module, expected);
}

#[test]
fn argument_expressions_substitute_as_whole_nodes() {
    assert_inlines(
        "def inc(x):\n    return x + 1\ny = inc(a * b)\n",
        "def inc(x):\n    return x + 1\ny = (a * b) + 1\n",
    );
}

#[test]
fn zero_parameter_function() {
    assert_inlines(
        "def seven():\n    return 7\nx = seven()\n",
        "def seven():\n    return 7\nx = 7\n",
    );
}

#[test]
fn helper_chains_collapse_in_one_pass() {
    assert_inlines(
        "def double(x):\n    return x * 2\ndef quad(x):\n    return double(double(x))\ny = quad(3)\n",
        "def double(x):\n    return x * 2\ndef quad(x):\n    return (x * 2) * 2\ny = (3 * 2) * 2\n",
    );
}

#[test]
fn nested_calls_inline_inside_out() {
    assert_inlines(
        "def inc(x):\n    return x + 1\ny = inc(inc(1))\n",
        "def inc(x):\n    return x + 1\ny = (1 + 1) + 1\n",
    );
}

#[test]
fn forward_references_stay_as_calls() {
    // The definition is only visible to calls after it in traversal order.
    assert_unchanged("y = g(1)\ndef g(a):\n    return a\n");
}

#[test]
fn redefined_names_never_inline() {
    // Both calls stay, including the one sitting between the two
    // definitions: redefinition anywhere disqualifies the name outright.
    assert_unchanged(concat!(
        "def f():\n    return 1\n",
        "x = f()\n",
        "def f():\n    return 2\n",
        "y = f()\n",
    ));
}

#[test]
fn a_method_redefinition_disqualifies_the_free_function() {
    // Definition names share one flat namespace, class bodies included.
    assert_unchanged(concat!(
        "def size():\n    return 4\n",
        "class Box:\n    def size(self):\n        return 0\n",
        "n = size()\n",
    ));
}

#[test]
fn multi_statement_bodies_are_opaque() {
    assert_unchanged("def f(x):\n    print x\n    return x\ny = f(1)\n");
}

#[test]
fn bare_return_is_opaque() {
    assert_unchanged("def f():\n    return\nx = f()\n");
}

#[test]
fn arity_mismatch_leaves_the_call() {
    assert_unchanged("def f(a, b):\n    return a\nx = f(1)\n");
    assert_unchanged("def f(a):\n    return a\nx = f(1, 2)\n");
}

#[test]
fn keyword_only_call_does_not_match_positional_arity() {
    assert_unchanged("def f(a):\n    return a\ny = f(a=1)\n");
}

#[test]
fn extra_keywords_are_dropped_when_positional_arity_matches() {
    assert_inlines(
        "def f(a):\n    return a\ny = f(1, unused=2)\n",
        "def f(a):\n    return a\ny = 1\n",
    );
}

#[test]
fn spread_arguments_block_inlining() {
    assert_unchanged("def f(a):\n    return a\ny = f(*args)\n");
    assert_unchanged("def f(a):\n    return a\ny = f(1, **opts)\n");
}

#[test]
fn tuple_parameters_block_inlining() {
    assert_unchanged("def f((a, b)):\n    return a\nx = f(pair)\n");
}

#[test]
fn declared_variadics_bind_to_empty_containers() {
    assert_inlines(
        "def f(a, *rest):\n    return (a, rest)\ny = f(3)\n",
        "def f(a, *rest):\n    return (a, rest)\ny = (3, [])\n",
    );
    assert_inlines(
        "def f(**opts):\n    return opts\ny = f()\n",
        "def f(**opts):\n    return opts\ny = {}\n",
    );
}

#[test]
fn defaults_do_not_block_inlining_when_all_arguments_are_given() {
    assert_inlines(
        "def f(a=1):\n    return a\nx = f(2)\n",
        "def f(a=1):\n    return a\nx = 2\n",
    );
    // An omitted defaulted argument is an arity mismatch to the inliner.
    assert_unchanged("def f(a=1):\n    return a\nx = f()\n");
}

#[test]
fn directly_called_lambda_inlines() {
    assert_inlines("y = (lambda a: a + 1)(4)\n", "y = 4 + 1\n");
    assert_inlines("y = (lambda: 5)()\n", "y = 5\n");
}

#[test]
fn nested_definitions_are_visible_module_wide() {
    // Definitions are recorded in one flat namespace as the walk reaches
    // them, nested ones included.
    assert_inlines(
        "def outer():\n    def inner(x):\n        return x + 1\n    return 9\ny = inner(2)\n",
        "def outer():\n    def inner(x):\n        return x + 1\n    return 9\ny = 2 + 1\n",
    );
}

#[test]
fn self_recursive_function_hits_the_substitution_ceiling() {
    // The definition is recorded before its own body is walked, so the
    // self-call substitutes forever until the depth guard trips.
    let err = inline_module(parse("def f(x):\n    return f(x)\n", "test").unwrap()).unwrap_err();
    let RewriteError::Recursion { limit, depth } = err;
    assert_eq!(limit, INLINE_DEPTH_LIMIT);
    assert!(depth > limit, "reported depth {depth} should exceed the limit {limit}");
}

#[test]
fn mutually_recursive_functions_hit_the_substitution_ceiling() {
    let source = "def a(x):\n    return b(x)\ndef b(x):\n    return a(x)\n";
    let err = inline_module(parse(source, "test").unwrap()).unwrap_err();
    assert!(matches!(err, RewriteError::Recursion { .. }), "got: {err:?}");
}

#[test]
fn recursion_error_message_names_the_limit() {
    let err = inline_module(parse("def f(x):\n    return f(x)\n", "test").unwrap()).unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("inline substitution depth"),
        "message should describe the depth ceiling, got: {message}"
    );
}
