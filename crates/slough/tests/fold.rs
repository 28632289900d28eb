use pretty_assertions::assert_eq;
use slough::{fold_module, parse};

/// Asserts that `source` and `expect` fold to the same tree.
///
/// The expected side is folded too, so results like `-4` can be written as
/// source text even though the fold produces a negative literal where the
/// parse produces a negation. Tree equality ignores source locations.
fn assert_folds(source: &str, expect: &str) {
    let folded = fold_module(parse(source, "test").unwrap());
    let expected = fold_module(parse(expect, "test").unwrap());
    assert_eq!(folded, expected, "folding {source:?}");
}

/// Asserts folding leaves `source` exactly as parsed.
fn assert_unchanged(source: &str) {
    let parsed = parse(source, "test").unwrap();
    assert_eq!(fold_module(parsed.clone()), parsed, "{source:?} should not fold");
}

#[test]
fn arithmetic_folds_bottom_up() {
    assert_folds("x = 2 * (3 + 4)\n", "x = 14\n");
    assert_folds("x = (2 + 3) * (10 - 4)\n", "x = 30\n");
    assert_folds("x = 2 ** 10\n", "x = 1024\n");
}

#[test]
fn folding_is_idempotent() {
    let source = "x = 2 * (3 + 4)\ny = a + (1 + 2)\nprint 1 < 2 < 3\n";
    let once = fold_module(parse(source, "test").unwrap());
    let twice = fold_module(once.clone());
    assert_eq!(twice, once);
}

#[test]
fn integer_division_floors() {
    assert_folds("x = 7 / 2\n", "x = 3\n");
    assert_folds("x = -7 / 2\n", "x = -4\n");
    assert_folds("x = 7 // -2\n", "x = -4\n");
}

#[test]
fn modulo_takes_the_divisor_sign() {
    assert_folds("x = 7 % -2\n", "x = -1\n");
    assert_folds("x = -7 % 2\n", "x = 1\n");
}

#[test]
fn float_arithmetic() {
    assert_folds("x = 1 / 2.0\n", "x = 0.5\n");
    assert_folds("x = 2 ** -1\n", "x = 0.5\n");
    assert_folds("x = 7.0 // 2\n", "x = 3.0\n");
}

#[test]
fn boolean_chains_return_operand_values() {
    assert_folds("x = 0 or '' or 5\n", "x = 5\n");
    assert_folds("x = 1 and 2 and 0\n", "x = 0\n");
    assert_folds("x = '' or 'fallback'\n", "x = 'fallback'\n");
    assert_folds("x = 1 and 2\n", "x = 2\n");
}

#[test]
fn bool_chain_with_any_non_constant_stays() {
    assert_unchanged("x = 0 or y\n");
    assert_unchanged("x = y and 1\n");
}

#[test]
fn comparison_chains_fold_when_fully_constant() {
    assert_folds("x = 1 < 2 < 3\n", "x = True\n");
    assert_folds("x = 1 < 2 < 0\n", "x = False\n");
    assert_folds("x = 3 == 3.0\n", "x = True\n");
}

#[test]
fn comparison_chain_short_circuits_before_bad_links() {
    // The first link is already false, so the incomparable tail is never
    // evaluated.
    assert_folds("x = 1 < 0 < 'nope'\n", "x = False\n");
    // Here evaluation reaches the incomparable link, so the chain stays.
    assert_unchanged("x = 1 < 2 < 'nope'\n");
}

#[test]
fn comparison_with_non_constant_operand_stays() {
    assert_unchanged("x = 1 < y < 0\n");
}

#[test]
fn membership_and_identity() {
    assert_folds("x = 'b' in 'abc'\n", "x = True\n");
    assert_folds("x = 2 in [1, 2]\n", "x = True\n");
    assert_folds("x = 3 not in (1, 2)\n", "x = True\n");
    assert_folds("x = None is None\n", "x = True\n");
    // Identity of fresh containers is an object property, not a value
    // property; it never folds.
    assert_unchanged("x = [] is []\n");
}

#[test]
fn evaluation_failures_leave_the_node_unfolded() {
    assert_unchanged("x = 1 / 0\n");
    assert_unchanged("x = 1 % 0\n");
    assert_unchanged("x = 1.0 / 0.0\n");
    assert_unchanged("x = int('nope')\n");
    assert_unchanged("x = float('nan')\n");
    assert_unchanged("x = 9223372036854775807 + 1\n");
    assert_unchanged("x = 1 << 64\n");
}

#[test]
fn sequence_repetition() {
    assert_folds("x = 'ab' * 3\n", "x = 'ababab'\n");
    assert_folds("x = [1] * 2\n", "x = [1, 1]\n");
    assert_folds("x = 2 * (0,)\n", "x = (0, 0)\n");
}

#[test]
fn concatenation() {
    assert_folds("x = 'ab' + 'cd'\n", "x = 'abcd'\n");
    assert_folds("x = [1] + [2]\n", "x = [1, 2]\n");
    assert_folds("x = (1,) + (2,)\n", "x = (1, 2)\n");
}

#[test]
fn set_algebra_dedupes_by_value() {
    assert_folds("x = {1, 2} | {3}\n", "x = {1, 2, 3}\n");
    assert_folds("x = {1} | {1.0}\n", "x = {1}\n");
    assert_folds("x = {1, 2, 3} & {2, 3, 4}\n", "x = {2, 3}\n");
    assert_folds("x = {1, 2} - {2}\n", "x = {1}\n");
    assert_folds("x = {1, 2} ^ {2, 3}\n", "x = {1, 3}\n");
}

#[test]
fn set_ordering_is_the_subset_relation() {
    assert_folds("x = {1} < {1, 2}\n", "x = True\n");
    assert_folds("x = {1, 3} < {1, 2}\n", "x = False\n");
    assert_folds("x = {1, 2} <= {1, 2}\n", "x = True\n");
}

#[test]
fn bools_act_as_integers_in_arithmetic() {
    assert_folds("x = True + True\n", "x = 2\n");
    assert_folds("x = True * 5\n", "x = 5\n");
    // Bitwise ops on two bools stay boolean.
    assert_folds("x = True | False\n", "x = True\n");
    assert_folds("x = True ^ True\n", "x = False\n");
    assert_folds("x = True | 2\n", "x = 3\n");
}

#[test]
fn conditional_expression_picks_a_branch() {
    assert_folds("x = 1 if 2 > 1 else y\n", "x = 1\n");
    // Only the test must be constant; the chosen branch may be anything.
    assert_folds("x = y if 1 else z\n", "x = y\n");
    assert_folds("x = y if 0 else z\n", "x = z\n");
    assert_unchanged("x = 1 if y else 2\n");
}

#[test]
fn conversion_calls_fold() {
    assert_folds("x = int('7')\n", "x = 7\n");
    assert_folds("x = int(' 7 ')\n", "x = 7\n");
    assert_folds("x = int('ff', 16)\n", "x = 255\n");
    assert_folds("x = int('0x1a', 0)\n", "x = 26\n");
    assert_folds("x = int(2.9)\n", "x = 2\n");
    assert_folds("x = int(-2.9)\n", "x = -2\n");
    assert_folds("x = float('2.5')\n", "x = 2.5\n");
    assert_folds("x = float(3)\n", "x = 3.0\n");
    assert_folds("x = str(2.5)\n", "x = '2.5'\n");
    assert_folds("x = str(True)\n", "x = 'True'\n");
    assert_folds("x = bool([])\n", "x = False\n");
    assert_folds("x = bool('x')\n", "x = True\n");
}

#[test]
fn conversion_calls_with_no_arguments_use_the_defaults() {
    assert_folds("x = int()\n", "x = 0\n");
    assert_folds("x = float()\n", "x = 0.0\n");
    assert_folds("x = str()\n", "x = ''\n");
    assert_folds("x = bool()\n", "x = False\n");
}

#[test]
fn conversion_call_argument_spellings() {
    // A constant spread unpacks like positional arguments.
    assert_folds("x = int(*('ff', 16))\n", "x = 255\n");
    // The base may arrive as a keyword.
    assert_folds("x = int('11', base=2)\n", "x = 3\n");
    // Unknown keywords, keyword spreads, and non-constant arguments all
    // leave the call alone.
    assert_unchanged("x = int('11', radix=2)\n");
    assert_unchanged("x = int(**options)\n");
    assert_unchanged("x = int(y)\n");
    assert_unchanged("x = float('1', base=2)\n");
}

#[test]
fn unlisted_calls_never_fold() {
    assert_unchanged("x = len('abc')\n");
    assert_unchanged("x = abs(-1)\n");
}

#[test]
fn folding_reaches_into_statements() {
    assert_folds("print 2 + 3\n", "print 5\n");
    assert_folds(
        "if 1 < 2:\n    y = 3 * 3\n",
        "if True:\n    y = 9\n",
    );
    assert_folds(
        "def f(a):\n    return a + (1 + 1)\n",
        "def f(a):\n    return a + 2\n",
    );
}

#[test]
fn unary_operators() {
    assert_folds("x = -(2 + 3)\n", "x = -5\n");
    assert_folds("x = ~5\n", "x = -6\n");
    assert_folds("x = not 0\n", "x = True\n");
    assert_folds("x = not 'text'\n", "x = False\n");
    assert_folds("x = +7\n", "x = 7\n");
}

#[test]
fn shifts() {
    assert_folds("x = 1 << 10\n", "x = 1024\n");
    assert_folds("x = -16 >> 2\n", "x = -4\n");
    // Shifting right past the width saturates toward the sign.
    assert_folds("x = -1 >> 100\n", "x = -1\n");
    assert_folds("x = 1 >> 100\n", "x = 0\n");
}

#[test]
fn oversized_results_are_left_symbolic() {
    // Results past the folded-value size cap stay as written.
    assert_unchanged("x = 'abcdefgh' * 1000\n");
}
