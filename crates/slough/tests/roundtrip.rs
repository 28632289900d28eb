//! Re-rendering a parsed module in the native dialect must produce text
//! that parses back to a deep-equal tree, and a second render of that
//! reparse must be byte-identical to the first. The output is canonical
//! rather than byte-faithful, so the assertions compare trees, not text.

use pretty_assertions::assert_eq;
use similar::TextDiff;
use slough::{Target, decompile, parse};

fn roundtrip(source: &str) {
    let module = parse(source, "test").unwrap_or_else(|e| panic!("fixture does not parse: {e}"));
    let printed = decompile(&module, Target::Python).unwrap();
    let reparsed = parse(&printed, "test")
        .unwrap_or_else(|e| panic!("rendered output does not parse: {e}\n--- rendered from {source:?}\n{printed}"));
    assert_eq!(reparsed, module, "tree changed across render/reparse of {source:?}");
    let reprinted = decompile(&reparsed, Target::Python).unwrap();
    if reprinted != printed {
        let diff = TextDiff::from_lines(&printed, &reprinted);
        panic!("second render of {source:?} is not stable:\n{}", diff.unified_diff());
    }
}

/// Renders `source` and asserts the exact canonical text.
fn assert_renders(source: &str, expect: &str) {
    let module = parse(source, "test").unwrap();
    let printed = decompile(&module, Target::Python).unwrap();
    assert_eq!(printed, expect, "canonical form of {source:?}");
}

#[test]
fn assignments() {
    for source in [
        "x = 1\n",
        "x = y = 0\n",
        "a, b = b, a\n",
        "(a, b), c = d\n",
        "a[0] = 1\n",
        "a.b.c = 2\n",
        "x += 1\n",
        "x -= 1\n",
        "x *= 2\n",
        "x /= 2\n",
        "x //= 2\n",
        "x %= 2\n",
        "x **= 2\n",
        "x <<= 1\n",
        "x >>= 1\n",
        "x |= m\n",
        "x ^= m\n",
        "x &= m\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn print_statements() {
    for source in [
        "print\n",
        "print x\n",
        "print x, y\n",
        "print x,\n",
        "print >>log\n",
        "print >>log, x\n",
        "print >>log, x, y,\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn simple_statements() {
    for source in [
        "pass\n",
        "del x\n",
        "del a[0], b.c\n",
        "global g\n",
        "global a, b\n",
        "assert x\n",
        "assert x, 'boom'\n",
        "raise\n",
        "raise Error\n",
        "raise Error, 'message'\n",
        "raise Error, 'message', trace\n",
        "a = 1; b = 2; c = 3\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn imports() {
    for source in [
        "import os\n",
        "import os.path\n",
        "import os.path as p, sys\n",
        "from os import path\n",
        "from os.path import join as j, split\n",
        "from os import (path, sep)\n",
        "from os import *\n",
        "from . import sibling\n",
        "from .. import parent\n",
        "from .pkg import inner\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn control_flow() {
    for source in [
        "if a:\n    pass\n",
        "if a:\n    x = 1\nelse:\n    x = 2\n",
        "if a:\n    x = 1\nelif b:\n    x = 2\nelif c:\n    x = 3\nelse:\n    x = 4\n",
        "while a:\n    a -= 1\n",
        "while a:\n    break\nelse:\n    print 'done'\n",
        "for x in xs:\n    print x\n",
        "for x in xs:\n    continue\nelse:\n    pass\n",
        "for k, v in pairs:\n    print k\n",
        "for x in 1, 2, 3:\n    print x\n",
        "while a:\n    if b:\n        break\n    continue\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn try_statements() {
    for source in [
        "try:\n    f()\nexcept:\n    pass\n",
        "try:\n    f()\nexcept Error:\n    pass\n",
        "try:\n    f()\nexcept Error, e:\n    print e\n",
        "try:\n    f()\nexcept Error as e:\n    print e\n",
        "try:\n    f()\nexcept A:\n    pass\nexcept B, e:\n    pass\nexcept:\n    pass\n",
        "try:\n    f()\nexcept Error:\n    pass\nelse:\n    g()\n",
        "try:\n    f()\nfinally:\n    g()\n",
        "try:\n    f()\nexcept Error:\n    pass\nelse:\n    g()\nfinally:\n    h()\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn with_statements() {
    for source in [
        "with a:\n    pass\n",
        "with open(p) as f:\n    print f\n",
        "with a as x, b as y:\n    print x, y\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn function_definitions() {
    for source in [
        "def f():\n    pass\n",
        "def f():\n    return\n",
        "def f(a, b):\n    return a\n",
        "def f(a, b=1, c=2):\n    return c\n",
        "def f(a, *args):\n    return args\n",
        "def f(a, **kw):\n    return kw\n",
        "def f(a, b=1, *args, **kw):\n    return a\n",
        "def f(a, (b, c)):\n    return b\n",
        "def f((a,)):\n    return a\n",
        "def outer():\n    def inner():\n        pass\n    return inner\n",
        "@trace\ndef f():\n    pass\n",
        "@app.route('/')\n@cached(60)\ndef f():\n    pass\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn class_definitions() {
    for source in [
        "class C:\n    pass\n",
        "class C():\n    pass\n",
        "class C(object):\n    pass\n",
        "class C(A, B):\n    pass\n",
        "class C(pkg.Base):\n    def m(self):\n        return self\n",
        "@register\nclass C:\n    pass\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn operator_expressions() {
    for source in [
        "x = a + b - c\n",
        "x = a * b / c % d\n",
        "x = a // b\n",
        "x = 2 ** 3 ** 2\n",
        "x = -a + +b\n",
        "x = ~mask\n",
        "x = not flag\n",
        "x = a << 2 | b >> 1\n",
        "x = a & b ^ c\n",
        "x = (a + b) * c\n",
        "x = a or b or c\n",
        "x = a and not b\n",
        "x = a < b <= c != d\n",
        "x = a <> b\n",
        "x = a is not None\n",
        "x = a not in b\n",
        "x = a in b\n",
        "x = `a + b`\n",
        "x = a if t else b\n",
        "x = a if t else (b if u else c)\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn literal_expressions() {
    for source in [
        "x = 42\n",
        "x = 0xff\n",
        "x = 0o17\n",
        "x = 0b101\n",
        "x = 017\n",
        "x = 1.5\n",
        "x = 1e3\n",
        "x = 1.5e-3\n",
        "x = None\n",
        "x = True\n",
        "x = False\n",
        "x = 'plain'\n",
        "x = \"double\"\n",
        "x = 'it\\'s'\n",
        "x = 'tab\\tnewline\\n'\n",
        "x = 'a' 'b' 'c'\n",
        "x = '\\x01\\x7f'\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn collection_expressions() {
    for source in [
        "x = ()\n",
        "x = (1,)\n",
        "x = 1,\n",
        "x = 1, 2, 3\n",
        "x = []\n",
        "x = [1, 2]\n",
        "x = {}\n",
        "x = {1 : 'a', 2 : 'b'}\n",
        "x = {1, 2, 3}\n",
        "x = [[1, 2], (3,), {4 : 5}]\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn call_and_access_expressions() {
    for source in [
        "f()\n",
        "f(1, 2)\n",
        "f(1, x=2)\n",
        "f(1, x=2, *rest)\n",
        "f(1, x=2, *rest, **opts)\n",
        "f(*rest)\n",
        "f(**opts)\n",
        "obj.method(arg).chain\n",
        "x = a[0]\n",
        "x = a[1, 2]\n",
        "x = a[1:]\n",
        "x = a[:2]\n",
        "x = a[:]\n",
        "x = a[::2]\n",
        "x = a[i:j:k]\n",
        "x = a[1:2, 3]\n",
        "x = matrix[i][j]\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn comprehensions_and_lambdas() {
    for source in [
        "x = [y for y in ys]\n",
        "x = [y * 2 for y in ys if y > 0]\n",
        "x = [a + b for a in al for b in bl]\n",
        "x = [y for y in ys if y if y < 10]\n",
        "x = {y for y in ys}\n",
        "x = {k : v for k, v in pairs}\n",
        "g = lambda: 0\n",
        "g = lambda x: x\n",
        "g = lambda a, b=1: a + b\n",
        "g = lambda *args, **kw: args\n",
        "x = (lambda a: a)(1)\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn line_structure_canonicalizes() {
    // Comments, blank lines, continuations, and semicolons all disappear
    // into the canonical layout without touching the tree.
    for source in [
        "x = 1 # trailing note\n",
        "# leading comment\nx = 1\n",
        "x = 1\n\n\ny = 2\n",
        "x = (1 +\n     2)\n",
        "x = 1 + \\\n    2\n",
        "if a:\n    x = 1; y = 2\n",
        "items = [1,\n         2,\n         3]\n",
    ] {
        roundtrip(source);
    }
}

#[test]
fn canonical_spellings() {
    assert_renders("x = y = 0\n", "x = y = 0\n");
    assert_renders("x = 1,\n", "x = (1,)\n");
    assert_renders("x = 0xff\n", "x = 255\n");
    assert_renders("x = a <> b\n", "x = (a != b)\n");
    assert_renders("del a[0], b\n", "del a[0], b\n");
    assert_renders("x = `y`\n", "x = `y`\n");
    assert_renders("print >>log, 'x',\n", "print >>log, 'x',\n");
    assert_renders("x = not y\n", "x = (not (y))\n");
    assert_renders("g = lambda x: x\n", "g = (lambda x:x)\n");
    assert_renders("class C:\n    pass\n", "class C:\n    pass\n");
    assert_renders("class C():\n    pass\n", "class C:\n    pass\n");
    assert_renders(
        "try:\n    f()\nexcept Error, e:\n    pass\n",
        "try:\n    f()\nexcept Error as e:\n    pass\n",
    );
}

#[test]
fn elif_ladders_reflatten() {
    let source = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
    assert_renders(
        source,
        "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n",
    );
}

#[test]
fn combined_try_except_finally_keeps_its_shape() {
    // The combined form nests the except inside the finally; rendering
    // spells that nesting out, and reparsing rebuilds the same tree.
    roundtrip("try:\n    f()\nexcept Error:\n    pass\nfinally:\n    g()\n");
}

#[test]
fn small_program() {
    roundtrip(concat!(
        "def clamp(value, low, high):\n",
        "    return low if value < low else (high if value > high else value)\n",
        "\n",
        "def mean(items):\n",
        "    total = 0.0\n",
        "    count = 0\n",
        "    for item in items:\n",
        "        total += item\n",
        "        count += 1\n",
        "    if count == 0:\n",
        "        return None\n",
        "    return total / count\n",
        "\n",
        "def spread(items):\n",
        "    lowest = items[0]\n",
        "    highest = items[0]\n",
        "    for item in items:\n",
        "        if item < lowest:\n",
        "            lowest = item\n",
        "        elif item > highest:\n",
        "            highest = item\n",
        "    return highest - lowest\n",
        "\n",
        "def passing(scores, cutoff=60):\n",
        "    return [s for s in scores if s >= cutoff]\n",
        "\n",
        "scores = [55, 71, 93, 62, 48, 100]\n",
        "print 'mean', mean(scores)\n",
        "print 'spread', spread(scores)\n",
        "print 'passing', passing(scores)\n",
        "print 'clamped', [clamp(s, 0, 100) for s in scores]\n",
    ));
}

#[test]
fn program_with_classes_and_error_handling() {
    roundtrip(concat!(
        "class Counter(object):\n",
        "    def __init__(self, start=0):\n",
        "        self.value = start\n",
        "\n",
        "    def bump(self, step):\n",
        "        self.value += step\n",
        "        return self.value\n",
        "\n",
        "def run(counter, steps):\n",
        "    try:\n",
        "        for step in steps:\n",
        "            counter.bump(step)\n",
        "    except TypeError, err:\n",
        "        print 'bad step:', err\n",
        "    finally:\n",
        "        print 'done'\n",
        "    return counter.value\n",
    ));
}
