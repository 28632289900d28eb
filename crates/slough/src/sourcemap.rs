//! Location report over a parse tree: where every function and class lives.
//!
//! The report lists functions flat (nested definitions included) and groups
//! a class's methods under the class. It renders either as an indented text
//! listing or as JSON.

use std::fmt;

use serde::Serialize;

use crate::ast::{Module, Stmt, StmtLoc};
use crate::decompile::python::{expr_text, param_text};
use crate::visit::{Visit, walk_stmt};

/// One function or method: its name, definition line, and positional
/// parameter names. Variadics and defaults are not part of the listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionEntry {
    pub name: String,
    pub line: u32,
    pub params: Vec<String>,
}

/// One class with the report of its body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntry {
    pub name: String,
    pub line: u32,
    pub bases: Vec<String>,
    #[serde(flatten)]
    pub members: Report,
}

/// Functions and classes of one scope, each sorted by name then line.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Report {
    pub functions: Vec<FunctionEntry>,
    pub classes: Vec<ClassEntry>,
}

impl Report {
    /// Collects the report for a whole module.
    #[must_use]
    pub fn from_module(module: &Module) -> Self {
        let mut collector = Collector::default();
        collector.visit_module(module);
        collector.into_report()
    }

    /// The report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, indent: &str, heading: &str) -> fmt::Result {
        if !self.functions.is_empty() {
            writeln!(f, "{indent}{heading}:")?;
            for entry in &self.functions {
                let params = entry.params.join(", ");
                writeln!(f, "{indent} {}: - {}({params})", entry.line, entry.name)?;
            }
            writeln!(f)?;
        }
        if !self.classes.is_empty() {
            writeln!(f, "{indent}Classes:")?;
            let deeper = format!("{indent}    ");
            for entry in &self.classes {
                let bases = entry.bases.join(", ");
                writeln!(f, "{indent} {}: {}({bases})", entry.line, entry.name)?;
                entry.members.render(f, &deeper, "Methods")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, "", "Functions")
    }
}

#[derive(Default)]
struct Collector {
    functions: Vec<FunctionEntry>,
    classes: Vec<ClassEntry>,
}

impl Collector {
    fn into_report(self) -> Report {
        let Self {
            mut functions,
            mut classes,
        } = self;
        functions.sort_by(|a, b| (a.name.as_str(), a.line).cmp(&(b.name.as_str(), b.line)));
        classes.sort_by(|a, b| (a.name.as_str(), a.line).cmp(&(b.name.as_str(), b.line)));
        Report { functions, classes }
    }
}

impl Visit for Collector {
    fn visit_stmt(&mut self, stmt: &StmtLoc) {
        match &stmt.stmt {
            Stmt::FunctionDef(def) => {
                self.functions.push(FunctionEntry {
                    name: def.name.clone(),
                    line: stmt.position.line,
                    params: def.params.params.iter().map(param_text).collect(),
                });
                // Keep walking so definitions nested in the body land in
                // this same flat list.
                walk_stmt(self, stmt);
            }
            Stmt::ClassDef(def) => {
                // The class body gets its own collector; its contents do
                // not leak into the enclosing scope's lists.
                let mut inner = Self::default();
                walk_stmt(&mut inner, stmt);
                self.classes.push(ClassEntry {
                    name: def.name.clone(),
                    line: stmt.position.line,
                    bases: def.bases.iter().map(expr_text).collect(),
                    members: inner.into_report(),
                });
            }
            _ => walk_stmt(self, stmt),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parse::parse;

    fn report(source: &str) -> Report {
        Report::from_module(&parse(source, "test").unwrap())
    }

    #[test]
    fn functions_list_flat_including_nested() {
        let map = report("def outer():\n    def inner(a):\n        pass\n");
        let names: Vec<&str> = map.functions.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["inner", "outer"]);
    }

    #[test]
    fn methods_stay_under_their_class() {
        let map = report("class C(Base):\n    def m(self):\n        pass\n");
        assert!(map.functions.is_empty());
        assert_eq!(map.classes.len(), 1);
        let class = &map.classes[0];
        assert_eq!(class.bases, vec!["Base".to_owned()]);
        assert_eq!(class.members.functions.len(), 1);
        assert_eq!(class.members.functions[0].name, "m");
    }

    #[test]
    fn entries_sort_by_name_then_line() {
        let map = report("def b():\n    pass\ndef a():\n    pass\ndef a():\n    pass\n");
        let order: Vec<(&str, u32)> = map
            .functions
            .iter()
            .map(|e| (e.name.as_str(), e.line))
            .collect();
        assert_eq!(order, vec![("a", 3), ("a", 5), ("b", 1)]);
    }

    #[test]
    fn text_rendering_matches_the_report_layout() {
        let source = "\
def a():
    pass

def b(x, y):
    pass

class C(Base):
    def m(self):
        pass
";
        let expect = "\
Functions:
 1: - a()
 4: - b(x, y)

Classes:
 7: C(Base)
    Methods:
     8: - m(self)


";
        assert_eq!(report(source).to_string(), expect);
    }

    #[test]
    fn json_shape_nests_class_members() {
        let map = report("class C:\n    def m(self):\n        pass\n");
        let json = map.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["classes"][0]["name"], "C");
        assert_eq!(value["classes"][0]["functions"][0]["name"], "m");
    }

    #[test]
    fn tuple_parameters_render_in_their_grouped_form() {
        let map = report("def f(a, (b, c)):\n    pass\n");
        assert_eq!(
            map.functions[0].params,
            vec!["a".to_owned(), "(b, c)".to_owned()]
        );
    }
}
