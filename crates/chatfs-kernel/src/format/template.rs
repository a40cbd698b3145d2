//! Template compilation.
//!
//! A template is literal text with `{{ expr }}` holes. Each hole is compiled
//! once into a rhai AST; rendering evaluates the holes in order against a
//! message scope and splices the results between the literals.

use rhai::{Dynamic, Engine, Scope, AST};

use super::functions::stringify;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug)]
enum Segment {
    Literal(String),
    Expr(AST),
}

/// One compiled template, kept together with its source text.
#[derive(Debug)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Compile `source`. The error string describes the first problem found.
    pub fn compile(engine: &Engine, source: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let body_start = start + OPEN.len();
            let Some(len) = rest[body_start..].find(CLOSE) else {
                return Err(format!("unclosed `{}` at byte {}", OPEN, offset + start));
            };

            let expr = rest[body_start..body_start + len].trim();
            if expr.is_empty() {
                return Err(format!("empty expression at byte {}", offset + start));
            }
            let ast = engine
                .compile_expression(expr)
                .map_err(|e| format!("`{}`: {}", expr, e))?;
            segments.push(Segment::Expr(ast));

            let consumed = body_start + len + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render into `out`, appending.
    ///
    /// Each hole evaluates against its own copy of `scope`, so a mutating
    /// call in one hole never leaks into another hole or template.
    pub fn render(&self, engine: &Engine, scope: &Scope, out: &mut String) -> Result<(), String> {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Expr(ast) => {
                    let mut local = scope.clone();
                    let value = engine
                        .eval_ast_with_scope::<Dynamic>(&mut local, ast)
                        .map_err(|e| e.to_string())?;
                    out.push_str(&stringify(value));
                }
            }
        }
        Ok(())
    }
}

/// The installed template list. Sources and compiled forms travel together,
/// so they can't drift out of step.
#[derive(Debug, Default)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    /// Compile every source; on failure returns the failing position.
    pub fn compile<S: AsRef<str>>(engine: &Engine, sources: &[S]) -> Result<Self, (usize, String)> {
        let templates = sources
            .iter()
            .enumerate()
            .map(|(i, s)| Template::compile(engine, s.as_ref()).map_err(|e| (i, e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }

    pub fn sources(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.source().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::functions::create_engine;

    fn render(source: &str, vars: &[(&str, &str)]) -> String {
        let engine = create_engine();
        let template = Template::compile(&engine, source).unwrap();
        let mut scope = Scope::new();
        for (name, value) in vars {
            scope.push(name.to_string(), value.to_string());
        }
        let mut out = String::new();
        template.render(&engine, &scope, &mut out).unwrap();
        out
    }

    #[test]
    fn test_literal_only() {
        assert_eq!(render("plain text", &[]), "plain text");
        assert_eq!(render("", &[]), "");
    }

    #[test]
    fn test_holes_and_literals() {
        assert_eq!(render("{{username}}", &[("username", "alice")]), "alice");
        assert_eq!(
            render("<{{ username }}> says {{content}}!", &[("username", "bob"), ("content", "hi")]),
            "<bob> says hi!"
        );
    }

    #[test]
    fn test_expressions() {
        assert_eq!(render("{{ 1 + 2 }}", &[]), "3");
        assert_eq!(render("{{ name.to_upper() }}", &[("name", "ann")]), "ANN");
        assert_eq!(render("{{ () }}", &[]), "");
    }

    #[test]
    fn test_holes_do_not_share_mutations() {
        assert_eq!(render("{{ name.clear() }}{{ name }}", &[("name", "ann")]), "ann");
    }

    #[test]
    fn test_stray_close_is_literal() {
        assert_eq!(render("a }} b", &[]), "a }} b");
    }

    #[test]
    fn test_syntax_errors() {
        let engine = create_engine();
        assert!(Template::compile(&engine, "{{ username").unwrap_err().contains("unclosed"));
        assert!(Template::compile(&engine, "x {{ }} y").unwrap_err().contains("empty"));
        assert!(Template::compile(&engine, "{{ 1 + }}").is_err());
        assert!(Template::compile(&engine, "{{ let x = 1 }}").is_err());
    }

    #[test]
    fn test_set_reports_failing_position() {
        let engine = create_engine();
        let err = TemplateSet::compile(&engine, &["{{a}}", "{{b}}", "{{"]).unwrap_err();
        assert_eq!(err.0, 2);

        let set = TemplateSet::compile(&engine, &["{{a}}", "b"]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.sources(), vec!["{{a}}", "b"]);
    }
}
