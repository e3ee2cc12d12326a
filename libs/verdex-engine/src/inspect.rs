//! Static Inspector
//!
//! **Core Responsibility:**
//! Parse cleaned candidate text and resolve the entry-point callable plus
//! its declared parameter list, once per grading request.
//!
//! **Resolution order:**
//! 1. An explicit name from the caller must resolve or the request fails.
//! 2. The last top-level callable whose lowercased name is in the canonical
//!    set.
//! 3. The last top-level callable in the file. Generated code tends to
//!    define helpers first and the actual solution last.

use boa_engine::ast::declaration::{Binding, Declaration, LexicalDeclaration, Variable};
use boa_engine::ast::expression::Expression;
use boa_engine::ast::{Statement, StatementListItem};
use boa_engine::interner::Interner;
use boa_engine::parser::{Parser, Source};
use boa_engine::ast::scope::Scope;

use verdex_common::types::Failure;

/// The resolved entry point: its name and declared parameters in order.
/// Destructuring and rest parameters count toward arity but carry no
/// bindable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub params: Vec<Option<String>>,
}

impl EntryPoint {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Named parameters only, for keyword binding and diagnostics.
    pub fn named_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .filter_map(|p| p.as_deref())
            .collect()
    }
}

/// Resolve the entry point of cleaned candidate text.
pub fn resolve_entry_point(
    source: &str,
    explicit: Option<&str>,
    canonical: &[String],
) -> Result<EntryPoint, Failure> {
    let mut interner = Interner::default();
    let mut parser = Parser::new(Source::from_bytes(source));
    let script = parser
        .parse_script(&Scope::new_global(), &mut interner)
        .map_err(|e| Failure::setup(format!("syntax error: {}", e)))?;

    let mut callables: Vec<EntryPoint> = Vec::new();
    for item in script.statements().statements() {
        match item {
            StatementListItem::Declaration(declaration) => match declaration {
                Declaration::FunctionDeclaration(function) => {
                    if let Some(name) = resolve_sym(&interner, function.name().sym()) {
                        callables.push(EntryPoint {
                            name,
                            params: param_names(&interner, function.parameters()),
                        });
                    }
                }
                Declaration::Lexical(lexical) => {
                    let variables = match lexical {
                        LexicalDeclaration::Const(list) | LexicalDeclaration::Let(list) => {
                            list.as_ref()
                        }
                    };
                    for variable in variables {
                        if let Some(entry) = callable_binding(&interner, variable) {
                            callables.push(entry);
                        }
                    }
                }
                _ => {}
            },
            StatementListItem::Statement(statement) => {
                if let Statement::Var(var) = statement {
                    for variable in var.0.as_ref() {
                        if let Some(entry) = callable_binding(&interner, variable) {
                            callables.push(entry);
                        }
                    }
                }
            }
        }
    }

    if let Some(name) = explicit {
        return callables
            .into_iter()
            .rev()
            .find(|c| c.name == name)
            .ok_or_else(|| Failure::setup(format!("function '{}' not found", name)));
    }

    if let Some(preferred) = callables
        .iter()
        .rev()
        .find(|c| canonical.iter().any(|k| k.eq_ignore_ascii_case(&c.name)))
    {
        return Ok(preferred.clone());
    }

    callables
        .pop()
        .ok_or_else(|| Failure::setup("no function found"))
}

/// A `const`/`let`/`var` binding whose initializer is a function or arrow
/// expression counts as a top-level callable.
fn callable_binding(interner: &Interner, variable: &Variable) -> Option<EntryPoint> {
    let Binding::Identifier(identifier) = variable.binding() else {
        return None;
    };
    let params = match variable.init()? {
        Expression::FunctionExpression(function) => param_names(interner, function.parameters()),
        Expression::ArrowFunction(arrow) => param_names(interner, arrow.parameters()),
        _ => return None,
    };
    Some(EntryPoint {
        name: resolve_sym(interner, identifier.sym())?,
        params,
    })
}

fn param_names(
    interner: &Interner,
    parameters: &boa_engine::ast::function::FormalParameterList,
) -> Vec<Option<String>> {
    parameters
        .as_ref()
        .iter()
        .map(|parameter| match parameter.variable().binding() {
            Binding::Identifier(identifier) => resolve_sym(interner, identifier.sym()),
            Binding::Pattern(_) => None,
        })
        .collect()
}

fn resolve_sym(interner: &Interner, sym: boa_engine::interner::Sym) -> Option<String> {
    interner.resolve(sym).map(|s| s.to_string())
}
