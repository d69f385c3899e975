// Copyright 2026 the Spotlight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Formula engine for the results chain.
//!
//! A formula is plain arithmetic over variable names:
//!
//! - decimal numbers, `+ - * / %`, parentheses, unary `+`/`-`;
//! - bare identifiers, resolved against an [`Environment`] (missing ⇒ `0`);
//! - the builtins in [`Builtin`].
//!
//! Evaluation is whitelist-then-parse. The source is first checked character
//! by character (`[0-9+\-*/().,% A-Za-z_]` plus ASCII whitespace); anything
//! else rejects the formula outright. Rejected or malformed formulas, unknown
//! functions, and non-finite results are all a [`FormulaError`]. In the
//! results chain ([`evaluate_steps`]) an error turns into the value `0` plus a
//! log line; it never reaches the user and never stops later steps.
//!
//! Steps run in declaration order. Each result joins the environment only for
//! the steps after it.

pub mod builtins;
mod lexer;
mod parser;

use std::collections::BTreeMap;

use thiserror::Error;

pub use builtins::Builtin;

use crate::course::FormulaStep;
use parser::{BinOp, Expr};

/// Why a formula produced no value.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FormulaError {
    /// A character outside the whitelist.
    #[error("character {ch:?} at offset {offset} is not allowed")]
    Rejected {
        /// The offending character.
        ch: char,
        /// Byte offset in the source.
        offset: usize,
    },
    /// A digit run that is not a number (e.g. `1.2.3`).
    #[error("`{0}` is not a number")]
    BadNumber(String),
    /// The formula is blank.
    #[error("formula is empty")]
    Empty,
    /// A token where it cannot appear.
    #[error("unexpected {0}")]
    Unexpected(String),
    /// Input ended mid-expression.
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    /// A call to a name that is not a builtin.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// A builtin called with the wrong number of arguments.
    #[error("`{name}` does not take {got} argument(s)")]
    Arity {
        /// Builtin name.
        name: &'static str,
        /// Arguments supplied.
        got: usize,
    },
    /// Nesting beyond the parser's depth limit.
    #[error("formula is nested too deeply")]
    TooDeep,
    /// More operators and operands than the parser's node limit.
    #[error("formula is too long")]
    TooLarge,
    /// The result is infinite or NaN (e.g. division by zero).
    #[error("result is not a finite number")]
    NonFinite,
}

/// Variable bindings for evaluation. Unbound names read as `0`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    vars: BTreeMap<String, f64>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`, replacing any earlier binding.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.vars.insert(name.into(), value);
    }

    /// Value of `name`, or `0` when unbound.
    #[must_use]
    pub fn get(&self, name: &str) -> f64 {
        self.vars.get(name).copied().unwrap_or(0.0)
    }

    /// Returns `true` if `name` is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut env = Self::new();
        for (k, v) in iter {
            env.set(k, v);
        }
        env
    }
}

/// A parsed formula, ready to evaluate any number of times.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    expr: Expr,
}

impl Formula {
    /// Whitelists, tokenizes, and parses `src`.
    pub fn parse(src: &str) -> Result<Self, FormulaError> {
        let tokens = lexer::tokenize(src)?;
        let expr = parser::parse(&tokens)?;
        Ok(Self { expr })
    }

    /// Evaluates against `env`.
    pub fn eval(&self, env: &Environment) -> Result<f64, FormulaError> {
        let value = eval_expr(&self.expr, env);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    /// Variable names the formula reads, in first-use order, deduplicated.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_vars(&self.expr, &mut out);
        out
    }
}

fn eval_expr(expr: &Expr, env: &Environment) -> f64 {
    match expr {
        Expr::Number(n) => *n,
        Expr::Var(name) => env.get(name),
        Expr::Neg(inner) => -eval_expr(inner, env),
        Expr::Binary(op, lhs, rhs) => {
            let (a, b) = (eval_expr(lhs, env), eval_expr(rhs, env));
            match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Rem => a % b,
            }
        }
        Expr::Call(func, args) => {
            let values: Vec<f64> = args.iter().map(|a| eval_expr(a, env)).collect();
            func.apply(&values)
        }
    }
}

fn collect_vars<'e>(expr: &'e Expr, out: &mut Vec<&'e str>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Var(name) => {
            if !out.contains(&name.as_str()) {
                out.push(name);
            }
        }
        Expr::Neg(inner) => collect_vars(inner, out),
        Expr::Binary(_, lhs, rhs) => {
            collect_vars(lhs, out);
            collect_vars(rhs, out);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_vars(arg, out);
            }
        }
    }
}

/// Parses and evaluates in one go.
pub fn evaluate(src: &str, env: &Environment) -> Result<f64, FormulaError> {
    Formula::parse(src)?.eval(env)
}

/// Like [`evaluate`], but any error becomes `0` and a warning in the log.
#[must_use]
pub fn evaluate_or_zero(src: &str, env: &Environment) -> f64 {
    evaluate(src, env).unwrap_or_else(|err| {
        tracing::warn!(formula = src, %err, "formula rejected; using 0");
        0.0
    })
}

/// One computed step of the results chain.
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    /// Step id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Unit suffix.
    pub unit: String,
    /// Computed value, `0` when the formula failed.
    pub value: f64,
    /// Whether the value is shown.
    pub display: bool,
    /// Whether the value is emphasized.
    pub is_main: bool,
    /// The failure that forced `value` to `0`, if any.
    pub error: Option<FormulaError>,
}

/// The whole results chain, in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Results {
    steps: Vec<StepResult>,
}

impl Results {
    /// All steps, shown or not.
    #[must_use]
    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    /// Steps flagged for display.
    pub fn displayed(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| s.display)
    }

    /// The first step flagged main.
    #[must_use]
    pub fn main(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.is_main)
    }

    /// Value of step `id`.
    #[must_use]
    pub fn value(&self, id: &str) -> Option<f64> {
        self.steps.iter().find(|s| s.id == id).map(|s| s.value)
    }

    /// Steps whose formula failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| s.error.is_some())
    }
}

/// Runs the results chain.
///
/// `seed` holds the field inputs. Each step's value is bound under its id
/// before the next step runs, so a step sees earlier steps but never later
/// ones.
#[must_use]
pub fn evaluate_steps(steps: &[FormulaStep], seed: &Environment) -> Results {
    let mut env = seed.clone();
    let mut out = Vec::with_capacity(steps.len());
    for step in steps {
        let (value, error) = match evaluate(&step.formula, &env) {
            Ok(value) => (value, None),
            Err(err) => {
                tracing::warn!(step = %step.id, formula = %step.formula, %err, "formula step failed; using 0");
                (0.0, Some(err))
            }
        };
        env.set(step.id.clone(), value);
        out.push(StepResult {
            id: step.id.clone(),
            label: step.label.clone(),
            unit: step.unit.clone(),
            value,
            display: step.display,
            is_main: step.is_main,
            error,
        });
    }
    Results { steps: out }
}
