//! Time-valued expressions.
//!
//! Animation curves, motion paths, and volume envelopes are built as typed
//! [`Expr`] trees. They can be evaluated in-process with [`Expr::eval`] and
//! are only turned into ffmpeg expression syntax by [`Expr::to_engine`] when
//! the filter graph is serialized.

use std::fmt::Write as _;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Variables the encoder provides while evaluating an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Var {
    /// Timestamp in seconds.
    Time,
    /// Output frame number (zoompan).
    OutputFrame,
    InputWidth,
    InputHeight,
    /// Zoom factor of the previous frame (zoompan).
    Zoom,
    /// Frame width (drawtext).
    Width,
    /// Frame height (drawtext).
    Height,
    TextWidth,
    TextHeight,
}

impl Var {
    pub fn engine_name(self) -> &'static str {
        match self {
            Var::Time => "t",
            Var::OutputFrame => "on",
            Var::InputWidth => "iw",
            Var::InputHeight => "ih",
            Var::Zoom => "zoom",
            Var::Width => "w",
            Var::Height => "h",
            Var::TextWidth => "text_w",
            Var::TextHeight => "text_h",
        }
    }
}

/// Values bound to [`Var`]s during evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Env {
    pub t: f64,
    pub on: f64,
    pub iw: f64,
    pub ih: f64,
    pub zoom: f64,
    pub w: f64,
    pub h: f64,
    pub text_w: f64,
    pub text_h: f64,
}

impl Env {
    /// An environment at time `t` with everything else zero.
    pub fn at(t: f64) -> Self {
        Self {
            t,
            ..Self::default()
        }
    }

    fn get(&self, var: Var) -> f64 {
        match var {
            Var::Time => self.t,
            Var::OutputFrame => self.on,
            Var::InputWidth => self.iw,
            Var::InputHeight => self.ih,
            Var::Zoom => self.zoom,
            Var::Width => self.w,
            Var::Height => self.h,
            Var::TextWidth => self.text_w,
            Var::TextHeight => self.text_h,
        }
    }
}

/// A scalar expression over encoder variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Var(Var),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Min(Box<Expr>, Box<Expr>),
    Max(Box<Expr>, Box<Expr>),
    Sin(Box<Expr>),
    /// 1 when `lo <= x <= hi`, else 0.
    Between(Box<Expr>, Box<Expr>, Box<Expr>),
    Gt(Box<Expr>, Box<Expr>),
    Gte(Box<Expr>, Box<Expr>),
    Lt(Box<Expr>, Box<Expr>),
    /// `cond != 0 ? then : else`.
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Caller-supplied engine syntax, e.g. a text position like `h*0.12`.
    /// Cannot be evaluated in-process.
    Raw(String),
}

impl Expr {
    pub fn c(value: f64) -> Self {
        Expr::Const(value)
    }

    pub fn var(var: Var) -> Self {
        Expr::Var(var)
    }

    /// Timestamp `t`.
    pub fn t() -> Self {
        Expr::Var(Var::Time)
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }

    pub fn min(self, other: Expr) -> Self {
        Expr::Min(Box::new(self), Box::new(other))
    }

    pub fn max(self, other: Expr) -> Self {
        Expr::Max(Box::new(self), Box::new(other))
    }

    pub fn sin(self) -> Self {
        Expr::Sin(Box::new(self))
    }

    pub fn clamp(self, lo: f64, hi: f64) -> Self {
        self.max(Expr::c(lo)).min(Expr::c(hi))
    }

    pub fn between(self, lo: Expr, hi: Expr) -> Self {
        Expr::Between(Box::new(self), Box::new(lo), Box::new(hi))
    }

    pub fn gt(self, other: Expr) -> Self {
        Expr::Gt(Box::new(self), Box::new(other))
    }

    pub fn gte(self, other: Expr) -> Self {
        Expr::Gte(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: Expr) -> Self {
        Expr::Lt(Box::new(self), Box::new(other))
    }

    pub fn if_else(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::If(Box::new(cond), Box::new(then), Box::new(otherwise))
    }

    /// 1 while `start <= t < end`, else 0.
    pub fn window(start: f64, end: f64) -> Self {
        Expr::t().gte(Expr::c(start)) * Expr::t().lt(Expr::c(end))
    }

    /// Evaluate in-process. `None` when the tree contains [`Expr::Raw`].
    pub fn eval(&self, env: &Env) -> Option<f64> {
        let bool_f = |b: bool| if b { 1.0 } else { 0.0 };
        Some(match self {
            Expr::Const(v) => *v,
            Expr::Var(var) => env.get(*var),
            Expr::Add(a, b) => a.eval(env)? + b.eval(env)?,
            Expr::Sub(a, b) => a.eval(env)? - b.eval(env)?,
            Expr::Mul(a, b) => a.eval(env)? * b.eval(env)?,
            Expr::Div(a, b) => a.eval(env)? / b.eval(env)?,
            Expr::Neg(a) => -a.eval(env)?,
            Expr::Min(a, b) => a.eval(env)?.min(b.eval(env)?),
            Expr::Max(a, b) => a.eval(env)?.max(b.eval(env)?),
            Expr::Sin(a) => a.eval(env)?.sin(),
            Expr::Between(x, lo, hi) => {
                let x = x.eval(env)?;
                bool_f(x >= lo.eval(env)? && x <= hi.eval(env)?)
            }
            Expr::Gt(a, b) => bool_f(a.eval(env)? > b.eval(env)?),
            Expr::Gte(a, b) => bool_f(a.eval(env)? >= b.eval(env)?),
            Expr::Lt(a, b) => bool_f(a.eval(env)? < b.eval(env)?),
            Expr::If(cond, then, otherwise) => {
                if cond.eval(env)? != 0.0 {
                    then.eval(env)?
                } else {
                    otherwise.eval(env)?
                }
            }
            Expr::Raw(_) => return None,
        })
    }

    /// Serialize to ffmpeg expression syntax.
    pub fn to_engine(&self) -> String {
        let mut out = String::new();
        self.write_engine(&mut out);
        out
    }

    fn write_engine(&self, out: &mut String) {
        match self {
            Expr::Const(v) => write_number(out, *v),
            Expr::Var(var) => out.push_str(var.engine_name()),
            Expr::Add(a, b) => write_binary(out, a, '+', b),
            Expr::Sub(a, b) => write_binary(out, a, '-', b),
            Expr::Mul(a, b) => write_binary(out, a, '*', b),
            Expr::Div(a, b) => write_binary(out, a, '/', b),
            Expr::Neg(a) => {
                out.push_str("(-");
                a.write_engine(out);
                out.push(')');
            }
            Expr::Min(a, b) => write_call(out, "min", &[a.as_ref(), b.as_ref()]),
            Expr::Max(a, b) => write_call(out, "max", &[a.as_ref(), b.as_ref()]),
            Expr::Sin(a) => write_call(out, "sin", &[a.as_ref()]),
            Expr::Between(x, lo, hi) => {
                write_call(out, "between", &[x.as_ref(), lo.as_ref(), hi.as_ref()])
            }
            Expr::Gt(a, b) => write_call(out, "gt", &[a.as_ref(), b.as_ref()]),
            Expr::Gte(a, b) => write_call(out, "gte", &[a.as_ref(), b.as_ref()]),
            Expr::Lt(a, b) => write_call(out, "lt", &[a.as_ref(), b.as_ref()]),
            Expr::If(c, a, b) => write_call(out, "if", &[c.as_ref(), a.as_ref(), b.as_ref()]),
            Expr::Raw(text) => {
                out.push('(');
                out.push_str(text);
                out.push(')');
            }
        }
    }
}

fn write_binary(out: &mut String, a: &Expr, op: char, b: &Expr) {
    out.push('(');
    a.write_engine(out);
    out.push(op);
    b.write_engine(out);
    out.push(')');
}

fn write_call(out: &mut String, name: &str, args: &[&Expr]) {
    out.push_str(name);
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        arg.write_engine(out);
    }
    out.push(')');
}

fn write_number(out: &mut String, v: f64) {
    // Display gives the shortest round-tripping form ("1", "0.25")
    let v = if v == 0.0 { 0.0 } else { v };
    if v < 0.0 {
        let _ = write!(out, "({v})");
    } else {
        let _ = write!(out, "{v}");
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Const(v)
    }
}

impl From<Var> for Expr {
    fn from(var: Var) -> Self {
        Expr::Var(var)
    }
}

macro_rules! binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl $trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::$variant(Box::new(self), Box::new(rhs))
            }
        }

        impl $trait<f64> for Expr {
            type Output = Expr;

            fn $method(self, rhs: f64) -> Expr {
                Expr::$variant(Box::new(self), Box::new(Expr::Const(rhs)))
            }
        }
    };
}

binary_op!(Add, add, Add);
binary_op!(Sub, sub, Sub);
binary_op!(Mul, mul, Mul);
binary_op!(Div, div, Div);

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization() {
        let e = (Expr::t() - 2.0).min(Expr::c(1.0)) * 0.5;
        assert_eq!(e.to_engine(), "(min((t-2),1)*0.5)");
        assert_eq!(Expr::c(-0.5).to_engine(), "(-0.5)");
        assert_eq!(Expr::window(1.0, 3.0).to_engine(), "(gte(t,1)*lt(t,3))");
        assert_eq!((Expr::raw("h*0.12") + 4.0).to_engine(), "((h*0.12)+4)");
    }

    #[test]
    fn test_eval_matches_meaning() {
        let e = Expr::if_else(Expr::t().gt(Expr::c(2.0)), Expr::c(10.0), Expr::t() * 3.0);
        assert_eq!(e.eval(&Env::at(1.0)), Some(3.0));
        assert_eq!(e.eval(&Env::at(2.5)), Some(10.0));

        let w = Expr::window(1.0, 3.0);
        assert_eq!(w.eval(&Env::at(1.0)), Some(1.0));
        assert_eq!(w.eval(&Env::at(3.0)), Some(0.0));

        let b = Expr::t().between(Expr::c(0.0), Expr::c(1.0));
        assert_eq!(b.eval(&Env::at(1.0)), Some(1.0));
    }

    #[test]
    fn test_variables_and_raw() {
        let env = Env {
            iw: 1920.0,
            zoom: 1.5,
            ..Env::default()
        };
        let x = Expr::var(Var::InputWidth) / Expr::var(Var::Zoom);
        assert_eq!(x.eval(&env), Some(1280.0));
        assert_eq!(x.to_engine(), "(iw/zoom)");
        assert_eq!(Expr::raw("w*0.05").eval(&env), None);
    }
}
