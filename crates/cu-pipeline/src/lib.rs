//! A minimal result-carrying composition primitive.
//!
//! [`Outcome`] is the ok/err pipeline arm: ordered sequencing via
//! [`Outcome::chain`]/[`Outcome::chain_err`], and bi-arm logging taps that
//! observe a value without altering it. [`Flow`] is the explicit
//! short-circuit control value a fold driver inspects to decide whether to
//! keep consuming its input or stop — a tagged `Continue`/`Halt` pair rather
//! than a sentinel smuggled into an `Outcome::Ok` arm, so "the step produced
//! a value" and "the fold should stop" are never conflated.

use std::future::Future;

/// An ok/err result, structurally identical to [`std::result::Result`] but
/// kept as our own type so pipeline-specific combinators (`tap`, async
/// `chain`) can live on it without orphan-rule friction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Ok(T),
    Err(E),
}

impl<T, E> Outcome<T, E> {
    pub const fn ok(value: T) -> Self {
        Self::Ok(value)
    }

    pub const fn err(error: E) -> Self {
        Self::Err(error)
    }

    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub const fn is_err(&self) -> bool {
        matches!(self, Self::Err(_))
    }

    /// Sequence a fallible ok-arm step. `err(e).chain(f) == err(e)`.
    pub fn chain<U>(self, f: impl FnOnce(T) -> Outcome<U, E>) -> Outcome<U, E> {
        match self {
            Self::Ok(v) => f(v),
            Self::Err(e) => Outcome::Err(e),
        }
    }

    /// Async counterpart of [`Outcome::chain`], for steps that suspend.
    pub async fn chain_async<U, Fut>(self, f: impl FnOnce(T) -> Fut) -> Outcome<U, E>
    where
        Fut: Future<Output = Outcome<U, E>>,
    {
        match self {
            Self::Ok(v) => f(v).await,
            Self::Err(e) => Outcome::Err(e),
        }
    }

    /// Sequence a step on the err arm, leaving the ok arm untouched.
    pub fn chain_err<F>(self, f: impl FnOnce(E) -> Outcome<T, F>) -> Outcome<T, F> {
        match self {
            Self::Ok(v) => Outcome::Ok(v),
            Self::Err(e) => f(e),
        }
    }

    /// Observe the ok arm (e.g. to log) without altering the value.
    #[must_use]
    pub fn tap(self, f: impl FnOnce(&T)) -> Self {
        if let Self::Ok(v) = &self {
            f(v);
        }
        self
    }

    /// Observe the err arm without altering the value.
    #[must_use]
    pub fn tap_err(self, f: impl FnOnce(&E)) -> Self {
        if let Self::Err(e) = &self {
            f(e);
        }
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U, E> {
        match self {
            Self::Ok(v) => Outcome::Ok(f(v)),
            Self::Err(e) => Outcome::Err(e),
        }
    }

    pub fn ok_value(self) -> Option<T> {
        match self {
            Self::Ok(v) => Some(v),
            Self::Err(_) => None,
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(value: Result<T, E>) -> Self {
        match value {
            Ok(v) => Self::Ok(v),
            Err(e) => Self::Err(e),
        }
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(value: Outcome<T, E>) -> Self {
        match value {
            Outcome::Ok(v) => Ok(v),
            Outcome::Err(e) => Err(e),
        }
    }
}

/// Fold control: whether a driver loop should keep consuming input
/// (`Continue`, carrying the next accumulator) or stop (`Halt`, carrying the
/// value that caused the stop). See the module docs for why this is a
/// distinct type from [`Outcome`] rather than a value embedded in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow<T, H> {
    Continue(T),
    Halt(H),
}

impl<T, H> Flow<T, H> {
    pub const fn is_halted(&self) -> bool {
        matches!(self, Self::Halt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inc(x: i32) -> Outcome<i32, &'static str> {
        Outcome::ok(x + 1)
    }

    fn double(x: i32) -> Outcome<i32, &'static str> {
        Outcome::ok(x * 2)
    }

    #[test]
    fn law_ok_chain_equals_f() {
        let lhs = Outcome::ok(5).chain(inc);
        let rhs = inc(5);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn law_err_chain_is_identity() {
        let lhs: Outcome<i32, &str> = Outcome::err("boom").chain(inc);
        assert_eq!(lhs, Outcome::err("boom"));
    }

    #[test]
    fn law_chain_is_associative() {
        let lhs = Outcome::ok(5).chain(inc).chain(double);
        let rhs = Outcome::ok(5).chain(|v| inc(v).chain(double));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn tap_does_not_alter_value() {
        let mut seen = None;
        let out = Outcome::ok(7).tap(|v| seen = Some(*v));
        assert_eq!(seen, Some(7));
        assert_eq!(out, Outcome::ok(7));
    }

    #[test]
    fn tap_err_does_not_run_on_ok() {
        let mut called = false;
        let out: Outcome<i32, &str> = Outcome::ok(1).tap_err(|_| called = true);
        assert!(!called);
        assert_eq!(out, Outcome::ok(1));
    }

    #[tokio::test]
    async fn chain_async_short_circuits_on_err() {
        let out: Outcome<i32, &str> = Outcome::err("boom")
            .chain_async(|v: i32| async move { Outcome::ok(v + 1) })
            .await;
        assert_eq!(out, Outcome::err("boom"));
    }
}
