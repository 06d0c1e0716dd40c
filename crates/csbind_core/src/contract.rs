//! Argument contracts.
//!
//! A [`Rule`] pairs a failure message with a predicate. A [`Contract`]
//! groups rules by argument position; checking it evaluates every rule of
//! every position and reports all failures at once, in position then rule
//! order.

use crate::error::{CsbindError, CsbindResult};
use std::borrow::Borrow;
use std::sync::Arc;

/// A named predicate over one argument.
pub struct Rule<T: ?Sized> {
    message: String,
    predicate: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: ?Sized> Rule<T> {
    /// Creates a rule.
    pub fn new<F>(message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Message reported when the rule fails.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Evaluates the predicate.
    pub fn holds(&self, value: &T) -> bool {
        (self.predicate)(value)
    }
}

impl<T: ?Sized> Clone for Rule<T> {
    fn clone(&self) -> Self {
        Self {
            message: self.message.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("message", &self.message).finish()
    }
}

type Group<A> = Box<dyn Fn(&A, &mut Vec<String>) + Send + Sync>;

/// Positional rule groups guarding an operation whose arguments are `A`.
pub struct Contract<A: ?Sized> {
    groups: Vec<Group<A>>,
}

impl<A: ?Sized> Contract<A> {
    /// Creates a contract with no rules.
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Adds the rule group for the next argument position.
    ///
    /// `project` selects the argument out of `A`. An empty group is allowed
    /// and leaves its position unchecked.
    pub fn argument<T, F>(mut self, project: F, rules: Vec<Rule<T>>) -> Self
    where
        T: ?Sized + 'static,
        F: Fn(&A) -> &T + Send + Sync + 'static,
    {
        self.groups.push(Box::new(move |args: &A, failures: &mut Vec<String>| {
            let value = project(args);
            failures.extend(
                rules
                    .iter()
                    .filter(|rule| !rule.holds(value))
                    .map(|rule| rule.message().to_string()),
            );
        }));
        self
    }

    /// Number of argument positions.
    pub fn arity(&self) -> usize {
        self.groups.len()
    }

    /// Collects the message of every failing rule.
    pub fn violations(&self, args: &A) -> Vec<String> {
        let mut failures = Vec::new();
        for group in &self.groups {
            group(args, &mut failures);
        }
        failures
    }

    /// Fails with [`CsbindError::ContractViolation`] if any rule fails.
    pub fn check(&self, args: &A) -> CsbindResult<()> {
        let failures = self.violations(args);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CsbindError::contract_violation(failures))
        }
    }

    /// Checks `args` and, only if every rule holds, invokes `target` with
    /// them.
    ///
    /// `args` may be owned or borrowed, so an operation can hand its
    /// arguments through to the body without copying them.
    pub fn call<B, R, F>(&self, args: B, target: F) -> CsbindResult<R>
    where
        B: Borrow<A>,
        F: FnOnce(B) -> CsbindResult<R>,
    {
        self.check(args.borrow())?;
        target(args)
    }
}

impl<A: ?Sized> Default for Contract<A> {
    fn default() -> Self {
        Self::new()
    }
}
