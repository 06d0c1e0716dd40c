//! Mode dispatch.
//!
//! A pipeline is a left fold of one stage per mutating mode over an
//! accumulator. Each stage touches the authority only when the request's
//! mode is its own; every other stage passes the accumulator through, so at
//! most one authority call happens per request.

use crate::authority::{AsyncAuthority, Authority};
use crate::error::CsbindResult;
use csbind_protocol::{Mode, MutationRequest};
use futures::future::{self, BoxFuture};

/// Stage of the blocking pipeline.
pub type Stage<A> = fn((), &MutationRequest, &A) -> CsbindResult<()>;

/// Stage of the future pipeline.
pub type AsyncStage<A> = for<'a> fn(
    BoxFuture<'a, CsbindResult<()>>,
    &'a MutationRequest,
    &'a A,
) -> BoxFuture<'a, CsbindResult<()>>;

fn fires(request: &MutationRequest, mode: Mode) -> bool {
    request.mode() == Some(mode)
}

/// Dispatches requests to a blocking authority.
pub struct Pipeline<A> {
    stages: Vec<Stage<A>>,
}

impl<A: Authority> Pipeline<A> {
    /// Builds the insert, edit, remove, add pipeline.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Self::insert_stage as Stage<A>,
                Self::edit_stage,
                Self::remove_stage,
                Self::add_stage,
            ],
        }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if there are no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage in order, stopping at the first failure.
    pub fn run(&self, request: &MutationRequest, authority: &A) -> CsbindResult<()> {
        self.stages
            .iter()
            .try_fold((), |acc, stage| stage(acc, request, authority))
    }

    fn insert_stage(_: (), request: &MutationRequest, authority: &A) -> CsbindResult<()> {
        if fires(request, Mode::Insert) {
            authority.insert(request)?;
        }
        Ok(())
    }

    fn edit_stage(_: (), request: &MutationRequest, authority: &A) -> CsbindResult<()> {
        if fires(request, Mode::Edit) {
            authority.edit(request)?;
        }
        Ok(())
    }

    fn remove_stage(_: (), request: &MutationRequest, authority: &A) -> CsbindResult<()> {
        if fires(request, Mode::Remove) {
            authority.remove(request)?;
        }
        Ok(())
    }

    fn add_stage(_: (), request: &MutationRequest, authority: &A) -> CsbindResult<()> {
        if fires(request, Mode::Add) {
            authority.add(request)?;
        }
        Ok(())
    }
}

/// Dispatches requests to a suspending authority.
///
/// A firing stage awaits the accumulator before issuing its own call, so
/// authority calls never overlap.
pub struct AsyncPipeline<A> {
    stages: Vec<AsyncStage<A>>,
}

impl<A: AsyncAuthority> AsyncPipeline<A> {
    /// Builds the insert, edit, remove, add pipeline.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                Self::insert_stage as AsyncStage<A>,
                Self::edit_stage,
                Self::remove_stage,
                Self::add_stage,
            ],
        }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if there are no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Chains every stage into one future.
    pub fn run<'a>(
        &self,
        request: &'a MutationRequest,
        authority: &'a A,
    ) -> BoxFuture<'a, CsbindResult<()>> {
        let seed: BoxFuture<'a, CsbindResult<()>> = Box::pin(future::ready(Ok(())));
        self.stages
            .iter()
            .fold(seed, |acc, stage| stage(acc, request, authority))
    }

    fn insert_stage<'a>(
        acc: BoxFuture<'a, CsbindResult<()>>,
        request: &'a MutationRequest,
        authority: &'a A,
    ) -> BoxFuture<'a, CsbindResult<()>> {
        if !fires(request, Mode::Insert) {
            return acc;
        }
        Box::pin(async move {
            acc.await?;
            authority.insert(request).await
        })
    }

    fn edit_stage<'a>(
        acc: BoxFuture<'a, CsbindResult<()>>,
        request: &'a MutationRequest,
        authority: &'a A,
    ) -> BoxFuture<'a, CsbindResult<()>> {
        if !fires(request, Mode::Edit) {
            return acc;
        }
        Box::pin(async move {
            acc.await?;
            authority.edit(request).await
        })
    }

    fn remove_stage<'a>(
        acc: BoxFuture<'a, CsbindResult<()>>,
        request: &'a MutationRequest,
        authority: &'a A,
    ) -> BoxFuture<'a, CsbindResult<()>> {
        if !fires(request, Mode::Remove) {
            return acc;
        }
        Box::pin(async move {
            acc.await?;
            authority.remove(request).await
        })
    }

    fn add_stage<'a>(
        acc: BoxFuture<'a, CsbindResult<()>>,
        request: &'a MutationRequest,
        authority: &'a A,
    ) -> BoxFuture<'a, CsbindResult<()>> {
        if !fires(request, Mode::Add) {
            return acc;
        }
        Box::pin(async move {
            acc.await?;
            authority.add(request).await
        })
    }
}
