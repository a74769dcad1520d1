//! Scoped visibility override for non-public target members.
//!
//! This is the only escape hatch past [`Visibility::Private`]. A guard covers
//! exactly one member for as long as it lives and is never handed to rule
//! authors: the dispatcher forces a member accessible, performs the single
//! read or call, and drops the guard before returning.

use super::Visibility;
use super::target_type::MemberInfo;
use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static ACTIVE_OVERRIDES: Cell<usize> = const { Cell::new(0) };
}

/// Proof that one member may be accessed regardless of its visibility.
///
/// Guards are tied to the thread that created them.
pub struct AccessGuard<'m> {
    member: &'m dyn MemberInfo,
    forced: bool,
    _not_send: PhantomData<*const ()>,
}

impl AccessGuard<'_> {
    /// Whether this guard grants access to `member`.
    pub fn covers(&self, member: &dyn MemberInfo) -> bool {
        std::ptr::addr_eq(self.member, member)
    }

    /// True when the member was non-public and an override is in effect.
    pub fn is_override(&self) -> bool {
        self.forced
    }
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        if self.forced {
            ACTIVE_OVERRIDES.with(|n| n.set(n.get().saturating_sub(1)));
            tracing::trace!(member = self.member.name(), "visibility override released");
        }
    }
}

/// Force `member` accessible for the lifetime of the returned guard.
pub fn force(member: &dyn MemberInfo) -> AccessGuard<'_> {
    let forced = member.visibility() != Visibility::Public;
    if forced {
        ACTIVE_OVERRIDES.with(|n| n.set(n.get() + 1));
        tracing::trace!(member = member.name(), "visibility override taken");
    }
    AccessGuard {
        member,
        forced,
        _not_send: PhantomData,
    }
}

/// Number of overrides currently alive on this thread.
pub fn active_overrides() -> usize {
    ACTIVE_OVERRIDES.with(Cell::get)
}

/// Reject access to a non-public member unless `guard` covers it.
pub(crate) fn check(
    member: &dyn MemberInfo,
    owner: &str,
    guard: Option<&AccessGuard<'_>>,
) -> Result<(), super::ResolutionFailure> {
    if member.visibility().is_public() || guard.is_some_and(|g| g.covers(member)) {
        return Ok(());
    }
    Err(super::ResolutionFailure::Inaccessible {
        owner: owner.to_string(),
        name: member.name().to_string(),
    })
}
