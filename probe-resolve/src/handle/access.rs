//! Accessibility bookkeeping shared by every handle.
//!
//! Elevation is counted on the member itself, so any number of handles for
//! one member can run operations concurrently and the member returns to its
//! persistent setting once the last of them finishes.

use tracing::{trace, warn};

use probe_core::{AccessDenied, AccessFault, Accessible, ProbeError, Result};

/// Accessibility of a member as found when its handle was created.
#[derive(Debug)]
pub(crate) struct AccessState {
    baseline: bool,
}

impl AccessState {
    /// Captures the baseline and proves that elevation is permitted.
    ///
    /// The member is left as it was found; operations elevate it again for
    /// their own duration.
    pub(crate) fn capture<M>(member: &M, describe: impl Fn() -> String) -> Result<Self>
    where
        M: Accessible + ?Sized,
    {
        let baseline = member.is_accessible();
        member
            .acquire_access()
            .map_err(|denied| refused(&describe, denied))?;
        release(member, &describe);
        Ok(Self { baseline })
    }

    /// Persistent accessibility of the member when the handle was created.
    pub(crate) fn baseline(&self) -> bool {
        self.baseline
    }
}

/// An operation in flight on a member. Dropping it releases the elevation.
pub(crate) struct AccessScope<'a, M: Accessible + ?Sized, D: Fn() -> String> {
    member: &'a M,
    describe: D,
}

impl<'a, M: Accessible + ?Sized, D: Fn() -> String> AccessScope<'a, M, D> {
    /// Elevates `member` for the lifetime of the returned scope.
    pub(crate) fn enter(member: &'a M, describe: D) -> Result<Self> {
        member
            .acquire_access()
            .map_err(|denied| refused(&describe, denied))?;
        trace!(member = %describe(), "elevated");
        Ok(Self { member, describe })
    }

    /// Translates a raw member fault into the error taxonomy.
    pub(crate) fn fault(&self, fault: AccessFault) -> ProbeError {
        let what = (self.describe)();
        match fault {
            AccessFault::Denied(denied) => ProbeError::Security {
                message: format!("access to {what} refused"),
                source: Some(denied),
            },
            AccessFault::IllegalArgument(reason) => {
                ProbeError::Validation(format!("{what}: {reason}"))
            }
            AccessFault::Raised(source) => ProbeError::Invocation {
                message: what,
                source,
            },
        }
    }
}

impl<M: Accessible + ?Sized, D: Fn() -> String> Drop for AccessScope<'_, M, D> {
    fn drop(&mut self) {
        release(self.member, &self.describe);
    }
}

fn refused(describe: &impl Fn() -> String, denied: AccessDenied) -> ProbeError {
    ProbeError::Security {
        message: format!("cannot suppress access checks on {}", describe()),
        source: Some(denied),
    }
}

/// Ends one elevation. Failure is logged, never raised.
fn release<M>(member: &M, describe: &impl Fn() -> String)
where
    M: Accessible + ?Sized,
{
    match member.release_access() {
        Ok(()) => trace!(member = %describe(), "released"),
        Err(err) => warn!(member = %describe(), error = %err, "Failed to release elevation"),
    }
}
