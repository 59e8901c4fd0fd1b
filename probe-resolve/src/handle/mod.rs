//! Permission-safe handles around resolved members.
//!
//! Every handle captures the member's accessibility at resolution time and
//! checks that the runtime lets it be suppressed. Each operation then runs
//! inside an access scope that holds one counted elevation on the member.
//! The count lives on the member, so handles sharing a member return it to
//! its persistent setting once the last operation from any of them leaves,
//! including when the operation fails or panics.
//!
//! Raw member faults are translated as follows:
//!
//! | Fault | Error |
//! |---|---|
//! | access refused | [`probe_core::ProbeError::Security`] |
//! | bad target or arguments | [`probe_core::ProbeError::Validation`] |
//! | member raised | [`probe_core::ProbeError::Invocation`] |

mod access;
mod constructor;
mod field;
mod method;

pub use constructor::ConstructorInitializer;
pub use field::FieldAccessor;
pub use method::MethodInvoker;
