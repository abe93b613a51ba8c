//! Billing protocol capability levels.
//!
//! Two generations of the billing proxy exist. They differ in more than one
//! endpoint, so they are modelled as distinct types instead of a runtime flag:
//!
//! | Level | Plans & subscriptions | Charge payload |
//! |-------|-----------------------|----------------|
//! | [`Legacy`] | no | [`Charge`] |
//! | [`Recurring`] | yes | [`NamedCharge`] |
//!
//! The level is chosen when the transport is built and determines which
//! operations the client exposes at compile time.

use std::fmt::Debug;

use crate::request::{Charge, ChargeRequest, NamedCharge};

mod sealed {
    pub trait Sealed {}
}

/// Marker trait implemented by [`Legacy`] and [`Recurring`].
///
/// This trait is sealed; the set of protocol levels is fixed by the backend.
pub trait ProtocolLevel: sealed::Sealed + Debug + Send + Sync + 'static {
    /// Charge payload accepted at this level.
    type Charge: ChargeRequest + Debug;

    /// Level name used in logs.
    const NAME: &'static str;
}

/// Original protocol: one-time charges only, no product name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Legacy;

/// Protocol with subscription plans and named charges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recurring;

impl sealed::Sealed for Legacy {}
impl sealed::Sealed for Recurring {}

impl ProtocolLevel for Legacy {
    type Charge = Charge;

    const NAME: &'static str = "legacy";
}

impl ProtocolLevel for Recurring {
    type Charge = NamedCharge;

    const NAME: &'static str = "recurring";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of<P: ProtocolLevel>() -> &'static str {
        P::NAME
    }

    #[test]
    fn test_level_names() {
        assert_eq!(name_of::<Legacy>(), "legacy");
        assert_eq!(name_of::<Recurring>(), "recurring");
    }
}
