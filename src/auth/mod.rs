//! Authorization layer: caller resolution and access policy.

pub mod policy;

pub use policy::Caller;
