//! Application boundary.
//!
//! The sampler, responder and publisher reach hardware and the network only
//! through the **port traits** defined in [`ports`], so every actor can be
//! exercised on the host with simulated adapters.

pub mod ports;
