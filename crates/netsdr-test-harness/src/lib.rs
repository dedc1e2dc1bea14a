//! netsdr-test-harness: mock control and data channels for testing
//! NetSDR clients without hardware.
//!
//! This crate provides [`MockControlChannel`] and [`MockDataChannel`],
//! in-memory implementations of the
//! [`ControlChannel`](netsdr_core::ControlChannel) and
//! [`DataChannel`](netsdr_core::DataChannel) traits. Each mock hands out
//! a handle ([`MockControlHandle`], [`MockDataHandle`]) that keeps
//! working after the mock itself has been boxed and moved into a client:
//! handles inspect what was sent, count lifecycle calls, and inject
//! inbound traffic.

pub mod mock_control;
pub mod mock_data;

pub use mock_control::{MockControlChannel, MockControlHandle};
pub use mock_data::{MockDataChannel, MockDataHandle};
