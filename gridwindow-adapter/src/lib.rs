//! Frame-driver glue for the `gridwindow` crate.
//!
//! `gridwindow` keeps the overscan controllers and the axis virtualizers independent: the
//! controllers produce an overscan budget and the virtualizers consume one. This crate wires
//! them together for hosts that just want "give me the window for this frame":
//!
//! - [`AxisDriver`] tracks the previous scroll offset, derives the delta and a sticky direction
//!   hint, runs the axis' [`OverscanModel`] and feeds its budget into the virtualizer.
//!
//! It holds no UI objects. Adapters call [`AxisDriver::on_frame`] once per frame per axis.
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(test)]
extern crate alloc;
#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod driver;


pub use driver::{AxisDriver, FrameInput, OverscanModel};
