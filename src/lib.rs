//! Modal dialogs and asynchronous content frames
//!
//! A [`frame::Frame`] loads server responses into a bound region, classifying
//! each body with [`content::classify`] before it is rendered. A
//! [`dialog::Dialog`] wraps one frame in a modal window driven through the
//! [`dialog::ModalToolkit`] seam, and [`dialog::DialogAction`] turns "show a
//! dialog and wait for it to close" into a single future.

pub mod backend;
pub mod cli;
pub mod config;
pub mod content;
pub mod dialog;
pub mod events;
pub mod frame;

#[cfg(test)]
pub(crate) mod testing;
