//! Thin ownership wrappers over the DXGI, Direct3D 11 and Direct2D object model.
//!
//! Every native object is held through [`handle::Com`], which owns at most one
//! reference to it. Cloning a wrapper retains the object, dropping or
//! [`Com::release`](handle::Com::release)-ing it gives the reference back.

mod common;
pub mod error;
pub mod handle;

#[cfg(windows)]
pub mod d2d1;
#[cfg(windows)]
pub mod d3d11;
#[cfg(windows)]
pub mod dxgi;

pub use common::Dimensions;
pub use error::{check, NativeError, Result};
pub use handle::{adopt, Com};
