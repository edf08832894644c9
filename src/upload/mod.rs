//! Image hosting backends

pub mod freeimage;

pub use freeimage::FreeImageHost;
