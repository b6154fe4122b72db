#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! Re-exports the ndimage crates under one roof:
//!
//! - [`core`](crate::core): sample types, run-time type dispatch and sample conversion.
//! - [`image`](crate::image): the strided image type, views and alias analysis.
//! - [`framework`](crate::framework): the scan and separable line-processing frameworks.
//! - [`numeric`](crate::numeric): small numeric utilities.

#[doc(inline)]
pub use ndimage_core as core;

#[doc(inline)]
pub use ndimage_image as image;

#[doc(inline)]
pub use ndimage_framework as framework;

#[doc(inline)]
pub use ndimage_numeric as numeric;
