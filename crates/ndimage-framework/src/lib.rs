#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! Most image operations visit the pixels one line at a time. This crate separates that
//! bookkeeping from the arithmetic: an operation is written as a line filter that works on
//! one line of samples of a single, fixed data type, and a framework feeds it every line of
//! images of any type, dimensionality and memory layout.
//!
//! - [`scan`] applies a pixel-wise [`ScanLineFilter`] to any number of inputs and outputs,
//!   with singleton expansion, type conversion and in-place safety.
//! - [`separable`] applies a [`SeparableLineFilter`] along one dimension after another,
//!   extending each line with a border according to a [`BoundaryCondition`].
//!
//! Both split the lines over threads when the estimated amount of work makes that worth it,
//! following the [`ExecutionStrategy`] in their options.
//!
//! ```rust
//! use ndimage_core::DataType;
//! use ndimage_framework::{scan_monadic, ScanOptions, VariadicScanLineFilter};
//! use ndimage_image::Image;
//!
//! let img = Image::from_vec(&[2, 2], 1, vec![1u8, 2, 3, 4]).unwrap();
//! let mut out = Image::default();
//! let mut square = VariadicScanLineFilter::<1, f32, _>::new(|[v]| v * v);
//! scan_monadic(&img, &mut out, DataType::SFloat, DataType::UInt16, 1, &mut square,
//!     ScanOptions::empty()).unwrap();
//! assert_eq!(out.to_vec::<u16>().unwrap(), vec![1, 4, 9, 16]);
//! ```

/// Boundary conditions for extending lines.
pub mod boundary;

/// Line buffers seen by line filters.
pub mod buffer;

/// Error types for the framework crate.
pub mod error;

/// Option sets for the frameworks.
pub mod options;

/// Thread control shared by the frameworks.
pub mod parallel;

/// The scan framework.
pub mod scan;

/// The separable framework.
pub mod separable;

/// Helpers for sizes and processing dimensions.
pub mod support;

pub use crate::boundary::BoundaryCondition;
pub use crate::buffer::{InputLine, LineBuffer, OutputLine};
pub use crate::error::FrameworkError;
pub use crate::options::{ScanOption, ScanOptions, SeparableOption, SeparableOptions};
pub use crate::parallel::{
    number_of_threads, set_number_of_threads, ExecutionStrategy, ParallelError,
    THREADING_THRESHOLD,
};
pub use crate::scan::{
    scan, scan_dyadic, scan_monadic, scan_single_input, scan_single_output, LineFilterFn,
    ScanLineFilter, ScanLineParams, VariadicScanLineFilter, MAX_BUFFER_SIZE,
};
pub use crate::separable::{separable, SeparableLineFilter, SeparableLineParams};
pub use crate::support::{
    optimal_processing_dim, optimal_processing_dim_for_kernel, singleton_expanded_size,
    singleton_expanded_tensor_elements,
};
