//! The scan framework: pixel-wise operations over any number of images.
//!
//! [`scan`] takes care of everything that is the same for every pixel-wise operation:
//! singleton expansion of the inputs, forging the outputs, conversion to and from the buffer
//! types the filter works in, and splitting the work over threads. The operation itself is a
//! [`ScanLineFilter`], which is called once for each image line (or chunk of one) and sees
//! the pixels of every image at the same coordinates.
//!
//! When all images share a layout without gaps, they are processed as a single long line,
//! split into chunks.

use std::marker::PhantomData;

use ndimage_core::{copy_buffer, DataType, Sample};
use ndimage_image::{strides, Image, ImageError, LineIterator, PixelSize, Tensor};
use ndimage_numeric::div_ceil;

use crate::buffer::{InputLine, LineBuffer, OutputLine, ScratchLine};
use crate::error::FrameworkError;
use crate::options::{ScanOption, ScanOptions};
use crate::parallel::{run_threads, THREADING_THRESHOLD};
use crate::support::{
    output_color_space, same_layout, sample_pointer, singleton_expanded_size,
    singleton_expanded_tensor_elements,
};

/// Largest number of pixels converted into a buffer at once when images are processed as a
/// single line.
pub const MAX_BUFFER_SIZE: usize = 256 * 1024;

/// What a [`ScanLineFilter`] gets to see for one line.
#[derive(Debug, Clone, Copy)]
pub struct ScanLineParams<'a> {
    inputs: &'a [LineBuffer],
    outputs: &'a [LineBuffer],
    buffer_length: usize,
    dimension: usize,
    position: &'a [usize],
    tensor_to_spatial: bool,
    thread: usize,
}

impl<'a> ScanLineParams<'a> {
    /// Input line `index`, read as samples of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::NoSuchBuffer`] if there is no such input and
    /// [`FrameworkError::BufferTypeMismatch`] if `T` is not the buffer type.
    pub fn input<T: Sample>(&self, index: usize) -> Result<InputLine<'a, T>, FrameworkError> {
        let inputs: &'a [LineBuffer] = self.inputs;
        let buffer = inputs
            .get(index)
            .ok_or(FrameworkError::NoSuchBuffer(index))?;
        InputLine::new(buffer)
    }

    /// Output line `index`, written as samples of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::NoSuchBuffer`] if there is no such output and
    /// [`FrameworkError::BufferTypeMismatch`] if `T` is not the buffer type.
    pub fn output<T: Sample>(&self, index: usize) -> Result<OutputLine<'a, T>, FrameworkError> {
        let outputs: &'a [LineBuffer] = self.outputs;
        let buffer = outputs
            .get(index)
            .ok_or(FrameworkError::NoSuchBuffer(index))?;
        OutputLine::new(buffer)
    }

    /// The untyped input buffers.
    pub fn input_buffers(&self) -> &'a [LineBuffer] {
        self.inputs
    }

    /// The untyped output buffers.
    pub fn output_buffers(&self) -> &'a [LineBuffer] {
        self.outputs
    }

    /// Number of pixels on this line.
    pub fn buffer_length(&self) -> usize {
        self.buffer_length
    }

    /// The dimension the line runs along.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Coordinates of the first pixel of the line.
    ///
    /// Only meaningful with [`ScanOption::NeedCoordinates`]; otherwise the images may have
    /// been flattened and the coordinates refer to the flattened images.
    pub fn position(&self) -> &'a [usize] {
        self.position
    }

    /// True if the tensor was turned into the last spatial dimension.
    pub fn tensor_to_spatial(&self) -> bool {
        self.tensor_to_spatial
    }

    /// Index of the thread calling the filter, below the count given to
    /// [`ScanLineFilter::set_number_of_threads`].
    pub fn thread(&self) -> usize {
        self.thread
    }
}

/// A pixel-wise operation, called by [`scan`] once per line.
///
/// The filter is shared between threads, so per-thread state must be indexed by
/// [`ScanLineParams::thread`].
pub trait ScanLineFilter: Sync {
    /// Processes one line.
    ///
    /// # Errors
    ///
    /// Any error is passed on to the caller of [`scan`].
    fn filter(&self, params: &ScanLineParams<'_>) -> Result<(), FrameworkError>;

    /// Called once before processing with the number of threads that will call
    /// [`ScanLineFilter::filter`].
    ///
    /// # Errors
    ///
    /// Any error aborts the scan before any line is processed.
    fn set_number_of_threads(&mut self, _threads: usize) -> Result<(), FrameworkError> {
        Ok(())
    }

    /// Estimated cost of processing one pixel, used to decide whether threads pay off.
    fn number_of_operations(
        &self,
        n_inputs: usize,
        n_outputs: usize,
        tensor_elements: usize,
    ) -> usize {
        n_inputs.max(n_outputs) * tensor_elements
    }
}

/// A line filter made from a closure.
///
/// ```rust
/// use ndimage_core::DataType;
/// use ndimage_framework::{scan_single_output, LineFilterFn, ScanOptions};
/// use ndimage_image::Image;
///
/// let mut img = Image::new(&[5], 1, DataType::UInt8).unwrap();
/// let mut ramp = LineFilterFn::new(|params| {
///     let mut out = params.output::<f64>(0)?;
///     for i in 0..out.len() {
///         out.set(i, 0, (params.position()[0] + i) as f64 * 1.6);
///     }
///     Ok(())
/// });
/// scan_single_output(&mut img, DataType::DFloat, &mut ramp, ScanOptions::empty()).unwrap();
/// assert_eq!(img.to_vec::<u8>().unwrap(), vec![0, 1, 3, 4, 6]);
/// ```
pub struct LineFilterFn<F> {
    func: F,
    cost: usize,
}

impl<F> LineFilterFn<F>
where
    F: Fn(&ScanLineParams<'_>) -> Result<(), FrameworkError> + Sync,
{
    /// Wraps `func`, costing one operation per sample.
    pub fn new(func: F) -> Self {
        Self { func, cost: 1 }
    }

    /// Wraps `func`, costing `cost` operations per sample.
    pub fn with_cost(func: F, cost: usize) -> Self {
        Self { func, cost }
    }
}

impl<F> ScanLineFilter for LineFilterFn<F>
where
    F: Fn(&ScanLineParams<'_>) -> Result<(), FrameworkError> + Sync,
{
    fn filter(&self, params: &ScanLineParams<'_>) -> Result<(), FrameworkError> {
        (self.func)(params)
    }

    fn number_of_operations(
        &self,
        n_inputs: usize,
        n_outputs: usize,
        tensor_elements: usize,
    ) -> usize {
        self.cost * n_inputs.max(n_outputs) * tensor_elements
    }
}

/// A line filter computing one output sample from the samples of `N` inputs at the same
/// pixel and tensor element, all of type `T`.
///
/// Inputs with a single tensor element are repeated for every element of the output.
///
/// ```rust
/// use ndimage_core::DataType;
/// use ndimage_framework::{scan_dyadic, ScanOptions, VariadicScanLineFilter};
/// use ndimage_image::Image;
///
/// let a = Image::from_vec(&[3], 1, vec![1.0f32, 2.0, 3.0]).unwrap();
/// let b = Image::from_scalar(10.0f32).unwrap();
/// let mut out = Image::default();
/// let mut add = VariadicScanLineFilter::<2, f32, _>::new(|[x, y]| x + y);
/// scan_dyadic(&a, &b, &mut out, DataType::SFloat, DataType::SFloat, DataType::SFloat,
///     &mut add, ScanOptions::empty()).unwrap();
/// assert_eq!(out.to_vec::<f32>().unwrap(), vec![11.0, 12.0, 13.0]);
/// ```
pub struct VariadicScanLineFilter<const N: usize, T, F> {
    func: F,
    cost: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<const N: usize, T, F> VariadicScanLineFilter<N, T, F>
where
    T: Sample,
    F: Fn([T; N]) -> T + Sync,
{
    /// Wraps `func`, costing one operation per sample.
    pub fn new(func: F) -> Self {
        Self::with_cost(func, 1)
    }

    /// Wraps `func`, costing `cost` operations per sample.
    pub fn with_cost(func: F, cost: usize) -> Self {
        Self {
            func,
            cost,
            _marker: PhantomData,
        }
    }
}

impl<const N: usize, T, F> ScanLineFilter for VariadicScanLineFilter<N, T, F>
where
    T: Sample,
    F: Fn([T; N]) -> T + Sync,
{
    fn filter(&self, params: &ScanLineParams<'_>) -> Result<(), FrameworkError> {
        let mut inputs = Vec::with_capacity(N);
        for index in 0..N {
            inputs.push(params.input::<T>(index)?);
        }
        let mut out = params.output::<T>(0)?;
        for pixel in 0..out.len() {
            for t in 0..out.tensor_length() {
                let values = std::array::from_fn(|k| {
                    let line = &inputs[k];
                    line.get(pixel, if line.tensor_length() == 1 { 0 } else { t })
                });
                out.set(pixel, t, (self.func)(values));
            }
        }
        Ok(())
    }

    fn number_of_operations(
        &self,
        _n_inputs: usize,
        _n_outputs: usize,
        tensor_elements: usize,
    ) -> usize {
        self.cost * tensor_elements
    }
}

fn check_length<T>(array: &[T], expected: usize) -> Result<(), FrameworkError> {
    if array.len() != expected {
        return Err(FrameworkError::ArraySizeMismatch {
            expected,
            actual: array.len(),
        });
    }
    Ok(())
}

/// Applies `filter` to every pixel of `inputs`, writing `outputs`.
///
/// Inputs are singleton-expanded to a common size unless
/// [`ScanOption::NoSingletonExpansion`] is set. Each output is reforged to that size, with
/// `n_tensor_elements[i]` tensor elements and data type `out_image_types[i]`; an output that
/// shares memory with an input in a way that is not pixel-for-pixel is stripped first, so
/// operating in place is safe whenever the output is the same view as an input.
///
/// The filter sees input `i` as samples of `in_buffer_types[i]` and output `i` as
/// `out_buffer_types[i]`, converted with saturation where they differ from the image types.
///
/// Dimensions along which all inputs are singleton-expanded are computed once and the outputs
/// expanded afterwards. The output takes the pixel size of the first input that has one, and
/// a color space from an input with a matching number of tensor elements.
///
/// # Errors
///
/// Returns [`FrameworkError::ArraySizeMismatch`] if the type arrays do not match the number
/// of images, image errors if inputs are raw or cannot be expanded to a common size, and any
/// error returned by the filter.
#[allow(clippy::too_many_arguments)]
pub fn scan<F: ScanLineFilter + ?Sized>(
    inputs: &[&Image],
    outputs: &mut [&mut Image],
    in_buffer_types: &[DataType],
    out_buffer_types: &[DataType],
    out_image_types: &[DataType],
    n_tensor_elements: &[usize],
    filter: &mut F,
    options: ScanOptions,
) -> Result<(), FrameworkError> {
    let (n_in, n_out) = (inputs.len(), outputs.len());
    if n_in == 0 && n_out == 0 {
        return Ok(());
    }
    check_length(in_buffer_types, n_in)?;
    check_length(out_buffer_types, n_out)?;
    check_length(out_image_types, n_out)?;
    check_length(n_tensor_elements, n_out)?;

    let mut pixel_size = PixelSize::default();
    let mut ins: Vec<Image> = Vec::with_capacity(n_in);
    for img in inputs {
        if !img.is_forged() {
            return Err(ImageError::ImageNotForged.into());
        }
        if !pixel_size.is_defined() && img.pixel_size().is_defined() {
            pixel_size = img.pixel_size().clone();
        }
        ins.push((*img).clone());
    }
    let tensor_to_spatial = options.contains(ScanOption::TensorAsSpatialDim)
        && ins.iter().any(|img| !img.is_scalar());

    let mut out_tensor = Tensor::scalar();
    let mut t_size = 1;
    let mut sizes = match ins.first() {
        Some(first) => first.sizes().to_vec(),
        None => {
            let out = &outputs[0];
            if !out.is_forged() {
                return Err(ImageError::ImageNotForged.into());
            }
            t_size = out.tensor_elements();
            out.sizes().to_vec()
        }
    };
    if n_in > 0 {
        if options.contains(ScanOption::NoSingletonExpansion) {
            if ins.iter().any(|img| img.sizes() != sizes.as_slice()) {
                return Err(ImageError::SizesDontMatch.into());
            }
            t_size = ins[0].tensor_elements();
            if tensor_to_spatial && ins.iter().any(|img| img.tensor_elements() != t_size) {
                return Err(ImageError::TensorElementsDontMatch.into());
            }
        } else {
            let refs: Vec<&Image> = ins.iter().collect();
            sizes = singleton_expanded_size(&refs)?;
            t_size = if tensor_to_spatial {
                singleton_expanded_tensor_elements(&refs)?
            } else {
                ins[0].tensor_elements()
            };
            for img in &mut ins {
                if img.sizes() != sizes.as_slice() {
                    img.expand_singleton_dimensions(&sizes)?;
                }
                if tensor_to_spatial && img.tensor_elements() != t_size {
                    img.expand_singleton_tensor(t_size)?;
                }
            }
        }
        if let Some(img) = inputs.iter().find(|img| !img.is_scalar()) {
            out_tensor = *img.tensor();
        }
    }

    let color_spaces: Vec<String> = if n_in == 0 {
        Vec::new()
    } else if options.contains(ScanOption::TensorAsSpatialDim) {
        vec![output_color_space(inputs, t_size)]
    } else {
        n_tensor_elements
            .iter()
            .map(|&n| output_color_space(inputs, n))
            .collect()
    };

    // Dimensions where every input repeats its samples are computed once.
    let true_sizes = sizes.clone();
    if n_in > 0 {
        for d in 0..sizes.len() {
            if sizes[d] > 1 && ins.iter().all(|img| img.strides()[d] == 0) {
                sizes[d] = 1;
                for img in &mut ins {
                    img.unexpand_singleton_dimension(d)?;
                }
            }
        }
    }

    {
        let in_refs: Vec<&Image> = ins.iter().collect();
        for (ii, out) in outputs.iter_mut().enumerate() {
            let n_tensor = if options.contains(ScanOption::TensorAsSpatialDim) {
                t_size
            } else {
                n_tensor_elements[ii]
            };
            if out.is_forged() && out.is_overlapping_view_of_any(&in_refs) {
                log::debug!("scan: output {ii} overlaps an input and gets new data");
                out.strip();
            }
            out.reforge(&sizes, n_tensor, out_image_types[ii])?;
        }
    }
    let mut outs: Vec<Image> = outputs.iter().map(|out| (**out).clone()).collect();

    if tensor_to_spatial {
        let nd = sizes.len();
        for img in ins.iter_mut().chain(outs.iter_mut()) {
            img.tensor_to_spatial(nd)?;
        }
        sizes.push(t_size);
    }
    if sizes.is_empty() {
        for img in ins.iter_mut().chain(outs.iter_mut()) {
            img.add_singleton(0)?;
        }
        sizes.push(1);
    }

    let mut scan_1d = sizes.len() == 1;
    if !scan_1d && !options.contains(ScanOption::NeedCoordinates) {
        let first = ins.first().or(outs.first());
        scan_1d = first.is_some_and(|first| {
            ins.iter()
                .chain(outs.iter())
                .all(|img| img.has_simple_stride() && same_layout(img, first))
        });
        if scan_1d {
            for img in ins.iter_mut().chain(outs.iter_mut()) {
                img.flatten()?;
            }
            sizes = vec![sizes.iter().product()];
        }
    }

    let in_use_buffer: Vec<bool> = ins
        .iter()
        .zip(in_buffer_types)
        .map(|(img, &bt)| img.data_type() != bt)
        .collect();
    let mut out_use_buffer: Vec<bool> = outs
        .iter()
        .zip(out_buffer_types)
        .map(|(img, &bt)| img.data_type() != bt)
        .collect();
    if options.contains(ScanOption::NotInPlace) {
        for (ii, out) in outs.iter().enumerate() {
            if !out_use_buffer[ii]
                && ins
                    .iter()
                    .zip(&in_use_buffer)
                    .any(|(img, &buffered)| !buffered && img.aliases(out))
            {
                out_use_buffer[ii] = true;
            }
        }
    }
    let need_buffers = in_use_buffer.iter().chain(&out_use_buffer).any(|&b| b);

    let strategy = options.strategy();
    let telems = ins
        .first()
        .or(outs.first())
        .map_or(1, |img| img.tensor_elements());
    let cost = filter.number_of_operations(n_in, n_out, telems);
    let mut n_threads = strategy.threads()?;

    let proc_dim = if scan_1d {
        0
    } else {
        let first = ins.first().or(outs.first()).map_or(&[][..], |img| img.strides());
        strides::optimal_processing_dim(&sizes, first)
    };
    let line_length = sizes[proc_dim];
    let n_lines = if scan_1d {
        1
    } else {
        sizes.iter().product::<usize>() / line_length.max(1)
    };
    if n_threads > 1 && n_lines * line_length * cost < THREADING_THRESHOLD {
        n_threads = 1;
    }

    // Work per thread: a range of pixels of the single line, or a range of lines.
    let (per_thread, buffer_size) = if scan_1d {
        let per_thread = div_ceil(line_length.max(1), n_threads.max(1));
        let mut buffer_size = per_thread;
        if need_buffers && buffer_size > MAX_BUFFER_SIZE {
            buffer_size = div_ceil(buffer_size, div_ceil(buffer_size, MAX_BUFFER_SIZE));
        }
        n_threads = div_ceil(line_length.max(1), per_thread);
        (per_thread, buffer_size)
    } else {
        n_threads = n_threads.clamp(1, n_lines.max(1));
        let per_thread = div_ceil(n_lines.max(1), n_threads);
        n_threads = div_ceil(n_lines.max(1), per_thread);
        (per_thread, line_length)
    };
    log::debug!(
        "scan: {n_in} inputs, {n_out} outputs, sizes {sizes:?}, {} along dimension {proc_dim}, \
         {n_threads} threads, buffers {need_buffers}",
        if scan_1d { "single line" } else { "lines" },
    );

    filter.set_number_of_threads(n_threads)?;
    let filter = &*filter;

    let worker = LineWorker {
        ins: &ins,
        outs: &outs,
        in_buffer_types,
        out_buffer_types,
        in_use_buffer: &in_use_buffer,
        out_use_buffer: &out_use_buffer,
        proc_dim,
        buffer_size,
        tensor_to_spatial,
    };
    let all_strides: Vec<Vec<isize>> = ins
        .iter()
        .chain(outs.iter())
        .map(|img| img.strides().to_vec())
        .collect();

    run_threads(strategy, n_threads, |thread| {
        let mut lines = worker.buffers()?;
        if scan_1d {
            let start = thread * per_thread;
            let end = (start + per_thread).min(line_length);
            let mut pos = start;
            while pos < end {
                let length = buffer_size.min(end - pos);
                let offsets: Vec<isize> = all_strides
                    .iter()
                    .map(|s| pos as isize * s[0])
                    .collect();
                worker.process(filter, &mut lines, &offsets, length, &[pos], thread)?;
                pos += length;
            }
        } else {
            let first_line = thread * per_thread;
            let count = per_thread.min(n_lines.saturating_sub(first_line));
            let mut it = LineIterator::new(&sizes, proc_dim, all_strides.clone());
            it.seek(first_line);
            let mut offsets = vec![0; all_strides.len()];
            for _ in 0..count {
                for (k, offset) in offsets.iter_mut().enumerate() {
                    *offset = it.offset(k);
                }
                worker.process(
                    filter,
                    &mut lines,
                    &offsets,
                    line_length,
                    it.coordinates(),
                    thread,
                )?;
                it.next_line();
            }
        }
        Ok(())
    })?;

    let restore_tensor =
        tensor_to_spatial && !out_tensor.is_scalar() && out_tensor.has_normal_order();
    for (ii, out) in outputs.iter_mut().enumerate() {
        if out.sizes() != true_sizes.as_slice() {
            out.expand_singleton_dimensions(&true_sizes)?;
        }
        if restore_tensor && out.tensor_elements() == out_tensor.elements() {
            out.reshape_tensor(out_tensor.rows(), out_tensor.columns())?;
        }
        if n_in > 0 {
            out.set_pixel_size(pixel_size.clone());
        }
        if let Some(cs) = color_spaces.get(if color_spaces.len() == 1 { 0 } else { ii }) {
            out.set_color_space(cs.clone());
        }
    }
    Ok(())
}

/// Shared, read-only description of the images a scan walks over.
struct LineWorker<'a> {
    ins: &'a [Image],
    outs: &'a [Image],
    in_buffer_types: &'a [DataType],
    out_buffer_types: &'a [DataType],
    in_use_buffer: &'a [bool],
    out_use_buffer: &'a [bool],
    proc_dim: usize,
    buffer_size: usize,
    tensor_to_spatial: bool,
}

/// One thread's buffers. Scratch lines are kept alive as long as the buffers point into them.
struct ThreadLines {
    _scratch: Vec<ScratchLine>,
    inputs: Vec<LineBuffer>,
    outputs: Vec<LineBuffer>,
}

impl LineWorker<'_> {
    fn buffers(&self) -> Result<ThreadLines, FrameworkError> {
        let mut scratch = Vec::new();
        let mut inputs = Vec::with_capacity(self.ins.len());
        for (ii, img) in self.ins.iter().enumerate() {
            if self.in_use_buffer[ii] {
                let repeated = img.strides()[self.proc_dim] == 0;
                let line = ScratchLine::allocate(
                    self.in_buffer_types[ii],
                    img.tensor_elements(),
                    self.buffer_size,
                    0,
                    repeated,
                )?;
                inputs.push(line.buffer);
                scratch.push(line);
            } else {
                inputs.push(LineBuffer::image_line(img, self.proc_dim));
            }
        }
        let mut outputs = Vec::with_capacity(self.outs.len());
        for (ii, img) in self.outs.iter().enumerate() {
            if self.out_use_buffer[ii] {
                let line = ScratchLine::allocate(
                    self.out_buffer_types[ii],
                    img.tensor_elements(),
                    self.buffer_size,
                    0,
                    false,
                )?;
                outputs.push(line.buffer);
                scratch.push(line);
            } else {
                outputs.push(LineBuffer::image_line(img, self.proc_dim));
            }
        }
        Ok(ThreadLines {
            _scratch: scratch,
            inputs,
            outputs,
        })
    }

    /// Runs the filter on `length` pixels starting at `offsets`, one per input then output.
    fn process<F: ScanLineFilter + ?Sized>(
        &self,
        filter: &F,
        lines: &mut ThreadLines,
        offsets: &[isize],
        length: usize,
        position: &[usize],
        thread: usize,
    ) -> Result<(), FrameworkError> {
        let n_in = self.ins.len();
        for (ii, img) in self.ins.iter().enumerate() {
            let ptr = sample_pointer(img, offsets[ii])?;
            let buffer = &mut lines.inputs[ii];
            buffer.length = length;
            if self.in_use_buffer[ii] {
                let src = LineBuffer {
                    ptr,
                    ..LineBuffer::image_line(img, self.proc_dim)
                };
                let pixels = if buffer.stride == 0 { 1 } else { length };
                // SAFETY: the source line lies within the input image, and the scratch line
                // holds `buffer_size >= length` pixels
                unsafe {
                    copy_buffer(
                        src.as_const_line(),
                        buffer.as_mut_line(),
                        pixels,
                        img.tensor_elements(),
                    );
                }
            } else {
                buffer.ptr = ptr;
            }
        }
        for (ii, img) in self.outs.iter().enumerate() {
            let buffer = &mut lines.outputs[ii];
            buffer.length = length;
            if !self.out_use_buffer[ii] {
                buffer.ptr = sample_pointer(img, offsets[n_in + ii])?;
            }
        }

        filter.filter(&ScanLineParams {
            inputs: &lines.inputs,
            outputs: &lines.outputs,
            buffer_length: length,
            dimension: self.proc_dim,
            position,
            tensor_to_spatial: self.tensor_to_spatial,
            thread,
        })?;

        for (ii, img) in self.outs.iter().enumerate() {
            if self.out_use_buffer[ii] {
                let dst = LineBuffer {
                    ptr: sample_pointer(img, offsets[n_in + ii])?,
                    ..LineBuffer::image_line(img, self.proc_dim)
                };
                // SAFETY: the destination line lies within the output image, and each line is
                // written by one thread only
                unsafe {
                    copy_buffer(
                        lines.outputs[ii].as_const_line(),
                        dst.as_mut_line(),
                        length,
                        img.tensor_elements(),
                    );
                }
            }
        }
        Ok(())
    }
}

/// [`scan`] without inputs: fills `out`, which must be forged, through a buffer of
/// `buffer_type`.
///
/// # Errors
///
/// Returns [`ImageError::ImageNotForged`] if `out` is raw, and the errors of [`scan`].
pub fn scan_single_output<F: ScanLineFilter + ?Sized>(
    out: &mut Image,
    buffer_type: DataType,
    filter: &mut F,
    options: ScanOptions,
) -> Result<(), FrameworkError> {
    if !out.is_forged() {
        return Err(ImageError::ImageNotForged.into());
    }
    let (data_type, n_tensor) = (out.data_type(), out.tensor_elements());
    scan(
        &[],
        &mut [&mut *out],
        &[],
        &[buffer_type],
        &[data_type],
        &[n_tensor],
        filter,
        options,
    )
}

/// [`scan`] without outputs: the filter only reads `input`, typically to gather statistics.
///
/// # Errors
///
/// Returns the errors of [`scan`].
pub fn scan_single_input<F: ScanLineFilter + ?Sized>(
    input: &Image,
    buffer_type: DataType,
    filter: &mut F,
    options: ScanOptions,
) -> Result<(), FrameworkError> {
    scan(&[input], &mut [], &[buffer_type], &[], &[], &[], filter, options)
}

/// [`scan`] with one input and one output.
///
/// # Errors
///
/// Returns the errors of [`scan`].
pub fn scan_monadic<F: ScanLineFilter + ?Sized>(
    input: &Image,
    out: &mut Image,
    buffer_type: DataType,
    out_image_type: DataType,
    n_tensor_elements: usize,
    filter: &mut F,
    options: ScanOptions,
) -> Result<(), FrameworkError> {
    scan(
        &[input],
        &mut [&mut *out],
        &[buffer_type],
        &[buffer_type],
        &[out_image_type],
        &[n_tensor_elements],
        filter,
        options,
    )
}

/// [`scan`] with two inputs and one output, for element-wise binary operations.
///
/// If one input is scalar and the other is not, the scalar is applied to every tensor element
/// of the other; otherwise both must have the same tensor shape. The output gets the tensor
/// shape of the non-scalar input.
///
/// # Errors
///
/// Returns [`ImageError::TensorElementsDontMatch`] if both inputs have different tensors, and
/// the errors of [`scan`].
#[allow(clippy::too_many_arguments)]
pub fn scan_dyadic<F: ScanLineFilter + ?Sized>(
    in1: &Image,
    in2: &Image,
    out: &mut Image,
    in_buffer_type: DataType,
    out_buffer_type: DataType,
    out_image_type: DataType,
    filter: &mut F,
    options: ScanOptions,
) -> Result<(), FrameworkError> {
    let tensor = if in1.is_scalar() {
        *in2.tensor()
    } else if in2.is_scalar() || in1.tensor() == in2.tensor() {
        *in1.tensor()
    } else {
        return Err(ImageError::TensorElementsDontMatch.into());
    };
    scan(
        &[in1, in2],
        &mut [&mut *out],
        &[in_buffer_type, in_buffer_type],
        &[out_buffer_type],
        &[out_image_type],
        &[tensor.elements()],
        filter,
        options | ScanOption::TensorAsSpatialDim,
    )?;
    if !tensor.is_scalar() && out.tensor_elements() == tensor.elements() {
        out.reshape_tensor_as(&tensor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::ExecutionStrategy;
    use rand::Rng;
    use std::sync::Mutex;

    fn random_image(sizes: &[usize]) -> Result<Image, FrameworkError> {
        let mut rng = rand::rng();
        let n = sizes.iter().product();
        let data: Vec<u8> = (0..n).map(|_| rng.random()).collect();
        Ok(Image::from_vec(sizes, 1, data)?)
    }

    fn scale(factor: f32) -> impl ScanLineFilter {
        LineFilterFn::new(move |params| {
            let input = params.input::<f32>(0)?;
            let mut out = params.output::<f32>(0)?;
            for i in 0..input.len() {
                for t in 0..input.tensor_length() {
                    out.set(i, t, input.get(i, t) * factor);
                }
            }
            Ok(())
        })
    }

    #[test]
    fn test_serial_and_parallel_agree() -> Result<(), FrameworkError> {
        let input = random_image(&[400, 300])?;
        let mut results = Vec::new();
        for strategy in [
            ExecutionStrategy::Serial,
            ExecutionStrategy::Auto,
            ExecutionStrategy::Fixed(4),
        ] {
            let mut out = Image::default();
            scan_monadic(
                &input,
                &mut out,
                DataType::SFloat,
                DataType::SFloat,
                1,
                &mut scale(0.5),
                ScanOptions::empty().with_strategy(strategy),
            )?;
            assert_eq!(out.sizes(), &[400, 300]);
            assert_eq!(out.data_type(), DataType::SFloat);
            results.push(out.to_vec::<f32>()?);
        }
        let expected: Vec<f32> = input
            .to_vec::<u8>()?
            .into_iter()
            .map(|v| v as f32 * 0.5)
            .collect();
        for result in results {
            assert_eq!(result, expected);
        }
        Ok(())
    }

    #[test]
    fn test_lines_with_coordinates() -> Result<(), FrameworkError> {
        let mut img = Image::new(&[3, 4], 1, DataType::UInt16)?;
        let mut filter = LineFilterFn::new(|params| {
            let mut out = params.output::<u16>(0)?;
            let pos = params.position();
            let dim = params.dimension();
            for i in 0..out.len() {
                let mut coords = pos.to_vec();
                coords[dim] += i;
                out.set(i, 0, (coords[0] + 10 * coords[1]) as u16);
            }
            Ok(())
        });
        scan_single_output(
            &mut img,
            DataType::UInt16,
            &mut filter,
            ScanOption::NeedCoordinates | ScanOption::NoMultiThreading,
        )?;
        assert_eq!(img.sample::<u16>(&[2, 3], 0)?, 32);
        assert_eq!(img.sample::<u16>(&[1, 0], 0)?, 1);
        Ok(())
    }

    #[test]
    fn test_singleton_expansion() -> Result<(), FrameworkError> {
        let a = Image::from_vec(&[4, 1], 1, vec![1.0f64, 2.0, 3.0, 4.0])?;
        let b = Image::from_vec(&[1, 3], 1, vec![10.0f64, 20.0, 30.0])?;
        let mut out = Image::default();
        let mut add = VariadicScanLineFilter::<2, f64, _>::new(|[x, y]| x + y);
        scan_dyadic(
            &a,
            &b,
            &mut out,
            DataType::DFloat,
            DataType::DFloat,
            DataType::SInt32,
            &mut add,
            ScanOptions::empty(),
        )?;
        assert_eq!(out.sizes(), &[4, 3]);
        assert_eq!(out.data_type(), DataType::SInt32);
        assert_eq!(out.sample::<i32>(&[2, 1], 0)?, 23);
        assert_eq!(out.sample::<i32>(&[3, 2], 0)?, 34);
        Ok(())
    }

    #[test]
    fn test_repeated_dimension_computed_once() -> Result<(), FrameworkError> {
        let mut input = Image::from_vec(&[5, 1], 1, vec![1u8, 2, 3, 4, 5])?;
        input.expand_singleton_dimension(1, 4)?;
        let calls = Mutex::new(0usize);
        let mut filter = LineFilterFn::new(|params| {
            if let Ok(mut calls) = calls.lock() {
                *calls += params.buffer_length();
            }
            let input = params.input::<u8>(0)?;
            let mut out = params.output::<u8>(0)?;
            for i in 0..input.len() {
                out.set(i, 0, input.get(i, 0) * 2);
            }
            Ok(())
        });
        let mut out = Image::default();
        scan_monadic(
            &input,
            &mut out,
            DataType::UInt8,
            DataType::UInt8,
            1,
            &mut filter,
            ScanOptions::empty(),
        )?;
        assert_eq!(calls.into_inner().ok(), Some(5));
        assert_eq!(out.sizes(), &[5, 4]);
        assert_eq!(out.strides()[1], 0);
        assert_eq!(out.sample::<u8>(&[4, 3], 0)?, 10);
        Ok(())
    }

    #[test]
    fn test_in_place() -> Result<(), FrameworkError> {
        let mut img = Image::from_vec(&[3, 2], 1, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let input = img.clone();
        scan_monadic(
            &input,
            &mut img,
            DataType::SFloat,
            DataType::SFloat,
            1,
            &mut scale(2.0),
            ScanOptions::empty(),
        )?;
        assert!(img.is_identical_view(&input));
        assert_eq!(input.to_vec::<f32>()?, vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
        Ok(())
    }

    #[test]
    fn test_overlapping_output_gets_new_data() -> Result<(), FrameworkError> {
        let mut input = Image::from_vec(&[4], 1, vec![1.0f32, 2.0, 3.0, 4.0])?;
        let mut out = input.clone();
        input.mirror(&[true])?;
        scan_monadic(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            1,
            &mut scale(1.0),
            ScanOptions::empty(),
        )?;
        assert!(!out.shares_data(&input));
        assert_eq!(out.to_vec::<f32>()?, vec![4.0, 3.0, 2.0, 1.0]);
        assert_eq!(input.to_vec::<f32>()?, vec![4.0, 3.0, 2.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_tensor_as_spatial_dim() -> Result<(), FrameworkError> {
        let rgb = Image::from_vec(&[2, 2], 3, (0..12).map(|v| v as f32).collect())?;
        let gain = Image::from_vec(&[2, 2], 1, vec![1.0f32, 2.0, 3.0, 4.0])?;
        let mut out = Image::default();
        let mut mul = VariadicScanLineFilter::<2, f32, _>::new(|[x, y]| x * y);
        scan_dyadic(
            &rgb,
            &gain,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            DataType::SFloat,
            &mut mul,
            ScanOptions::empty(),
        )?;
        assert_eq!(out.sizes(), &[2, 2]);
        assert_eq!(out.tensor_elements(), 3);
        assert_eq!(out.tensor(), rgb.tensor());
        assert_eq!(out.sample::<f32>(&[1, 0], 2)?, 10.0);
        assert_eq!(out.sample::<f32>(&[1, 1], 1)?, 40.0);
        Ok(())
    }

    #[test]
    fn test_dyadic_tensor_mismatch() -> Result<(), FrameworkError> {
        let a = Image::new(&[2], 2, DataType::SFloat)?;
        let b = Image::new(&[2], 3, DataType::SFloat)?;
        let mut out = Image::default();
        let mut add = VariadicScanLineFilter::<2, f32, _>::new(|[x, y]| x + y);
        let res = scan_dyadic(
            &a,
            &b,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            DataType::SFloat,
            &mut add,
            ScanOptions::empty(),
        );
        assert_eq!(
            res,
            Err(FrameworkError::Image(ImageError::TensorElementsDontMatch))
        );
        Ok(())
    }

    #[test]
    fn test_single_input_statistics() -> Result<(), FrameworkError> {
        let input = random_image(&[500, 300])?;
        let partial = Mutex::new(Vec::new());
        let mut sum = LineFilterFn::new(|params| {
            let line = params.input::<f64>(0)?;
            let total: f64 = line.samples(0).sum();
            if let Ok(mut partial) = partial.lock() {
                partial.push(total);
            }
            Ok(())
        });
        scan_single_input(&input, DataType::DFloat, &mut sum, ScanOptions::empty())?;
        let total: f64 = partial.into_inner().unwrap_or_default().iter().sum();
        let expected: f64 = input.to_vec::<u8>()?.iter().map(|&v| v as f64).sum();
        assert_eq!(total, expected);
        Ok(())
    }

    #[test]
    fn test_filter_error_is_returned() -> Result<(), FrameworkError> {
        let input = Image::new(&[10, 10], 1, DataType::UInt8)?;
        let mut failing =
            LineFilterFn::new(|_params| Err(FrameworkError::Filter("no".to_string())));
        let res = scan_single_input(&input, DataType::UInt8, &mut failing, ScanOptions::empty());
        assert_eq!(res, Err(FrameworkError::Filter("no".to_string())));

        let mut wrong_type = LineFilterFn::new(|params| params.input::<f32>(0).map(|_| ()));
        let res =
            scan_single_input(&input, DataType::UInt8, &mut wrong_type, ScanOptions::empty());
        assert!(matches!(res, Err(FrameworkError::BufferTypeMismatch { .. })));
        Ok(())
    }

    #[test]
    fn test_zero_dimensional() -> Result<(), FrameworkError> {
        let input = Image::from_scalar(7i16)?;
        let mut out = Image::default();
        scan_monadic(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            1,
            &mut scale(3.0),
            ScanOptions::empty(),
        )?;
        assert_eq!(out.dimensionality(), 0);
        assert_eq!(out.to_vec::<f32>()?, vec![21.0]);
        Ok(())
    }

    #[test]
    fn test_type_arrays_checked() -> Result<(), FrameworkError> {
        let input = Image::new(&[4], 1, DataType::UInt8)?;
        let mut out = Image::default();
        let res = scan(
            &[&input],
            &mut [&mut out],
            &[],
            &[DataType::UInt8],
            &[DataType::UInt8],
            &[1],
            &mut scale(1.0),
            ScanOptions::empty(),
        );
        assert_eq!(
            res,
            Err(FrameworkError::ArraySizeMismatch {
                expected: 1,
                actual: 0
            })
        );
        Ok(())
    }
}
