//! The separable framework: filters applied one dimension at a time.
//!
//! [`separable`] calls a [`SeparableLineFilter`] for every image line along each processed
//! dimension in turn, feeding the result of one pass into the next. The input line comes with
//! a border filled according to a [`BoundaryCondition`], so the filter can read past both ends.
//! Intermediate results are kept in the buffer type, and only the last pass writes the output
//! in its own type.

use ndimage_core::{copy_buffer, DataType, Sample};
use ndimage_image::{Image, ImageError, LineIterator};
use ndimage_numeric::div_ceil;

use crate::boundary::{expand_border, BoundaryCondition};
use crate::buffer::{InputLine, LineBuffer, OutputLine, ScratchLine};
use crate::error::FrameworkError;
use crate::options::{SeparableOption, SeparableOptions};
use crate::parallel::{run_threads, ExecutionStrategy, THREADING_THRESHOLD};
use crate::support::{sample_pointer, use_parameter};

/// What a [`SeparableLineFilter`] gets to see for one line.
#[derive(Debug, Clone, Copy)]
pub struct SeparableLineParams<'a> {
    input: &'a LineBuffer,
    output: &'a LineBuffer,
    dimension: usize,
    pass: usize,
    n_passes: usize,
    position: &'a [usize],
    tensor_to_spatial: bool,
    thread: usize,
}

impl<'a> SeparableLineParams<'a> {
    /// The input line, read as samples of type `T`, with its border.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::BufferTypeMismatch`] if `T` is not the buffer type.
    pub fn input<T: Sample>(&self) -> Result<InputLine<'a, T>, FrameworkError> {
        InputLine::new(self.input)
    }

    /// The output line, written as samples of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkError::BufferTypeMismatch`] if `T` is not the buffer type.
    pub fn output<T: Sample>(&self) -> Result<OutputLine<'a, T>, FrameworkError> {
        OutputLine::new(self.output)
    }

    /// The untyped input buffer.
    pub fn input_buffer(&self) -> &'a LineBuffer {
        self.input
    }

    /// The untyped output buffer.
    pub fn output_buffer(&self) -> &'a LineBuffer {
        self.output
    }

    /// The dimension being processed.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Index of this pass, counting from 0.
    pub fn pass(&self) -> usize {
        self.pass
    }

    /// Total number of passes.
    pub fn number_of_passes(&self) -> usize {
        self.n_passes
    }

    /// Coordinates of the first pixel of the line.
    pub fn position(&self) -> &'a [usize] {
        self.position
    }

    /// True if the tensor was turned into an extra, unprocessed, spatial dimension.
    pub fn tensor_to_spatial(&self) -> bool {
        self.tensor_to_spatial
    }

    /// Index of the thread calling the filter.
    pub fn thread(&self) -> usize {
        self.thread
    }
}

/// A one-dimensional operation, called by [`separable`] once per line and pass.
pub trait SeparableLineFilter: Sync {
    /// Processes one line.
    ///
    /// # Errors
    ///
    /// Any error is passed on to the caller of [`separable`].
    fn filter(&self, params: &SeparableLineParams<'_>) -> Result<(), FrameworkError>;

    /// Called once before processing with the largest number of threads that will call
    /// [`SeparableLineFilter::filter`].
    ///
    /// # Errors
    ///
    /// Any error aborts processing before any line is filtered.
    fn set_number_of_threads(&mut self, _threads: usize) -> Result<(), FrameworkError> {
        Ok(())
    }

    /// Estimated cost of filtering one line along `dimension`.
    fn number_of_operations(
        &self,
        line_length: usize,
        tensor_elements: usize,
        border: usize,
        _dimension: usize,
    ) -> usize {
        line_length * tensor_elements * 2 * (2 * border + 1)
    }
}

/// Applies `filter` along each dimension of `input` for which `process` is set, writing
/// `output`.
///
/// `process`, `border` and `boundary` have one element per dimension; an empty array selects
/// the default (all dimensions, no border, mirroring) and a single element applies to all.
/// Dimensions of size 1 are never processed. The filter reads and writes samples of
/// `buffer_type`; the output is reforged to the sizes and tensor of `input` with data type
/// `out_image_type`, keeping its pixel size and color space. Without any dimension to
/// process, the input is copied.
///
/// With [`SeparableOption::AsScalarImage`] the tensor elements are processed as independent
/// scalar images.
///
/// # Errors
///
/// Returns [`FrameworkError::ArraySizeMismatch`] for parameter arrays of a wrong length, image
/// errors if `input` is raw, and any error returned by the filter.
#[allow(clippy::too_many_arguments)]
pub fn separable<F: SeparableLineFilter + ?Sized>(
    input: &Image,
    output: &mut Image,
    buffer_type: DataType,
    out_image_type: DataType,
    process: &[bool],
    border: &[usize],
    boundary: &[BoundaryCondition],
    filter: &mut F,
    options: SeparableOptions,
) -> Result<(), FrameworkError> {
    if !input.is_forged() {
        return Err(ImageError::ImageNotForged.into());
    }
    let nd = input.dimensionality();
    let mut process = use_parameter(process, nd, true)?;
    let mut border = use_parameter(border, nd, 0)?;
    let mut boundary = use_parameter(boundary, nd, BoundaryCondition::default())?;
    for (p, &n) in process.iter_mut().zip(input.sizes()) {
        if n == 1 {
            *p = false;
        }
    }

    let pixel_size = input.pixel_size().clone();
    let color_space = input.color_space().to_string();
    let tensor = *input.tensor();
    let mut src = input.clone();

    if output.is_forged() && output.is_overlapping_view(&src) {
        log::debug!("separable: output overlaps the input and gets new data");
        output.strip();
    }
    output.reforge(src.sizes(), src.tensor_elements(), out_image_type)?;
    let mut out = output.clone();

    let tensor_to_spatial = options.contains(SeparableOption::AsScalarImage) && !src.is_scalar();
    if tensor_to_spatial {
        src.tensor_to_spatial(nd)?;
        out.tensor_to_spatial(nd)?;
        process.push(false);
        border.push(0);
        boundary.push(BoundaryCondition::default());
    }

    let dims: Vec<usize> = (0..process.len()).filter(|&d| process[d]).collect();
    if dims.is_empty() {
        log::debug!("separable: no dimension to process, copying");
        out.copy_from(&src)?;
    } else {
        let strategy = options.strategy();
        let max_threads = strategy.threads()?;
        filter.set_number_of_threads(max_threads)?;
        let filter = &*filter;

        let n_passes = dims.len();
        let mut intermediate = None;
        if out.data_type() != buffer_type && n_passes > 1 {
            intermediate = Some(Image::new(out.sizes(), out.tensor_elements(), buffer_type)?);
        }
        for (pass, &d) in dims.iter().enumerate() {
            let last = pass + 1 == n_passes;
            let dst = match &intermediate {
                Some(tmp) if !last => tmp.clone(),
                _ => out.clone(),
            };
            let pass_src = match (pass, &intermediate) {
                (0, _) => &src,
                (_, Some(tmp)) => tmp,
                (_, None) => &out,
            };
            let job = Pass {
                src: pass_src,
                dst: &dst,
                dimension: d,
                pass,
                n_passes,
                border: border[d],
                boundary: boundary[d],
                buffer_type,
                tensor_to_spatial,
                options,
            };
            job.run(filter, strategy, max_threads)?;
        }
    }

    if output.tensor_elements() == tensor.elements() {
        output.reshape_tensor_as(&tensor)?;
    }
    output.set_pixel_size(pixel_size);
    output.set_color_space(color_space);
    Ok(())
}

/// One pass of the separable framework: all lines along one dimension.
struct Pass<'a> {
    src: &'a Image,
    dst: &'a Image,
    dimension: usize,
    pass: usize,
    n_passes: usize,
    border: usize,
    boundary: BoundaryCondition,
    buffer_type: DataType,
    tensor_to_spatial: bool,
    options: SeparableOptions,
}

impl Pass<'_> {
    fn run<F: SeparableLineFilter + ?Sized>(
        &self,
        filter: &F,
        strategy: ExecutionStrategy,
        max_threads: usize,
    ) -> Result<(), FrameworkError> {
        let d = self.dimension;
        let (src, dst) = (self.src, self.dst);
        let line_length = dst.sizes()[d];
        let n_lines = dst.number_of_pixels() / line_length.max(1);
        let telems = dst.tensor_elements();

        let use_in_buffer = self.border > 0
            || src.data_type() != self.buffer_type
            || self.options.contains(SeparableOption::UseInputBuffer)
            || src.shares_data(dst);
        let use_out_buffer = dst.data_type() != self.buffer_type
            || self.options.contains(SeparableOption::UseOutputBuffer);

        let mut n_threads = max_threads;
        let ops = n_lines * filter.number_of_operations(line_length, telems, self.border, d);
        if n_threads > 1 && ops < THREADING_THRESHOLD {
            n_threads = 1;
        }
        n_threads = n_threads.clamp(1, n_lines.max(1));
        let per_thread = div_ceil(n_lines.max(1), n_threads);
        n_threads = div_ceil(n_lines.max(1), per_thread);
        log::debug!(
            "separable: pass {} of {} along dimension {d}, {n_lines} lines of {line_length}, \
             {n_threads} threads, input buffer {use_in_buffer}, output buffer {use_out_buffer}",
            self.pass + 1,
            self.n_passes,
        );

        run_threads(strategy, n_threads, |thread| {
            let in_scratch = if use_in_buffer {
                Some(ScratchLine::allocate(
                    self.buffer_type,
                    telems,
                    line_length,
                    self.border,
                    false,
                )?)
            } else {
                None
            };
            let out_scratch = if use_out_buffer {
                Some(ScratchLine::allocate(
                    self.buffer_type,
                    telems,
                    line_length,
                    0,
                    false,
                )?)
            } else {
                None
            };

            let first_line = thread * per_thread;
            let count = per_thread.min(n_lines.saturating_sub(first_line));
            let mut it = LineIterator::for_images(&[src, dst], d);
            it.seek(first_line);
            for _ in 0..count {
                let src_line = LineBuffer {
                    ptr: sample_pointer(src, it.offset(0))?,
                    length: line_length,
                    ..LineBuffer::image_line(src, d)
                };
                let dst_line = LineBuffer {
                    ptr: sample_pointer(dst, it.offset(1))?,
                    length: line_length,
                    ..LineBuffer::image_line(dst, d)
                };
                let input = match &in_scratch {
                    Some(scratch) => {
                        // SAFETY: the source line lies within the image, and the scratch line
                        // holds `line_length` pixels plus the border at both ends
                        unsafe {
                            copy_buffer(
                                src_line.as_const_line(),
                                scratch.buffer.as_mut_line(),
                                line_length,
                                telems,
                            );
                            expand_border(&scratch.buffer, self.boundary);
                        }
                        scratch.buffer
                    }
                    None => src_line,
                };
                let output = match &out_scratch {
                    Some(scratch) => scratch.buffer,
                    None => dst_line,
                };

                filter.filter(&SeparableLineParams {
                    input: &input,
                    output: &output,
                    dimension: d,
                    pass: self.pass,
                    n_passes: self.n_passes,
                    position: it.coordinates(),
                    tensor_to_spatial: self.tensor_to_spatial,
                    thread,
                })?;

                if out_scratch.is_some() {
                    // SAFETY: the destination line lies within the image, and each line is
                    // written by one thread only
                    unsafe {
                        copy_buffer(
                            output.as_const_line(),
                            dst_line.as_mut_line(),
                            line_length,
                            telems,
                        );
                    }
                }
                it.next_line();
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    /// Sum over a window of `2 * radius + 1` pixels.
    struct WindowSum {
        radius: usize,
    }

    impl SeparableLineFilter for WindowSum {
        fn filter(&self, params: &SeparableLineParams<'_>) -> Result<(), FrameworkError> {
            let input = params.input::<f32>()?;
            let mut out = params.output::<f32>()?;
            let r = self.radius as isize;
            for i in 0..out.len() {
                for t in 0..out.tensor_length() {
                    let sum = (-r..=r)
                        .map(|k| input.get_with_border(i as isize + k, t))
                        .sum();
                    out.set(i, t, sum);
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_window_sum_mirror() -> Result<(), FrameworkError> {
        let input = Image::from_vec(&[5], 1, vec![1.0f32, 2.0, 3.0, 4.0, 5.0])?;
        let mut out = Image::default();
        separable(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            &[],
            &[1],
            &[BoundaryCondition::SymmetricMirror],
            &mut WindowSum { radius: 1 },
            SeparableOptions::empty(),
        )?;
        assert_eq!(out.to_vec::<f32>()?, vec![4.0, 6.0, 9.0, 12.0, 14.0]);
        Ok(())
    }

    #[test]
    fn test_two_passes_through_intermediate() -> Result<(), FrameworkError> {
        let input = Image::from_vec(&[3, 3], 1, vec![1u8; 9])?;
        let mut out = Image::default();
        separable(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::UInt8,
            &[],
            &[1],
            &[BoundaryCondition::AddZeros],
            &mut WindowSum { radius: 1 },
            SeparableOptions::empty(),
        )?;
        assert_eq!(out.data_type(), DataType::UInt8);
        assert_eq!(out.to_vec::<u8>()?, vec![4, 6, 4, 6, 9, 6, 4, 6, 4]);
        Ok(())
    }

    #[test]
    fn test_process_mask() -> Result<(), FrameworkError> {
        let input = Image::from_vec(&[2, 3], 1, vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let mut out = Image::default();
        separable(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            &[false, true],
            &[1],
            &[BoundaryCondition::ZeroOrderExtrapolate],
            &mut WindowSum { radius: 1 },
            SeparableOptions::empty(),
        )?;
        // columns [1, 3, 5] and [2, 4, 6], clamped at the ends
        assert_eq!(out.to_vec::<f32>()?, vec![5.0, 8.0, 9.0, 12.0, 13.0, 16.0]);
        Ok(())
    }

    #[test]
    fn test_as_scalar_image() -> Result<(), FrameworkError> {
        let input = Image::from_vec(
            &[4],
            2,
            vec![1.0f32, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0],
        )?;
        let mut out = Image::default();
        separable(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            &[],
            &[1],
            &[BoundaryCondition::Periodic],
            &mut WindowSum { radius: 1 },
            SeparableOption::AsScalarImage.into(),
        )?;
        assert_eq!(out.sizes(), &[4]);
        assert_eq!(out.tensor_elements(), 2);
        assert_eq!(
            out.to_vec::<f32>()?,
            vec![7.0, 70.0, 6.0, 60.0, 9.0, 90.0, 8.0, 80.0]
        );
        Ok(())
    }

    #[test]
    fn test_serial_and_parallel_agree() -> Result<(), FrameworkError> {
        let mut rng = rand::rng();
        let data: Vec<u8> = (0..300 * 400).map(|_| rng.random_range(0..16)).collect();
        let input = Image::from_vec(&[300, 400], 1, data)?;
        let mut results = Vec::new();
        for strategy in [
            ExecutionStrategy::Serial,
            ExecutionStrategy::Auto,
            ExecutionStrategy::Fixed(3),
        ] {
            let mut out = Image::default();
            separable(
                &input,
                &mut out,
                DataType::SFloat,
                DataType::SFloat,
                &[],
                &[2],
                &[],
                &mut WindowSum { radius: 2 },
                SeparableOptions::empty().with_strategy(strategy),
            )?;
            results.push(out.to_vec::<f32>()?);
        }
        assert_eq!(results[0], results[1]);
        assert_eq!(results[0], results[2]);
        Ok(())
    }

    #[test]
    fn test_in_place() -> Result<(), FrameworkError> {
        let mut img = Image::from_vec(&[5], 1, vec![1.0f32, 2.0, 3.0, 4.0, 5.0])?;
        let input = img.clone();
        separable(
            &input,
            &mut img,
            DataType::SFloat,
            DataType::SFloat,
            &[],
            &[1],
            &[],
            &mut WindowSum { radius: 1 },
            SeparableOptions::empty(),
        )?;
        assert!(img.is_identical_view(&input));
        assert_eq!(input.to_vec::<f32>()?, vec![4.0, 6.0, 9.0, 12.0, 14.0]);
        Ok(())
    }

    #[test]
    fn test_nothing_to_process_copies() -> Result<(), FrameworkError> {
        let input = Image::from_vec(&[1, 3], 1, vec![100u8, 200, 255])?;
        let mut out = Image::default();
        separable(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::SInt8,
            &[true, false],
            &[],
            &[],
            &mut WindowSum { radius: 0 },
            SeparableOptions::empty(),
        )?;
        assert_eq!(out.data_type(), DataType::SInt8);
        assert_eq!(out.to_vec::<i8>()?, vec![100, 127, 127]);
        Ok(())
    }

    #[test]
    fn test_parameter_lengths_checked() -> Result<(), FrameworkError> {
        let input = Image::new(&[4, 4], 1, DataType::SFloat)?;
        let mut out = Image::default();
        let res = separable(
            &input,
            &mut out,
            DataType::SFloat,
            DataType::SFloat,
            &[true, true, true],
            &[],
            &[],
            &mut WindowSum { radius: 0 },
            SeparableOptions::empty(),
        );
        assert_eq!(
            res,
            Err(FrameworkError::ArraySizeMismatch {
                expected: 2,
                actual: 3
            })
        );
        Ok(())
    }
}
