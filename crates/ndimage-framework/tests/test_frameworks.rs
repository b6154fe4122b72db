use approx::assert_relative_eq;
use rand::Rng;

use ndimage_core::DataType;
use ndimage_framework::{
    number_of_threads, scan_dyadic, scan_monadic, separable, set_number_of_threads,
    BoundaryCondition, FrameworkError, ScanOption, ScanOptions, SeparableLineFilter,
    SeparableLineParams, SeparableOptions, VariadicScanLineFilter,
};
use ndimage_image::Image;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Convolution with a short kernel centered on the pixel.
struct Convolve {
    weights: Vec<f64>,
}

impl SeparableLineFilter for Convolve {
    fn filter(&self, params: &SeparableLineParams<'_>) -> Result<(), FrameworkError> {
        let input = params.input::<f64>()?;
        let mut out = params.output::<f64>()?;
        let r = (self.weights.len() / 2) as isize;
        for i in 0..out.len() {
            for t in 0..out.tensor_length() {
                let value = self
                    .weights
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * input.get_with_border(i as isize + k as isize - r, t))
                    .sum();
                out.set(i, t, value);
            }
        }
        Ok(())
    }
}

#[test]
fn test_scan_follows_strided_views() -> Result<(), FrameworkError> {
    init_logger();
    let img = Image::from_vec(&[6, 4], 1, (0..24).map(|v| v as f32).collect())?;
    let mut view = img.clone();
    view.swap_dimensions(0, 1)?.mirror(&[true, false])?;

    for options in [
        ScanOptions::empty(),
        ScanOption::NeedCoordinates | ScanOption::NoMultiThreading,
    ] {
        let mut out = Image::default();
        let mut identity = VariadicScanLineFilter::<1, f32, _>::new(|[v]| v);
        scan_monadic(
            &view,
            &mut out,
            DataType::SFloat,
            DataType::SInt32,
            1,
            &mut identity,
            options,
        )?;
        assert_eq!(out.sizes(), &[4, 6]);
        let expected: Vec<i32> = view.to_vec::<f32>()?.iter().map(|&v| v as i32).collect();
        assert_eq!(out.to_vec::<i32>()?, expected);
    }
    Ok(())
}

#[test]
fn test_color_image_times_plane_weights() -> Result<(), FrameworkError> {
    init_logger();
    let rgb = Image::from_vec(&[4, 3, 2], 3, vec![1u8; 4 * 3 * 2 * 3])?;
    let weights = Image::from_vec(&[1, 1, 2], 1, vec![2.0f32, 5.0])?;
    let mut out = Image::default();
    let mut mul = VariadicScanLineFilter::<2, f32, _>::new(|[x, y]| x * y);
    scan_dyadic(
        &rgb,
        &weights,
        &mut out,
        DataType::SFloat,
        DataType::SFloat,
        DataType::UInt8,
        &mut mul,
        ScanOptions::empty(),
    )?;
    assert_eq!(out.sizes(), &[4, 3, 2]);
    assert_eq!(out.tensor_elements(), 3);
    assert_eq!(out.sample::<u8>(&[3, 2, 0], 2)?, 2);
    assert_eq!(out.sample::<u8>(&[0, 1, 1], 0)?, 5);
    Ok(())
}

#[test]
fn test_smoothing_preserves_mass() -> Result<(), FrameworkError> {
    init_logger();
    let mut rng = rand::rng();
    let data: Vec<f64> = (0..64 * 48).map(|_| rng.random_range(0.0..1.0)).collect();
    let total: f64 = data.iter().sum();
    let input = Image::from_vec(&[64, 48], 1, data)?;

    let mut out = Image::default();
    separable(
        &input,
        &mut out,
        DataType::DFloat,
        DataType::DFloat,
        &[],
        &[1],
        &[BoundaryCondition::Periodic],
        &mut Convolve {
            weights: vec![0.25, 0.5, 0.25],
        },
        SeparableOptions::empty(),
    )?;
    let smoothed: f64 = out.to_vec::<f64>()?.iter().sum();
    assert_relative_eq!(smoothed, total, max_relative = 1e-10);
    Ok(())
}

#[test]
fn test_smoothing_a_constant_changes_nothing() -> Result<(), FrameworkError> {
    init_logger();
    let mut input = Image::new(&[20, 30, 4], 1, DataType::UInt16)?;
    input.fill(1000u16)?;

    let mut smoothed = Image::default();
    separable(
        &input,
        &mut smoothed,
        DataType::DFloat,
        DataType::DFloat,
        &[],
        &[2],
        &[BoundaryCondition::SymmetricMirror],
        &mut Convolve {
            weights: vec![0.1, 0.2, 0.4, 0.2, 0.1],
        },
        SeparableOptions::empty(),
    )?;

    let mut diff = Image::default();
    let mut sub = VariadicScanLineFilter::<2, f64, _>::new(|[a, b]| (a - b).abs());
    scan_dyadic(
        &smoothed,
        &input,
        &mut diff,
        DataType::DFloat,
        DataType::DFloat,
        DataType::DFloat,
        &mut sub,
        ScanOptions::empty(),
    )?;
    let worst = diff.to_vec::<f64>()?.into_iter().fold(0.0, f64::max);
    assert!(worst < 1e-9, "largest difference {worst}");
    Ok(())
}

#[test]
fn test_global_thread_count() {
    set_number_of_threads(2);
    assert_eq!(number_of_threads(), 2);
    set_number_of_threads(0);
    assert!(number_of_threads() >= 1);
}
