use argh::FromArgs;

use morphix::image::Grid;
use morphix::imgproc::{
    connectivity::Connectivity,
    distance_transform::{distance_transform_with_id, DistanceTransform, Metric},
    label::{count_labels, label},
    morphology::{self, MorphologyConfig, StructuringElement},
    parallel::ExecutionStrategy,
    watershed::{watershed, WatershedLines},
};

#[derive(FromArgs)]
/// Run the morphology pipeline on a synthetic grid of blobs
struct Args {
    /// width and height of the grid
    #[argh(option, short = 's', default = "128")]
    size: usize,

    /// depth of the grid, 1 for a planar image
    #[argh(option, short = 'd', default = "1")]
    depth: usize,

    /// side of the square structuring element
    #[argh(option, short = 'k', default = "5")]
    kernel: usize,

    /// distance metric id: 0=Chebyshev, 1=Manhattan, 2=Euclidean, 3=Squared-Euclidean
    #[argh(option, short = 'm', default = "2")]
    metric: u32,

    /// use 8/26-connectivity instead of 4/6
    #[argh(switch)]
    high_connectivity: bool,

    /// leave watershed lines at zero
    #[argh(switch)]
    keep_lines: bool,

    /// run every pass on the current thread
    #[argh(switch)]
    serial: bool,
}

/// Bright discs on a dark background with a sprinkle of noise.
fn synthetic_blobs(size: usize, depth: usize) -> Grid<u8, 1> {
    let centres = [(0.25, 0.3), (0.7, 0.35), (0.5, 0.75)];
    let radius = size as f64 * 0.15;
    Grid::from_fn([size, size, depth].into(), |x, y, z| {
        let inside = centres.iter().any(|&(cx, cy)| {
            let dx = x as f64 - cx * size as f64;
            let dy = y as f64 - cy * size as f64;
            dx * dx + dy * dy <= radius * radius
        });
        let noise = (x * 7919 + y * 104_729 + z * 1_299_709) % 211 == 0;
        [if inside != noise { 200 } else { 0 }]
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();
    let strategy = if args.serial {
        ExecutionStrategy::Serial
    } else {
        ExecutionStrategy::Auto
    };
    let connectivity = Connectivity::from(args.high_connectivity);

    let src = synthetic_blobs(args.size, args.depth);
    log::info!("input grid {}", src.size());

    // remove the noise with an opening, then close small gaps
    let now = std::time::Instant::now();
    let opened = morphology::mopening_square(&src, 3)?;
    let cleaned = morphology::mclosing_square(&opened, 3)?;
    log::info!("opening + closing took {:?}", now.elapsed());

    let config = MorphologyConfig::default().with_strategy(strategy);
    let element = StructuringElement::Square { size: args.kernel };
    let now = std::time::Instant::now();
    let eroded = morphology::erode(&cleaned, &element, config)?;
    let dilated = morphology::dilate(&cleaned, &element, config)?;
    log::info!(
        "erode + dilate with a {} square took {:?}",
        args.kernel,
        now.elapsed()
    );

    let disc = StructuringElement::ellipse(args.kernel, args.kernel);
    let gradient = morphology::gradient(&cleaned, &disc, config)?;
    let edges = gradient.as_slice().iter().filter(|&&v| v > 0).count();
    log::info!("gradient marks {} edge pixels", edges);

    let foreground = eroded.as_slice().iter().filter(|&&v| v > 0).count();
    let grown = dilated.as_slice().iter().filter(|&&v| v > 0).count();
    log::info!("foreground: eroded {} / dilated {}", foreground, grown);

    let labels = label(&cleaned, connectivity, 0.0)?;
    log::info!("{} connected regions", count_labels(&labels));

    let metric = Metric::try_from(args.metric)?;
    let distance = DistanceTransform::new(metric)
        .with_strategy(strategy)
        .execute(&cleaned, 0)?;
    let max_distance = distance
        .as_slice()
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0, f64::max);
    log::info!("{:?} distance to background peaks at {}", metric, max_distance);

    // the same call through the numeric metric id
    let by_id = distance_transform_with_id(&cleaned, 0, args.metric)?;
    log::debug!("metric id {} agrees: {}", args.metric, by_id == distance);

    // label 0 is the background region touching the origin; shrink the other
    // regions into seeds and flood along the inverted distance
    let seeds = morphology::erode_square(&labels, 3)?;
    let priority = distance.map(|&d| if d.is_finite() { -d } else { 0.0 });
    let basins = watershed(
        &seeds,
        &priority,
        WatershedLines::from(!args.keep_lines),
        connectivity,
    )?;
    let unlabelled = basins.as_slice().iter().filter(|&&l| l == 0).count();
    log::info!("watershed leaves {} pixels unlabelled", unlabelled);

    Ok(())
}
