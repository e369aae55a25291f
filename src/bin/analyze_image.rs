// Copyright (c) 2025 The edgescope developers
// See LICENSE file in root directory for license terms.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::Parser;
use env_logger;
use image::ImageReader;
use log::{info, warn};

use edgescope::config::AnalysisConfig;
use edgescope::image_funcs::{annotate_circle, FilterKind};
use edgescope::session::{AnalysisSession, FilterTarget};

/// Program for measuring edge sharpness, noise, and CNR of the circular
/// feature in test image(s).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Path of the file or directory to process.
    #[arg(short, long, required_unless_present = "synthesize")]
    input: Option<String>,

    /// Directory where output file(s) are written.
    #[arg(short, long)]
    output: String,

    /// Analyze a synthesized test image instead of input file(s). Given as
    /// WIDTHxHEIGHTxRADIUS, e.g. 500x500x200.
    #[arg(long, conflicts_with = "input")]
    synthesize: Option<Synthetic>,

    /// Filter applied to each image before analysis: sharpen, blur, noise, or
    /// edge-enhance.
    #[arg(short, long)]
    filter: Option<FilterKind>,

    /// JSON file with analysis parameters. Omitted fields take their defaults.
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Copy, Clone, Debug)]
struct Synthetic {
    width: u32,
    height: u32,
    radius: u32,
}

impl FromStr for Synthetic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('x').collect();
        let [width, height, radius] = fields.as_slice() else {
            return Err(format!("Expected WIDTHxHEIGHTxRADIUS, got '{}'", s));
        };
        let parse = |field: &str| field.trim().parse::<u32>().map_err(
            |e| format!("Bad value '{}' in '{}': {}", field, s, e));
        Ok(Synthetic{width: parse(*width)?, height: parse(*height)?, radius: parse(*radius)?})
    }
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AnalysisConfig::load(path).unwrap_or_else(|e| {
            panic!("Could not load config: {}", e);
        }),
        None => AnalysisConfig::default(),
    };
    let output_metadata = fs::metadata(&args.output).unwrap_or_else(|e| {
        panic!("Output dir '{}' does not exist? {:?}", args.output, e);
    });
    assert!(output_metadata.is_dir(),
            "Output '{}' must be a directory", args.output);
    let mut session = AnalysisSession::new(config);

    if let Some(synthetic) = args.synthesize {
        session.synthesize(synthetic.width, synthetic.height, synthetic.radius);
        let name = format!("synthetic_{}x{}x{}",
                           synthetic.width, synthetic.height, synthetic.radius);
        process_loaded(&mut session, &name, &args);
        return;
    }
    let Some(input) = &args.input else {
        unreachable!("clap requires --input when --synthesize is absent");
    };
    let input_metadata = fs::metadata(input).unwrap_or_else(|e| {
        panic!("Input file/dir '{}' does not exist? {:?}", input, e);
    });
    if input_metadata.is_dir() {
        // Enumerate and process all of the files in the directory.
        let mut paths: Vec<PathBuf> = fs::read_dir(input).unwrap_or_else(|e| {
            panic!("Could not read dir '{}': {:?}", input, e);
        }).filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();
        for path in paths {
            process_file(&mut session, &path, &args);
        }
    } else {
        // Process the single file.
        assert!(input_metadata.is_file());
        process_file(&mut session, Path::new(input), &args);
    }
}

fn process_file(session: &mut AnalysisSession, input_path: &Path, args: &Args) {
    info!("Processing {:?}", input_path);
    let img = match ImageReader::open(input_path).and_then(|r| r.with_guessed_format()) {
        Ok(reader) => match reader.decode() {
            Ok(img) => img,
            Err(e) => {
                warn!("Skipping {:?} due to: {:?}", input_path, e);
                return;
            },
        },
        Err(e) => {
            warn!("Skipping {:?} due to: {:?}", input_path, e);
            return;
        },
    };
    session.load_image(img.to_luma8());
    let name = input_path.file_stem().map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("image"));
    process_loaded(session, &name, args);
}

fn ms_per_megapixel(elapsed: Duration, width: u32, height: u32) -> f64 {
    elapsed.as_secs_f64() * 1000.0 / (width as f64 * height as f64 / 1000000.0)
}

// Filters (optionally) and analyzes the session's source image, then writes
// `<name>.json` and an annotated `<name>.bmp` to the output directory.
fn process_loaded(session: &mut AnalysisSession, name: &str, args: &Args) {
    if let Some(filter) = args.filter {
        if let Err(e) = session.apply_filter(filter, FilterTarget::Source) {
            warn!("Skipping {} due to: {}", name, e);
            return;
        }
    }
    let Some(image) = session.images().source() else {
        warn!("Skipping {}: no image", name);
        return;
    };
    let (width, height) = image.dimensions();

    let analysis_start = Instant::now();
    let circle = match session.analyze() {
        Ok(result) => {
            info!("WxH: {}x{}; center ({}, {}) radius {}; edge profile {} samples",
                  width, height, result.center.x, result.center.y, result.radius,
                  result.edge_profile.len());
            info!("Signal mean {:.2} noise stddev {:.2} CNR {:.2}",
                  result.signal_mean, result.noise_std, result.cnr);
            result.circle()
        },
        Err(e) => {
            warn!("Skipping {} due to: {}", name, e);
            return;
        },
    };
    info!("{}ms per megapixel\n",
          ms_per_megapixel(analysis_start.elapsed(), width, height));

    let output_dir = PathBuf::from(&args.output);
    if let Some(record) = session.export() {
        let output_path = output_dir.join(format!("{}.json", name));
        match record.to_json() {
            Ok(json) => if let Err(e) = fs::write(&output_path, json) {
                warn!("Could not write {:?}: {}", output_path, e);
            },
            Err(e) => warn!("Could not serialize result for {}: {}", name, e),
        }
    }

    // Mark where we found the circle.
    if let Some(image) = session.images().source() {
        let output_path = output_dir.join(format!("{}.bmp", name));
        if let Err(e) = annotate_circle(image, &circle).save(&output_path) {
            warn!("Could not write {:?}: {}", output_path, e);
        }
    }
}

// mod tests.
