//! Detect motion in an image sequence and box it.

use clap::*;
use flowseg::prelude::v1::{Result, *};
use log::*;
use std::fs::File;
use std::path::Path;

mod frames;
mod sink;

use frames::*;
use sink::FileSink;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("motion-detect")
        .version(crate_version!())
        .author(crate_authors!())
        .arg(
            Arg::new("input")
                .long("input")
                .short('i')
                .takes_value(true)
                .required(true)
                .help("Directory of input frames, processed in name order"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .help("JSON pipeline configuration"),
        )
        .arg(
            Arg::new("prop")
                .long("prop")
                .short('p')
                .takes_value(true)
                .multiple_occurrences(true)
                .help("Override a property, as Name=value"),
        )
        .arg(
            Arg::new("estimator")
                .long("estimator")
                .short('e')
                .takes_value(true)
                .possible_values(["block", "farneback"])
                .default_value("block"),
        )
        .arg(
            Arg::new("dump-masks")
                .long("dump-masks")
                .short('m')
                .required(false),
        )
        .arg(Arg::new("output").takes_value(true).required(true))
        .get_matches();

    let input = matches
        .value_of("input")
        .ok_or_else(|| anyhow!("no input directory"))?;
    let output = matches
        .value_of("output")
        .ok_or_else(|| anyhow!("no output directory"))?;
    let dump_masks = matches.is_present("dump-masks");

    let config = match matches.value_of("config") {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => PipelineConfig::default(),
    };

    let estimator = create_estimator(matches.value_of("estimator").unwrap_or("block"))?;
    let mut pipeline = MotionPipeline::with_config(estimator, config);

    for prop in matches.values_of("prop").into_iter().flatten() {
        let (name, value) = parse_prop(prop)?;
        pipeline.set_prop(name, value)?;
    }

    for (name, prop) in pipeline.props() {
        debug!("{name}: {prop:?}");
    }

    run(&mut pipeline, Path::new(input), Path::new(output), dump_masks)
}

fn create_estimator(name: &str) -> Result<Box<dyn FlowEstimator>> {
    match name {
        "block" => Ok(Box::new(block_flow_estimator::BlockFlowEstimator::default())),
        #[cfg(feature = "farneback")]
        "farneback" => Ok(Box::new(
            farneback_estimator::FarnebackEstimator::default(),
        )),
        _ => Err(anyhow!("estimator {name} is not available in this build")),
    }
}

/// Split a `Name=value` property override.
fn parse_prop(prop: &str) -> Result<(&str, &str)> {
    prop.split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .ok_or_else(|| anyhow!("property {prop} is not in Name=value form"))
}

fn run<E: FlowEstimator>(
    pipeline: &mut MotionPipeline<E>,
    input: &Path,
    output: &Path,
    dump_masks: bool,
) -> Result<()> {
    let paths = list_frames(input)?;

    if paths.is_empty() {
        bail!("no frames found in {}", input.display());
    }

    info!("processing {} frames", paths.len());

    let mut sink = FileSink::create(output)?;
    let mut detected = 0;

    for (i, path) in paths.iter().enumerate() {
        let frame = match load_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                error!("{e}");
                continue;
            }
        };

        // Outputs are numbered by input position.
        sink.seek(i);

        let detection = match pipeline.process_into(&frame, &mut sink) {
            Ok(detection) => detection,
            Err(e) => {
                error!("{}: {e}", path.display());
                continue;
            }
        };

        if let Some(bbox) = detection.bbox {
            detected += 1;
            debug!("{}: {:?}", path.display(), bbox);
        }

        if dump_masks {
            if let Some(mask) = &detection.mask {
                gray_image(&mask.to_frame())?.save(sink.frame_path("mask_", i))?;
            }
        }
    }

    sink.finish()?;

    info!("motion found in {detected} of {} frames", paths.len());

    Ok(())
}
