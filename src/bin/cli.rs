//! CLI application for body measurement from pose landmarks.
//!
//! Usage:
//!   percent-body <landmarks.json>                      # Human-readable output
//!   percent-body <landmarks.json> --reference sheet    # Calibrate from a reference sheet
//!   percent-body <landmarks.json> --json               # JSON output
//!   percent-body <landmarks.json> -o measurements.json # Save to file
//!
//! The landmark file holds the provider output in its raw order:
//!   {"keypoints": [{"name": "left_shoulder", "x": 101.5, "y": 88.0, "score": 0.92}, ...]}

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use percent_body::{Assessment, Config, LandmarkSet, Pipeline, ReferenceKind, TorsoRole};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "percent-body")]
#[command(author, version, about = "Body measurements from pose landmarks", long_about = None)]
struct Args {
    /// Landmark JSON file
    #[arg(required = true)]
    landmarks: PathBuf,

    /// Object of known size used to calibrate the image scale
    #[arg(short, long, value_enum, default_value_t = Reference::Auto)]
    reference: Reference,

    /// JSON configuration file (defaults are used for missing keys)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Reference {
    /// Distance between the eyes
    Eyes,
    /// Standard sheet held in frame
    Sheet,
    /// Sheet if visible, otherwise eyes
    Auto,
}

impl Reference {
    fn kinds(self) -> &'static [ReferenceKind] {
        match self {
            Self::Eyes => &[ReferenceKind::Interpupillary],
            Self::Sheet => &[ReferenceKind::ReferenceRectangle],
            Self::Auto => &[ReferenceKind::ReferenceRectangle, ReferenceKind::Interpupillary],
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        eprintln!("Hint: {}", e.hint());
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let mut filter = EnvFilter::from_default_env();
    if verbose {
        if let Ok(d) = "percent_body=debug".parse() {
            filter = filter.add_directive(d);
        }
    }
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run(args: &Args) -> percent_body::Result<()> {
    let config = match &args.config {
        Some(path) => {
            debug!(?path, "loading configuration");
            Config::from_json_file(path)?
        }
        None => Config::default(),
    };
    let pipeline = Pipeline::new(config)?;

    debug!(path = ?args.landmarks, "loading landmarks");
    let contents = std::fs::read_to_string(&args.landmarks)?;
    let landmarks: LandmarkSet = serde_json::from_str(&contents)?;
    debug!(count = landmarks.len(), "landmarks loaded");

    let assessment = pipeline.run_any(&landmarks, args.reference.kinds())?;

    let output_str = if args.json {
        serde_json::to_string_pretty(&assessment)?
    } else {
        format_human_readable(&args.landmarks, &assessment)
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        debug!(?path, "output written");
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

fn format_human_readable(source: &std::path::Path, assessment: &Assessment) -> String {
    let m = &assessment.measurement;
    let unit = m.unit;
    let mut s = String::new();

    s.push_str(&format!("Landmarks: {}\n", source.display()));
    s.push_str(&format!("Scale: {:.4} cm/px\n", assessment.scale.cm_per_pixel()));

    s.push_str("\nMeasurements:\n");
    s.push_str(&format!("  Chest:        {:.2} {}\n", m.chest, unit));
    s.push_str(&format!("  Waist (est.): {:.2} {}\n", m.waist, unit));
    s.push_str(&format!("  Hip:          {:.2} {}\n", m.hip, unit));
    s.push_str(&format!("  Torso length: {:.2} {}\n", m.torso_length, unit));
    s.push_str(&format!("  Size:         {}\n", assessment.size));

    s.push_str("\nWidths (cm):\n");
    s.push_str(&format!("  Shoulders: {:.1}\n", m.raw.shoulder_width_cm));
    s.push_str(&format!("  Waist:     {:.1}\n", m.raw.waist_width_cm));
    s.push_str(&format!("  Hips:      {:.1}\n", m.raw.hip_width_cm));

    s.push_str("\nLandmark confidence:\n");
    for role in TorsoRole::ALL {
        if let Some(score) = m.confidence.get(&role) {
            s.push_str(&format!("  {:<15} {:.2}\n", role.name(), score));
        }
    }

    s
}
