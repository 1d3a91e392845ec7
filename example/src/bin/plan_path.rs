// Plans a WAM trajectory from a JSON job file.
//
//   plan_path <job.json> [output.json]
//
// RUST_LOG sets the log level, WAM_CONFIG optionally points at a manipulator
// configuration file.

use std::error::Error;
use std::fs;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wam_trajectory::{
    BarrettWam4, LineTrajectoryPlanner, ManipulatorConfig, PlanOutcome, Point, TrajectoryPlanner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PlannerKind {
    #[default]
    Curve,
    Line,
}

#[derive(Debug, Deserialize)]
struct Job {
    #[serde(default)]
    planner: PlannerKind,
    speed: Option<f64>,
    max_chord: Option<f64>,
    samples_per_segment: Option<usize>,
    waypoints: Vec<Point>,
}

#[derive(Debug, Default, Serialize)]
struct PlanReport {
    succeeded: bool,
    /// False when the sampled curves leave a joint limit between waypoints
    within_limits: bool,
    durations: Vec<f64>,
    times: Vec<f64>,
    values: Vec<Vec<f64>>,
    path: Vec<Point>,
}

fn load_manipulator() -> Result<BarrettWam4, Box<dyn Error>> {
    let Ok(path) = std::env::var("WAM_CONFIG") else {
        return Ok(BarrettWam4::default());
    };
    let config: ManipulatorConfig = serde_json::from_str(&fs::read_to_string(&path)?)?;
    info!("Loaded {} from {}", config.name, path);
    Ok(BarrettWam4::from_config(config)?)
}

fn report(planner: &TrajectoryPlanner<'_, BarrettWam4>, outcome: PlanOutcome) -> PlanReport {
    let Some(trajectory) = outcome.into_trajectory() else {
        return PlanReport::default();
    };

    let samples = planner.curves_values(&trajectory);
    let within_limits = planner.first_limit_violation(&samples).is_none();
    let path = planner.end_effector_path(&samples);
    let (_, durations) = trajectory.into_parts();

    PlanReport {
        succeeded: true,
        within_limits,
        durations,
        times: samples.times,
        values: samples.values,
        path,
    }
}

fn plan(wam: &BarrettWam4, job: &Job) -> Result<PlanReport, Box<dyn Error>> {
    let mut planner = TrajectoryPlanner::new(wam);
    if let Some(samples) = job.samples_per_segment {
        planner = planner.with_samples_per_segment(samples);
    }

    match job.planner {
        PlannerKind::Curve => {
            let outcome = planner.trajectory_through_points(&job.waypoints)?;
            Ok(report(&planner, outcome))
        }
        PlannerKind::Line => {
            let mut line = LineTrajectoryPlanner::from_planner(planner);
            if let Some(max_chord) = job.max_chord {
                line = line.with_max_chord(max_chord);
            }
            let outcome = line.trajectory_through_points(&job.waypoints)?;
            Ok(report(line.planner(), outcome))
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(job_path) = args.next() else {
        eprintln!("usage: plan_path <job.json> [output.json]");
        std::process::exit(2);
    };
    let output = args.next();

    let job: Job = serde_json::from_str(&fs::read_to_string(&job_path)?)?;
    info!(
        "{:?} job with {} waypoints from {}",
        job.planner,
        job.waypoints.len(),
        job_path
    );

    let mut wam = load_manipulator()?;
    if let Some(speed) = job.speed {
        wam.set_speed(speed)?;
    }

    let report = plan(&wam, &job)?;
    if report.succeeded {
        info!(
            "Planned {} segments, {} samples",
            report.durations.len(),
            report.times.len()
        );
        if !report.within_limits {
            warn!("Sampled trajectory leaves the joint limits between waypoints");
        }
    } else {
        warn!("Path leaves the workspace, nothing planned");
    }

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            info!("Wrote {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
