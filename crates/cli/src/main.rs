//! Pensum CLI - curriculum dependency engine.

mod config;
mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pensum_core::{CourseId, CurriculumGraph, EnrollmentRecord, EnrollmentSnapshot, EnrollmentState};
use pensum_layout::{GraphLayout, LayoutEngine, ViewportConfig};
use pensum_planner::{compute_available, Recommender, TieredRecommender};
use pensum_progress::{aggregate, BlockerAnalyzer, CompletionEstimator};
use pensum_storage::{JsonSnapshotStore, SnapshotStore, StorageError};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::PensumConfig;

#[derive(Parser)]
#[command(name = "pensum")]
#[command(about = "Curriculum dependency engine", long_about = None)]
struct Cli {
    /// Directory holding `curricula/` and `enrollments/`
    #[arg(long, env = "PENSUM_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Human-readable output instead of JSON
    #[arg(long, global = true)]
    text: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a curriculum
    Check {
        /// Program name
        #[arg(long)]
        program: String,
    },
    /// List courses a student can register now
    Available {
        /// Program name
        #[arg(long)]
        program: String,
        /// Student key
        #[arg(long)]
        student: String,
    },
    /// Progress statistics
    Stats {
        /// Program name
        #[arg(long)]
        program: String,
        /// Student key
        #[arg(long)]
        student: String,
    },
    /// Prioritized course recommendations
    Recommend {
        /// Program name
        #[arg(long)]
        program: String,
        /// Student key
        #[arg(long)]
        student: String,
    },
    /// Locked courses and bottlenecks
    Blockers {
        /// Program name
        #[arg(long)]
        program: String,
        /// Student key
        #[arg(long)]
        student: String,
    },
    /// Remaining semesters estimate
    Estimate {
        /// Program name
        #[arg(long)]
        program: String,
        /// Student key
        #[arg(long)]
        student: String,
    },
    /// Dependency graph layout
    Layout {
        /// Program name
        #[arg(long)]
        program: String,
        /// Student key, for node states
        #[arg(long)]
        student: Option<String>,
    },
    /// Record a course result
    Record {
        /// Program name
        #[arg(long)]
        program: String,
        /// Student key
        #[arg(long)]
        student: String,
        /// Course id
        #[arg(long)]
        course: String,
        /// NOT_TAKEN, IN_PROGRESS, APPROVED, FAILED or WITHDRAWN
        #[arg(long)]
        state: String,
        /// Final grade
        #[arg(long)]
        grade: Option<f64>,
        /// Term label, e.g. 2024-1
        #[arg(long)]
        semester: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckSummary<'a> {
    program: &'a str,
    courses: usize,
    tiers: usize,
    total_credits: u32,
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    layout: &'a GraphLayout,
    viewport: &'a ViewportConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(StorageError::Curriculum(cause)) = err.downcast_ref::<StorageError>() {
                if !cause.is_fatal() {
                    eprintln!("error: {err:#}");
                    return ExitCode::FAILURE;
                }
                error!(error = %cause, "integrity check failed");
                eprintln!("curriculum data unavailable: {cause}");
                return ExitCode::from(2);
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = PensumConfig::load(cli.config.as_deref()).await?;
    let store = JsonSnapshotStore::new(&cli.data_dir)
        .await
        .with_context(|| format!("opening data directory {}", cli.data_dir.display()))?;
    let text = cli.text;

    match cli.command {
        Commands::Check { program } => {
            let graph = store.load_graph(&program).await?;
            info!(program = %program, courses = graph.len(), "curriculum valid");
            if text {
                print!("{}", render::check(&program, &graph));
            } else {
                print_json(&CheckSummary {
                    program: &program,
                    courses: graph.len(),
                    tiers: graph.tiers().len(),
                    total_credits: graph.total_credits(),
                })?;
            }
        }
        Commands::Available { program, student } => {
            let (graph, enrollment) = load_pair(&store, &program, &student).await?;
            let set = compute_available(&graph, &enrollment);
            if text {
                print!("{}", render::available(&graph, &set));
            } else {
                print_json(&set)?;
            }
        }
        Commands::Stats { program, student } => {
            let (graph, enrollment) = load_pair(&store, &program, &student).await?;
            let stats = aggregate(&graph, &enrollment);
            if text {
                print!("{}", render::stats(&stats));
            } else {
                print_json(&stats)?;
            }
        }
        Commands::Recommend { program, student } => {
            let (graph, enrollment) = load_pair(&store, &program, &student).await?;
            let report = TieredRecommender::new().recommend(&graph, &enrollment);
            if text {
                print!("{}", render::recommendations(&report));
            } else {
                print_json(&report)?;
            }
        }
        Commands::Blockers { program, student } => {
            let (graph, enrollment) = load_pair(&store, &program, &student).await?;
            let analysis = BlockerAnalyzer::new().analyze(&graph, &enrollment);
            if text {
                print!("{}", render::blockers(&analysis));
            } else {
                print_json(&analysis)?;
            }
        }
        Commands::Estimate { program, student } => {
            let (graph, enrollment) = load_pair(&store, &program, &student).await?;
            let estimate = CompletionEstimator::new(config.estimator).estimate(&graph, &enrollment);
            if text {
                print!("{}", render::estimate(&estimate));
            } else {
                print_json(&estimate)?;
            }
        }
        Commands::Layout { program, student } => {
            let graph = store.load_graph(&program).await?;
            let enrollment = match student {
                Some(student) => store.load_enrollment(&student).await?,
                None => EnrollmentSnapshot::new(),
            };
            let layout = LayoutEngine::new(config.layout).layout(&graph, &enrollment);
            if text {
                print!("{}", render::layout(&layout));
            } else {
                print_json(&LayoutOutput {
                    layout: &layout,
                    viewport: &config.viewport,
                })?;
            }
        }
        Commands::Record {
            program,
            student,
            course,
            state,
            grade,
            semester,
        } => {
            let graph = store.load_graph(&program).await?;
            let record = build_record(&graph, &course, &state, grade, semester)?;

            let mut enrollment = store.load_enrollment(&student).await?;
            enrollment.upsert(record);
            store.save_enrollment(&student, &enrollment).await?;
            info!(student = %student, course = %course, state = %state, "enrollment recorded");

            let stored = enrollment.record(&CourseId::new(&course));
            if text {
                println!("Recorded {course} as {}", enrollment.state_of(&CourseId::new(&course)));
            } else {
                print_json(&stored)?;
            }
        }
    }

    Ok(())
}

async fn load_pair(
    store: &impl SnapshotStore,
    program: &str,
    student: &str,
) -> Result<(CurriculumGraph, EnrollmentSnapshot)> {
    let graph = store.load_graph(program).await?;
    let enrollment = store.load_enrollment(student).await?;
    Ok((graph, enrollment))
}

fn build_record(
    graph: &CurriculumGraph,
    course: &str,
    state: &str,
    grade: Option<f64>,
    semester: Option<String>,
) -> Result<EnrollmentRecord> {
    let course_id = CourseId::new(course);
    if !graph.contains(&course_id) {
        bail!("unknown course {course_id}");
    }
    let state: EnrollmentState = state.parse().map_err(anyhow::Error::msg)?;

    let mut record = EnrollmentRecord::new(course_id, state);
    if let Some(grade) = grade {
        if !grade.is_finite() || grade < 0.0 {
            bail!("grade must be a non-negative number");
        }
        record = record.with_grade(grade);
    }
    if let Some(label) = semester {
        record = record.with_semester_taken(label);
    }
    record.updated_at = Some(chrono::Utc::now());
    Ok(record)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
