use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use otofind::acquisition;
use otofind::classification::{AOM_TAG, CSOM_TAG, ModelSpec};
use otofind::config::{self, AppConfig};
use otofind::{
    InferenceResult, InferenceRunner, MergePolicy, ModelOutcome, ModelSet, RequestId,
    ResultFormatter,
};

#[derive(Parser)]
#[command(name = "otofind")]
#[command(about = "Screen eardrum photos for acute and chronic otitis media")]
struct Cli {
    /// Image to classify (starts the GUI when omitted)
    #[arg(value_name = "IMAGE")]
    image_path: Option<PathBuf>,

    /// Directory holding aom.rten and csom.rten
    #[arg(long, value_name = "DIR", env = "OTOFIND_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// Acute otitis media model (overrides --models-dir)
    #[arg(long, value_name = "FILE")]
    aom_model: Option<PathBuf>,

    /// Chronic suppurative otitis media model (overrides --models-dir)
    #[arg(long, value_name = "FILE")]
    csom_model: Option<PathBuf>,

    /// Square input size the models expect, in pixels
    #[arg(long, default_value_t = 224)]
    input_size: u32,

    /// Decimals shown for each percentage
    #[arg(long, default_value_t = 1)]
    precision: usize,

    /// Show a failing model on its own line instead of replacing all results
    #[arg(long)]
    isolate_failures: bool,

    /// Seconds to wait for each model
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// Photo capture command, "{output}" is replaced by the file to write
    #[arg(long, value_name = "COMMAND", env = "OTOFIND_CAMERA_COMMAND")]
    camera_command: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn to_config(&self) -> AppConfig {
        let models_dir = self
            .models_dir
            .clone()
            .unwrap_or_else(config::default_models_dir);
        let size = self.input_size;

        let models = vec![
            ModelSpec::new(
                AOM_TAG,
                self.aom_model
                    .clone()
                    .unwrap_or_else(|| models_dir.join("aom.rten")),
            )
            .with_input_size(size, size),
            ModelSpec::new(
                CSOM_TAG,
                self.csom_model
                    .clone()
                    .unwrap_or_else(|| models_dir.join("csom.rten")),
            )
            .with_input_size(size, size),
        ];

        AppConfig {
            models,
            merge_policy: if self.isolate_failures {
                MergePolicy::Isolated
            } else {
                MergePolicy::Clobber
            },
            precision: self.precision,
            result_timeout: Duration::from_secs(self.timeout),
            camera_command: self.camera_command.as_deref().and_then(config::parse_command),
        }
    }
}

#[derive(Serialize)]
struct ScoredModel {
    tag: String,
    score: f32,
    percent: f64,
}

impl From<InferenceResult> for ScoredModel {
    fn from(result: InferenceResult) -> Self {
        Self {
            percent: result.percent(),
            tag: result.tag,
            score: result.score,
        }
    }
}

#[derive(Serialize)]
struct FailedModel {
    tag: String,
    reason: String,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    image: &'a Path,
    request: RequestId,
    results: Vec<ScoredModel>,
    failures: Vec<FailedModel>,
    display: String,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    let config = args.to_config();

    match &args.image_path {
        Some(path) => classify_file(&config, path, args.json),
        None => run_gui(config),
    }
}

#[cfg(feature = "gui")]
fn run_gui(config: AppConfig) -> anyhow::Result<()> {
    otofind::gui::run(config).map_err(|e| anyhow::anyhow!("GUI failed: {}", e))
}

#[cfg(not(feature = "gui"))]
fn run_gui(_config: AppConfig) -> anyhow::Result<()> {
    anyhow::bail!("No image given and otofind was built without the gui feature")
}

fn classify_file(config: &AppConfig, path: &Path, json: bool) -> anyhow::Result<()> {
    let models = ModelSet::load(&config.models)?;
    let runner = InferenceRunner::new(models)?;

    let acquired = acquisition::decode_file(path)?;
    log::info!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        acquired.image.width(),
        acquired.image.height(),
        acquired.orientation
    );

    let mut formatter = ResultFormatter::new(config.merge_policy, config.precision);
    log::debug!("Missing results use the {:?} policy", formatter.policy());
    let submission = runner.submit(acquired.into_request())?;
    let request = submission.request;
    formatter.begin(request);

    let runtime = tokio::runtime::Runtime::new()?;
    let reports = runtime.block_on(submission.collect_within(config.result_timeout));

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for report in reports {
        if let Some(result) = report.result() {
            results.push(ScoredModel::from(result));
        } else if report.outcome.is_missing() {
            let reason = match &report.outcome {
                ModelOutcome::Failed(reason) => reason.clone(),
                _ => "model produced no output".to_string(),
            };
            failures.push(FailedModel {
                tag: report.tag.clone(),
                reason,
            });
        }
        formatter.apply(report);
    }

    if json {
        let output = JsonOutput {
            image: path,
            request,
            results,
            failures,
            display: formatter.render(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", formatter.render());
    }

    Ok(())
}
