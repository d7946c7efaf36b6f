use clap::Parser;
use lockstep_sort::{
    render_channel, workload, Algorithm, Bounds, Coordinator, Renderer, RunId, RunSummary,
    SortConfig, SummaryRenderer,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Sorts one shuffled sequence with several algorithms in lockstep and
/// reports how many reads and writes each one needed.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of elements to sort
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Seed for the initial shuffle
    #[arg(short, long)]
    seed: Option<u64>,

    /// Comma separated algorithm names, e.g. `bubble,quick,gnome`
    #[arg(short, long, value_delimiter = ',')]
    algorithms: Vec<Algorithm>,

    /// First index of the range to sort
    #[arg(long, requires = "hi")]
    lo: Option<usize>,

    /// Last index (inclusive) of the range to sort
    #[arg(long, requires = "lo")]
    hi: Option<usize>,

    /// Print the array after every write
    #[arg(long)]
    trace_writes: bool,

    /// Print run summaries as JSON instead of colored text
    #[arg(long)]
    json: bool,

    /// Enable verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> Result<SortConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => {
                info!("loading configuration from {}", path.display());
                SortConfig::load(path)?
            }
            None => SortConfig::default(),
        };

        if let Some(size) = self.size {
            config.size = size;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if !self.algorithms.is_empty() {
            config.algorithms = self.algorithms;
        }
        if let (Some(lo), Some(hi)) = (self.lo, self.hi) {
            config.bounds = Some(Bounds::new(lo, hi)?);
        }
        config.trace_writes |= self.trace_writes;
        config.json |= self.json;

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "lockstep_sort=warn".into()),
        1 => tracing_subscriber::EnvFilter::new("lockstep_sort=debug"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.into_config()?;
    let initial = workload::shuffled_permutation(config.size, config.seed);
    debug!(?initial, "initial sequence");

    let (channel, mut frames) = render_channel::<usize>();
    for (index, &algorithm) in config.algorithms.iter().enumerate() {
        frames.seed(RunId { index, algorithm }, &initial);
    }
    let round_hook = channel.round_hook();

    // Frames are only logged here; a display would draw each batch instead.
    let consumer = thread::Builder::new()
        .name("frames".to_string())
        .spawn(move || {
            let mut rounds = 0u64;
            for batch in frames {
                rounds += 1;
                let done = batch.iter().filter(|frame| frame.finished).count();
                debug!(round = rounds, runs = batch.len(), done, "frame batch");
            }
            rounds
        })?;

    let renderer: Arc<dyn Renderer<usize>> = if config.json {
        Arc::new(channel)
    } else {
        Arc::new((channel, SummaryRenderer::new(config.trace_writes)))
    };

    let mut coordinator = Coordinator::new(initial, renderer)
        .algorithms(config.algorithms.iter().copied())
        .on_round_complete(round_hook);
    if let Some(bounds) = config.bounds {
        coordinator = coordinator.bounds(bounds);
    }
    let reports = coordinator.run()?;

    match consumer.join() {
        Ok(rounds) => info!(rounds, "frame consumer finished"),
        Err(payload) => std::panic::resume_unwind(payload),
    }

    if config.json {
        let summaries: Vec<RunSummary> = reports.iter().map(|report| report.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }

    let failed = reports.iter().filter(|report| !report.is_sorted()).count();
    if failed > 0 {
        return Err(format!("{failed} of {} runs did not sort", reports.len()).into());
    }
    Ok(())
}
