use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

use clap::Parser;
use seqbeam::{
    BeamConfig, BeamSearch, BioValidator, Dataset, Evaluation, ItemContextGenerator, LinearModel,
    Result, ScoringModel, SequenceValidator,
};

/// Assign the most probable label sequences to the instances in the data sets (FILE).
/// If no FILE is given, or FILE is '-', data is read from STDIN.
#[derive(Debug, Parser)]
#[command(version)]
struct Argv {
    /// read a log-linear model from a JSON file (MODEL)
    #[arg(short, long, value_name = "MODEL")]
    model: PathBuf,
    /// number of hypotheses kept per position
    #[arg(short, long, default_value_t = 3)]
    beam_size: usize,
    /// number of label sequences to output per instance
    #[arg(short, long, default_value_t = 1)]
    n_best: usize,
    /// number of model evaluations to memoize (0 disables the cache)
    #[arg(short, long, default_value_t = 0)]
    cache_size: usize,
    /// prune hypotheses whose log-probability is not above this value
    #[arg(long, allow_negative_numbers = true)]
    min_score: Option<f64>,
    /// forbid I-X tags that do not continue a B-X or I-X chunk
    #[arg(long)]
    bio: bool,
    /// report the performance of the model on the data
    #[arg(short = 't', long = "test")]
    evaluate: bool,
    /// print results as JSON, one line per instance
    #[arg(short, long)]
    json: bool,
    /// suppress tagging results (useful for test mode)
    #[arg(short, long)]
    quiet: bool,
    #[arg(value_name = "FILE")]
    datasets: Vec<PathBuf>,
}

impl Argv {
    fn config(&self) -> BeamConfig {
        let mut config = BeamConfig::with_beam_size(self.beam_size).cache_size(self.cache_size);
        if let Some(min) = self.min_score {
            config.min_sequence_score = min;
        }
        config
    }
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    if path.as_os_str() == "-" {
        Dataset::read(io::stdin().lock())
    } else {
        Dataset::from_path(path)
    }
}

fn run(argv: &Argv) -> Result<()> {
    let model = LinearModel::from_path(&argv.model)?;
    log::info!(
        "loaded {} outcomes, {} features from {:?}",
        model.outcome_count(),
        model.num_features(),
        argv.model
    );
    let config = argv.config();
    let bio = argv.bio;
    let validator = move |i: usize, seq: &[Vec<String>], prior: &[String], outcome: &str| {
        !bio || BioValidator.valid(i, seq, prior, outcome)
    };
    let mut search =
        BeamSearch::new(model, ItemContextGenerator, &config)?.with_validator(validator);

    let stdin_path = PathBuf::from("-");
    let datasets = if argv.datasets.is_empty() {
        std::slice::from_ref(&stdin_path)
    } else {
        &argv.datasets[..]
    };

    let mut evaluation = Evaluation::default();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let begin = Instant::now();
    let mut num_instances = 0;
    for path in datasets {
        let ds = read_dataset(path)?;
        log::debug!("{:?}: {} instances, {} items", path, ds.len(), ds.total_items());
        for instance in &ds.instances {
            let results = search.best_sequences(
                argv.n_best,
                &instance.items,
                &[],
                config.min_sequence_score,
            )?;
            num_instances += 1;
            if argv.evaluate {
                let top = results.first().map(|s| s.outcomes()).unwrap_or_default();
                evaluation.accumulate(&instance.labels, top);
            }
            if argv.quiet {
                continue;
            }
            if argv.json {
                writeln!(out, "{}", serde_json::to_string(&results)?)?;
                continue;
            }
            for seq in &results {
                if argv.n_best > 1 {
                    writeln!(out, "@{}", seq.score())?;
                }
                for label in seq.outcomes() {
                    writeln!(out, "{label}")?;
                }
                writeln!(out)?;
            }
        }
    }
    if argv.evaluate {
        evaluation.evaluate();
        write!(out, "{evaluation}")?;
        let secs = begin.elapsed().as_secs_f64();
        writeln!(
            out,
            "Elapsed time: {:.6} [sec] ({:.1} [instance/sec])",
            secs,
            num_instances as f64 / secs
        )?;
    }
    out.flush()?;
    log::debug!("cache hits={}, misses={}", search.cache().hits(), search.cache().misses());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let argv = Argv::parse();
    log::info!("{:?}", argv);
    match run(&argv) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("seqbeam: {e}");
            ExitCode::FAILURE
        }
    }
}
