use std::path::PathBuf;

use apibench_core::Target;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark every target and write a comparison report
    Run {
        /// Target as name=url; repeat for each server. Order breaks ties
        #[arg(short, long = "target", value_name = "NAME=URL")]
        targets: Vec<Target>,

        /// Requests per endpoint before phase scaling
        #[arg(short = 'n', long, env = "APIBENCH_REQUESTS")]
        requests: Option<u64>,

        /// Requests in flight per endpoint before phase scaling
        #[arg(short, long, env = "APIBENCH_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Report file
        #[arg(short, long, env = "APIBENCH_OUTPUT")]
        output: Option<PathBuf>,

        /// Chart data file for an external renderer
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Workload file or directory (YAML/JSON)
        #[arg(long, env = "APIBENCH_CONFIG")]
        config: Option<PathBuf>,

        /// Highest record id present before the run
        #[arg(long, env = "APIBENCH_SEED_MAX_ID")]
        seed_max_id: Option<u64>,

        /// Per-request timeout in seconds
        #[arg(long, env = "APIBENCH_TIMEOUT")]
        timeout: Option<u64>,

        /// Seconds to wait for targets to come up before probing
        #[arg(long, default_value_t = crate::consts::DEFAULT_WAIT_READY_SECS)]
        wait_ready: u64,

        /// Hide progress bars
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
    },
    /// Print the tables of a saved report
    Show {
        /// Report file
        report: PathBuf,
    },
}
