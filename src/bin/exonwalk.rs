use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{self, Parser, Subcommand, ValueEnum};
use log::{error, info, Level};
use simple_logger::init_with_level;

use exonwalk::pipeline::{exon_info, load_exons, walk_converted, PipelineResult};
use exonwalk::walk::{ReportOrder, WalkOptions, MAX_DISTANCE};
use exonwalk::writer::TargetFormat;
use exonwalk::{Groups, Writer};

#[derive(Debug, Parser)]
#[command(name = "exonwalk", author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(
        short = 'L',
        long = "level",
        help = "Log level",
        value_name = "LEVEL",
        value_enum,
        default_value_t = LogLevel::Info,
        global = true
    )]
    level: LogLevel,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print splice pattern groups, one tab-separated group per line
    Groups(TableArgs),

    /// Print adjacent relations not explained by the groups, one pair per line
    Rels(TableArgs),

    /// Walk a converted exon table and print the unexplained exons
    Walk(WalkArgs),
}

#[derive(Debug, clap::Args)]
struct TableArgs {
    #[arg(value_name = "PATH", help = "Path to the exon table")]
    input: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Output path (stdout if omitted, gzip if ending in .gz)"
    )]
    output: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
struct WalkArgs {
    #[arg(value_name = "CONVERTED", help = "Path to the converted exon table")]
    converted: PathBuf,

    #[arg(value_name = "ORIGINAL", help = "Path to the original exon table")]
    original: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Output path (stdout if omitted, gzip if ending in .gz)"
    )]
    output: Option<PathBuf>,

    #[arg(
        short = 'd',
        long = "max-distance",
        value_name = "BASES",
        help = "Stop a walk at exons farther than this from the seed exon",
        default_value_t = MAX_DISTANCE
    )]
    max_distance: u64,

    #[arg(
        long = "order",
        value_name = "ORDER",
        help = "Report order of the walked exons",
        value_enum,
        default_value_t = Order::Index
    )]
    order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Order {
    /// Ascending exon index
    Index,
    /// Walk direction
    Walk,
}

impl From<Order> for ReportOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Index => ReportOrder::Index,
            Order::Walk => ReportOrder::Walk,
        }
    }
}

fn main() {
    let start = std::time::Instant::now();
    let args: Args = Args::parse();

    init_with_level(args.level.into()).unwrap_or_else(|e| {
        eprintln!("ERROR: failed to initialize logger: {e}");
        std::process::exit(1);
    });

    run(args.command).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    info!("finished in {:?}", start.elapsed());
}

fn run(command: Command) -> PipelineResult<()> {
    match command {
        Command::Groups(args) => {
            let exons = load_exons(&args.input)?;
            let groups = Groups::from_exons(&exons);
            info!("{} groups", groups.len());
            emit(groups.as_slice(), args.output.as_deref())
        }
        Command::Rels(args) => {
            let exons = load_exons(&args.input)?;
            let info = exon_info(&exons);
            emit(info.relations.as_slice(), args.output.as_deref())
        }
        Command::Walk(args) => {
            let options = WalkOptions::new()
                .max_distance(args.max_distance)
                .report_order(args.order.into());

            let original = load_exons(&args.original)?;
            let info = exon_info(&original);
            let converted = load_exons(&args.converted)?;
            let run = walk_converted(converted, &info, &options);

            emit(&run.reports, args.output.as_deref())
        }
    }
}

fn emit<F: TargetFormat>(records: &[F], output: Option<&Path>) -> PipelineResult<()> {
    match output {
        Some(path) => Writer::to_path(path, records)?,
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            Writer::from_records(records, &mut writer)?;
            writer.flush()?;
        }
    }
    Ok(())
}
