use std::path::PathBuf;
use std::time::Instant;
use std::{env, process};

use gnomad_db::{GnomadBase, IngestParams, IngestStats};
use gnomad_db::ingest;

use getopts::Options;

use log::{info, LevelFilter};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new();
    init_logger(config.verbose);

    // Open or create the database.
    let database = GnomadBase::open_or_create(&config.db_dir).map_err(|x| x.to_string())?;

    // Ingest the tables.
    let mut statistics = IngestStats::default();
    for filename in config.tables.iter() {
        let file_stats = ingest::ingest_file(&database, filename, &config.params).map_err(|x| x.to_string())?;
        statistics += file_stats;
    }

    // Statistics.
    info!(
        "Inserted {} of {} rows from {} tables ({} dropped)",
        statistics.inserted, statistics.rows, config.tables.len(), statistics.dropped
    );
    let variants = database.len().map_err(|x| x.to_string())?;
    info!("The database contains {} variants", variants);
    let size = database.file_size().unwrap_or(String::from("unknown"));
    info!("Final database size: {}", size);

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    info!("Used {:.3} seconds", seconds);

    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

//-----------------------------------------------------------------------------

struct Config {
    pub tables: Vec<PathBuf>,
    pub db_dir: PathBuf,
    pub verbose: bool,
    pub params: IngestParams,
}

impl Config {
    pub fn new() -> Config {
        let mut params = IngestParams::default();

        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} [options] -d DIR table1.tsv[.gz] [table2.tsv[.gz] ...]", program);

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("d", "database", "database directory (required)", "DIR");
        let batch_desc = format!("number of rows per transaction (default: {})", params.batch_size);
        opts.optopt("b", "batch-size", &batch_desc, "INT");
        opts.optflag("v", "verbose", "print progress information for each batch");
        let matches = match opts.parse(&args[1..]) {
            Ok(m) => m,
            Err(f) => {
                eprintln!("{}", f);
                process::exit(1);
            }
        };

        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if let Some(s) = matches.opt_str("b") {
            match s.parse::<usize>() {
                Ok(n) if n > 0 => params.batch_size = n,
                _ => {
                    eprintln!("--batch-size: invalid value {}", s);
                    process::exit(1);
                }
            }
        }

        let db_dir = if let Some(s) = matches.opt_str("d") {
            PathBuf::from(s)
        } else {
            eprintln!("Database directory must be provided with --database");
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        let tables: Vec<PathBuf> = matches.free.iter().map(PathBuf::from).collect();
        if tables.is_empty() {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        }

        Config {
            tables,
            db_dir,
            verbose: matches.opt_present("v"),
            params,
        }
    }
}

//-----------------------------------------------------------------------------
