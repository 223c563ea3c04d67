use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::{env, process};

use gnomad_db::{FieldSelector, FrequencyTable, GnomadBase, Interval, VariantQuery};
use gnomad_db::utils;

use getopts::Options;

use log::{debug, LevelFilter};

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    // Parse arguments.
    let config = Config::new()?;
    init_logger(config.verbose);

    // Open the database.
    if !GnomadBase::exists(&config.db_dir) {
        return Err(format!("No database in {}", config.db_dir.display()));
    }
    let database = GnomadBase::open_or_create(&config.db_dir).map_err(|x| x.to_string())?;

    // Run the query.
    let table = match &config.query {
        QueryType::Variants(variants) => {
            debug!("Looking up {} variants", variants.len());
            database.lookup_many(variants, &config.fields)
        },
        QueryType::Interval(interval) => {
            debug!("Looking up interval {}", interval);
            database.lookup_interval(interval, &config.fields)
        },
    }.map_err(|x| x.to_string())?;

    // TSV output.
    write_table(&table).map_err(|x| x.to_string())?;

    Ok(())
}

fn init_logger(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("RUST_LOG")
        .init();
}

fn write_table(table: &FrequencyTable) -> io::Result<()> {
    let stdout = io::stdout();
    let mut output = io::BufWriter::new(stdout.lock());
    table.write_tsv(&mut output)?;
    output.flush()
}

//-----------------------------------------------------------------------------

enum QueryType {
    Variants(Vec<VariantQuery>),
    Interval(Interval),
}

struct Config {
    pub db_dir: PathBuf,
    pub fields: FieldSelector,
    pub query: QueryType,
    pub verbose: bool,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} [options] DIR", program);

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("f", "fields", "output fields: * or a comma-separated list such as AF,AF_popmax (default: AF)", "STR");
        opts.optmulti("v", "variant", "variant chrom:pos:ref>alt (may repeat)", "STR");
        opts.optopt("i", "interval", "interval chrom:start-end (inclusive)", "STR");
        opts.optopt("t", "table", "tab-separated chrom, pos, ref, alt table of variants; may be gzip-compressed", "FILE");
        opts.optflag("", "verbose", "print debug information");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let fields = match matches.opt_str("f") {
            Some(s) => s.parse::<FieldSelector>().map_err(|x| format!("--fields: {}", x))?,
            None => FieldSelector::default(),
        };

        let interval = matches.opt_str("i");
        let table = matches.opt_str("t");
        let variants = matches.opt_strs("v");
        let query_types = [interval.is_some(), table.is_some(), !variants.is_empty()];
        if query_types.iter().filter(|x| **x).count() != 1 {
            return Err(String::from("Exactly one of --variant, --interval, and --table must be provided"));
        }

        let query = if let Some(s) = interval {
            QueryType::Interval(Interval::parse(&s).map_err(|x| format!("--interval: {}", x))?)
        } else if let Some(filename) = table {
            QueryType::Variants(read_variants(&filename)?)
        } else {
            let mut queries = Vec::with_capacity(variants.len());
            for variant in variants.iter() {
                queries.push(VariantQuery::parse(variant).map_err(|x| format!("--variant: {}", x))?);
            }
            QueryType::Variants(queries)
        };

        let db_dir = if let Some(s) = matches.free.first() {
            PathBuf::from(s)
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Ok(Config {
            db_dir,
            fields,
            query,
            verbose: matches.opt_present("verbose"),
        })
    }
}

//-----------------------------------------------------------------------------

// Reads variants from a headerless table with columns chrom, pos, ref, and alt.
// Additional columns are ignored.
fn read_variants(filename: &str) -> Result<Vec<VariantQuery>, String> {
    let reader = utils::open_file(filename).map_err(|x| format!("Cannot open {}: {}", filename, x))?;
    let mut result = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.map_err(|x| x.to_string())?;
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(format!("{}:{}: expected chrom, pos, ref, and alt", filename, line_num + 1));
        }
        let pos = fields[1].parse::<usize>().map_err(|x| {
            format!("{}:{}: invalid position {}: {}", filename, line_num + 1, fields[1], x)
        })?;
        result.push(VariantQuery::new(fields[0], pos, fields[2], fields[3]));
    }
    Ok(result)
}

//-----------------------------------------------------------------------------
