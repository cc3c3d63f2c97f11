//! icd10cm-terms CLI - Extract and enrich ICD-10-CM terms
//!
//! # Main Command
//!
//! ```bash
//! icd10cm-terms extract                                  # order file -> terms CSV
//! icd10cm-terms extract --leaf-only --include-official-abbr
//! icd10cm-terms extract --disable-rules C1 --report-json report.json
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! icd10cm-terms parse --input icd10cm_order_2026.txt    # Dump parsed records as JSON
//! icd10cm-terms canon "Pain, unspecified."               # Canonical form of a term
//! icd10cm-terms enrich "B-cell leukemia"                 # Variants with rule ids
//! icd10cm-terms rules                                    # List the rule set
//! ```

use clap::{Args, Parser, Subcommand};
use icd10cm::logs::{init_logging, log_info, log_success, log_warning};
use icd10cm::{
    builtin_rules, canonicalize, enrich_term, parse_lines, print_summary, read_input_file, transform_file,
    write_terms_csv, InputError, MalformedPolicy, ParseMode, PipelineError, RuleResult, RuleSet, RunSummary,
    TransformOptions, DEFAULT_ENRICHED_MAX_PER_TERM,
};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_INPUT: &str = "icd10cm_order_2026.txt";
const DEFAULT_OUTPUT: &str = "icd10cm_terms_2026.csv";

/// Exit status when the input file does not exist.
const EXIT_INPUT_NOT_FOUND: i32 = 2;

#[derive(Parser)]
#[command(name = "icd10cm-terms")]
#[command(about = "Extract + enrich ICD-10-CM terms", long_about = None)]
struct Cli {
    /// More progress output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: order file -> (code, term, type) CSV
    Extract(ExtractArgs),

    /// Parse the order file and output records as JSON
    Parse {
        /// Input order file
        #[arg(long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Fall back to whitespace layouts for lines that do not fit the fixed columns
        #[arg(long)]
        lenient: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the canonical form of a term
    Canon {
        term: String,
    },

    /// Show enrichment variants of a term
    Enrich {
        term: String,

        /// Maximum number of variants
        #[arg(long, default_value_t = DEFAULT_ENRICHED_MAX_PER_TERM)]
        max: usize,

        #[command(flatten)]
        rules: RuleArgs,
    },

    /// List the enrichment rules
    Rules {
        #[command(flatten)]
        rules: RuleArgs,

        /// Print rule definitions as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ExtractArgs {
    /// Path to icd10cm_order_YYYY.txt
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Output CSV path
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Only include billable (leaf) codes (FLAG == 1)
    #[arg(long)]
    leaf_only: bool,

    /// Also emit the short description as Type=official+abbr
    #[arg(long)]
    include_official_abbr: bool,

    /// Disable canonical rows
    #[arg(long)]
    no_canonical: bool,

    /// Disable enriched rows
    #[arg(long)]
    no_enriched: bool,

    /// Maximum enriched rows per canonical term
    #[arg(long)]
    enriched_max_per_term: Option<usize>,

    /// Disable per-rule enrichment report printing
    #[arg(long)]
    no_rule_report: bool,

    /// Recover lines that do not fit the fixed columns
    #[arg(long)]
    lenient: bool,

    /// Abort on the first malformed line instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Write the run summary as JSON
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Options JSON file; explicit flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    rules: RuleArgs,
}

#[derive(Args)]
struct RuleArgs {
    /// Only run these rule ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    rules: Vec<String>,

    /// Do not run these rule ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    disable_rules: Vec<String>,

    /// Extra rules from a JSON file, appended after the built-in ones
    #[arg(long)]
    rules_file: Option<PathBuf>,
}

impl RuleArgs {
    fn build(&self) -> RuleResult<RuleSet> {
        let mut rules = builtin_rules()?;
        if let Some(ref path) = self.rules_file {
            let extra = RuleSet::load_rules_file(path)?;
            log_info(format!("Loaded {} rules from {}", extra.len(), path.display()));
            rules = rules.extend(extra)?;
        }
        if !self.rules.is_empty() {
            rules = rules.select(self.rules.as_slice())?;
        }
        if !self.disable_rules.is_empty() {
            rules = rules.without(self.disable_rules.as_slice())?;
        }
        Ok(rules)
    }
}

impl ExtractArgs {
    fn options(&self) -> Result<TransformOptions, PipelineError> {
        let mut options = match self.config {
            Some(ref path) => TransformOptions::load(path)?,
            None => TransformOptions::default(),
        };

        if self.leaf_only {
            options.leaf_only = true;
        }
        if self.include_official_abbr {
            options.include_official_abbr = true;
        }
        if self.no_canonical {
            options.include_canonical = false;
        }
        if self.no_enriched {
            options.include_enriched = false;
        }
        if let Some(max) = self.enriched_max_per_term {
            options.enriched_max_per_term = max;
        }
        if self.lenient {
            options.parse_mode = ParseMode::Lenient;
        }
        if self.strict {
            options.on_malformed = MalformedPolicy::Abort;
        }
        Ok(options)
    }
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract(args) => cmd_extract(&args),

        Commands::Parse { input, lenient, output } => cmd_parse(&input, lenient, output.as_deref()),

        Commands::Canon { term } => cmd_canon(&term),

        Commands::Enrich { term, max, rules } => cmd_enrich(&term, max, &rules),

        Commands::Rules { rules, json } => cmd_rules(&rules, json),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {}", e);
        std::process::exit(exit_code(e.as_ref()));
    }
}

fn exit_code(err: &(dyn Error + 'static)) -> i32 {
    let not_found = matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::Input(InputError::NotFound(_)))
    ) || matches!(err.downcast_ref::<InputError>(), Some(InputError::NotFound(_)));

    if not_found {
        EXIT_INPUT_NOT_FOUND
    } else {
        1
    }
}

fn cmd_extract(args: &ExtractArgs) -> Result<(), Box<dyn Error>> {
    let options = args.options()?;
    let rules = args.rules.build()?;
    log_info(format!("{} enrichment rules active", rules.len()));

    let result = transform_file(&args.input, &options, &rules)?;

    let written = write_terms_csv(&args.output, &result.rows)?;
    log_success(format!("{} rows written to: {}", written, args.output.display()));

    let summary = RunSummary::new(&result, &rules, &options, &args.input, &args.output);
    print_summary(&summary, !args.no_rule_report);

    if let Some(ref path) = args.report_json {
        summary.write_json(path)?;
        log_success(format!("Report written to: {}", path.display()));
    }

    Ok(())
}

fn cmd_parse(input: &Path, lenient: bool, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let mode = if lenient { ParseMode::Lenient } else { ParseMode::Strict };
    let decoded = read_input_file(input)?;
    log_success(format!("Detected encoding: {}", decoded.encoding));

    let mut records = Vec::new();
    let mut failures = 0;
    for (line_number, parsed) in parse_lines(&decoded.content, mode) {
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => {
                failures += 1;
                tracing::debug!(line = line_number, error = %e, "unparsable line");
            }
        }
    }

    log_success(format!("Parsed {} records", records.len()));
    if failures > 0 {
        log_warning(format!("{} lines could not be parsed", failures));
    }

    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_canon(term: &str) -> Result<(), Box<dyn Error>> {
    match canonicalize(term) {
        Some(canon) => println!("{}", canon),
        None => log_warning("Term has no canonical form"),
    }
    Ok(())
}

fn cmd_enrich(term: &str, max: usize, rule_args: &RuleArgs) -> Result<(), Box<dyn Error>> {
    let rules = rule_args.build()?;
    let Some(canon) = canonicalize(term) else {
        log_warning("Term has no canonical form");
        return Ok(());
    };

    println!("canonical: {}", canon);
    for variant in enrich_term(&canon, &rules, max) {
        println!("  {:<3} {}", variant.rule_id, variant.term);
    }
    Ok(())
}

fn cmd_rules(rule_args: &RuleArgs, json: bool) -> Result<(), Box<dyn Error>> {
    let rules = rule_args.build()?;

    if json {
        let specs: Vec<_> = rules.iter().map(|r| r.to_spec()).collect();
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    for rule in rules.iter() {
        println!("  {:<3} max={:<2} {}", rule.id(), rule.max_variants(), rule.description());
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            log_success(format!("Output written to: {}", p.display()));
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
