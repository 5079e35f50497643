use clap::{Parser, Subcommand};
use colored::Colorize;
use shortpat::{Analyzer, CompiledPattern, PatternCompiler, PatternSet, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shortpat")]
#[command(about = "Shortpat - typed short-URL patterns")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'v', long = "log-debug", global = true)]
    log_debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a pattern and print its regex
    Convert {
        /// The pattern to convert
        pattern: String,
        /// Show a report of every compilation stage
        #[arg(short, long)]
        debug: bool,
        /// Print the stored record as JSON
        #[arg(short, long, conflicts_with = "debug")]
        json: bool,
    },
    /// Match input against a pattern and print typed groups
    Match {
        /// The pattern
        pattern: String,
        /// The input string
        input: String,
        /// Show type and constraints of every group
        #[arg(long)]
        verbose: bool,
    },
    /// Generate a string from group values
    Generate {
        /// The pattern
        pattern: String,
        /// Group values as key=value
        values: Vec<String>,
    },
    /// Run input through a pattern file, pre-filter first
    Check {
        /// File with one pattern per line
        patterns: PathBuf,
        /// The input string
        input: String,
    },
    /// Print static analysis of a pattern
    Analyze {
        /// The pattern
        pattern: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_debug);

    match cli.command {
        Commands::Convert {
            pattern,
            debug,
            json,
        } => cmd_convert(&pattern, debug, json),
        Commands::Match {
            pattern,
            input,
            verbose,
        } => cmd_match(&pattern, &input, verbose),
        Commands::Generate { pattern, values } => cmd_generate(&pattern, &values),
        Commands::Check { patterns, input } => cmd_check(&patterns, &input),
        Commands::Analyze { pattern } => cmd_analyze(&pattern),
    }
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("shortpat=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), message);
    std::process::exit(1);
}

fn compile_or_exit(pattern: &str) -> CompiledPattern {
    PatternCompiler::default()
        .compile(pattern)
        .unwrap_or_else(|e| fail(e))
}

fn cmd_convert(pattern: &str, debug: bool, json: bool) {
    let compiler = PatternCompiler::default();

    if debug {
        match compiler.compile_debug(pattern) {
            Ok(report) => print!("{}", report),
            Err(e) => fail(e),
        }
    } else if json {
        let record = compile_or_exit(pattern).to_record();
        match serde_json::to_string_pretty(&record) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    } else {
        println!("{}", "Converting pattern...".bold());
        println!("  Input:  {}", pattern.cyan());
        println!();
        let compiled = compile_or_exit(pattern);
        println!("{}", "Regex:".bold());
        println!("  {}", compiled.regex().green());
    }
}

fn cmd_match(pattern: &str, input: &str, verbose: bool) {
    let compiled = compile_or_exit(pattern);

    let Some(result) = compiled.match_str(input) else {
        println!("{}", "✗ No match".red());
        std::process::exit(1);
    };

    if result.is_failed() {
        println!("{}", "✗ Matched with errors".yellow().bold());
    } else {
        println!("{}", "✓ Match found!".green().bold());
    }

    for (name, group) in result.groups() {
        println!("  {}: {}", name.cyan(), group.value.to_string().green());
        if verbose {
            println!("    type: {}", group.type_name);
            for (key, value) in &group.constraints {
                println!("    {}={}", key, value);
            }
        }
    }
    for error in result.errors() {
        println!("  {} {}", "error:".red(), error);
    }

    if result.is_failed() {
        std::process::exit(1);
    }
}

fn parse_value(raw: &str) -> Value {
    raw.parse::<i64>()
        .map(Value::Int)
        .unwrap_or_else(|_| Value::from(raw))
}

fn cmd_generate(pattern: &str, values: &[String]) {
    let compiled = compile_or_exit(pattern);

    let pairs: Vec<(String, Value)> = values
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) => (key.to_string(), parse_value(value)),
            None => fail(format!("expected key=value, got '{}'", entry)),
        })
        .collect();

    match compiled.generate(pairs) {
        Ok(output) => println!("{}", output),
        Err(e) => fail(e),
    }
}

fn read_patterns(path: &Path) -> Vec<String> {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("cannot read {}: {}", path.display(), e)));
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn cmd_check(path: &Path, input: &str) {
    let patterns = read_patterns(path);
    let set = PatternSet::compile(&PatternCompiler::default(), &patterns).unwrap_or_else(|e| fail(e));

    println!("{}", "Checking input...".bold());
    println!("  Patterns: {}", set.len());
    println!("  Input:    {}", input.yellow());
    println!();

    if !set.heuristic().support(input) {
        println!("{}", "✗ Rejected by pre-filter".red());
        std::process::exit(1);
    }
    println!("{}", "✓ Passed pre-filter".green());

    match set.find(input) {
        Some((index, result)) => {
            println!(
                "{} [{}] {}",
                "Matched".green().bold(),
                index + 1,
                set.patterns()[index].pattern().cyan()
            );
            for (name, value) in result.values() {
                println!("  {}: {}", name.cyan(), value.to_string().green());
            }
            for error in result.errors() {
                println!("  {} {}", "error:".red(), error);
            }
        }
        None => {
            println!("{}", "✗ No pattern matched".red());
            std::process::exit(1);
        }
    }
}

fn cmd_analyze(pattern: &str) {
    let compiled = compile_or_exit(pattern);
    let analyzer = Analyzer::default();
    let analysis = analyzer.analyze(compiled.ast());

    println!("{}", "Analysis".bold());
    println!("  Pattern: {}", pattern.cyan());
    println!("  Length:  {}..={}", analysis.min_len, analysis.max_len);
    println!("  Chars:   {}", analysis.allowed_chars.to_string().green());

    if !analysis.literals.is_empty() {
        println!();
        println!("{}", "Literals:".bold());
        for (text, optional) in &analysis.literals {
            let marker = if *optional { " (optional)" } else { "" };
            println!("  {:?}{}", text, marker);
        }
    }

    let groups = compiled.ast().groups();
    if !groups.is_empty() {
        println!();
        println!("{}", "Groups:".bold());
        for group in groups {
            let group_analysis = analyzer.analyze_group(group);
            println!(
                "  {} ({}): {}..={} [{}]",
                group.name().cyan(),
                group.value_type().name(),
                group_analysis.min_len,
                group_analysis.max_len,
                group_analysis.allowed_chars
            );
        }
    }
}
