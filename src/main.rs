/// mtscyclic
///
/// Cycle parameters and failure point of cyclic loading tests.
///
/// The testing machine records a block of samples every so many
/// cycles. For each recorded cycle the program works out the
/// displacement and force amplitudes and extremes, the stresses over
/// the specimen cross-section, the area of the hysteresis loop, the
/// phase lag between force and displacement and the loading rate. The
/// failure cycle is then located at the knee of the minimum
/// displacement curve.
///
/// Most of the work is done by the associated **cyclic** library. The
/// main program reads the command line flags into **MtsOptions**,
/// turns them into a run configuration and writes the results.
///
/// Think of the program flow as
///
/// 1. Read in the raw data
/// 2. Split it into blocks, one per recorded cycle
/// 3. Work out the parameters of every cycle
/// 4. Tabulate the cycles and locate the failure point
/// 5. Write out requested output

#[macro_use]
extern crate clap;
extern crate cyclic;
extern crate env_logger;
extern crate log;

use cyclic::pipeline::{self, Report};
use cyclic::{chart, io, COMMENT};
use log::{error, info};
use options::{builder, clap::get_options_clap, TerminatingOutput};

mod list;
mod options;

fn main() {
    env_logger::init();

    let mut options = options::get_default_options();
    get_options_clap("", &mut options);
    // stdout is kept for the results table, commentary goes to stderr
    eprintln!("{}mtscyclic: version {}", COMMENT, crate_version!());
    eprintln!("{}", COMMENT);
    if options.verbosity == options::Verbosity::Verbose {
        eprintln!("{}Options: ", COMMENT);
        eprintln!("{}", options);
    }

    // Check if we're just running to output data
    if options.output == TerminatingOutput::List {
        list::print_list();
        std::process::exit(0);
    }

    if options.infile.is_empty() {
        error!("Error: no data file given. Use --infile FILE, or --help for the options.");
        std::process::exit(2)
    }

    let config = match builder::get_config(&options) {
        Ok(config) => config,
        Err(why) => {
            error!("Error: {}", why);
            std::process::exit(2)
        }
    };
    info!("configuration\n{}", config);

    let report = match pipeline::process_file(&options.infile, &config) {
        Ok(report) => report,
        Err(why) => {
            error!("Error: could not process '{}': {}", options.infile, why);
            std::process::exit(1)
        }
    };

    summarise(&report);

    if let Err(why) = write_output(&options, &report, &config) {
        error!("Error: {}", why);
        std::process::exit(1)
    }
}

fn summarise(report: &Report) {
    eprintln!("{}{} cycles processed", COMMENT, report.table.len());
    for rejected in &report.rejected {
        eprintln!("{}rejected block at row {}: {}", COMMENT, rejected.row, rejected.reason);
    }

    match &report.failure {
        Ok(failure) => eprintln!(
            "{}The failure cycle is: {} (minimum displacement {} mm)",
            COMMENT, failure.failure_cycle, failure.failure_displacement
        ),
        Err(why) => eprintln!("{}{}", COMMENT, why),
    }
}

/// Write the results table and, if asked for, the chart.
fn write_output(options: &options::MtsOptions, report: &Report, config: &cyclic::config::Config) -> cyclic::Result<()> {
    if options.outfile.is_empty() {
        let stdout = std::io::stdout();
        io::write_results_to(stdout.lock(), report, config.detail)?;
    } else {
        io::write_results(&options.outfile, report, config.detail)?;
        eprintln!("{}The results have been stored in '{}'", COMMENT, options.outfile);
    }

    if !options.chart.is_empty() {
        if options.chart.ends_with(".svg") {
            chart::write_svg_chart(&options.chart, &report.table, report.failure_result(), &options.infile)?;
            eprintln!("{}Chart written to file '{}'", COMMENT, options.chart);
        } else {
            error!("Error: Currently mtscyclic can only draw svg charts. Please use a '.svg' suffix");
        }
    }

    Ok(())
}
