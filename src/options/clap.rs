use std::str::FromStr;

use crate::options::{MtsOptions, TerminatingOutput, Verbosity};
use clap::{App, AppSettings, Arg, ArgMatches, ErrorKind};
use cyclic::optimise::Method;
use log::error;

/// Get the options from the command line.
pub fn get_options_clap(line: &str, options: &mut MtsOptions) {
    let process = App::new("mtscyclic: cycle parameters and failure point of cyclic loading tests")
        .version(crate_version!())
        .about(include_str!("../description.md"))
        .setting(AppSettings::AllowLeadingHyphen)

        .arg(Arg::with_name("infile")
             .short("i")
             .long("infile")
             .value_name("FILE")
             .help("read the raw test data from FILE (tab separated export of the testing machine)")
             .takes_value(true))

        .arg(Arg::with_name("separator")
             .long("separator")
             .value_name("SEP")
             .help("decimal separator used in the data file, ',' or '.' (default ',')")
             .takes_value(true))

        .arg(Arg::with_name("language")
             .short("l")
             .long("language")
             .value_name("LANG")
             .help("language of the data file, 'english' (e) or 'spanish' (s) (default english)")
             .takes_value(true))

        .arg(Arg::with_name("rows")
             .long("rows")
             .value_name("N")
             .help("number of data columns in the file, 4 or 6 (default 4)")
             .takes_value(true))

        .arg(Arg::with_name("frequency")
             .short("f")
             .long("frequency")
             .value_name("HZ")
             .help("test frequency in Hz. There is no default, so the frequency must be specified.")
             .takes_value(true))

        .arg(Arg::with_name("side1")
             .long("side1")
             .value_name("MM")
             .help("first side of the specimen cross-section in mm, needed for stresses")
             .takes_value(true))

        .arg(Arg::with_name("side2")
             .long("side2")
             .value_name("MM")
             .help("second side of the specimen cross-section in mm, needed for stresses")
             .takes_value(true))

        .arg(Arg::with_name("half_cycle")
             .long("half_cycle")
             .value_name("SECONDS")
             .help("time between a displacement peak and valley used for the loading rate (default 0.05 s)")
             .takes_value(true))

        .arg(Arg::with_name("truncation")
             .long("truncation")
             .value_name("POLICY")
             .help("what to do with a block shorter than its marker declares, 'truncate' or 'reject' (default truncate)")
             .takes_value(true))

        .arg(Arg::with_name("fit_method")
             .long("fit_method")
             .value_name("METHOD")
             .possible_values(&Method::variants())
             .case_insensitive(true)
             .help("least squares method for the sine fits (default levenberg)")
             .takes_value(true))

        .arg(Arg::with_name("fit_maxiter")
             .long("fit_maxiter")
             .value_name("N")
             .help("maximum iterations of a sine fit (default 200)")
             .takes_value(true))

        .arg(Arg::with_name("fit_tol")
             .long("fit_tol")
             .value_name("TOL")
             .help("relative convergence tolerance of a sine fit (default 1.49012e-8)")
             .takes_value(true))

        .arg(Arg::with_name("basic")
             .long("basic")
             .help("only amplitudes, loop area, phase and loading rate: no stresses and no failure point"))

        .arg(Arg::with_name("outfile")
             .short("o")
             .long("outfile")
             .value_name("FILE")
             .help("write the cycle results to FILE as semicolon separated values (default stdout)")
             .takes_value(true))

        .arg(Arg::with_name("chart")
             .long("chart")
             .value_name("FILE")
             .help("draw the minimum displacement against cycle with the failure point marked, as svg")
             .takes_value(true))

        .arg(Arg::with_name("list")
             .long("list")
             .help("list the file layouts and output columns"))

        .arg(Arg::with_name("verbose")
             .short("v")
             .long("verbose")
             .help("print the options used"));

    // turn the commands into matches
    let matches = if line.is_empty() {
        // this will get them directly from the command line
        process.get_matches()
    } else {
        // get them from the string
        // add command word since it skips first argument
        process.get_matches_from(("mtscyclic ".to_string() + line.trim()).split(' '))
    };

    // data file
    if let Some(file) = matches.value_of("infile") {
        options.infile = file.to_string();
    }
    if let Some(separator) = matches.value_of("separator") {
        options.separator = separator.to_string();
    }
    if let Some(language) = matches.value_of("language") {
        options.language = language.to_string();
    }
    if let Some(rows) = matches.value_of("rows") {
        options.rows = rows.to_string();
    }
    if let Some(truncation) = matches.value_of("truncation") {
        options.truncation = truncation.to_string();
    }

    // test description
    if let Some(frequency) = value_or_exit::<f64>(&matches, "frequency") {
        options.frequency = frequency;
    }
    if let Some(side1) = value_or_exit::<f64>(&matches, "side1") {
        options.side1 = Some(side1);
    }
    if let Some(side2) = value_or_exit::<f64>(&matches, "side2") {
        options.side2 = Some(side2);
    }
    if let Some(half_cycle) = value_or_exit::<f64>(&matches, "half_cycle") {
        options.half_cycle = half_cycle;
    }

    // sine fits
    if let Some(method) = value_or_exit::<Method>(&matches, "fit_method") {
        options.fit_method = method;
    }
    if let Some(maxiter) = value_or_exit::<usize>(&matches, "fit_maxiter") {
        options.fit_maxiter = maxiter;
    }
    if let Some(tol) = value_or_exit::<f64>(&matches, "fit_tol") {
        options.fit_tol = tol;
    }

    // output options
    if matches.is_present("basic") {
        options.basic = true;
    }
    if let Some(file) = matches.value_of("outfile") {
        options.outfile = file.to_string();
    }
    if let Some(file) = matches.value_of("chart") {
        options.chart = file.to_string();
    }
    if matches.is_present("list") {
        options.output = TerminatingOutput::List;
    }
    if matches.is_present("verbose") {
        options.verbosity = Verbosity::Verbose;
    }
}

/// The typed value of an option, `None` if it was not given. A value
/// that does not parse ends the program.
fn value_or_exit<T: FromStr>(matches: &ArgMatches, name: &str) -> Option<T> {
    match value_t!(matches, name, T) {
        Ok(value) => Some(value),
        Err(ref e) if e.kind == ErrorKind::ArgumentNotFound => None,
        Err(e) => {
            error!("Error: --{}: {}", name, e.message);
            std::process::exit(2)
        }
    }
}
