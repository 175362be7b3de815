//! Turn the command line options into a run configuration.

use cyclic::config::{Config, Detail, FitOptions};
use cyclic::{Error, Result};

use crate::options::MtsOptions;

/// Cross-section from the two sides, if both were given.
pub fn get_cross_section(options: &MtsOptions) -> Result<Option<f64>> {
    match (options.side1, options.side2) {
        (Some(a), Some(b)) => Ok(Some(a * b)),
        (None, None) => Ok(None),
        _ => Err(Error::Config(
            "both --side1 and --side2 are needed for the cross-section".to_string(),
        )),
    }
}

/// Parse and check everything the run needs. Any error here is an
/// option the user has to fix.
pub fn get_config(options: &MtsOptions) -> Result<Config> {
    if options.frequency == 0.0 {
        return Err(Error::Config(
            "the test frequency has no default, use --frequency".to_string(),
        ));
    }

    let mut config = Config::new(
        options.separator.parse()?,
        options.language.parse()?,
        options.rows.parse()?,
        options.frequency,
        get_cross_section(options)?,
    )?;

    config.half_cycle_duration = options.half_cycle;
    config.truncation = options.truncation.parse()?;
    config.fit = FitOptions {
        method: options.fit_method,
        max_iter: options.fit_maxiter,
        tol: options.fit_tol,
    };
    if options.basic {
        config.detail = Detail::Basic;
    }
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::get_default_options;
    use cyclic::config::{DecimalSeparator, Layout, Locale, TruncationPolicy};
    use cyclic::optimise::Method;

    #[test]
    fn defaults_need_a_frequency() {
        let options = get_default_options();
        assert!(matches!(get_config(&options), Err(Error::Config(_))));
    }

    #[test]
    fn options_become_a_config() {
        let mut options = get_default_options();
        options.frequency = 10.0;
        options.side1 = Some(4.0);
        options.side2 = Some(2.5);
        options.language = "s".to_string();
        options.rows = "6".to_string();
        options.separator = ".".to_string();
        options.truncation = "reject".to_string();
        options.fit_method = Method::Nelder;

        let config = get_config(&options).unwrap();

        assert_eq!(config.decimal_separator, DecimalSeparator::Point);
        assert_eq!(config.locale, Locale::Spanish);
        assert_eq!(config.layout, Layout::SixColumn);
        assert_eq!(config.cross_section_mm2, Some(10.0));
        assert_eq!(config.truncation, TruncationPolicy::Reject);
        assert_eq!(config.fit.method, Method::Nelder);
        assert_eq!(config.detail, Detail::Full);
    }

    #[test]
    fn one_side_is_not_enough() {
        let mut options = get_default_options();
        options.frequency = 10.0;
        options.side1 = Some(4.0);

        assert!(get_config(&options).is_err());
    }

    #[test]
    fn bad_answers_are_config_errors() {
        let mut options = get_default_options();
        options.frequency = 10.0;
        options.rows = "5".to_string();
        assert!(matches!(get_config(&options), Err(Error::Config(_))));

        options.rows = "4".to_string();
        options.half_cycle = -1.0;
        assert!(get_config(&options).is_err());
    }
}
