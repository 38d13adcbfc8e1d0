//! `repairgrid options`, `parts` and `validate`: look at the reference
//! sheets without running an estimate.

use repairgrid_config::Settings;
use repairgrid_estimator::resolver::{cascade, PartialSelection};

use crate::exit_codes::EXIT_ERROR;
use crate::report::{options_text, parts_text, validate_text, ValidateReport};
use crate::sources::SourceArgs;
use crate::CliError;

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json_str = serde_json::to_string_pretty(value).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })?;
    println!("{json_str}");
    Ok(())
}

pub fn cmd_options(
    sources: SourceArgs,
    maker: Option<String>,
    model: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let settings = Settings::load();
    let tables = sources.load_tables(&settings)?;

    let partial = PartialSelection {
        maker: maker.map(|m| m.trim().to_string()),
        model: model.map(|m| m.trim().to_string()),
    };
    let options = cascade(&tables, &partial);

    if options.makers.is_empty() {
        log::warn!("no makers found; check that both sheets have MAKER, MODEL, YEAR and CITY columns");
    }

    if json {
        return print_json(&options);
    }
    print!("{}", options_text(&options));
    Ok(())
}

pub fn cmd_parts(sources: SourceArgs, json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let tables = sources.load_tables(&settings)?;
    let parts = tables.valid_parts();

    if json {
        return print_json(&parts);
    }
    print!("{}", parts_text(&parts));
    Ok(())
}

/// Report the loaded shape of every sheet. Fails when the paint or labour
/// sheet lacks an identity column, since no vehicle could ever match.
pub fn cmd_validate(sources: SourceArgs, json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let tables = sources.load_tables(&settings)?;
    let report = ValidateReport::from_tables(&tables);

    if json {
        print_json(&report)?;
    } else {
        print!("{}", validate_text(&report));
    }

    if !report.valid {
        return Err(CliError::source("reference sheets are missing required columns")
            .with_hint("paint needs MAKER, MODEL, YEAR, CITY, W_METALLIC/SOLID; labour needs MAKER, MODEL, YEAR, CITY"));
    }
    Ok(())
}
