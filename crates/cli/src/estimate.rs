//! `repairgrid run`: price a part selection from an estimate config.

use std::path::{Path, PathBuf};

use repairgrid_config::Settings;
use repairgrid_estimator::headers::canonicalize;
use repairgrid_estimator::model::GarageType;
use repairgrid_estimator::selection::PartColumn;
use repairgrid_estimator::{CellValue, EstimateConfig, EstimateSession};
use repairgrid_io::{load_reference_tables, CachedSource, FileSource};

use crate::exit_codes::{EXIT_ERROR, EXIT_USAGE};
use crate::report::estimate_text;
use crate::sources::{config_base_dir, read_config};
use crate::CliError;

pub struct RunArgs {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub parts: Vec<String>,
    pub sets: Vec<String>,
    pub confirm: bool,
    pub garage: Option<GarageType>,
}

/// One `--set PART:COLUMN=VALUE` edit.
#[derive(Debug, Clone, PartialEq)]
pub struct PartEdit {
    pub part: String,
    pub column: PartColumn,
    pub value: CellValue,
}

impl std::str::FromStr for PartEdit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| format!("invalid edit '{s}' (expected PART:COLUMN=VALUE)"))?;
        let (part, column) = target
            .rsplit_once(':')
            .ok_or_else(|| format!("invalid edit '{s}' (expected PART:COLUMN=VALUE)"))?;

        let part = canonicalize(part);
        if part.is_empty() {
            return Err(format!("invalid edit '{s}': part name is empty"));
        }
        Ok(Self {
            part,
            column: column.parse()?,
            value: CellValue::Text(value.trim().to_string()),
        })
    }
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config_str = read_config(&args.config)?;
    let config = EstimateConfig::from_toml(&config_str)?;
    let base_dir = config_base_dir(&args.config);

    // Part table: config first, then command-line additions and edits
    let mut session = EstimateSession::new();
    config.apply_to(&mut session)?;

    if !args.parts.is_empty() {
        let mut chosen = config.chosen_parts();
        for part in &args.parts {
            let part = canonicalize(part);
            if !part.is_empty() && !chosen.contains(&part) {
                chosen.push(part);
            }
        }
        session.sync(&chosen);
    }

    for raw in &args.sets {
        let edit: PartEdit = raw.parse().map_err(CliError::args)?;
        session
            .table_mut()
            .apply_edit(&edit.part, edit.column, &edit.value)
            .map_err(|e| {
                CliError::from(e).with_hint(format!("add it with --part {} or in [[parts]]", edit.part))
            })?;
    }

    if args.confirm {
        session.confirm();
    }

    let settings = Settings::load();
    let mut request = config.request(settings.category_rates());
    if let Some(garage) = args.garage {
        request.garage = garage;
    }

    let source = CachedSource::new(
        FileSource::from_config(&config.sources, base_dir),
        settings.cache_ttl(),
    );
    let tables = load_reference_tables(&source)?;
    let estimate = repairgrid_estimator::run(&request, &tables, &session)?;

    let output_file = args
        .output
        .clone()
        .or_else(|| config.output.json.as_ref().map(|p| resolve_output(p, base_dir)));

    if args.json || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(&estimate).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;

        if let Some(ref path) = output_file {
            std::fs::write(path, &json_str).map_err(|e| CliError {
                code: EXIT_USAGE,
                message: format!("cannot write {}: {e}", path.display()),
                hint: None,
            })?;
            eprintln!("wrote {}", path.display());
        }

        if args.json {
            println!("{json_str}");
            return Ok(());
        }
    }

    print!("{}", estimate_text(&estimate));
    Ok(())
}

fn resolve_output(path: &str, base_dir: &Path) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
