//! `repairgrid shell`: an interactive estimate session.
//!
//! One session holds the vehicle selection and the part table across
//! commands. Every `estimate` is a fresh pass over the sheets; reads go
//! through the TTL cache, so edits to the files show up once the cache
//! window lapses (or after `reload`).

use std::io::{self, BufRead, IsTerminal, Write};

use repairgrid_config::Settings;
use repairgrid_estimator::headers::canonicalize;
use repairgrid_estimator::loader::coerce_year;
use repairgrid_estimator::model::{GarageType, VehicleSelection};
use repairgrid_estimator::resolver::{cascade, PartialSelection};
use repairgrid_estimator::{
    CategoryRates, CellValue, EstimateConfig, EstimateRequest, EstimateSession, ReferenceTables,
};
use repairgrid_io::{load_reference_tables, CachedSource, FileSource, TableSource};

use crate::estimate::PartEdit;
use crate::exit_codes::EXIT_ERROR;
use crate::report::{estimate_text, options_text, part_table_text, parts_text};
use crate::sources::{config_base_dir, read_config, SourceArgs};
use crate::CliError;

const HELP: &str = "\
Commands:
  parts                        list parts offered by the labour sheet
  options                      list makers, models, years, cities, finishes
  vehicle                      show the current vehicle
  vehicle <field> <value>      set maker, model, year, city, finish or garage
  add <PART>[, <PART>...]      select parts
  remove <PART>[, <PART>...]   drop parts (their edits are discarded)
  set <PART>:<COLUMN>=<VALUE>  edit disc, rnr, rnr_cost, tinkering, tinkering_cost
  table                        show the part table
  confirm                      confirm parts and costs
  unconfirm                    withdraw confirmation
  estimate                     compute the estimate
  json                         compute the estimate as JSON
  reload                       re-read the sheets on next use
  help                         this text
  quit                         leave the shell";

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Help,
    Parts,
    Options,
    ShowVehicle,
    SetVehicle { field: VehicleField, value: String },
    Add(Vec<String>),
    Remove(Vec<String>),
    Set(PartEdit),
    Table,
    Confirm,
    Unconfirm,
    Estimate { json: bool },
    Reload,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleField {
    Maker,
    Model,
    Year,
    City,
    Finish,
    Garage,
}

impl std::str::FromStr for VehicleField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "maker" => Ok(Self::Maker),
            "model" => Ok(Self::Model),
            "year" => Ok(Self::Year),
            "city" => Ok(Self::City),
            "finish" => Ok(Self::Finish),
            "garage" => Ok(Self::Garage),
            other => Err(format!(
                "unknown vehicle field '{other}' (expected maker, model, year, city, finish or garage)"
            )),
        }
    }
}

fn part_list(rest: &str) -> Result<Vec<String>, String> {
    let parts: Vec<String> = rest
        .split(',')
        .map(canonicalize)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        return Err("name at least one part".into());
    }
    Ok(parts)
}

impl std::str::FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        match word.to_ascii_lowercase().as_str() {
            "help" | "?" => Ok(Self::Help),
            "parts" => Ok(Self::Parts),
            "options" => Ok(Self::Options),
            "vehicle" if rest.is_empty() => Ok(Self::ShowVehicle),
            "vehicle" => {
                let (field, value) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| format!("missing value for vehicle {rest}"))?;
                Ok(Self::SetVehicle {
                    field: field.parse()?,
                    value: value.trim().to_string(),
                })
            }
            "add" => Ok(Self::Add(part_list(rest)?)),
            "remove" | "rm" => Ok(Self::Remove(part_list(rest)?)),
            "set" => Ok(Self::Set(rest.parse()?)),
            "table" => Ok(Self::Table),
            "confirm" => Ok(Self::Confirm),
            "unconfirm" => Ok(Self::Unconfirm),
            "estimate" => Ok(Self::Estimate { json: false }),
            "json" => Ok(Self::Estimate { json: true }),
            "reload" => Ok(Self::Reload),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command '{other}' (try 'help')")),
        }
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

pub struct Shell<S: TableSource> {
    source: CachedSource<S>,
    rates: CategoryRates,
    name: String,
    vehicle: VehicleSelection,
    garage: GarageType,
    chosen: Vec<String>,
    session: EstimateSession,
}

impl<S: TableSource> Shell<S> {
    pub fn new(source: CachedSource<S>, rates: CategoryRates) -> Self {
        Self {
            source,
            rates,
            name: "shell".to_string(),
            vehicle: VehicleSelection {
                maker: String::new(),
                model: String::new(),
                year: String::new(),
                city: String::new(),
                finish: String::new(),
            },
            garage: GarageType::default(),
            chosen: Vec::new(),
            session: EstimateSession::new(),
        }
    }

    /// Start from an estimate config: its vehicle, parts, edits and
    /// confirmation.
    pub fn seed(&mut self, config: &EstimateConfig) -> Result<(), CliError> {
        let request = config.request(self.rates);
        self.name = request.name;
        self.vehicle = request.selection;
        self.garage = request.garage;
        self.rates = request.rates;
        self.chosen = config.chosen_parts();
        config.apply_to(&mut self.session)?;
        Ok(())
    }

    fn tables(&self) -> Result<ReferenceTables, CliError> {
        Ok(load_reference_tables(&self.source)?)
    }

    /// Execute one command. Returns false when the shell should exit.
    pub fn execute(&mut self, command: ShellCommand, out: &mut dyn Write) -> Result<bool, CliError> {
        match command {
            ShellCommand::Help => writeln!(out, "{HELP}")?,
            ShellCommand::Parts => write!(out, "{}", parts_text(&self.tables()?.valid_parts()))?,
            ShellCommand::Options => {
                let partial = PartialSelection {
                    maker: Some(self.vehicle.maker.clone()).filter(|m| !m.is_empty()),
                    model: Some(self.vehicle.model.clone()).filter(|m| !m.is_empty()),
                };
                write!(out, "{}", options_text(&cascade(&self.tables()?, &partial)))?;
            }
            ShellCommand::ShowVehicle => {
                writeln!(out, "vehicle: {} (garage {})", self.vehicle, self.garage)?
            }
            ShellCommand::SetVehicle { field, value } => self.set_vehicle(field, value)?,
            ShellCommand::Add(parts) => {
                for part in parts {
                    if !self.chosen.contains(&part) {
                        self.chosen.push(part);
                    }
                }
                self.session.sync(&self.chosen);
                writeln!(out, "{} part(s) selected", self.chosen.len())?;
            }
            ShellCommand::Remove(parts) => {
                self.chosen.retain(|p| !parts.contains(p));
                self.session.sync(&self.chosen);
                writeln!(out, "{} part(s) selected", self.chosen.len())?;
            }
            ShellCommand::Set(edit) => {
                self.session
                    .table_mut()
                    .apply_edit(&edit.part, edit.column, &edit.value)?;
            }
            ShellCommand::Table => {
                write!(out, "{}", part_table_text(self.session.table().records()))?;
                let state = if self.session.is_confirmed() {
                    "confirmed"
                } else {
                    "not confirmed"
                };
                writeln!(out, "({state})")?;
            }
            ShellCommand::Confirm => {
                self.session.confirm();
                writeln!(out, "confirmed {} part(s)", self.session.committed().len())?;
            }
            ShellCommand::Unconfirm => {
                self.session.revoke_confirmation();
                writeln!(out, "confirmation withdrawn")?;
            }
            ShellCommand::Estimate { json } => self.estimate(json, out)?,
            ShellCommand::Reload => {
                self.source.invalidate();
                writeln!(
                    out,
                    "sheets will be re-read (cache window {}s)",
                    self.source.ttl().as_secs()
                )?;
            }
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn set_vehicle(&mut self, field: VehicleField, value: String) -> Result<(), CliError> {
        let value = value.trim().to_string();
        match field {
            VehicleField::Maker => self.vehicle.maker = value,
            VehicleField::Model => self.vehicle.model = value,
            VehicleField::Year => self.vehicle.year = coerce_year(&CellValue::Text(value)),
            VehicleField::City => self.vehicle.city = value,
            VehicleField::Finish => self.vehicle.finish = value,
            VehicleField::Garage => self.garage = value.parse().map_err(CliError::args)?,
        }
        Ok(())
    }

    fn estimate(&self, json: bool, out: &mut dyn Write) -> Result<(), CliError> {
        let v = &self.vehicle;
        if [&v.maker, &v.model, &v.year, &v.city, &v.finish]
            .iter()
            .any(|f| f.is_empty())
        {
            return Err(CliError::args("vehicle is incomplete")
                .with_hint("set maker, model, year, city and finish with 'vehicle <field> <value>'"));
        }

        let request = EstimateRequest {
            name: self.name.clone(),
            selection: self.vehicle.clone(),
            garage: self.garage,
            rates: self.rates,
        };
        let tables = self.tables()?;
        let estimate = repairgrid_estimator::run(&request, &tables, &self.session)?;

        if json {
            let json_str = serde_json::to_string_pretty(&estimate)
                .map_err(|e| CliError {
                    code: EXIT_ERROR,
                    message: format!("JSON serialization error: {e}"),
                    hint: None,
                })?;
            writeln!(out, "{json_str}")?;
        } else {
            write!(out, "{}", estimate_text(&estimate))?;
        }
        Ok(())
    }

    /// Read commands until EOF or `quit`. Command errors are reported and
    /// the session carries on.
    pub fn run_lines(
        &mut self,
        input: impl BufRead,
        out: &mut dyn Write,
        err: &mut dyn Write,
        prompt: bool,
    ) -> Result<(), CliError> {
        if prompt {
            write!(err, "> ")?;
            err.flush()?;
        }
        for line in input.lines() {
            let line = line?;
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                let result = trimmed
                    .parse::<ShellCommand>()
                    .map_err(CliError::args)
                    .and_then(|cmd| self.execute(cmd, out));
                match result {
                    Ok(false) => return Ok(()),
                    Ok(true) => {}
                    Err(e) => {
                        writeln!(err, "error: {}", e.message)?;
                        if let Some(hint) = e.hint {
                            writeln!(err, "hint:  {hint}")?;
                        }
                    }
                }
            }
            if prompt {
                write!(err, "> ")?;
                err.flush()?;
            }
        }
        Ok(())
    }
}

pub fn cmd_shell(sources: SourceArgs) -> Result<(), CliError> {
    let settings = Settings::load();
    let rates = settings.category_rates();

    let mut shell = match sources.config {
        Some(ref config_path) => {
            let config = EstimateConfig::from_toml(&read_config(config_path)?)?;
            let file_source = FileSource::from_config(&config.sources, config_base_dir(config_path));
            let mut shell = Shell::new(CachedSource::new(file_source, settings.cache_ttl()), rates);
            shell.seed(&config)?;
            shell
        }
        None => Shell::new(
            CachedSource::new(sources.file_source(&settings)?, settings.cache_ttl()),
            rates,
        ),
    };

    let stdin = io::stdin();
    let prompt = stdin.is_terminal();
    if prompt {
        eprintln!("repairgrid shell; 'help' lists commands");
    }
    shell.run_lines(stdin.lock(), &mut io::stdout(), &mut io::stderr(), prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use repairgrid_io::{SheetKind, SourceError};

    struct MemorySource;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
        rows.iter()
            .map(|r| r.iter().map(|c| CellValue::from(*c)).collect())
            .collect()
    }

    impl TableSource for MemorySource {
        fn fetch(&self, kind: SheetKind) -> Result<Vec<Vec<CellValue>>, SourceError> {
            Ok(match kind {
                SheetKind::Paint => grid(&[
                    &["MAKER", "MODEL", "YEAR", "CITY", "W_METALLIC/SOLID", "BONNET"],
                    &["TOYOTA", "COROLLA", "2020", "DELHI", "SOLID", "1000"],
                ]),
                SheetKind::Labour => grid(&[
                    &["MAKER", "MODEL", "YEAR", "CITY", "BONNET", "DOOR"],
                    &["TOYOTA", "COROLLA", "2020", "DELHI", "5", "10"],
                ]),
                SheetKind::Tinkering => grid(&[&["DOOR"]]),
                SheetKind::Rnr => grid(&[&["BONNET"]]),
            })
        }
    }

    fn shell() -> Shell<MemorySource> {
        Shell::new(
            CachedSource::new(MemorySource, Duration::from_secs(300)),
            CategoryRates::default(),
        )
    }

    fn run_script(shell: &mut Shell<MemorySource>, script: &str) -> (String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        shell
            .run_lines(script.as_bytes(), &mut out, &mut err, false)
            .unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn parse_commands() {
        assert_eq!("add bonnet, front bumper".parse(), Ok(ShellCommand::Add(vec!["BONNET".into(), "FRONT BUMPER".into()])));
        assert_eq!(
            "vehicle year 2020".parse(),
            Ok(ShellCommand::SetVehicle {
                field: VehicleField::Year,
                value: "2020".into()
            })
        );
        assert_eq!("VEHICLE".parse(), Ok(ShellCommand::ShowVehicle));
        assert_eq!("json".parse(), Ok(ShellCommand::Estimate { json: true }));
        assert!("add".parse::<ShellCommand>().is_err());
        assert!("vehicle colour red".parse::<ShellCommand>().is_err());
        assert!("paint it".parse::<ShellCommand>().is_err());
    }

    const VEHICLE: &str = "\
vehicle maker TOYOTA
vehicle model COROLLA
vehicle year 2020
vehicle city DELHI
vehicle finish SOLID
";

    #[test]
    fn estimate_requires_confirmation() {
        let mut shell = shell();
        let (out, err) = run_script(&mut shell, &format!("{VEHICLE}add bonnet\nestimate\n"));
        assert!(out.contains("1 part(s) selected"));
        assert!(err.contains("error: parts and costs have not been confirmed"), "{err}");
    }

    #[test]
    fn edits_after_confirm_are_priced() {
        let mut shell = shell();
        let script = format!(
            "{VEHICLE}add bonnet\nconfirm\nestimate\nset BONNET:rnr_cost=200\nestimate\n"
        );
        let (out, err) = run_script(&mut shell, &script);
        assert!(err.is_empty(), "{err}");
        assert!(out.contains("16,500.00"));
        assert!(out.contains("200.00"));
    }

    #[test]
    fn removed_part_loses_edits() {
        let mut shell = shell();
        let script = "add bonnet, door\nset door:disc=40\nremove door\nadd door\ntable\n";
        let (out, _) = run_script(&mut shell, script);
        let door_row = out.lines().find(|l| l.trim_start().starts_with("DOOR")).unwrap();
        assert!(door_row.contains("0.00"));
        assert!(!door_row.contains("40.00"));
        assert!(out.contains("(not confirmed)"));
    }

    #[test]
    fn incomplete_vehicle_reported() {
        let mut shell = shell();
        let (_, err) = run_script(&mut shell, "add bonnet\nconfirm\nestimate\n");
        assert!(err.contains("vehicle is incomplete"));
        assert!(err.contains("hint:"));
    }

    #[test]
    fn errors_do_not_end_session() {
        let mut shell = shell();
        let (out, err) = run_script(&mut shell, "bogus\nset ROOF:disc=5\nparts\nquit\nparts\n");
        assert!(err.contains("unknown command 'bogus'"));
        assert!(err.contains("part 'ROOF' is not in the selection table"));
        // parts listed once; the second 'parts' comes after quit
        assert_eq!(out.matches("BONNET").count(), 1);
    }

    #[test]
    fn fractional_year_matches_sheet_year() {
        let mut shell = shell();
        let script = VEHICLE.replace("vehicle year 2020", "vehicle year 2020.0");
        let (out, err) = run_script(&mut shell, &format!("{script}vehicle\nadd bonnet\nconfirm\nestimate\n"));
        assert!(err.is_empty(), "{err}");
        assert!(out.contains("vehicle: TOYOTA COROLLA 2020 in DELHI, SOLID"));
        assert!(out.contains("Vehicle:  TOYOTA COROLLA 2020 in DELHI, SOLID"));
        assert!(out.contains("16,500.00"));
    }

    #[test]
    fn reload_reports_cache_window() {
        let mut shell = shell();
        let (out, _) = run_script(&mut shell, "reload\n");
        assert_eq!(out, "sheets will be re-read (cache window 300s)\n");
    }

    #[test]
    fn options_follow_vehicle() {
        let mut shell = shell();
        let (out, _) = run_script(&mut shell, "vehicle maker TOYOTA\noptions\n");
        assert!(out.contains("Models:   COROLLA"));
        assert!(out.contains("Years:    (none)"));
    }
}
