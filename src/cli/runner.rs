//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{ConnectivityPolicy, LoaderConfig};
use crate::engine::{RunDriver, RunPlan, RunReport};
use crate::error::{Error, Result};
use crate::types::{
    default_years, DatasetGroup, JobType, Segment, Selection, StateCode, KNOWN_STATES,
};
use std::fs;
use std::path::Path;
use tracing::info;

/// Read a state list file; the first two characters of each line are a code
pub fn read_states_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read states file {}: {e}", path.display()))
    })?;

    let states: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| line.len() >= 2)
        .filter_map(|line| line.get(..2))
        .map(str::to_lowercase)
        .collect();

    if states.is_empty() {
        return Err(Error::config(format!(
            "States file {} lists no states",
            path.display()
        )));
    }
    Ok(states)
}

/// Resolve a `--states` value against the allowed codes
///
/// `all` selects every allowed state in list order. Any unknown code
/// rejects the whole list.
pub fn resolve_states(input: &str, allowed: &[String]) -> Result<Vec<StateCode>> {
    let selection = Selection::parse_with(input, |code| StateCode::parse_in(code, allowed))
        .map_err(|e| match e {
            Error::InvalidArgument { message, .. } => Error::invalid_argument(
                "states",
                format!("The list of states you provided included an invalid value: {input} ({message})"),
            ),
            other => other,
        })?;

    Ok(selection.expand(|| {
        allowed
            .iter()
            .filter_map(|code| StateCode::parse_in(code, allowed).ok())
            .collect()
    }))
}

/// Parse a `--years` value; `all` is 2002 through 2011
pub fn parse_years(input: &str) -> Result<Vec<u16>> {
    let selection = Selection::parse_with(input, |year| {
        year.parse::<u16>()
            .map_err(|e| Error::invalid_argument("years", format!("invalid year '{year}': {e}")))
    })?;
    Ok(selection.expand(default_years))
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.loader_config()?;
        let plan = self.plan()?;

        let driver = RunDriver::from_config(config)?;
        info!(
            "Loading into {} from {}",
            driver.store().location(),
            driver.config().endpoint
        );
        let report = driver.run(&plan).await?;
        self.output_report(&report)
    }

    /// Effective configuration: file, then environment, then flags
    pub fn loader_config(&self) -> Result<LoaderConfig> {
        self.apply_flags(self.file_config()?.with_env_overrides())
    }

    /// Same as [`Runner::loader_config`] with an explicit variable source
    pub fn loader_config_with<F>(&self, env: F) -> Result<LoaderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.apply_flags(self.file_config()?.with_overrides_from(env))
    }

    fn file_config(&self) -> Result<LoaderConfig> {
        match &self.cli.config {
            Some(path) => LoaderConfig::from_file(path),
            None => Ok(LoaderConfig::default()),
        }
    }

    fn apply_flags(&self, mut config: LoaderConfig) -> Result<LoaderConfig> {
        if let Some(endpoint) = &self.cli.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(database) = &self.cli.database {
            config = config.with_database(database.clone());
        }

        if let Commands::Load {
            continue_on_connection_error,
            index_datasets,
            batch_size,
            ..
        } = &self.cli.command
        {
            if *continue_on_connection_error {
                config = config.with_connectivity_policy(ConnectivityPolicy::SkipResource);
            }
            if *index_datasets {
                config = config.with_dataset_indexes(true);
            }
            if let Some(size) = batch_size {
                config = config.with_dataset_batch_size(*size);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Build the run plan; invalid selections fail before any work starts
    pub fn plan(&self) -> Result<RunPlan> {
        let allowed = self.allowed_states()?;

        match &self.cli.command {
            Commands::Load {
                states,
                groups,
                segments,
                job_types,
                years,
                skip_geo,
                ..
            } => {
                let groups: Selection<DatasetGroup> = groups.parse()?;
                let segments: Selection<Segment> = segments.parse()?;
                let job_types: Selection<JobType> = job_types.parse()?;

                Ok(RunPlan::new(resolve_states(states, &allowed)?)
                    .with_years(parse_years(years)?)
                    .with_groups(groups.expand(|| DatasetGroup::ALL.to_vec()))
                    .with_segments(segments)
                    .with_job_types(job_types.expand(|| JobType::ALL.to_vec()))
                    .with_crosswalk(!*skip_geo))
            }
            Commands::Xwalk { states } => Ok(RunPlan::crosswalk_only(resolve_states(
                states, &allowed,
            )?)),
        }
    }

    fn allowed_states(&self) -> Result<Vec<String>> {
        match &self.cli.states_file {
            Some(path) => read_states_file(path),
            None => Ok(KNOWN_STATES.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    /// Print the run report
    fn output_report(&self, report: &RunReport) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
            OutputFormat::Pretty => println!("{report}"),
        }
        Ok(())
    }
}
