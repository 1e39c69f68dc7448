//! CLI command implementations

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::membership::ProcessId;
use crate::observability::{init_logging, AuditLog, FileAuditLog};
use crate::quorum::{GridRounding, QuorumGrid};
use crate::runtime::{HoldFor, ProcessBuilder, ProcessHandle};
use crate::scheduler::{RequestScheduler, SchedulerReport};
use crate::transport::{LocalNetwork, NetworkStats};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Parse arguments, initialise logging and run the command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    init_logging(&cli.log_level)?;
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config, force } => init(&config, force),
        Command::Simulate {
            config,
            members,
            duration_secs,
        } => simulate(config.as_deref(), members, duration_secs),
        Command::Quorum {
            size,
            index,
            rounding,
        } => quorum(size, index, rounding.into()),
    }
}

/// Write a default configuration file.
pub fn init(config_path: &Path, force: bool) -> CliResult<()> {
    if config_path.exists() && !force {
        return Err(CliError::already_initialized(config_path.display()));
    }

    let config = SimulationConfig::default();
    config.save(config_path)?;
    info!(path = %config_path.display(), "wrote default configuration");

    write_response(json!({
        "config": config_path.display().to_string(),
        "settings": config,
    }))
}

/// Print the quorum of one index, or every index, and check intersection.
pub fn quorum(size: usize, index: Option<usize>, rounding: GridRounding) -> CliResult<()> {
    let grid = QuorumGrid::new(size, rounding)?;

    let indices: Vec<usize> = match index {
        Some(index) => vec![index],
        None => (0..size).collect(),
    };

    let mut quorums = Vec::with_capacity(indices.len());
    for index in indices {
        let (row, column) = grid.position(index)?;
        let members = grid.quorum_of(index)?;
        quorums.push(json!({
            "index": index,
            "row": row,
            "column": column,
            "size": members.len(),
            "quorum": members,
        }));
    }

    let intersection = match grid.verify_intersection() {
        Ok(()) => json!({ "holds": true }),
        Err(gap) => json!({ "holds": false, "first": gap.first, "second": gap.second }),
    };

    write_response(json!({
        "group_size": grid.size(),
        "side": grid.side(),
        "rows": grid.rows(),
        "rounding": rounding,
        "quorums": quorums,
        "intersection": intersection,
    }))
}

/// Run a simulation from a config file (or defaults) and print its summary.
pub fn simulate(
    config_path: Option<&Path>,
    members: Option<usize>,
    duration_secs: Option<u64>,
) -> CliResult<()> {
    let mut config = match config_path {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(members) = members {
        config.members = members;
    }
    if let Some(duration_secs) = duration_secs {
        config.duration_secs = duration_secs;
    }
    config.validate()?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CliError::simulation_failed(format!("Failed to create tokio runtime: {}", e))
    })?;
    let summary = rt.block_on(run_simulation(&config))?;

    write_response(serde_json::to_value(&summary)?)
}

/// Per-process result of a simulation
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub process: ProcessId,
    /// Position in the final view; `None` once the process has left
    pub index: Option<usize>,
    #[serde(flatten)]
    pub report: SchedulerReport,
}

/// Result of a simulation
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    pub group: String,
    pub members: usize,
    pub duration_secs: u64,
    pub audit_path: PathBuf,
    pub processes: Vec<ProcessSummary>,
    pub entries: u64,
    pub abandoned: u64,
    pub network: NetworkStats,
}

/// Start `config.members` processes in one group, drive them with the
/// scheduler for `config.duration_secs` and shut everything down.
///
/// Must run inside a tokio runtime.
pub async fn run_simulation(config: &SimulationConfig) -> CliResult<SimulationSummary> {
    let network = if config.drop_rate > 0.0 {
        LocalNetwork::lossy(&config.group_name, config.drop_rate, config.seed)?
    } else {
        LocalNetwork::new(&config.group_name)
    };

    let audit: Arc<dyn AuditLog> = Arc::new(FileAuditLog::open(&config.audit_path).map_err(|e| {
        CliError::io_error(format!(
            "Failed to open audit file {}: {}",
            config.audit_path.display(),
            e
        ))
    })?);

    let mut handles: Vec<ProcessHandle> = Vec::with_capacity(config.members);
    for _ in 0..config.members {
        let handle = ProcessBuilder::new(network.join()?)
            .config(config.to_protocol_config())
            .critical_section(HoldFor(config.critical_section()))
            .audit(Arc::clone(&audit))
            .spawn()?;
        handles.push(handle);
    }
    info!(
        group = %config.group_name,
        members = config.members,
        duration_secs = config.duration_secs,
        "simulation started"
    );

    let (stop_tx, stop) = watch::channel(false);
    let scheduler_config = config.to_scheduler_config();
    let mut tasks = Vec::with_capacity(handles.len());
    for (offset, handle) in handles.iter().enumerate() {
        let mut scheduler = RequestScheduler::new(handle.clone(), scheduler_config);
        if let Some(seed) = config.seed {
            scheduler = scheduler.with_seed(seed.wrapping_add(offset as u64));
        }
        tasks.push(tokio::spawn(scheduler.run(stop.clone())));
    }

    tokio::time::sleep(config.duration()).await;
    let _ = stop_tx.send(true);

    let view = network.view();
    let mut processes = Vec::with_capacity(handles.len());
    for (handle, task) in handles.iter().zip(tasks) {
        let report = task
            .await
            .map_err(|e| CliError::simulation_failed(format!("Scheduler task failed: {}", e)))??;
        processes.push(ProcessSummary {
            process: handle.id(),
            index: view.index_of(&handle.id()),
            report,
        });
    }

    for handle in &handles {
        if let Err(e) = handle.shutdown().await {
            warn!(process = %handle.id(), error = %e, "shutdown failed");
        }
    }
    if let Err(e) = audit.sync() {
        warn!(error = %e, "audit sync failed");
    }

    let summary = SimulationSummary {
        group: config.group_name.clone(),
        members: config.members,
        duration_secs: config.duration_secs,
        audit_path: config.audit_path.clone(),
        entries: processes.iter().map(|p| p.report.completed).sum(),
        abandoned: processes.iter().map(|p| p.report.abandoned).sum(),
        processes,
        network: network.stats()?,
    };
    info!(
        entries = summary.entries,
        abandoned = summary.abandoned,
        "simulation finished"
    );

    Ok(summary)
}
