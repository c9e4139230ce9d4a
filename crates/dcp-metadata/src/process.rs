// crates/dcp-metadata/src/process.rs
//
// Analysis process: one workflow run, with its tasks flattened out of any
// nested sub-workflows.

use dcp_core::{normalize_timestamp, CallRecord, DcpError, RunRecord};

use crate::config::BuilderConfig;
use crate::documents::{AnalysisProcess, ProcessCore, Provenance, Task, TextLabel};

/// Build the analysis process for `record`. The document id is the run id.
pub fn build_process(
    record: &RunRecord,
    config: &BuilderConfig,
) -> Result<AnalysisProcess, DcpError> {
    if record.id.trim().is_empty() {
        return Err(DcpError::Validation(
            "Run record has no workflow id".to_string(),
        ));
    }

    Ok(AnalysisProcess {
        described_by: config.schema_urls().analysis_process(),
        schema_type: "process".to_string(),
        process_core: ProcessCore {
            process_id: record.id.clone(),
        },
        process_type: TextLabel::new("analysis"),
        analysis_run_type: "run".to_string(),
        inputs: record.inputs.clone(),
        tasks: flatten_tasks(record)?,
        timestamp_start_utc: normalize_timestamp(&record.start)?,
        timestamp_stop_utc: normalize_timestamp(&record.end)?,
        reference_files: config.reference_ids.clone(),
        provenance: Provenance::new(record.id.clone(), &config.workspace_version),
    })
}

/// All task executions in the run, sub-workflows included, sorted by task
/// name. Ties are broken by start time, stop time, then stdout location so
/// scattered shards come out in a stable order.
pub fn flatten_tasks(record: &RunRecord) -> Result<Vec<Task>, DcpError> {
    let mut tasks = Vec::new();
    collect_tasks(record, &mut tasks)?;
    tasks.sort_by(|a, b| {
        (&a.task_name, &a.start_time, &a.stop_time, &a.log_out).cmp(&(
            &b.task_name,
            &b.start_time,
            &b.stop_time,
            &b.log_out,
        ))
    });
    Ok(tasks)
}

fn collect_tasks(record: &RunRecord, out: &mut Vec<Task>) -> Result<(), DcpError> {
    for (name, calls) in &record.calls {
        for call in calls {
            match &call.sub_workflow_metadata {
                Some(sub) => collect_tasks(sub, out)?,
                None => out.push(task_from_call(name, call)?),
            }
        }
    }
    Ok(())
}

fn task_from_call(qualified_name: &str, call: &CallRecord) -> Result<Task, DcpError> {
    let task_name = qualified_name
        .rsplit('.')
        .next()
        .unwrap_or(qualified_name)
        .to_string();
    let runtime = call.runtime_attributes.clone().unwrap_or_default();

    let cpus = runtime
        .cpu
        .as_deref()
        .ok_or_else(|| DcpError::Validation(format!("Task {} has no cpu count", qualified_name)))?
        .trim()
        .parse::<u32>()
        .map_err(|e| {
            DcpError::Validation(format!("Task {} has invalid cpu count: {}", qualified_name, e))
        })?;
    let start = call
        .start
        .as_deref()
        .ok_or_else(|| DcpError::Validation(format!("Task {} has no start time", qualified_name)))?;
    let end = call
        .end
        .as_deref()
        .ok_or_else(|| DcpError::Validation(format!("Task {} has no end time", qualified_name)))?;

    Ok(Task {
        task_name,
        cpus,
        memory: runtime.memory.unwrap_or_default(),
        disk_size: runtime.disks.unwrap_or_default(),
        docker_image: runtime.docker.unwrap_or_default(),
        zone: runtime.zones.unwrap_or_default(),
        start_time: normalize_timestamp(start)?,
        stop_time: normalize_timestamp(end)?,
        log_out: call.stdout.clone().unwrap_or_default(),
        log_err: call.stderr.clone().unwrap_or_default(),
    })
}
