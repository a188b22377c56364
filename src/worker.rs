use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::RECOGNITION;
use crate::error::{ExtractError, Result};
use crate::source::ModulePaths;
use crate::{extract_component, Extraction};

/// One extraction job: a (style, component) pair with project-relative
/// source and destination paths. Serializable so coordinators can ship job
/// batches across process boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub project_root: PathBuf,
    pub style_id: String,
    pub component_id: String,
    pub source_path: PathBuf,
    pub generated_path: PathBuf,
}

impl JobDescriptor {
    fn source_abs(&self) -> PathBuf {
        self.project_root.join(&self.source_path)
    }

    fn generated_abs(&self) -> PathBuf {
        self.project_root.join(&self.generated_path)
    }
}

#[derive(Debug)]
pub struct JobOutcome {
    pub component_id: String,
    pub result: Result<()>,
}

/// Runs every job on the rayon pool, one isolated pipeline per job. A
/// failing or panicking job never stops the others; panics surface as
/// `Worker` errors carrying the panic message.
pub fn run_jobs(jobs: Vec<JobDescriptor>) -> Vec<JobOutcome> {
    jobs.into_par_iter()
        .map(|job| {
            let component_id = job.component_id.clone();
            let result = catch_unwind(AssertUnwindSafe(|| run_one(&job)))
                .unwrap_or_else(|panic| {
                    Err(ExtractError::Worker {
                        component: job.component_id.clone(),
                        message: panic_message(&panic),
                    })
                });
            if let Err(err) = &result {
                tracing::error!(component = %component_id, "{err}");
            }
            JobOutcome {
                component_id,
                result,
            }
        })
        .collect()
}

fn run_one(job: &JobDescriptor) -> Result<()> {
    let source = fs::read_to_string(job.source_abs()).map_err(|e| ExtractError::Worker {
        component: job.component_id.clone(),
        message: format!("reading {}: {e}", job.source_path.display()),
    })?;
    let paths = ModulePaths {
        source: job.source_path.clone(),
        generated: job.generated_path.clone(),
    };
    let Some(extraction) = extract_component(&source, &paths, &RECOGNITION)? else {
        tracing::info!(
            style = %job.style_id,
            component = %job.component_id,
            "nothing to extract"
        );
        return Ok(());
    };
    write_outputs(job, &extraction)?;
    tracing::info!(
        style = %job.style_id,
        component = %job.component_id,
        skipped = extraction.skipped.len(),
        "component extracted"
    );
    Ok(())
}

/// Both writes are issued together and awaited jointly; either failure fails
/// the component.
fn write_outputs(job: &JobDescriptor, extraction: &Extraction) -> Result<()> {
    let (rewrite, generate) = rayon::join(
        || {
            let path = job.source_abs();
            fs::write(&path, &extraction.rewritten)
                .map_err(|source| ExtractError::Write { path, source })
        },
        || {
            let path = job.generated_abs();
            fs::write(&path, &extraction.module)
                .map_err(|source| ExtractError::Write { path, source })
        },
    );
    rewrite?;
    generate?;
    Ok(())
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
