// src/build/queue.rs

//! Build task queue
//!
//! Tasks are grouped by repository. Within a group they run one after the
//! other in submission order, so a repository queued in dependency order
//! builds in that order. Groups run concurrently, bounded by the configured
//! worker count. Each task runs on the blocking pool with its own database
//! connection, followed by the completion hook: publish the artifact when
//! the base package builds, then regenerate the static index if enabled.

use super::{BuildOutcome, build_package, task_name};
use crate::context::Context;
use crate::db::models::{Architecture, BasePackage, Package, Repository};
use crate::error::{Error, Result};
use crate::repository::publish_artifact;
use crate::static_index;
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

/// One queued build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    pub package_id: i64,
    pub architecture: Architecture,
    pub repository_id: i64,
    pub force: bool,
    /// Grouping key: the repository name
    pub group: String,
    /// Dedupe key, see [`task_name`]
    pub name: String,
}

impl BuildTask {
    pub fn new(
        conn: &Connection,
        package: &Package,
        architecture: &Architecture,
        repo: &Repository,
        force: bool,
    ) -> Result<Self> {
        let base = package.base_package(conn)?;
        let version = base.version.as_deref().ok_or_else(|| {
            Error::MetadataError(format!("Base package '{}' has no version", base))
        })?;

        Ok(Self {
            package_id: package.require_id()?,
            architecture: architecture.clone(),
            repository_id: repo.require_id()?,
            force,
            group: repo.name.clone(),
            name: task_name(package, version, repo, &architecture.name),
        })
    }
}

/// What happened to one task
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub name: String,
    pub group: String,
    pub outcome: std::result::Result<BuildOutcome, String>,
    /// The completion hook added the artifact to the repository index
    pub published: bool,
}

/// Pending build tasks, grouped by repository
#[derive(Debug)]
pub struct BuildQueue {
    ctx: Arc<Context>,
    groups: Vec<(String, Vec<BuildTask>)>,
    queued: HashSet<String>,
}

impl BuildQueue {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self {
            ctx,
            groups: Vec::new(),
            queued: HashSet::new(),
        }
    }

    /// Queue a task; a task with the same name already queued is dropped
    pub fn submit(&mut self, task: BuildTask) -> bool {
        if !self.queued.insert(task.name.clone()) {
            info!("{} is already queued", task.name);
            return false;
        }

        match self.groups.iter_mut().find(|(group, _)| *group == task.group) {
            Some((_, tasks)) => tasks.push(task),
            None => self.groups.push((task.group.clone(), vec![task])),
        }
        true
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Run every queued task to completion
    pub async fn run(self) -> Vec<TaskReport> {
        let semaphore = Arc::new(Semaphore::new(self.ctx.config.build.workers.max(1)));
        let mut set = JoinSet::new();

        for (group, tasks) in self.groups {
            let ctx = Arc::clone(&self.ctx);
            let semaphore = Arc::clone(&semaphore);
            let span = info_span!("group", repository = %group);

            set.spawn(
                async move {
                    let mut reports = Vec::with_capacity(tasks.len());
                    for task in tasks {
                        let Ok(_permit) = semaphore.acquire().await else {
                            break;
                        };
                        reports.push(run_blocking(Arc::clone(&ctx), task).await);
                    }
                    reports
                }
                .instrument(span),
            );
        }

        let mut reports = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(group_reports) => reports.extend(group_reports),
                Err(e) => error!("Build group task failed: {}", e),
            }
        }
        reports
    }
}

async fn run_blocking(ctx: Arc<Context>, task: BuildTask) -> TaskReport {
    let name = task.name.clone();
    let group = task.group.clone();

    match tokio::task::spawn_blocking(move || run_task(&ctx, &task)).await {
        Ok(report) => report,
        Err(e) => {
            error!("Build task {} panicked: {}", name, e);
            TaskReport {
                name,
                group,
                outcome: Err(e.to_string()),
                published: false,
            }
        }
    }
}

/// Execute one task and its completion hook
pub fn run_task(ctx: &Context, task: &BuildTask) -> TaskReport {
    let _span = info_span!("build", task = %task.name).entered();

    let mut report = TaskReport {
        name: task.name.clone(),
        group: task.group.clone(),
        outcome: Err(String::new()),
        published: false,
    };

    let mut conn = match ctx.open_db() {
        Ok(conn) => conn,
        Err(e) => {
            error!("Cannot open database: {}", e);
            report.outcome = Err(e.to_string());
            return report;
        }
    };

    match execute(&mut conn, ctx, task) {
        Ok((outcome, published)) => {
            report.outcome = Ok(outcome);
            report.published = published;
        }
        Err(e) => {
            warn!("Build task {} failed: {}", task.name, e);
            report.outcome = Err(e.to_string());
        }
    }
    report
}

fn execute(conn: &mut Connection, ctx: &Context, task: &BuildTask) -> Result<(BuildOutcome, bool)> {
    let package = Package::find_by_id(conn, task.package_id)?
        .ok_or_else(|| Error::NotFoundError(format!("Package {}", task.package_id)))?;
    let repo = Repository::find_by_id(conn, task.repository_id)?
        .ok_or_else(|| Error::NotFoundError(format!("Repository {}", task.repository_id)))?;

    let outcome = build_package(conn, ctx, &package, &task.architecture, &repo, task.force)?;
    let published = on_complete(conn, ctx, &package, &task.architecture, &repo);
    Ok((outcome, published))
}

/// Completion hook: publish when the base package builds, then refresh the static index
fn on_complete(
    conn: &Connection,
    ctx: &Context,
    package: &Package,
    architecture: &Architecture,
    repo: &Repository,
) -> bool {
    let builds = match BasePackage::find_by_id(conn, package.base_package_id) {
        Ok(Some(base)) => base.builds,
        Ok(None) => false,
        Err(e) => {
            warn!("Cannot reload {}: {}", package.name, e);
            false
        }
    };

    let published = if builds {
        match publish_artifact(conn, ctx, package, architecture, repo) {
            Ok(indexed) => indexed,
            Err(e) => {
                warn!("Cannot publish {}: {}", package.name, e);
                false
            }
        }
    } else {
        false
    };

    if ctx.config.build.static_index
        && let Err(e) = static_index::write_index(conn, &ctx.config)
    {
        warn!("Cannot write static index: {}", e);
    }

    published
}
