use std::sync::Arc;

use crate::cache::{MenuCache, RebuildStats};
use crate::entities;
use crate::errors::MenuError;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

pub const REBUILD_MENU_CACHE: &str = "rebuild_menu_cache";

/// Cron expression (sec min hour dom mon dow, UTC) firing once a day at `hour`.
pub fn rebuild_schedule(hour: u32) -> Result<String, MenuError> {
    if hour > 23 {
        return Err(MenuError::Config(format!(
            "refresh hour must be between 0 and 23, got {hour}"
        )));
    }
    Ok(format!("0 0 {hour} * * *"))
}

/// Initialize and start the job scheduler with the daily menu rebuild.
///
/// The caller owns the returned scheduler and stops it with
/// [`JobScheduler::shutdown`].
pub async fn init_scheduler(
    db: DatabaseConnection,
    cache: Arc<MenuCache>,
    refresh_hour: u32,
) -> Result<JobScheduler, MenuError> {
    let schedule = rebuild_schedule(refresh_hour)?;

    let sched = JobScheduler::new()
        .await
        .map_err(|e| MenuError::Scheduler(format!("Failed to create job scheduler: {}", e)))?;

    // Daily menu snapshot rebuild. A failure is logged and recorded; the
    // next day's run is scheduled regardless.
    let rebuild_job = Job::new_async(schedule.as_str(), move |_uuid, _l| {
        let db = db.clone();
        let cache = cache.clone();
        Box::pin(async move {
            run_scheduled_rebuild(&db, &cache).await;
        })
    })
    .map_err(|e| MenuError::Scheduler(format!("Failed to create rebuild job: {}", e)))?;

    sched
        .add(rebuild_job)
        .await
        .map_err(|e| MenuError::Scheduler(format!("Failed to add rebuild job: {}", e)))?;

    sched
        .start()
        .await
        .map_err(|e| MenuError::Scheduler(format!("Failed to start job scheduler: {}", e)))?;

    info!(schedule = %schedule, "Job scheduler started with {} jobs", 1);

    Ok(sched)
}

/// Body of the scheduled rebuild job. Never fails: errors are logged and
/// written to `job_executions`.
pub async fn run_scheduled_rebuild(db: &DatabaseConnection, cache: &MenuCache) {
    info!("Running {} job", REBUILD_MENU_CACHE);
    let execution_id = match start_job_execution(db, REBUILD_MENU_CACHE).await {
        Ok(id) => Some(id),
        Err(e) => {
            error!("Failed to record start of {}: {}", REBUILD_MENU_CACHE, e);
            None
        }
    };

    let (success, error_message, records) = match cache.rebuild().await {
        Ok(stats) => {
            info!(
                roles = stats.roles,
                menu_items = stats.menu_items,
                links = stats.links,
                "Scheduled menu cache rebuild finished"
            );
            (true, None, Some(stats.menu_items as i64))
        }
        Err(e) => {
            error!("Scheduled menu cache rebuild failed: {}", e);
            (false, Some(e.to_string()), None)
        }
    };

    if let Some(id) = execution_id {
        if let Err(e) = complete_job_execution(db, id, success, error_message, records).await {
            error!("Failed to record completion of {}: {}", REBUILD_MENU_CACHE, e);
        }
    }
}

/// Record the start of a job execution
pub async fn start_job_execution(
    db: &DatabaseConnection,
    job_name: &str,
) -> Result<i64, MenuError> {
    use entities::job_execution;

    let now = Utc::now().timestamp();

    let execution = job_execution::ActiveModel {
        job_name: Set(job_name.to_string()),
        started_at: Set(now),
        completed_at: Set(None),
        success: Set(None),
        error_message: Set(None),
        records_processed: Set(None),
        ..Default::default()
    };

    let result = execution.insert(db).await?;
    Ok(result.id)
}

/// Record the completion of a job execution
pub async fn complete_job_execution(
    db: &DatabaseConnection,
    execution_id: i64,
    success: bool,
    error_message: Option<String>,
    records_processed: Option<i64>,
) -> Result<(), MenuError> {
    use entities::job_execution::{Column, Entity};

    let now = Utc::now().timestamp();

    if let Some(execution) = Entity::find()
        .filter(Column::Id.eq(execution_id))
        .one(db)
        .await?
    {
        let mut active: entities::job_execution::ActiveModel = execution.into_active_model();
        active.completed_at = Set(Some(now));
        active.success = Set(Some(if success { 1 } else { 0 }));
        active.error_message = Set(error_message);
        active.records_processed = Set(records_processed);
        active.update(db).await?;
    }

    Ok(())
}

/// Most recent executions of `job_name`, newest first.
pub async fn recent_job_executions(
    db: &DatabaseConnection,
    job_name: &str,
    limit: u64,
) -> Result<Vec<entities::job_execution::Model>, MenuError> {
    use entities::job_execution::{Column, Entity};
    use sea_orm::QuerySelect;

    let rows = Entity::find()
        .filter(Column::JobName.eq(job_name))
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(db)
        .await?;
    Ok(rows)
}

/// Manually trigger a job by name (admin action). Goes through the same
/// cache lock as the scheduled run; a failure is recorded and returned.
pub async fn trigger_job_manually(
    db: &DatabaseConnection,
    cache: &MenuCache,
    job_name: &str,
) -> Result<RebuildStats, MenuError> {
    if job_name != REBUILD_MENU_CACHE {
        return Err(MenuError::UnknownJob(job_name.to_string()));
    }

    info!("Manually triggering job: {}", job_name);
    let execution_id = start_job_execution(db, job_name).await?;

    match cache.rebuild().await {
        Ok(stats) => {
            info!(
                "Manually triggered job {} completed: {} menu items",
                job_name, stats.menu_items
            );
            complete_job_execution(db, execution_id, true, None, Some(stats.menu_items as i64))
                .await?;
            Ok(stats)
        }
        Err(e) => {
            error!("Manually triggered job {} failed: {}", job_name, e);
            complete_job_execution(db, execution_id, false, Some(e.to_string()), None).await?;
            Err(e)
        }
    }
}
