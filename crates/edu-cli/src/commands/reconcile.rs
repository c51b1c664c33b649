use crate::cli::GlobalFlags;
use crate::cli::root_commands::ReconcileArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `edu reconcile`.
///
/// Always prints a list so the output shape does not depend on `--course`.
pub async fn handle(
    args: &ReconcileArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let reconciler = ctx.service.reconciler();
    let reports = match args.course.as_deref() {
        Some(course_id) => vec![reconciler.reconcile_course(course_id).await?],
        None => reconciler.reconcile_all().await?,
    };

    let drifted = reports.iter().filter(|report| report.has_drift()).count();
    tracing::info!(checked = reports.len(), drifted, "reconcile finished");
    output(&reports, flags.format)
}
