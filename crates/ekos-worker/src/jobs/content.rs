//! Script writing job.

use serde_json::json;

use ekos_models::{ContentId, TaskId};
use ekos_trends::{IdeaGenerator, Script, ScriptBrief, TemplateGenerator};

use super::{to_map, JobContext, JobOutcome};
use crate::error::WorkerResult;
use crate::logging::JobLogger;

pub(super) async fn run(
    ctx: &JobContext,
    task_id: &TaskId,
    content_id: &ContentId,
    logger: &JobLogger,
) -> WorkerResult<JobOutcome> {
    ctx.tracker.start(task_id, 10).await?;

    let content = ctx.content.get(content_id).await?;
    let brief = ScriptBrief {
        title: content.title.clone(),
        topic: content.topic.clone(),
        description: content.description.clone().unwrap_or_default(),
        keywords: content.keywords.clone(),
    };

    let (script, generator) = match ctx.ideas.write_script(&brief).await {
        Ok(script) => (script, ctx.ideas.name()),
        Err(e) => {
            logger.log_warning(&format!("{} failed, using templates: {}", ctx.ideas.name(), e));
            let fallback = TemplateGenerator::new();
            (fallback.write_script(&brief).await?, fallback.name())
        }
    };
    ctx.tracker.set_progress(task_id, 80).await?;

    let Script { title, script } = script;
    let title = Some(title.trim()).filter(|t| !t.is_empty());
    let updated = ctx.content.set_script(content_id, title, &script).await?;

    logger.log_completion(&format!("Script of {} chars by {generator}", script.chars().count()));
    Ok(JobOutcome::new(to_map(json!({
        "content_id": updated.id,
        "title": updated.title,
        "script_length": script.chars().count(),
        "generator": generator,
    }))))
}
