//! Recurring maintenance tasks.

use crate::context::EngineContext;
use crate::model::document::{Document, MaintenanceTask, NewMaintenanceTask};
use crate::service::Created;

pub fn add_maintenance_task(
    document: &Document,
    input: NewMaintenanceTask,
    ctx: &mut EngineContext,
) -> Created {
    let task = MaintenanceTask {
        id: ctx.next_id("task"),
        area_id: input.area_id,
        kind: input.kind,
        month: input.month.filter(|month| (1..=12).contains(month)),
        description: input.description,
        last_completed: None,
    };

    let id = task.id.clone();
    let mut next = document.clone();
    next.maintenance_tasks.push(task);
    Created { document: next, id }
}

/// Stamps `last_completed` with today's date.
pub fn complete_maintenance_task(
    document: &Document,
    task_id: &str,
    ctx: &mut EngineContext,
) -> Document {
    let mut next = document.clone();
    if let Some(task) = next
        .maintenance_tasks
        .iter_mut()
        .find(|task| task.id == task_id)
    {
        task.last_completed = Some(ctx.today());
    }
    next
}

pub fn remove_maintenance_task(document: &Document, task_id: &str) -> Document {
    let mut next = document.clone();
    next.maintenance_tasks.retain(|task| task.id != task_id);
    next
}

#[cfg(test)]
mod tests {
    use super::{add_maintenance_task, complete_maintenance_task};
    use crate::context::EngineContext;
    use crate::model::document::{Document, MaintenanceKind, NewMaintenanceTask};

    #[test]
    fn completion_records_today_and_invalid_month_is_dropped() {
        let mut ctx = EngineContext::deterministic("2025-11-20T16:45:00Z".parse().unwrap());
        let document = Document::new("Plot", 2025, "2025-01-01T00:00:00.000Z");
        let created = add_maintenance_task(
            &document,
            NewMaintenanceTask {
                area_id: None,
                kind: MaintenanceKind::Prune,
                month: Some(13),
                description: "Winter prune".to_string(),
            },
            &mut ctx,
        );

        let completed = complete_maintenance_task(&created.document, &created.id, &mut ctx);
        let task = &completed.maintenance_tasks[0];
        assert_eq!(task.month, None);
        assert_eq!(task.last_completed.as_deref(), Some("2025-11-20"));
    }
}
