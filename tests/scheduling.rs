mod common;

use chrono::{Duration, Utc};
use std::sync::atomic::Ordering;

use common::{memory_store, settle, sink_with, store_on, FakeCalendar, FakeNotifications};
use tidylist::scheduling::{Permission, SchedulingOptions, SchedulingSink};
use tidylist::storage::{MemoryStorage, PersistedState, StateStorage};
use tidylist::{NewTask, Task, TaskPatch};

#[tokio::test]
async fn test_due_in_two_hours_schedules_one_reminder() {
    let notifications = FakeNotifications::granted();
    let mut store = memory_store().with_scheduler(sink_with(notifications));
    let id = store.add_task(NewTask::new("Pay rent")).unwrap();

    store.update_task(&id, TaskPatch::default().due(Utc::now() + Duration::hours(2)));

    assert_eq!(store.scheduler().active_reminders(), 1);
    let fire_at = store.scheduler().reminder_for(&id).unwrap();
    let expected = Utc::now() + Duration::hours(1);
    assert!((fire_at - expected).num_seconds().abs() <= 2);
}

#[tokio::test]
async fn test_due_within_the_hour_schedules_nothing() {
    let notifications = FakeNotifications::granted();
    let mut store = memory_store().with_scheduler(sink_with(notifications));
    let id = store.add_task(NewTask::new("Pay rent")).unwrap();

    store.update_task(&id, TaskPatch::default().due(Utc::now() + Duration::hours(2)));
    assert_eq!(store.scheduler().active_reminders(), 1);

    // Moving the due date inside the lead time replaces the reminder with nothing
    store.update_task(&id, TaskPatch::default().due(Utc::now() + Duration::minutes(30)));
    assert_eq!(store.scheduler().active_reminders(), 0);
    assert!(store.scheduler().reminder_for(&id).is_none());
}

#[tokio::test]
async fn test_rescheduling_replaces_previous_reminder() {
    let notifications = FakeNotifications::granted();
    let mut store = memory_store().with_scheduler(sink_with(notifications));
    let id = store
        .add_task(NewTask::new("Dentist").due(Utc::now() + Duration::hours(3)))
        .unwrap();

    store.update_task(&id, TaskPatch::default().due(Utc::now() + Duration::hours(5)));
    store.update_task(&id, TaskPatch::default().due(Utc::now() + Duration::hours(6)));

    assert_eq!(store.scheduler().active_reminders(), 1);
}

#[tokio::test]
async fn test_past_due_and_denied_schedule_nothing() {
    let mut sink = sink_with(FakeNotifications::granted());
    let mut store = memory_store();
    let id = store
        .add_task(NewTask::new("Late").due(Utc::now() - Duration::hours(1)))
        .unwrap();
    assert!(!sink.schedule_due_notification(store.task(&id).unwrap()));

    let mut denied = sink_with(FakeNotifications::with_permission(Permission::Denied));
    store.update_task(&id, TaskPatch::default().due(Utc::now() + Duration::hours(4)));
    assert!(!denied.schedule_due_notification(store.task(&id).unwrap()));

    let mut unsupported = sink_with(FakeNotifications::with_permission(Permission::Unsupported));
    assert!(!unsupported.schedule_due_notification(store.task(&id).unwrap()));
    assert!(sink.schedule_due_notification(store.task(&id).unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_reminder_fires_an_hour_before_due() {
    let notifications = FakeNotifications::granted();
    let mut store = memory_store().with_scheduler(sink_with(notifications.clone()));
    store.add_task(NewTask::new("Submit taxes").due(Utc::now() + Duration::hours(2)));

    tokio::time::sleep(std::time::Duration::from_secs(50 * 60)).await;
    assert!(notifications.shown().is_empty());

    tokio::time::sleep(std::time::Duration::from_secs(11 * 60)).await;
    let shown = notifications.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Task Due Soon");
    assert_eq!(shown[0].body, "The task \"Submit taxes\" is due in 1 hour");
    assert_eq!(store.scheduler().active_reminders(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_deleting_a_task_cancels_its_reminder() {
    let notifications = FakeNotifications::granted();
    let mut store = memory_store().with_scheduler(sink_with(notifications.clone()));
    let id = store
        .add_task(NewTask::new("Cancelled meeting").due(Utc::now() + Duration::hours(2)))
        .unwrap();

    store.delete_task(&id);
    assert_eq!(store.scheduler().active_reminders(), 0);

    tokio::time::sleep(std::time::Duration::from_secs(3 * 3600)).await;
    assert!(notifications.shown().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_default_permission_is_requested_once_reminder_runs() {
    let notifications = FakeNotifications::refusing();
    let mut store = memory_store().with_scheduler(sink_with(notifications.clone()));
    store.add_task(NewTask::new("Ask first").due(Utc::now() + Duration::hours(2)));

    tokio::time::sleep(std::time::Duration::from_secs(2 * 3600)).await;
    assert_eq!(notifications.requests.load(Ordering::SeqCst), 1);
    assert!(notifications.shown().is_empty());
}

#[tokio::test]
async fn test_clearing_due_date_cancels_reminder() {
    let mut store = memory_store().with_scheduler(sink_with(FakeNotifications::granted()));
    let id = store
        .add_task(NewTask::new("Maybe later").due(Utc::now() + Duration::hours(5)))
        .unwrap();
    assert_eq!(store.scheduler().active_reminders(), 1);

    store.update_task(&id, TaskPatch::default().clear_due());
    assert_eq!(store.scheduler().active_reminders(), 0);
    assert!(store.task(&id).unwrap().due_date.is_none());
}

#[tokio::test]
async fn test_reminders_restored_when_scheduler_attached() {
    let mut store = memory_store();
    store.add_task(NewTask::new("open").due(Utc::now() + Duration::hours(3)));
    let done = store
        .add_task(NewTask::new("done").due(Utc::now() + Duration::hours(3)))
        .unwrap();
    store.update_task(&done, TaskPatch::default().completed(true));

    let store = store.with_scheduler(sink_with(FakeNotifications::granted()));
    assert_eq!(store.scheduler().active_reminders(), 1);
}

#[test]
fn test_no_runtime_schedules_nothing() {
    let mut store = memory_store().with_scheduler(sink_with(FakeNotifications::granted()));
    let id = store
        .add_task(NewTask::new("offline").due(Utc::now() + Duration::hours(2)))
        .unwrap();

    assert!(store.task(&id).is_some());
    assert_eq!(store.scheduler().active_reminders(), 0);
}

#[tokio::test]
async fn test_completion_synced_to_calendar_when_enabled() {
    let calendar = FakeCalendar::new();
    let sink = SchedulingSink::new(SchedulingOptions::default()).with_calendar(calendar.clone());
    let mut store = memory_store().with_scheduler(sink);
    let id = store.add_task(NewTask::new("Run 5k")).unwrap();

    store.update_task(&id, TaskPatch::default().completed(true));
    settle().await;
    assert!(calendar.events().is_empty(), "calendar sync is off by default");

    store.toggle_google_calendar_sync();
    store.update_task(&id, TaskPatch::default().completed(false));
    let before = Utc::now();
    store.update_task(&id, TaskPatch::default().completed(true));
    settle().await;

    let events = calendar.events();
    assert_eq!(events.len(), 1);
    let (calendar_id, event) = &events[0];
    assert_eq!(calendar_id, "primary");
    assert_eq!(event.summary, "Completed: Run 5k");
    assert!(event.description.starts_with("Task completed on "));
    assert!(event.start.date_time >= before);
    assert_eq!(event.end.date_time - event.start.date_time, Duration::minutes(30));
    assert_eq!(event.start.time_zone, "UTC");
}

#[tokio::test]
async fn test_calendar_failure_does_not_affect_store() {
    let calendar = FakeCalendar::failing();
    let sink = SchedulingSink::default().with_calendar(calendar.clone());
    let mut store = memory_store().with_scheduler(sink);
    store.toggle_google_calendar_sync();
    let id = store.add_task(NewTask::new("Fragile")).unwrap();

    assert!(store.update_task(&id, TaskPatch::default().completed(true)));
    settle().await;

    assert!(calendar.events().is_empty());
    assert!(store.task(&id).unwrap().completed);
}

#[tokio::test]
async fn test_calendar_absent_is_silent() {
    let mut store = memory_store();
    store.toggle_google_calendar_sync();
    let id = store.add_task(NewTask::new("No calendar")).unwrap();

    assert!(store.update_task(&id, TaskPatch::default().completed(true)));
    assert!(!store.scheduler().has_calendar());
}

#[tokio::test(start_paused = true)]
async fn test_completing_a_task_cancels_its_reminder() {
    let notifications = FakeNotifications::granted();
    let mut store = memory_store().with_scheduler(sink_with(notifications.clone()));
    let id = store
        .add_task(NewTask::new("File expenses").due(Utc::now() + Duration::hours(2)))
        .unwrap();
    assert_eq!(store.scheduler().active_reminders(), 1);

    store.update_task(&id, TaskPatch::default().completed(true));
    assert_eq!(store.scheduler().active_reminders(), 0);

    // Reopening re-arms, completing again disarms
    store.update_task(&id, TaskPatch::default().completed(false));
    assert!(store.scheduler().reminder_for(&id).is_some());
    store.update_task(&id, TaskPatch::default().completed(true));
    assert_eq!(store.scheduler().active_reminders(), 0);

    tokio::time::sleep(std::time::Duration::from_secs(3 * 3600)).await;
    assert!(notifications.shown().is_empty());
}

#[tokio::test]
async fn test_due_date_on_completed_task_schedules_nothing() {
    let mut store = memory_store().with_scheduler(sink_with(FakeNotifications::granted()));
    let id = store.add_task(NewTask::new("Already done").completed(true)).unwrap();

    store.update_task(&id, TaskPatch::default().due(Utc::now() + Duration::hours(4)));
    assert_eq!(store.scheduler().active_reminders(), 0);

    let mut sink = sink_with(FakeNotifications::granted());
    assert!(!sink.schedule_due_notification(store.task(&id).unwrap()));
}

#[tokio::test(start_paused = true)]
async fn test_refused_prompt_leaves_no_pending_reminder() {
    let notifications = FakeNotifications::refusing();
    let mut store = memory_store().with_scheduler(sink_with(notifications.clone()));
    let id = store
        .add_task(NewTask::new("Ask first").due(Utc::now() + Duration::hours(2)))
        .unwrap();
    assert_eq!(store.scheduler().active_reminders(), 1);

    settle().await;
    assert_eq!(notifications.requests.load(Ordering::SeqCst), 1);
    assert_eq!(store.scheduler().active_reminders(), 0);
    assert!(store.scheduler().reminder_for(&id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reorder_dropping_a_task_cancels_its_reminder() {
    let notifications = FakeNotifications::granted();
    let mut store = memory_store().with_scheduler(sink_with(notifications.clone()));
    let dropped = store
        .add_task(NewTask::new("Dropped").due(Utc::now() + Duration::hours(3)))
        .unwrap();
    let kept = store
        .add_task(NewTask::new("Kept").due(Utc::now() + Duration::hours(4)))
        .unwrap();
    assert_eq!(store.scheduler().active_reminders(), 2);

    let remaining: Vec<_> = store.tasks().iter().filter(|t| t.id == kept).cloned().collect();
    store.reorder_tasks(remaining);

    assert_eq!(store.scheduler().active_reminders(), 1);
    assert!(store.scheduler().reminder_for(&dropped).is_none());
    assert!(store.scheduler().reminder_for(&kept).is_some());

    tokio::time::sleep(std::time::Duration::from_secs(3 * 3600 + 60)).await;
    let shown = notifications.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].task_id, kept);
}

#[tokio::test]
async fn test_retention_purge_leaves_open_reminders_armed() {
    let storage = MemoryStorage::new();
    let mut stale = Task::from_new(
        NewTask::new("Old errand").completed(true).due(Utc::now() + Duration::hours(5)),
        Utc::now() - Duration::days(30),
    )
    .unwrap();
    stale.completed_at = Some(Utc::now() - Duration::days(10));
    storage
        .save(&PersistedState {
            tasks: vec![stale.clone()],
            ..PersistedState::default()
        })
        .unwrap();

    let mut store = store_on(storage).with_scheduler(sink_with(FakeNotifications::granted()));
    let open = store
        .add_task(NewTask::new("Upcoming").due(Utc::now() + Duration::hours(6)))
        .unwrap();
    assert_eq!(store.scheduler().active_reminders(), 1);

    // Complete a second dated task: its reminder goes, the stale task is purged
    let finishing = store
        .add_task(NewTask::new("Finishing").due(Utc::now() + Duration::hours(7)))
        .unwrap();
    assert_eq!(store.scheduler().active_reminders(), 2);
    store.update_task(&finishing, TaskPatch::default().completed(true));

    assert!(store.task(&stale.id).is_none());
    assert_eq!(store.scheduler().active_reminders(), 1);
    assert!(store.scheduler().reminder_for(&open).is_some());
    assert!(store.scheduler().reminder_for(&stale.id).is_none());
}
