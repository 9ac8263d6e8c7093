use std::time::{Duration, Instant};

use progress_core::{
    update, Effect, IndicatorConfig, IndicatorState, Msg, ProgressItem, ProgressSnapshot,
    ProgressState, RawNotification, RefreshPhase, TransportFailure,
};
use serde_json::json;

fn init_logging() {
    progress_logging::initialize_for_tests();
}

fn ongoing_push(code: &str) -> RawNotification {
    RawNotification::new(
        "web_progress",
        json!([{"state": "ongoing", "code": code, "cancellable": true, "model": "sale.order"}]),
    )
}

fn push(state: IndicatorState, at: Instant, notifications: Vec<RawNotification>) -> (IndicatorState, Vec<Effect>) {
    update(state, Msg::PushReceived { notifications, at })
}

fn fetches(effects: &[Effect]) -> Vec<u64> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::FetchSnapshot { seq } => Some(*seq),
            _ => None,
        })
        .collect()
}

fn timers(effects: &[Effect]) -> Vec<(u64, Instant)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::ArmTimer { timer, deadline } => Some((*timer, *deadline)),
            _ => None,
        })
        .collect()
}

fn two_jobs() -> ProgressSnapshot {
    ProgressSnapshot::new(vec![
        ProgressItem::new("j1", ProgressState::Ongoing)
            .cancellable(true)
            .with_model("sale.order"),
        ProgressItem::new("j2", ProgressState::Ongoing).cancellable(false),
    ])
}

/// Runs a forced fetch to completion so the state holds `snapshot`.
fn loaded(snapshot: ProgressSnapshot) -> IndicatorState {
    let (state, effects) = update(IndicatorState::new(), Msg::Started);
    let seq = fetches(&effects)[0];
    let (state, _) = update(
        state,
        Msg::FetchCompleted {
            seq,
            result: Ok(snapshot),
        },
    );
    state
}

#[test]
fn start_loads_once_immediately() {
    init_logging();
    let (state, effects) = update(IndicatorState::new(), Msg::Started);
    assert_eq!(effects, vec![Effect::FetchSnapshot { seq: 1 }]);
    assert_eq!(state.phase(), RefreshPhase::Fetching { seq: 1 });
}

#[test]
fn three_pushes_within_two_seconds_schedule_one_fetch_at_ten_seconds() {
    init_logging();
    let first = Instant::now();
    let mut state = IndicatorState::new();
    let mut all_effects = Vec::new();

    for offset in [0, 800, 2_000] {
        let (next, effects) = push(
            state,
            first + Duration::from_millis(offset),
            vec![ongoing_push("j1")],
        );
        state = next;
        all_effects.extend(effects);
    }

    let armed = timers(&all_effects);
    assert_eq!(armed, vec![(1, first + Duration::from_secs(10))]);
    assert!(fetches(&all_effects).is_empty());

    let (_state, effects) = update(state, Msg::TimerFired { timer: 1 });
    assert_eq!(fetches(&effects).len(), 1);
}

#[test]
fn accepted_ongoing_pushes_are_forwarded_each_time() {
    init_logging();
    let now = Instant::now();
    let (_state, effects) = push(
        IndicatorState::new(),
        now,
        vec![ongoing_push("j1"), ongoing_push("j2")],
    );
    let forwarded = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::ForwardProgress { .. }))
        .count();
    assert_eq!(forwarded, 2);
    assert_eq!(timers(&effects).len(), 1);
}

#[test]
fn non_forwarded_states_still_schedule_a_refresh() {
    init_logging();
    let now = Instant::now();
    let cancelled = RawNotification::new("web_progress", json!([{"state": "cancel", "code": "j1"}]));
    let (_state, effects) = push(IndicatorState::new(), now, vec![cancelled]);
    assert_eq!(timers(&effects).len(), 1);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::ForwardProgress { .. })));
}

#[test]
fn malformed_message_on_our_topic_still_schedules_a_refresh() {
    init_logging();
    let now = Instant::now();
    let batch = vec![
        RawNotification::new("web_progress", json!("garbage")),
        RawNotification::new("bus.presence", json!([{"state": "ongoing", "code": "x"}])),
    ];
    let (state, effects) = push(IndicatorState::new(), now, batch);

    assert_eq!(timers(&effects).len(), 1);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::ForwardProgress { .. })));
    assert!(matches!(state.phase(), RefreshPhase::Armed { .. }));
}

#[test]
fn push_without_code_or_with_odd_state_is_not_lost() {
    init_logging();
    let now = Instant::now();
    let partial = json!([{"state": "ongoing", "progress": 40}]);
    let (_state, effects) = push(
        IndicatorState::new(),
        now,
        vec![RawNotification::new("web_progress", partial.clone())],
    );
    assert_eq!(timers(&effects).len(), 1);
    assert!(effects.contains(&Effect::ForwardProgress { payload: partial }));

    let (_state, effects) = push(
        IndicatorState::new(),
        now,
        vec![RawNotification::new(
            "web_progress",
            json!([{"state": false, "code": "j1"}]),
        )],
    );
    assert_eq!(timers(&effects).len(), 1);
    assert_eq!(effects.len(), 1);
}

#[test]
fn foreign_only_batch_changes_nothing() {
    init_logging();
    let state = IndicatorState::new();
    let batch = vec![RawNotification::new("mail.channel", json!(["hello"]))];
    let (next, effects) = push(state.clone(), Instant::now(), batch);
    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn fallback_tick_is_debounced_like_a_notification() {
    init_logging();
    let now = Instant::now();
    let (state, effects) = update(IndicatorState::new(), Msg::FallbackTick { at: now });
    assert_eq!(timers(&effects).len(), 1);
    let (_state, effects) = push(state, now, vec![ongoing_push("j1")]);
    assert!(timers(&effects).is_empty());
}

#[test]
fn empty_fetch_renders_zero_counter_without_spinner() {
    init_logging();
    let mut state = loaded(ProgressSnapshot::empty());
    let view = state.view();

    assert_eq!(view.counter, 0);
    assert!(!view.spinning);
    assert!(view.cancel_targets.is_empty());
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn two_item_fetch_wires_one_cancel_handler() {
    init_logging();
    let state = loaded(two_jobs());
    let view = state.view();
    assert_eq!(view.counter, 2);
    assert!(view.spinning);
    assert_eq!(view.cancel_targets, vec!["j1".to_string()]);

    let (state, effects) = update(state, Msg::CancelClicked { code: "j1".into() });
    assert_eq!(effects, vec![Effect::RequestCancel { code: "j1".into() }]);
    assert!(state.view().cancel_targets.is_empty());

    let (state, effects) = update(state, Msg::CancelClicked { code: "j1".into() });
    assert!(effects.is_empty());

    let (_state, effects) = update(state, Msg::CancelClicked { code: "j2".into() });
    assert!(effects.is_empty());
}

#[test]
fn opening_menu_while_timer_armed_keeps_original_deadline() {
    init_logging();
    let first = Instant::now();
    let state = loaded(ProgressSnapshot::empty());

    let (state, effects) = push(state, first, vec![ongoing_push("j1")]);
    let armed = timers(&effects);
    assert_eq!(armed, vec![(1, first + Duration::from_secs(10))]);

    let (state, effects) = update(state, Msg::MenuToggled { open: true });
    assert!(effects.is_empty());
    assert!(state.view().open);
    assert_eq!(
        state.phase(),
        RefreshPhase::Armed {
            timer: 1,
            deadline: first + Duration::from_secs(10)
        }
    );

    let (_state, effects) = update(state, Msg::TimerFired { timer: 1 });
    assert_eq!(fetches(&effects).len(), 1);
}

#[test]
fn opening_menu_when_idle_refreshes_once_per_open() {
    init_logging();
    let state = loaded(ProgressSnapshot::empty());

    let (state, effects) = update(state, Msg::MenuToggled { open: true });
    let seq = fetches(&effects);
    assert_eq!(seq.len(), 1);
    let (state, _) = update(
        state,
        Msg::FetchCompleted {
            seq: seq[0],
            result: Ok(two_jobs()),
        },
    );

    let (state, effects) = update(state, Msg::MenuToggled { open: true });
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::MenuToggled { open: false });
    assert!(effects.is_empty());
    let (_state, effects) = update(state, Msg::MenuToggled { open: true });
    assert_eq!(fetches(&effects).len(), 1);
}

#[test]
fn out_of_order_completion_keeps_newest_issued_snapshot() {
    init_logging();
    let now = Instant::now();
    let (state, effects) = update(IndicatorState::new(), Msg::Started);
    let a = fetches(&effects)[0];
    let (state, effects) = push(state, now, vec![ongoing_push("j1")]);
    let (timer, _) = timers(&effects)[0];
    let (state, effects) = update(state, Msg::TimerFired { timer });
    let b = fetches(&effects)[0];

    let newer = two_jobs();
    let older = ProgressSnapshot::new(vec![ProgressItem::new("old", ProgressState::Done)]);
    let (state, _) = update(state, Msg::FetchCompleted { seq: b, result: Ok(newer.clone()) });
    let (state, _) = update(state, Msg::FetchCompleted { seq: a, result: Ok(older) });

    assert_eq!(state.last_snapshot(), Some(&newer));
    assert_eq!(state.view().counter, 2);
}

#[test]
fn failed_fetch_leaves_display_untouched() {
    init_logging();
    let now = Instant::now();
    let mut state = loaded(two_jobs());
    assert!(state.consume_dirty());

    let (state, effects) = push(state, now, vec![ongoing_push("j1")]);
    let (timer, _) = timers(&effects)[0];
    let (state, effects) = update(state, Msg::TimerFired { timer });
    let seq = fetches(&effects)[0];
    let (mut state, _) = update(
        state,
        Msg::FetchCompleted {
            seq,
            result: Err(TransportFailure::new("502 bad gateway")),
        },
    );

    assert!(!state.consume_dirty());
    assert_eq!(state.view().counter, 2);
    assert_eq!(state.phase(), RefreshPhase::Idle);
}

#[test]
fn selecting_a_job_resolves_its_view_lazily() {
    init_logging();
    let state = loaded(two_jobs());

    let (state, effects) = update(state, Msg::JobSelected { code: "j1".into() });
    assert_eq!(
        effects,
        vec![Effect::ResolveView {
            model: "sale.order".into()
        }]
    );

    let (state, effects) = update(
        state,
        Msg::ViewResolved {
            model: "sale.order".into(),
            result: Ok(42),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenView {
            model: "sale.order".into(),
            view_id: 42
        }]
    );

    // j2 has no model; unknown codes resolve nothing.
    let (state, effects) = update(state, Msg::JobSelected { code: "j2".into() });
    assert!(effects.is_empty());
    let (state, effects) = update(state, Msg::JobSelected { code: "nope".into() });
    assert!(effects.is_empty());

    let (_state, effects) = update(
        state,
        Msg::ViewResolved {
            model: "sale.order".into(),
            result: Err(TransportFailure::new("access denied")),
        },
    );
    assert!(effects.is_empty());
}

#[test]
fn teardown_cancels_timer_and_ignores_late_messages() {
    init_logging();
    let now = Instant::now();
    let (state, effects) = update(IndicatorState::new(), Msg::Started);
    let seq = fetches(&effects)[0];
    let (state, effects) = push(state, now, vec![ongoing_push("j1")]);
    let (timer, _) = timers(&effects)[0];

    let (state, effects) = update(state, Msg::Teardown);
    assert_eq!(effects, vec![Effect::CancelTimer { timer }]);

    let (mut state, effects) = update(
        state,
        Msg::FetchCompleted {
            seq,
            result: Ok(two_jobs()),
        },
    );
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view().counter, 0);

    let (_state, effects) = push(state, now, vec![ongoing_push("j1")]);
    assert!(effects.is_empty());
}

#[test]
fn custom_window_and_channel_are_honoured() {
    init_logging();
    let now = Instant::now();
    let config = IndicatorConfig {
        channel: "jobs".to_string(),
        debounce_window: Duration::from_secs(2),
        ..IndicatorConfig::default()
    };
    let state = IndicatorState::with_config(config);

    let (state, effects) = push(state, now, vec![ongoing_push("j1")]);
    assert!(effects.is_empty());

    let jobs = RawNotification::new("jobs", json!([{"state": "done", "code": "j1"}]));
    let (_state, effects) = push(state, now, vec![jobs]);
    assert_eq!(timers(&effects), vec![(1, now + Duration::from_secs(2))]);
}
