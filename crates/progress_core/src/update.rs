use std::time::Instant;

use progress_logging::{progress_debug, progress_warn};

use crate::{Classification, Effect, IndicatorState, Msg, ProgressSnapshot, RawNotification};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: IndicatorState, msg: Msg) -> (IndicatorState, Vec<Effect>) {
    if state.is_stopped() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Started => state.scheduler.force_refresh().into_iter().collect(),
        Msg::PushReceived { notifications, at } => handle_push(&mut state, notifications, at),
        Msg::FallbackTick { at } => state.scheduler.notify(at).into_iter().collect(),
        Msg::TimerFired { timer } => state.scheduler.timer_fired(timer).into_iter().collect(),
        Msg::FetchCompleted { seq, result } => {
            if let Some(snapshot) = state.scheduler.fetch_completed(seq, result) {
                apply_snapshot(&mut state, &snapshot);
            }
            Vec::new()
        }
        Msg::MenuToggled { open } => {
            let opened = state.presenter.set_open(open);
            state.mark_dirty();
            if opened {
                state.scheduler.force_refresh().into_iter().collect()
            } else {
                Vec::new()
            }
        }
        Msg::CancelClicked { code } => match state.presenter.trigger_cancel(&code) {
            Some(code) => {
                state.mark_dirty();
                vec![Effect::RequestCancel { code }]
            }
            None => Vec::new(),
        },
        Msg::JobSelected { code } => {
            let model = state
                .last_snapshot()
                .and_then(|snapshot| snapshot.find(&code))
                .map(|item| item.model.clone())
                .filter(|model| !model.is_empty());
            match model {
                Some(model) => vec![Effect::ResolveView { model }],
                None => {
                    progress_debug!("no model known for selected job {}", code);
                    Vec::new()
                }
            }
        }
        Msg::ViewResolved { model, result } => match result {
            Ok(view_id) => vec![Effect::OpenView { model, view_id }],
            Err(failure) => {
                progress_warn!("resolving view for {} failed: {}", model, failure);
                Vec::new()
            }
        },
        Msg::Teardown => state.scheduler.teardown().into_iter().collect(),
    };

    (state, effects)
}

fn handle_push(
    state: &mut IndicatorState,
    notifications: Vec<RawNotification>,
    at: Instant,
) -> Vec<Effect> {
    let mut effects = Vec::new();
    for raw in notifications {
        let Classification::Accepted {
            state: wire_state,
            forward,
            ..
        } = state.listener.classify(&raw)
        else {
            continue;
        };
        effects.extend(state.scheduler.notify(at));
        if let Err(err) = wire_state {
            progress_warn!("not forwarding malformed {} notification: {}", raw.topic, err);
        }
        if let Some(payload) = forward {
            effects.push(Effect::ForwardProgress { payload });
        }
    }
    effects
}

fn apply_snapshot(state: &mut IndicatorState, snapshot: &ProgressSnapshot) {
    state.presenter.render(snapshot);
    state.mark_dirty();
}
