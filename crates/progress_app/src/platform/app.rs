use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::Context;
use chrono::Utc;
use progress_core::{update, IndicatorState, Msg};
use progress_engine::{
    BusEvent, EngineCommand, EngineHandle, EventBus, JsonRpcBackend, LongPollChannel, Topic,
};
use progress_logging::{progress_info, progress_warn};
use serde_json::Value;

use super::config::{load_config, AppConfig, CONFIG_FILENAME};
use super::effects::{EffectRunner, MsgSink};
use super::input::{parse_command, HELP};
use super::{logging, render};

pub fn run_app() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));
    let (config, problem) = match load_config(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::initialize(config.log_destination, config.level(), &config.log_file);
    if let Some(err) = problem {
        progress_warn!("using default configuration: {}", err);
    }
    progress_info!(
        "progress indicator starting against {} on channel {}",
        config.base_url,
        config.channel
    );

    let backend = JsonRpcBackend::new(config.rpc()).context("configuring backend rpc")?;
    let push = LongPollChannel::new(config.push()).context("configuring push channel")?;

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let engine = EngineHandle::new(
        Arc::new(backend),
        Some(Arc::new(push)),
        Arc::new(MsgSink::new(msg_tx.clone())),
        config.engine(),
    );

    // Handlers stay registered until the end of this function.
    let bus = EventBus::new();
    let cancel_engine = engine.clone();
    let _cancel_handler = bus.subscribe(Topic::CancelRequested, move |event| {
        if let BusEvent::CancelRequested { code } = event {
            cancel_engine.send(EngineCommand::CancelJob { code: code.clone() });
        }
    });
    let _progress_printer = bus.subscribe(Topic::JobProgress, print_job_progress);

    let runner = EffectRunner::new(engine.clone(), bus.clone());
    let mut state = IndicatorState::with_config(config.indicator());

    println!("{HELP}");
    spawn_input_reader(msg_tx.clone());
    msg_tx
        .send(Msg::Started)
        .context("message loop closed before start")?;
    drop(msg_tx);

    while let Ok(msg) = msg_rx.recv() {
        let teardown = matches!(msg, Msg::Teardown);
        let (next, effects) = update(state, msg);
        state = next;
        runner.run(effects);

        if state.consume_dirty() {
            for line in render::render(&state.view(), Utc::now()) {
                println!("{line}");
            }
        }
        if teardown {
            break;
        }
    }

    engine.shutdown();
    progress_info!("progress indicator stopped");
    Ok(())
}

fn spawn_input_reader(tx: mpsc::Sender<Msg>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Some(msg) => {
                    if tx.send(msg).is_err() {
                        return;
                    }
                }
                None => println!("{HELP}"),
            }
        }
        // End of input closes the indicator.
        let _ = tx.send(Msg::Teardown);
    });
}

fn print_job_progress(event: &BusEvent) {
    let BusEvent::JobProgress { payload } = event else {
        return;
    };
    let head = &payload[0];
    let code = head["code"].as_str().unwrap_or("?");
    let state = head["state"].as_str().unwrap_or("?");
    match head.get("progress").and_then(Value::as_f64) {
        Some(percent) => println!("    job {code}: {state} {percent:.0}%"),
        None => println!("    job {code}: {state}"),
    }
}
