//! Shared fixtures for the integration tests

#![allow(dead_code)]

use ringside::application::{CallCoordinator, CoordinatorBuilder};
use ringside::config::Config;
use ringside::infrastructure::telephony::LoopbackTelephony;
use ringside::{Call, CallObserver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Observer that records every callback as `"<event>:<call id>"`
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl CallObserver for Recorder {
    fn on_call_received(&self, call: &Call) {
        self.record(format!("received:{}", call.id()));
    }

    fn on_call_initiated(&self, call: &Call) {
        self.record(format!("initiated:{}", call.id()));
    }

    fn on_call_ended(&self, call: &Call) {
        self.record(format!("ended:{}", call.id()));
    }

    fn on_mute_state_changed(&self, call: &Call) {
        self.record(format!("muted:{}", call.id()));
    }

    fn on_audio_session_changed(&self, active: bool) {
        self.record(format!("audio:{}", active));
    }
}

pub fn setup(config: Config) -> (CallCoordinator, Arc<LoopbackTelephony>) {
    setup_with(CoordinatorBuilder::new(config.clone()), &config)
}

pub fn setup_with(
    builder: CoordinatorBuilder,
    config: &Config,
) -> (CallCoordinator, Arc<LoopbackTelephony>) {
    let provider = Arc::new(LoopbackTelephony::new(
        config.provider.clone(),
        builder.provider_sink(),
    ));
    let coordinator = builder.spawn(provider.clone());
    (coordinator, provider)
}

/// Poll `condition` until it holds, failing the test after one second
pub async fn eventually<F: Fn() -> bool>(condition: F) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Poll the active-call table until it has `count` calls
pub async fn wait_for_calls(coordinator: &CallCoordinator, count: usize) -> Vec<Call> {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let calls = coordinator.active_calls().await;
            if calls.len() == count {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("active-call table never reached the expected size")
}
