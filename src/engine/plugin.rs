use bevy::prelude::*;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, RwLock};

use crate::engine::config::EngineConfig;
use crate::engine::RoundEngine;
use crate::generation::{Combination, GenerationOptions};
use crate::signals::Signal;

/// Adds a [`RoundEngine`] built from built-in data. Requests come in as
/// [`RequestCombination`] events; results and core signals go out as events.
#[derive(Default)]
pub struct RoundEnginePlugin {
    pub config: EngineConfig,
}

impl Plugin for RoundEnginePlugin {
    fn build(&self, app: &mut App) {
        let engine = RoundEngine::with_defaults(self.config.clone());

        let (tx, rx) = mpsc::channel();
        engine.signals().subscribe(move |signal| {
            let _ = tx.send(signal.clone());
        });

        app.insert_resource(EngineResource(Arc::new(RwLock::new(engine))))
            .insert_resource(SignalRelay(Mutex::new(rx)))
            .add_event::<RequestCombination>()
            .add_event::<CombinationReady>()
            .add_event::<CoreSignalEvent>()
            .add_systems(
                Update,
                (
                    combination_request_system,
                    signal_relay_system,
                    cache_sweep_system,
                )
                    .chain(),
            );
    }
}

#[derive(Resource)]
pub struct EngineResource(pub Arc<RwLock<RoundEngine>>);

#[derive(Resource)]
struct SignalRelay(Mutex<Receiver<Signal>>);

/// Ask for a combination. `None` uses the configured default round.
#[derive(Event, Debug, Clone, Default)]
pub struct RequestCombination {
    pub round_type: Option<String>,
    pub options: GenerationOptions,
}

#[derive(Event, Debug, Clone)]
pub struct CombinationReady(pub Combination);

/// A core [`Signal`] forwarded into the app's event stream
#[derive(Event, Debug, Clone)]
pub struct CoreSignalEvent(pub Signal);

fn combination_request_system(
    mut requests: EventReader<RequestCombination>,
    mut ready: EventWriter<CombinationReady>,
    engine_res: Res<EngineResource>,
) {
    if requests.is_empty() {
        return;
    }
    if let Ok(mut engine) = engine_res.0.write() {
        for request in requests.read() {
            let round_type = request
                .round_type
                .clone()
                .unwrap_or_else(|| engine.config().default_round.clone());
            let combination = engine.generate_combination(&round_type, &request.options);
            ready.send(CombinationReady(combination));
        }
    }
}

fn signal_relay_system(relay: Res<SignalRelay>, mut signals: EventWriter<CoreSignalEvent>) {
    if let Ok(rx) = relay.0.lock() {
        for signal in rx.try_iter() {
            signals.send(CoreSignalEvent(signal));
        }
    }
}

fn cache_sweep_system(engine_res: Res<EngineResource>) {
    if let Ok(mut engine) = engine_res.0.write() {
        engine.tick();
    }
}
