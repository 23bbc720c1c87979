//! Bevy adapter tests: requests in, combinations and core signals out
#![cfg(feature = "bevy")]

use bevy::prelude::*;

use wordround_core::constants::QUICK_ROUND;
use wordround_core::engine::{
    CombinationReady, CoreSignalEvent, EngineConfig, EngineResource, RequestCombination,
    RoundEnginePlugin,
};
use wordround_core::generation::GenerationOptions;

fn app(seed: u64) -> App {
    let mut app = App::new();
    app.add_plugins(RoundEnginePlugin {
        config: EngineConfig {
            seed: Some(seed),
            ..Default::default()
        },
    });
    app
}

fn ready(app: &App) -> Vec<CombinationReady> {
    app.world()
        .resource::<Events<CombinationReady>>()
        .iter_current_update_events()
        .cloned()
        .collect()
}

#[test]
fn plugin_inserts_engine() {
    let app = app(1);
    let engine = app.world().resource::<EngineResource>();
    let engine = engine.0.read().unwrap();
    assert_eq!(engine.seed().seed, 1);
}

#[test]
fn request_produces_combination() {
    let mut app = app(2);
    app.world_mut().send_event(RequestCombination {
        round_type: Some(QUICK_ROUND.into()),
        options: GenerationOptions::default(),
    });
    app.update();

    let ready = ready(&app);
    assert_eq!(ready.len(), 1);
    let combination = &ready[0].0;
    assert_eq!(combination.round_config.name, QUICK_ROUND);
    assert!(combination.category.is_compatible(combination.letter));
}

#[test]
fn default_round_when_unspecified() {
    let mut app = app(3);
    app.world_mut().send_event(RequestCombination::default());
    app.update();

    let ready = ready(&app);
    assert_eq!(ready.len(), 1);
    assert_eq!(
        ready[0].0.round_config.name,
        EngineConfig::default().default_round
    );
}

#[test]
fn signals_are_relayed() {
    let mut app = app(4);
    app.world_mut().send_event(RequestCombination::default());
    app.update();

    let names: Vec<&'static str> = app
        .world()
        .resource::<Events<CoreSignalEvent>>()
        .iter_current_update_events()
        .map(|event| event.0.name())
        .collect();
    assert!(names.contains(&"combination:generated"));
    assert!(names.contains(&"letter:generated"));
}

#[test]
fn no_requests_no_output() {
    let mut app = app(5);
    app.update();
    assert!(ready(&app).is_empty());
}
