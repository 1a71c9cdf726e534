// src/main.rs

use std::path::PathBuf;

use log::{info, warn};

use tilesynth::{Engine, EngineConfig, MixMode, Waveform};

/// ===============================
/// Main
/// ===============================

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .ok();

    let config = EngineConfig::default();
    let frame_size = config.frame_size;
    let mut engine = Engine::new(config);

    // --------------------------------
    // Graph
    // --------------------------------

    let output = engine.output_node();
    let nodes = engine
        .add_oscillator(Waveform::Sine, 220.0, 0.4, -0.3)
        .and_then(|low| {
            let high = engine.add_oscillator(Waveform::Square, 330.0, 0.1, 0.3)?;
            let mixer = engine.add_mixer(MixMode::Tile)?;
            engine.connect(low, mixer)?;
            engine.connect(high, mixer)?;
            engine.connect(mixer, output)?;
            Ok(mixer)
        });

    if let Err(e) = nodes {
        warn!("graph setup failed: {}", e);
        return;
    }

    if let Err(e) = engine.recalculate() {
        warn!("{}", e);
    }

    // --------------------------------
    // Run a few callbacks
    // --------------------------------

    println!("Starting engine sanity test...");

    let mut playback = engine.playback();
    let mut block = vec![0.0_f32; frame_size * 2];
    for n in 0..4 {
        playback.render(&mut block);
        let peak = block.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        println!(
            "--- Callback {} --- cursor {} peak {:.3}",
            n,
            playback.position().left(),
            peak
        );
    }

    // --------------------------------
    // Export
    // --------------------------------

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    match engine.save_wav(path.as_deref()) {
        Ok(()) => info!("exported loop to {}", path.unwrap_or_default().display()),
        Err(e) => println!("No export: {}", e),
    }

    println!("Sanity test completed.");
}
