//! Grapple Motion headless demo
//!
//! Runs a scripted walk, jump, swing and grapple through a small test level,
//! then soaks the engine with seeded random input and checks that the actor
//! never ends a frame inside the level geometry.
//!
//! Usage: `grapple-motion [tuning.json] [seed]`

use std::collections::BTreeMap;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use grapple_motion::Tuning;
use grapple_motion::consts::SIM_DT;
use grapple_motion::sim::{Level, PlayerController, TickInput};

const DEFAULT_SEED: u64 = 0x5eed_6ab1;
const SOAK_TICKS: usize = 20_000;

const LEVEL: [&str; 14] = [
    "##############################",
    "#                            #",
    "#                            #",
    "#                            #",
    "#                            #",
    "#             ###            #",
    "#                            #",
    "#                            #",
    "#                       #    #",
    "#                       #    #",
    "#    ====               #    #",
    "#                       #    #",
    "# P                     #    #",
    "==============================",
];

/// Scripted input for one phase of the demo
struct Phase {
    name: &'static str,
    input: TickInput,
    ticks: usize,
}

fn press(aim: Vec2) -> TickInput {
    TickInput {
        aim,
        jump_pressed: true,
        ..Default::default()
    }
}

fn hold(aim: Vec2) -> TickInput {
    TickInput {
        aim,
        ..Default::default()
    }
}

fn phase(name: &'static str, input: TickInput, ticks: usize) -> Phase {
    Phase { name, input, ticks }
}

fn script() -> Vec<Phase> {
    let up_right = Vec2::new(1.0, 1.0);
    vec![
        phase("settle", TickInput::default(), 30),
        phase("walk right", hold(Vec2::X), 45),
        phase("jump", press(Vec2::X), 1),
        phase("air", hold(Vec2::X), 40),
        phase(
            "release jump",
            TickInput {
                jump_released: true,
                ..Default::default()
            },
            1,
        ),
        phase("land", TickInput::default(), 60),
        phase(
            "attach rope",
            TickInput {
                aim: Vec2::new(0.3, 1.0),
                anchor: true,
                ..Default::default()
            },
            1,
        ),
        phase("run out on the rope", hold(Vec2::NEG_X), 60),
        phase("jump off the ground", press(Vec2::NEG_X), 1),
        phase("pump swing", hold(Vec2::X), 120),
        phase(
            "let go",
            TickInput {
                anchor: true,
                ..Default::default()
            },
            1,
        ),
        phase("fall", TickInput::default(), 60),
        phase(
            "grapple",
            TickInput {
                aim: up_right,
                grapple: true,
                ..Default::default()
            },
            1,
        ),
        phase("reel in", hold(up_right), 90),
        phase("recover", TickInput::default(), 60),
    ]
}

fn run_script(level: &Level, tuning: &Tuning) {
    let mut controller = PlayerController::spawn(tuning, level);
    for phase in script() {
        for _ in 0..phase.ticks {
            controller.tick(level, &phase.input, SIM_DT);
        }
        log::info!(
            "{:<20} {:?} at ({:.2}, {:.2}) moving ({:.2}, {:.2})",
            phase.name,
            controller.kind(),
            controller.position().x,
            controller.position().y,
            controller.velocity().x,
            controller.velocity().y,
        );
    }

    match serde_json::to_string(controller.snapshot()) {
        Ok(json) => log::info!("Final snapshot: {json}"),
        Err(e) => log::warn!("Could not serialize snapshot: {e}"),
    }
}

fn random_input(rng: &mut Pcg32) -> TickInput {
    let aim = Vec2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0));
    TickInput {
        aim,
        jump_pressed: rng.random_bool(0.05),
        jump_released: rng.random_bool(0.05),
        anchor: rng.random_bool(0.01),
        grapple: rng.random_bool(0.01),
    }
}

/// Returns the number of frames that ended inside geometry
fn soak(level: &Level, tuning: &Tuning, seed: u64) -> usize {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut controller = PlayerController::spawn(tuning, level);
    let mut visits: BTreeMap<String, usize> = BTreeMap::new();
    let mut penetrating = 0;
    let mut input = TickInput::default();

    for frame in 0..SOAK_TICKS {
        // Hold each random input for a few frames so states get to play out
        if frame % 8 == 0 {
            input = random_input(&mut rng);
        } else {
            input.jump_pressed = false;
            input.jump_released = false;
            input.anchor = false;
            input.grapple = false;
        }
        controller.tick(level, &input, SIM_DT);

        let depth = level.max_penetration(controller.body());
        if depth > tuning.collision.skin {
            penetrating += 1;
            log::warn!("Frame {frame}: {:?} penetrating by {depth}", controller.kind());
        }
        *visits.entry(format!("{:?}", controller.kind())).or_default() += 1;
    }

    for (kind, frames) in &visits {
        log::info!("{kind:<20} {frames:>6} frames");
    }
    penetrating
}

fn main() {
    env_logger::init();
    log::info!("Grapple Motion (native) starting...");

    let mut args = std::env::args().skip(1);
    let tuning = Tuning::load(args.next().unwrap_or_else(|| "tuning.json".to_string()));
    let seed = match args.next().map(|s| s.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(e)) => {
            log::warn!("Ignoring bad seed: {e}");
            DEFAULT_SEED
        }
        None => DEFAULT_SEED,
    };

    let level = Level::from_ascii(&LEVEL, 1.0);
    run_script(&level, &tuning);

    log::info!("Soaking {SOAK_TICKS} ticks with seed {seed}");
    let penetrating = soak(&level, &tuning, seed);
    if penetrating == 0 {
        println!("✓ Soak finished with no penetration");
    } else {
        println!("✗ {penetrating} frames ended inside geometry");
        std::process::exit(1);
    }
}
