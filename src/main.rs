//! Abbot headless runner
//!
//! Usage: `abbot [settings.json] [ticks]`
//!
//! Drives the simulation with a scripted input loop and logs the player's
//! state once per simulated second. Set `RUST_LOG=debug` for contact and
//! chunk registration detail.

use std::process::ExitCode;

use abbot::consts::SIM_DT;
use abbot::{Driver, Settings, TickInput};

const DEFAULT_TICKS: u64 = 600;
const TICKS_PER_SECOND: u64 = 60;

/// Walk right for two seconds, jump, walk left, attack, then rest
fn scripted_input(tick: u64) -> TickInput {
    let second = tick / TICKS_PER_SECOND;
    let frame = tick % TICKS_PER_SECOND;
    match second % 5 {
        0 | 1 => TickInput {
            moving_right: true,
            jump: second == 1 && frame == 0,
            ..Default::default()
        },
        2 => TickInput {
            moving_left: true,
            ..Default::default()
        },
        3 => TickInput {
            attack: frame == 0,
            ..Default::default()
        },
        _ => TickInput::default(),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);

    let settings = match args.next() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let ticks = match args.next() {
        Some(n) => n.parse::<u64>()?,
        None => DEFAULT_TICKS,
    };

    log::info!(
        "Abbot starting: {} ticks, jump policy {}",
        ticks,
        settings.jump_policy.as_str()
    );
    let mut driver = Driver::new(settings)?;

    for tick in 0..ticks {
        driver.tick(&scripted_input(tick), SIM_DT);

        if tick % TICKS_PER_SECOND == 0 {
            let view = driver.player_view();
            log::info!(
                "t={:.1}s pos=({:.1}, {:.1}) angle={:.3} hp={}/{} anim={}",
                tick as f32 * SIM_DT,
                view.position.x,
                view.position.y,
                view.angle,
                view.current_hp,
                view.hp,
                view.animation
            );
        }
    }

    let view = driver.player_view();
    println!("{}", serde_json::to_string_pretty(&view)?);
    log::info!(
        "Finished after {} ticks; {} chunks cached, {} evicted",
        driver.time_ticks(),
        driver.galaxy().cache().len(),
        driver.galaxy().cache().evictions()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("abbot: {}", e);
            ExitCode::FAILURE
        }
    }
}
