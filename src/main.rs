use std::path::PathBuf;
use std::rc::Rc;
use tracing::{error, info, warn};

use dreamwake_encounters::{
    Autopilot, AutopilotStatus, Clock, EngineConfig, LevelData, ManualClock, Millis, Presenter,
    SystemClock, TracingPresenter, World,
};

fn data_dir() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DREAMWAKE_DATA").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dreamwake_encounters=info".parse().unwrap()),
        )
        .init();

    let data_dir = data_dir();
    let config = EngineConfig::load_or_default(&data_dir.join("engine.toml"));

    let level = match LevelData::load(&data_dir) {
        Ok(level) => level,
        Err(e) => {
            error!("Failed to load level from {:?}: {}", data_dir, e);
            std::process::exit(1);
        }
    };

    let presenter: Rc<dyn Presenter> = Rc::new(TracingPresenter);
    let mut world = World::from_level(level, config.clone(), presenter);
    let player = world.add_player(&config.player.name);
    let mut autopilot = Autopilot::new(player);

    let system_clock = SystemClock::new();
    let manual_clock = ManualClock::new(0);
    let step_ms = config.tick_interval().as_millis() as Millis;
    let mut interval = tokio::time::interval(config.tick_interval());

    info!(
        "Running at {} Hz ({}), up to {} ticks",
        config.tick_rate_hz,
        if config.realtime { "realtime" } else { "stepped" },
        config.max_ticks
    );

    let mut finished = false;
    let mut deaths = 0u32;
    for tick in 0..config.max_ticks {
        let now = if config.realtime {
            interval.tick().await;
            system_clock.now()
        } else {
            manual_clock.advance(step_ms)
        };

        let report = world.tick(now);

        for quest in &report.quests_completed {
            if let Some(q) = world.ledger().get(*quest) {
                info!("Quest '{}' completed at tick {}", q.title(), tick);
            }
        }

        if !report.players_killed.is_empty() {
            deaths += 1;
            warn!("Player died, restarting the session");
            world.reset_session();
            autopilot.on_session_reset();
            continue;
        }

        if autopilot.step(&mut world, now) == AutopilotStatus::Finished {
            info!(
                "Narrative finished after {} ticks ({} kills, {} deaths)",
                tick,
                autopilot.kills(),
                deaths
            );
            finished = true;
            break;
        }
    }

    if !finished {
        warn!("Tick budget exhausted before the narrative finished");
    }

    match serde_json::to_string_pretty(&world.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize snapshot: {}", e),
    }
}
