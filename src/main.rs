//! Color Chain demo
//!
//! Plays one level with seeded random swaps and prints the board and a
//! summary of the event stream.
//!
//! Usage: `color-chain [level.json] [demo-seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Color Chain (native) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match load_level(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => color_chain::LevelConfig::default(),
    };
    let demo_seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);

    if let Err(e) = demo::run(&config, demo_seed) {
        log::error!("Demo aborted: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library only on wasm
}

#[cfg(not(target_arch = "wasm32"))]
fn load_level(path: &str) -> Result<color_chain::LevelConfig, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    let config = color_chain::LevelConfig::from_json(&json)?;
    Ok(config.validated())
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use color_chain::sim::{EventLog, GridEvent, MoveOutcome, ResolutionEngine};
    use color_chain::{EngineError, LevelConfig, LevelSession, LevelState, grid_pos};

    /// Random swap attempts allowed per move before giving up
    const ATTEMPTS_PER_MOVE: u32 = 200;

    pub fn run(config: &LevelConfig, demo_seed: u64) -> Result<(), EngineError> {
        let mut engine = ResolutionEngine::new();
        let log = EventLog::shared();
        let session = LevelSession::shared();
        engine.subscribe(log.clone());
        engine.subscribe(session.clone());

        engine.initialize(config)?;
        session.borrow_mut().start(config);
        println!("{}", config);
        print_board(&engine);
        log.borrow_mut().take();

        let mut rng = Pcg32::seed_from_u64(demo_seed);
        let size = engine.board().size() as i32;
        let mut longest_chain = 0;

        while session.borrow().state() == LevelState::Playing {
            let mut found = false;
            for _ in 0..ATTEMPTS_PER_MOVE {
                let a = grid_pos(rng.random_range(0..size), rng.random_range(0..size));
                let b = if rng.random_bool(0.5) {
                    a + grid_pos(1, 0)
                } else {
                    a + grid_pos(0, 1)
                };
                if !engine.board().is_valid_position(b) {
                    continue;
                }
                match engine.process_swap(a, b)? {
                    MoveOutcome::Resolved(summary) => {
                        longest_chain = longest_chain.max(summary.chain_count);
                        println!(
                            "Swap ({}, {}) <-> ({}, {}): {} match(es), {} round(s), +{}",
                            a.x,
                            a.y,
                            b.x,
                            b.y,
                            summary.total_matches,
                            summary.chain_count,
                            summary.total_score
                        );
                        found = true;
                        break;
                    }
                    _ => continue,
                }
            }
            if !found {
                println!("No valid swap found, stopping");
                break;
            }
            session.borrow_mut().on_move_completed();
        }

        print_board(&engine);

        let log = log.borrow();
        let session = session.borrow();
        println!(
            "Events: {} matches, {} popped, {} moved, {} spawned, {} reverted",
            log.matches_found(),
            log.balls_popped(),
            log.balls_moved(),
            log.balls_spawned(),
            log.count(|e| matches!(e, GridEvent::SwapReverted { .. }))
        );
        println!(
            "Result: {:?} | Score: {}/{} | Stars: {} | Moves left: {} | Longest chain: {}",
            session.state(),
            session.score(),
            config.target_score,
            session.stars(),
            session.moves_remaining(),
            longest_chain
        );
        Ok(())
    }

    fn print_board(engine: &ResolutionEngine) {
        for row in engine.board().to_rows() {
            println!("  {}", row);
        }
    }
}
