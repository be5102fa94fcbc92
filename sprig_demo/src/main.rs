//! Headless platformer demo
//!
//! Drops a player onto a floor, lets it hop around collecting coins, and
//! switches to a results scene once every coin is gone. Nothing is drawn;
//! progress is reported through the log.
//!
//! Usage: `sprig_demo [config.toml|config.ron]`

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, info};
use rand::Rng;
use sprig_engine::foundation::logging;
use sprig_engine::prelude::*;

const FRAME: f32 = 1.0 / 60.0;
const MAX_FRAMES: u32 = 60 * 30;
const COINS: usize = 8;

fn load_config() -> Result<EngineConfig, EngineError> {
    match std::env::args().nth(1) {
        Some(path) => Ok(EngineConfig::load_from_file(path)?),
        None => Ok(EngineConfig::default().with_gravity(1600.0)),
    }
}

fn game_scene(world: &mut World, score: &Rc<Cell<u32>>) -> EngineResult<()> {
    world.spawn(components![
        Pos::new(vec2(-400.0, 300.0)),
        RectShape::new(800.0, 20.0),
        Area::new(),
        Body::new_static(),
        "floor",
    ])?;

    let player = world.spawn(components![
        Pos::new(vec2(0.0, 0.0)),
        RectShape::new(24.0, 24.0),
        Area::new(),
        Body::new().with_jump_force(700.0),
        Move::new(vec2(1.0, 0.0), 120.0),
        Health::new(3.0),
        "player",
    ])?;

    let mut rng = rand::thread_rng();
    for _ in 0..COINS {
        let pos = vec2(rng.gen_range(-380.0..380.0), rng.gen_range(150.0..280.0));
        world.spawn(components![Pos::new(pos), CircleShape::new(8.0), Area::new(), "coin"])?;
    }

    // Hop shortly after every landing.
    world.on_entity(player, EventKind::Ground, |world, player, _| {
        world.wait(0.2, move |world| {
            if let Some(body) = world.component::<Body>(player) {
                body.jump_default();
            }
            Ok(())
        })?;
        Ok(())
    })?;

    // Turn around at the edges of the floor.
    world.on_update("player", |world, player| {
        let x = world.pos(player).x;
        let dir = world.vec2(player, "dir").unwrap_or_else(|| vec2(1.0, 0.0));
        if (x > 360.0 && dir.x > 0.0) || (x < -380.0 && dir.x < 0.0) {
            world.set_prop(player, "dir", vec2(-dir.x, 0.0))?;
        }
        Ok(())
    });

    let score = Rc::clone(score);
    world.on_collide("player", "coin", move |world, _, coin, _| {
        score.set(score.get() + 1);
        info!("Coin collected ({}/{COINS})", score.get());
        world.destroy(coin)?;
        let root = world.root();
        if world.get(root, "coin").is_empty() {
            world.go("results", vec![Value::Number(score.get() as f32)])?;
        }
        Ok(())
    });

    world.loop_every(5.0, |world| {
        let root = world.root();
        if let Some(player) = world.get(root, "player").first().copied() {
            debug!("Player at {:?}, hp {:?}", world.pos(player), world.number(player, "hp"));
        }
        Ok(())
    })?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);

    let mut engine = Engine::new(config)?;
    let score = Rc::new(Cell::new(0));
    let finished = Rc::new(Cell::new(false));

    let game_score = Rc::clone(&score);
    engine.scene("game", move |world, _| game_scene(world, &game_score));
    let done = Rc::clone(&finished);
    engine.scene("results", move |_, args| {
        let collected = args.first().and_then(Value::as_number).unwrap_or(0.0);
        info!("All coins collected: {collected}");
        done.set(true);
        Ok(())
    });
    engine.go("game", Vec::new())?;

    while !finished.get() && engine.frame_count() < u64::from(MAX_FRAMES) {
        engine.frame(FRAME)?;
    }

    info!(
        "Stopped after {} frames ({:.1}s), score {}",
        engine.frame_count(),
        engine.total_time(),
        score.get()
    );
    Ok(())
}
