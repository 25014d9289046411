//! Headless demo: a few agents moving around a walled level

use navlab::ai::{FleeState, PursueState, TravelState, WanderState};
use navlab::prelude::*;

const LEVEL: &str = "demo";
const TICK: f32 = 1.0 / 60.0;
const TICKS: usize = 600;

/// Level layout, `#` = wall
const MAP: &[&str] = &[
    "................",
    "................",
    "..####....####..",
    "..#..........#..",
    "..#..######..#..",
    "........#.......",
    "........#.......",
    "..#..######..#..",
    "..#..........#..",
    "..####....####..",
    "................",
    "................",
];

fn build_navigation(grid: &OccupancyGrid) -> NavigationService<OccupancyGrid> {
    let config = NavigationConfig::default();
    let store = NavigationStore::new(&config.data_directory);
    let mut service = NavigationService::new(grid.clone(), config);

    let footprint = Footprint::new(grid.width as i32, grid.depth as i32, grid.cell_size);
    let mut generators: Vec<Box<dyn NodeGenerator>> =
        vec![Box::new(CornerGraphGenerator::new(footprint))];

    let source = service.load_or_generate(
        &store,
        LEVEL,
        Some(grid.fingerprint()),
        &mut generators,
        grid,
    );
    log::info!(
        "Navigation ready ({:?}): {} nodes, {} connections, {} table entries",
        source,
        service.graph().node_count(),
        service.graph().connection_count(),
        service.table().len()
    );
    service
}

fn main() {
    env_logger::init();

    let grid = OccupancyGrid::from_rows(MAP, 1.0);
    let mut sim = Simulation::new(build_navigation(&grid));

    let patrol = vec![
        grid.grid_to_world(1, 1),
        grid.grid_to_world(14, 1),
        grid.grid_to_world(14, 10),
        grid.grid_to_world(1, 10),
    ];
    let walker = AgentConfig::default().with_seed(1);
    let runner = AgentConfig::default().with_max_speed(2.5).with_seed(2);

    let guard = sim.spawn_agent(
        "guard",
        patrol[0],
        &walker,
        Some(Brain::new(TravelState::new(patrol.clone(), true))),
    );
    let rabbit = sim.spawn_agent(
        "rabbit",
        grid.grid_to_world(7, 3),
        &runner,
        Some(Brain::new(WanderState::new(4.0))),
    );
    let fox = sim.spawn_agent(
        "fox",
        grid.grid_to_world(12, 6),
        &walker.clone().with_seed(3),
        Some(Brain::new(PursueState::new(rabbit))),
    );
    let _scared = sim.spawn_agent(
        "scared",
        grid.grid_to_world(4, 6),
        &runner.clone().with_seed(4),
        Some(Brain::new(FleeState::new(fox))),
    );

    for tick in 0..TICKS {
        sim.step(TICK);

        for event in sim.events().iter() {
            let name = sim
                .world()
                .get::<Name>(event.agent())
                .map(|name| name.to_string())
                .unwrap_or_default();
            log::debug!("[tick {}] {}: {:?}", tick, name, event);
        }

        if tick % 120 == 0 {
            for (_, (name, transform)) in sim.world().query::<(&Name, &Transform)>().iter() {
                log::info!("[{:>5.2}s] {:<7} at {:.2}", sim.elapsed(), name.0, transform.position);
            }
        }
    }

    if let Some(position) = sim.position(guard) {
        log::info!("Guard finished at {:.2} after {} ticks", position, sim.ticks());
    }
}
