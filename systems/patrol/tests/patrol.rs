use std::time::Duration;

use neon_heist_core::{CellCoord, Command, Event, FailureReason, MissionPhase, MissionSetup};
use neon_heist_system_patrol::Patrol;
use neon_heist_world::{self as world, query, World};

fn guarded_setup(player: CellCoord) -> MissionSetup {
    MissionSetup {
        width: 5,
        height: 5,
        walls: Vec::new(),
        player,
        blueprint: CellCoord::new(4, 4),
        exit: CellCoord::new(4, 0),
        keys: Vec::new(),
        locks: Vec::new(),
        required_keys: 0,
        time_limit_secs: 60,
        guard_routes: vec![vec![
            CellCoord::new(2, 1),
            CellCoord::new(2, 2),
            CellCoord::new(2, 3),
            CellCoord::new(2, 2),
        ]],
    }
}

fn run(world: &mut World, patrol: &mut Patrol, command: Command, log: &mut Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, command, &mut events);

    while !events.is_empty() {
        log.extend(events.iter().cloned());
        let guards = query::guard_view(world);
        let mut commands = Vec::new();
        patrol.handle(&events, &guards, &mut commands);

        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
}

fn one_second() -> Command {
    Command::Tick {
        dt: Duration::from_secs(1),
    }
}

#[test]
fn guard_walks_route_once_per_second() {
    let mut world = World::new();
    let mut patrol = Patrol::default();
    let mut log = Vec::new();

    run(
        &mut world,
        &mut patrol,
        Command::ConfigureMission {
            setup: guarded_setup(CellCoord::new(0, 0)),
        },
        &mut log,
    );
    run(&mut world, &mut patrol, Command::StartMission, &mut log);
    for _ in 0..3 {
        run(&mut world, &mut patrol, one_second(), &mut log);
    }

    let cells: Vec<CellCoord> = log
        .iter()
        .filter_map(|event| match event {
            Event::GuardAdvanced { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        cells,
        vec![
            CellCoord::new(2, 2),
            CellCoord::new(2, 3),
            CellCoord::new(2, 2),
        ]
    );
}

#[test]
fn guard_entering_player_cell_detects_player() {
    let mut world = World::new();
    let mut patrol = Patrol::default();
    let mut log = Vec::new();

    run(
        &mut world,
        &mut patrol,
        Command::ConfigureMission {
            setup: guarded_setup(CellCoord::new(2, 3)),
        },
        &mut log,
    );
    run(&mut world, &mut patrol, Command::StartMission, &mut log);
    for _ in 0..5 {
        run(&mut world, &mut patrol, one_second(), &mut log);
    }

    assert_eq!(
        query::phase(&world),
        MissionPhase::Failed(FailureReason::Detected)
    );
    let advanced = log
        .iter()
        .filter(|event| matches!(event, Event::GuardAdvanced { .. }))
        .count();
    assert_eq!(advanced, 2, "patrol halts once the mission ends");
}
