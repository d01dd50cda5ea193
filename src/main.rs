use std::time::Duration;

use pascalian::{Cell, CycleDirection, PropagationEngine, TriangleLayout};

/// Terminal demo: builds the pattern board, activates one seed cell and
/// shows the cascade it causes. All presentation, no logic.
fn main() {
    env_logger::init();

    let size = env_usize("BOARD_SIZE").unwrap_or(10);
    let speed = env_f64("ANIMATION_SPEED").unwrap_or(0.0);

    let mut engine = PropagationEngine::new(size);
    engine.set_step_delay_fraction(speed);

    log::info!("board size: {}", engine.size());
    log::info!("size checkpoints: {:?}", PropagationEngine::size_checkpoints());

    engine.rebuild_pattern();
    println!("Pattern board ({} cells):", engine.cell_count());
    print_board(engine.layout(), &engine.snapshot());

    let changes = engine.subscribe();
    let target = engine.size() / 2;
    println!("Activating seed cell {target}...");
    engine
        .activate_cell(target, CycleDirection::Forward)
        .expect("activation target within board");
    if !engine.wait_until_idle(Duration::from_secs(120)) {
        log::warn!("pass still running after timeout");
    }

    println!("Cascade touched {} cells:", changes.try_iter().count());
    print_board(engine.layout(), &engine.snapshot());
}

fn print_board(layout: TriangleLayout, cells: &[Cell]) {
    for row in 0..layout.size() {
        let start = layout.offset(row);
        let labels: Vec<String> = cells[start..start + layout.row_len(row)]
            .iter()
            .map(|c| c.label_char().to_string())
            .collect();
        println!("{}{}", " ".repeat(row), labels.join(" "));
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok()?.parse().ok()
}

fn env_f64(name: &str) -> Option<f64> {
    std::env::var(name).ok()?.parse().ok()
}
