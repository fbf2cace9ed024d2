use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cardfall::core::{Board, GameSnapshot, PieceGenerator, Session};
use cardfall::term::{GameView, Viewport};
use cardfall::types::{Cell, Character, Color, GameAction, ShapeKind};

fn playing_session(seed: u32) -> Session {
    let mut session = Session::new(seed, Character::Cowboy);
    session.start();
    session.apply_action(GameAction::PickCard(0));
    session.apply_action(GameAction::PickTask(0));
    session
}

fn bench_tick(c: &mut Criterion) {
    let mut session = playing_session(12345);
    c.bench_function("session_tick_16ms", |b| {
        b.iter(|| {
            session.tick(black_box(16));
        })
    });
}

fn bench_line_clear(c: &mut Criterion) {
    c.bench_function("sweep_4_rows", |b| {
        b.iter(|| {
            let mut board = Board::new();
            for y in 16..20 {
                for x in 0..10 {
                    board.set(
                        x,
                        y,
                        Cell::Occupied {
                            color: Color::Blue,
                            shape: ShapeKind::I,
                            marked: false,
                        },
                    );
                }
            }
            board.remove_full_rows()
        })
    });
}

fn bench_piece_generation(c: &mut Criterion) {
    let mut generator = PieceGenerator::new(12345);
    c.bench_function("gen_shape_and_color", |b| {
        b.iter(|| {
            let shape = generator.gen_shape();
            let color = generator.sample_color();
            black_box((shape, color))
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let session = playing_session(777);
    c.bench_function("snapshot_capture", |b| {
        b.iter(|| GameSnapshot::capture(black_box(&session)))
    });
}

fn bench_render(c: &mut Criterion) {
    let session = playing_session(42);
    let snap = GameSnapshot::capture(&session);
    let view = GameView::default();
    c.bench_function("render_80x24", |b| {
        b.iter(|| view.render(black_box(&snap), Viewport::new(80, 24)))
    });
}

criterion_group!(
    benches,
    bench_tick,
    bench_line_clear,
    bench_piece_generation,
    bench_snapshot,
    bench_render
);
criterion_main!(benches);
