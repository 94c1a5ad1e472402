use racetrack::racetrack::{Position, path_length, rasterize};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn random_position(rng: &mut StdRng) -> Position {
    Position::new(rng.random_range(-12..=12), rng.random_range(-12..=12))
}

#[test]
fn test_walk_is_connected_and_spans_endpoints() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..2_000 {
        let from = random_position(&mut rng);
        let to = random_position(&mut rng);
        let path = rasterize(from, to);

        assert_eq!(path.first(), Some(&from));
        assert_eq!(path.last(), Some(&to));
        assert_eq!(path.len(), path_length(from, to));
        for pair in path.windows(2) {
            let dx = (pair[1].x - pair[0].x).abs();
            let dy = (pair[1].y - pair[0].y).abs();
            assert!(dx <= 1 && dy <= 1 && dx + dy > 0, "{from:?} -> {to:?}: {path:?}");
        }
    }
}

#[test]
fn test_walk_advances_along_major_axis_every_step() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let from = random_position(&mut rng);
        let to = random_position(&mut rng);
        let path = rasterize(from, to);
        let x_major = (to.x - from.x).abs() >= (to.y - from.y).abs();
        for pair in path.windows(2) {
            let step = if x_major {
                (pair[1].x - pair[0].x).abs()
            } else {
                (pair[1].y - pair[0].y).abs()
            };
            assert_eq!(step, 1);
        }
    }
}

#[test]
fn test_zero_length_move() {
    let here = Position::new(3, -2);
    assert_eq!(rasterize(here, here), vec![here]);
    assert_eq!(path_length(here, here), 1);
}

#[test]
fn test_known_diagonal_walk() {
    let path = rasterize(Position::new(0, 0), Position::new(4, 2));
    assert_eq!(path.len(), 5);
    assert_eq!(path[0], Position::new(0, 0));
    assert_eq!(path[4], Position::new(4, 2));
    assert!(path.iter().all(|p| (0..=2).contains(&p.y)));
}
