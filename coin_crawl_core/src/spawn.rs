use rand::Rng;

use crate::Position;

/// Consecutive rejected samples tolerated per entity before giving up.
///
/// The sampler is plain rejection sampling, so success is only probable, not
/// guaranteed; on any arena where the interior comfortably exceeds the entity
/// count this bound is effectively never reached.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

/// Represents errors from the random placement algorithm.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpawnError {
    #[error("arena of size ({width}, {height}) has no interior cells to spawn into")]
    NoInterior { width: i32, height: i32 },
    #[error(
        "placed {placed} of {requested} entities, then rejected {attempts} \
         candidates in a row; arena interior is too crowded"
    )]
    Exhausted {
        requested: usize,
        placed: usize,
        attempts: usize,
    },
}

/// Samples one uniformly random interior position, excluding the outermost
/// ring: `x ∈ [1, width - 2]`, `y ∈ [1, height - 2]`.
fn sample_interior<R: Rng>(rng: &mut R, width: i32, height: i32) -> Position {
    Position {
        x: rng.random_range(1..width - 1),
        y: rng.random_range(1..height - 1),
    }
}

/// Places `count` entities at random non-overlapping interior positions.
///
/// A candidate is rejected when it collides with a member of the batch built
/// so far, or when `blocked` says the cell is unavailable (the caller supplies
/// hero position and structural walls through it). Sampling is bounded by
/// [`MAX_PLACEMENT_ATTEMPTS`] per entity; exceeding it fails fast with
/// [`SpawnError::Exhausted`] rather than looping forever on a configuration
/// the arena cannot satisfy.
pub fn place_batch<R, F>(
    rng: &mut R,
    width: i32,
    height: i32,
    count: usize,
    mut blocked: F,
) -> Result<Vec<Position>, SpawnError>
where
    R: Rng,
    F: FnMut(Position) -> bool,
{
    if width <= 2 || height <= 2 {
        return Err(SpawnError::NoInterior { width, height });
    }

    let mut placed: Vec<Position> = Vec::with_capacity(count);
    while placed.len() < count {
        let mut attempts = 0;
        let position = loop {
            if attempts >= MAX_PLACEMENT_ATTEMPTS {
                return Err(SpawnError::Exhausted {
                    requested: count,
                    placed: placed.len(),
                    attempts,
                });
            }
            attempts += 1;
            let candidate = sample_interior(rng, width, height);
            if !placed.contains(&candidate) && !blocked(candidate) {
                break candidate;
            }
        };
        placed.push(position);
    }
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn batch_stays_in_the_interior_and_never_overlaps() {
        let mut rng = StdRng::seed_from_u64(7);
        let batch = place_batch(&mut rng, 40, 20, 5, |_| false).unwrap();

        assert_eq!(batch.len(), 5);
        for position in &batch {
            assert!(position.x >= 1 && position.x <= 38, "{position:?}");
            assert!(position.y >= 1 && position.y <= 18, "{position:?}");
        }
        for (i, a) in batch.iter().enumerate() {
            for b in &batch[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn blocked_cells_are_never_chosen() {
        let mut rng = StdRng::seed_from_u64(11);
        let hero = Position::new(3, 3);
        let batch = place_batch(&mut rng, 8, 8, 10, |p| p == hero).unwrap();
        assert!(batch.iter().all(|p| *p != hero));
    }

    #[test]
    fn crowded_interior_fails_fast() {
        // A 3x3 arena has exactly one interior cell; two entities cannot fit.
        let mut rng = StdRng::seed_from_u64(1);
        let err = place_batch(&mut rng, 3, 3, 2, |_| false).unwrap_err();
        assert!(matches!(
            err,
            SpawnError::Exhausted {
                requested: 2,
                placed: 1,
                ..
            }
        ));
    }

    #[test]
    fn degenerate_dimensions_are_rejected_up_front() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = place_batch(&mut rng, 2, 10, 1, |_| false).unwrap_err();
        assert_eq!(
            err,
            SpawnError::NoInterior {
                width: 2,
                height: 10
            }
        );
    }
}
