//! Seeded placement routines used when an episode is reset
//!
//! Every routine takes the RNG explicitly so an episode is a pure
//! function of its seed. Row ranges are half-open `(start, end)`.

use crate::core::error::{GridError, Result};
use crate::core::types::Coord;
use ahash::AHashSet;
use rand::seq::index::sample;
use rand::seq::SliceRandom;
use rand::Rng;

/// `n` distinct columns drawn uniformly from `0..cols`
pub fn distinct_columns<R: Rng>(rng: &mut R, cols: i32, n: usize) -> Result<Vec<i32>> {
    let available = cols.max(0) as usize;
    if n > available {
        return Err(GridError::NotEnoughColumns {
            needed: n,
            available,
        });
    }
    Ok(sample(rng, available, n).into_iter().map(|c| c as i32).collect())
}

/// `n` distinct cells drawn uniformly from the rows, skipping `taken`
pub fn random_coords<R: Rng>(
    rng: &mut R,
    n: usize,
    rows: (i32, i32),
    cols: i32,
    taken: &AHashSet<Coord>,
) -> Result<Vec<Coord>> {
    let candidates: Vec<Coord> = (rows.0..rows.1)
        .flat_map(|row| (0..cols).map(move |col| Coord::new(row, col)))
        .filter(|c| !taken.contains(c))
        .collect();
    if n > candidates.len() {
        return Err(GridError::LayoutDoesNotFit {
            what: "random targets".to_string(),
            needed: n as i32,
            available: candidates.len() as i32,
        });
    }
    Ok(sample(rng, candidates.len(), n)
        .into_iter()
        .map(|i| candidates[i])
        .collect())
}

/// `n` cells on one random row with a constant random gap between them
pub fn even_row<R: Rng>(rng: &mut R, n: usize, rows: (i32, i32), cols: i32) -> Result<Vec<Coord>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    check_fits("even targets", n as i32, cols)?;
    let row = random_row(rng, rows)?;
    let (start, gap) = even_run(rng, n as i32, cols);
    Ok((0..n as i32).map(|i| Coord::new(row, start + i * (gap + 1))).collect())
}

/// `n` cells on one random row, each gap drawn independently from
/// `0..=max_spacing` while columns remain
pub fn uneven_row<R: Rng>(
    rng: &mut R,
    n: usize,
    rows: (i32, i32),
    cols: i32,
    max_spacing: i32,
) -> Result<Vec<Coord>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    check_fits("uneven targets", n as i32, cols)?;
    let row = random_row(rng, rows)?;

    let mut spare = cols - n as i32;
    let mut gaps = Vec::with_capacity(n - 1);
    for _ in 1..n {
        if spare == 0 {
            gaps.push(0);
        } else {
            let gap = rng.gen_range(0..=max_spacing.max(0).min(spare));
            spare -= gap;
            gaps.push(gap);
        }
    }
    // Early gaps would otherwise be systematically larger
    gaps.shuffle(rng);

    let mut col = rng.gen_range(0..=spare);
    let mut coords = Vec::with_capacity(n);
    coords.push(Coord::new(row, col));
    for gap in gaps {
        col += gap + 1;
        coords.push(Coord::new(row, col));
    }
    Ok(coords)
}

/// `n` cells down one random column with a constant random gap
pub fn vertical_column<R: Rng>(
    rng: &mut R,
    n: usize,
    rows: (i32, i32),
    cols: i32,
) -> Result<Vec<Coord>> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let height = rows.1 - rows.0;
    check_fits("vertical targets", n as i32, height)?;
    if cols <= 0 {
        return Err(GridError::LayoutDoesNotFit {
            what: "vertical targets".to_string(),
            needed: 1,
            available: cols,
        });
    }
    let col = rng.gen_range(0..cols);
    let (start, gap) = even_run(rng, n as i32, height);
    Ok((0..n as i32)
        .map(|i| Coord::new(rows.0 + start + i * (gap + 1), col))
        .collect())
}

/// Offset and gap of `n` evenly spaced units within `span`
fn even_run<R: Rng>(rng: &mut R, n: i32, span: i32) -> (i32, i32) {
    let spare = span - n;
    let max_gap = spare / (n - 1).max(1);
    let gap = if max_gap > 0 { rng.gen_range(0..max_gap) } else { 0 };
    let taken = n + gap * (n - 1);
    let start = rng.gen_range(0..=span - taken);
    (start, gap)
}

fn random_row<R: Rng>(rng: &mut R, rows: (i32, i32)) -> Result<i32> {
    if rows.1 <= rows.0 {
        return Err(GridError::LayoutDoesNotFit {
            what: "target row".to_string(),
            needed: 1,
            available: 0,
        });
    }
    Ok(rng.gen_range(rows.0..rows.1))
}

fn check_fits(what: &str, needed: i32, available: i32) -> Result<()> {
    if needed > available {
        return Err(GridError::LayoutDoesNotFit {
            what: what.to_string(),
            needed,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_distinct_columns() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let cols = distinct_columns(&mut rng, 10, 7).unwrap();
        let unique: AHashSet<i32> = cols.iter().copied().collect();
        assert_eq!(unique.len(), 7);
        assert!(cols.iter().all(|c| (0..10).contains(c)));
        assert!(matches!(
            distinct_columns(&mut rng, 3, 4),
            Err(GridError::NotEnoughColumns { needed: 4, available: 3 })
        ));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = even_row(&mut ChaCha8Rng::seed_from_u64(7), 5, (6, 11), 20).unwrap();
        let b = even_row(&mut ChaCha8Rng::seed_from_u64(7), 5, (6, 11), 20).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_even_row_spacing() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for n in 1..=10 {
            let coords = even_row(&mut rng, n, (6, 11), 20).unwrap();
            assert_eq!(coords.len(), n);
            assert!(coords.iter().all(|c| c.row == coords[0].row && (6..11).contains(&c.row)));
            assert!(coords.iter().all(|c| (0..20).contains(&c.col)));
            let gaps: AHashSet<i32> = coords.windows(2).map(|w| w[1].col - w[0].col).collect();
            assert!(gaps.len() <= 1);
        }
    }

    #[test]
    fn test_uneven_row_stays_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let coords = uneven_row(&mut rng, 6, (6, 11), 15, 5).unwrap();
            assert_eq!(coords.len(), 6);
            for w in coords.windows(2) {
                let step = w[1].col - w[0].col;
                assert!((1..=6).contains(&step));
            }
            assert!(coords.last().unwrap().col < 15);
        }
    }

    #[test]
    fn test_vertical_column() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let coords = vertical_column(&mut rng, 4, (6, 11), 8).unwrap();
        assert!(coords.iter().all(|c| c.col == coords[0].col));
        assert!(coords.iter().all(|c| (6..11).contains(&c.row)));
        assert!(vertical_column(&mut rng, 6, (6, 11), 8).is_err());
    }

    #[test]
    fn test_random_coords_skips_taken() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let taken: AHashSet<Coord> = [Coord::new(0, 0), Coord::new(0, 1)].into_iter().collect();
        let coords = random_coords(&mut rng, 2, (0, 1), 4, &taken).unwrap();
        let unique: AHashSet<Coord> = coords.iter().copied().collect();
        assert_eq!(unique.len(), 2);
        assert!(coords.iter().all(|c| c.col >= 2));
        assert!(random_coords(&mut rng, 3, (0, 1), 4, &taken).is_err());
    }

    #[test]
    fn test_row_too_narrow() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            even_row(&mut rng, 6, (6, 11), 5),
            Err(GridError::LayoutDoesNotFit { needed: 6, available: 5, .. })
        ));
    }
}
