// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Proportional distribution of pre-reserved seats across categories.
//!
//! Seats are split in proportion to each category's availability using the
//! largest-remainder method. When there are at least as many seats as
//! categories with availability, every such category receives one seat.

use serde::{Deserialize, Serialize};

/// Free seats of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAvailability {
    pub category_id: i64,
    pub available: u32,
}

/// Seats assigned to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAllocation {
    pub category_id: i64,
    pub seats: u32,
}

/// Distributes `seats` across `categories`.
///
/// The result keeps the input order, omits categories receiving nothing and
/// never assigns more than a category has available. The sum of the result
/// is `min(seats, total availability)`.
#[must_use]
pub fn distribute_seats(seats: u32, categories: &[CategoryAvailability]) -> Vec<SeatAllocation> {
    let total: u64 = categories.iter().map(|c| u64::from(c.available)).sum();
    if total == 0 || seats == 0 {
        return Vec::new();
    }
    let to_assign = u64::from(seats).min(total);

    let mut assigned: Vec<u64> = Vec::with_capacity(categories.len());
    let mut remainders: Vec<(usize, u64)> = Vec::with_capacity(categories.len());
    for (index, category) in categories.iter().enumerate() {
        let weighted = to_assign * u64::from(category.available);
        assigned.push(weighted / total);
        remainders.push((index, weighted % total));
    }

    let mut left = to_assign - assigned.iter().sum::<u64>();
    // largest remainder first, earlier categories win ties
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (index, _) in &remainders {
        if left == 0 {
            break;
        }
        if assigned[*index] < u64::from(categories[*index].available) {
            assigned[*index] += 1;
            left -= 1;
        }
    }

    let eligible = u64::try_from(categories.iter().filter(|c| c.available > 0).count())
        .unwrap_or(u64::MAX);
    if to_assign >= eligible {
        for (index, category) in categories.iter().enumerate() {
            if category.available == 0 || assigned[index] > 0 {
                continue;
            }
            let donor = (0..categories.len())
                .filter(|i| assigned[*i] > 1)
                .max_by_key(|i| (assigned[*i], std::cmp::Reverse(*i)));
            if let Some(donor) = donor {
                assigned[donor] -= 1;
                assigned[index] = 1;
            }
        }
    }

    categories
        .iter()
        .zip(assigned)
        .filter(|(_, seats)| *seats > 0)
        .map(|(category, seats)| SeatAllocation {
            category_id: category.category_id,
            seats: u32::try_from(seats).unwrap_or(u32::MAX),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avail(category_id: i64, available: u32) -> CategoryAvailability {
        CategoryAvailability {
            category_id,
            available,
        }
    }

    fn total(allocations: &[SeatAllocation]) -> u32 {
        allocations.iter().map(|a| a.seats).sum()
    }

    #[test]
    fn test_proportional_split() {
        let result = distribute_seats(10, &[avail(1, 30), avail(2, 10), avail(3, 10)]);
        assert_eq!(
            result,
            vec![
                SeatAllocation {
                    category_id: 1,
                    seats: 6
                },
                SeatAllocation {
                    category_id: 2,
                    seats: 2
                },
                SeatAllocation {
                    category_id: 3,
                    seats: 2
                },
            ]
        );
    }

    #[test]
    fn test_never_exceeds_availability() {
        let result = distribute_seats(100, &[avail(1, 3), avail(2, 4)]);
        assert_eq!(total(&result), 7);
        assert!(result.iter().all(|a| a.seats <= 4));
    }

    #[test]
    fn test_small_category_is_not_starved() {
        let result = distribute_seats(3, &[avail(1, 1000), avail(2, 1), avail(3, 1)]);
        assert_eq!(total(&result), 3);
        assert!(result.iter().any(|a| a.category_id == 2 && a.seats == 1));
        assert!(result.iter().any(|a| a.category_id == 3 && a.seats == 1));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(distribute_seats(0, &[avail(1, 10)]).is_empty());
        assert!(distribute_seats(5, &[avail(1, 0)]).is_empty());
        assert!(distribute_seats(5, &[]).is_empty());
    }

    #[test]
    fn test_remainders_fill_up_to_requested() {
        let result = distribute_seats(5, &[avail(1, 3), avail(2, 3), avail(3, 3)]);
        assert_eq!(total(&result), 5);
    }
}
