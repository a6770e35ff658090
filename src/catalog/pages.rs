/// Pure filter -> order -> window pipeline for listing galleries.
// region:    --- Imports
use crate::catalog::model::ListingRow;
use crate::paging::{self, PageError, PageRequest, SortType};
use std::cmp::Ordering;

// endregion: --- Imports

// region:    --- Filter & Order

/// Multi-criteria listing filter. Empty sets mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub conditions: Vec<i64>,
    pub categories: Vec<i64>,
}

impl ListingFilter {
    /// A row matches when each non-empty criterion is satisfied; the category
    /// criterion needs at least one tag in common.
    pub fn matches(&self, row: &ListingRow) -> bool {
        (self.conditions.is_empty() || self.conditions.contains(&(row.condition as i64)))
            && (self.categories.is_empty()
                || row.categories.iter().any(|c| self.categories.contains(c)))
    }
}

/// Requested ordering; no explicit sort means relevance-rank descending.
#[derive(Debug, Clone, Copy)]
pub enum ListingOrder {
    Relevance,
    Explicit(SortType),
}

fn compare(order: ListingOrder, a: &ListingRow, b: &ListingRow) -> Ordering {
    match order {
        ListingOrder::Relevance => b.rank.total_cmp(&a.rank),
        ListingOrder::Explicit(SortType::PriceLowToHigh) => a.price.cmp(&b.price),
        ListingOrder::Explicit(SortType::PriceHighToLow) => b.price.cmp(&a.price),
        ListingOrder::Explicit(SortType::DateOldToRecent) => a.posted_date.cmp(&b.posted_date),
        ListingOrder::Explicit(SortType::DateRecentToOld) => b.posted_date.cmp(&a.posted_date),
    }
}

// endregion: --- Filter & Order

// region:    --- Page Selection

/// Filter the candidate rows, place them in total order (sort key then pk
/// ascending) and cut the requested window.
pub fn select_page(
    mut rows: Vec<ListingRow>,
    filter: &ListingFilter,
    order: ListingOrder,
    req: &PageRequest,
) -> Result<Vec<ListingRow>, PageError> {
    rows.retain(|r| filter.matches(r));
    paging::order_rows(&mut rows, |a, b| compare(order, a, b), |r| r.id);
    paging::window(rows, |r| r.id, req)
}

// endregion: --- Page Selection

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paging::Direction;
    use chrono::{TimeZone, Utc};

    fn row(pk: i64, condition: i16, price: i64, day: u32, rank: f32, cats: &[i64]) -> ListingRow {
        ListingRow {
            id: pk,
            name: format!("listing {pk}"),
            posted_date: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            deadline: Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap().date_naive(),
            price,
            negotiable: false,
            condition,
            description: String::new(),
            image: String::new(),
            rank,
            categories: cats.to_vec(),
            album: Vec::new(),
            contact: String::new(),
            email: String::new(),
        }
    }

    fn req(count: i64, direction: Direction, base_pk: i64) -> PageRequest {
        PageRequest::new(count, direction, base_pk).unwrap()
    }

    fn pks(rows: &[ListingRow]) -> Vec<i64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn condition_filter_worked_example() {
        // conditions {0,1} over {A(0,5), B(2,6), C(1,7)}, pk order, forward 2
        // from -1 must return [A, C] with B excluded
        let rows = vec![
            row(5, 0, 100, 1, 0.0, &[]),
            row(6, 2, 100, 1, 0.0, &[]),
            row(7, 1, 100, 1, 0.0, &[]),
        ];
        let filter = ListingFilter {
            conditions: vec![0, 1],
            categories: vec![],
        };
        let page = select_page(
            rows,
            &filter,
            ListingOrder::Relevance,
            &req(2, Direction::Forward, -1),
        )
        .unwrap();
        assert_eq!(pks(&page), vec![5, 7]);
    }

    #[test]
    fn category_filter_needs_one_shared_tag() {
        let rows = vec![
            row(1, 0, 100, 1, 0.0, &[10, 11]),
            row(2, 0, 100, 1, 0.0, &[12]),
            row(3, 0, 100, 1, 0.0, &[]),
        ];
        let filter = ListingFilter {
            conditions: vec![],
            categories: vec![11, 12],
        };
        let page = select_page(
            rows,
            &filter,
            ListingOrder::Relevance,
            &req(10, Direction::Forward, -1),
        )
        .unwrap();
        assert_eq!(pks(&page), vec![1, 2]);
    }

    #[test]
    fn relevance_orders_best_match_first_with_pk_tie_break() {
        let rows = vec![
            row(4, 0, 100, 1, 0.2, &[]),
            row(2, 0, 100, 1, 0.9, &[]),
            row(3, 0, 100, 1, 0.2, &[]),
        ];
        let page = select_page(
            rows,
            &ListingFilter::default(),
            ListingOrder::Relevance,
            &req(10, Direction::Forward, -1),
        )
        .unwrap();
        assert_eq!(pks(&page), vec![2, 3, 4]);
    }

    #[test]
    fn explicit_price_sorts() {
        let rows = vec![
            row(1, 0, 300, 1, 0.0, &[]),
            row(2, 0, 100, 1, 0.0, &[]),
            row(3, 0, 200, 1, 0.0, &[]),
        ];
        let asc = select_page(
            rows.clone(),
            &ListingFilter::default(),
            ListingOrder::Explicit(SortType::PriceLowToHigh),
            &req(10, Direction::Forward, -1),
        )
        .unwrap();
        assert_eq!(pks(&asc), vec![2, 3, 1]);

        let desc = select_page(
            rows,
            &ListingFilter::default(),
            ListingOrder::Explicit(SortType::PriceHighToLow),
            &req(10, Direction::Forward, -1),
        )
        .unwrap();
        assert_eq!(pks(&desc), vec![1, 3, 2]);
    }

    #[test]
    fn date_sorts_follow_posted_date() {
        let rows = vec![
            row(1, 0, 100, 20, 0.0, &[]),
            row(2, 0, 100, 5, 0.0, &[]),
            row(3, 0, 100, 12, 0.0, &[]),
        ];
        let old_first = select_page(
            rows.clone(),
            &ListingFilter::default(),
            ListingOrder::Explicit(SortType::DateOldToRecent),
            &req(10, Direction::Forward, -1),
        )
        .unwrap();
        assert_eq!(pks(&old_first), vec![2, 3, 1]);

        let recent_first = select_page(
            rows,
            &ListingFilter::default(),
            ListingOrder::Explicit(SortType::DateRecentToOld),
            &req(10, Direction::Forward, -1),
        )
        .unwrap();
        assert_eq!(pks(&recent_first), vec![1, 3, 2]);
    }

    #[test]
    fn cursor_excluded_by_filter_is_rejected() {
        let rows = vec![row(1, 0, 100, 1, 0.0, &[]), row(2, 3, 100, 1, 0.0, &[])];
        let filter = ListingFilter {
            conditions: vec![0],
            categories: vec![],
        };
        // pk 2 exists, but the condition filter removes it
        let err = select_page(
            rows,
            &filter,
            ListingOrder::Relevance,
            &req(1, Direction::Forward, 2),
        )
        .unwrap_err();
        assert_eq!(err, PageError::CursorNotFound);
    }
}

// endregion: --- Tests
