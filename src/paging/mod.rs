/// Relative (keyset) pagination engine.
///
/// One windowing algorithm shared by items, item requests, notifications and
/// message threads: rows are placed in a strict total order (caller-chosen
/// sort key, then pk ascending as tie-break), and a page of `count` rows is
/// cut strictly beyond the base row's rank in the requested direction.
// region:    --- Imports
use std::cmp::Ordering;

// endregion: --- Imports

// region:    --- Page Request

/// Sentinel base pk meaning "start from the appropriate end".
pub const FIRST_PAGE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn parse(s: &str) -> Result<Self, PageError> {
        match s {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            _ => Err(PageError::BadDirection),
        }
    }
}

/// Explicit listing sort; absent means relevance-rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortType {
    PriceLowToHigh,
    PriceHighToLow,
    DateOldToRecent,
    DateRecentToOld,
}

impl SortType {
    pub fn parse(s: &str) -> Result<Self, PageError> {
        match s {
            "price_lowtohigh" => Ok(SortType::PriceLowToHigh),
            "price_hightolow" => Ok(SortType::PriceHighToLow),
            "date_oldtorec" => Ok(SortType::DateOldToRecent),
            "date_rectoold" => Ok(SortType::DateRecentToOld),
            _ => Err(PageError::BadSortType),
        }
    }
}

/// A validated relative page request.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    count: usize,
    direction: Direction,
    base_pk: i64,
}

impl PageRequest {
    pub fn new(count: i64, direction: Direction, base_pk: i64) -> Result<Self, PageError> {
        if count < 1 {
            return Err(PageError::BadCount);
        }
        if base_pk < FIRST_PAGE {
            return Err(PageError::BadBasePk);
        }
        Ok(Self {
            count: count as usize,
            direction,
            base_pk,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn base_pk(&self) -> i64 {
        self.base_pk
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    #[error("count must be an integer >= 1")]
    BadCount,
    #[error("base pk must be -1 or an existing pk")]
    BadBasePk,
    #[error("direction must be 'forward' or 'backward'")]
    BadDirection,
    #[error("unknown sort_type")]
    BadSortType,
    #[error("filter lists must be comma-separated integers")]
    BadFilterList,
    #[error("base pk not found under the current filter")]
    CursorNotFound,
}

// endregion: --- Page Request

// region:    --- Windowing

/// Sort rows into the engine's total order: `cmp`, then pk ascending.
///
/// The pk tie-break is mandatory; sort keys (price, datetime, rank) can
/// repeat, and the order must be strict for cursors to be meaningful.
pub fn order_rows<T>(
    rows: &mut [T],
    cmp: impl Fn(&T, &T) -> Ordering,
    pk: impl Fn(&T) -> i64,
) {
    rows.sort_by(|a, b| cmp(a, b).then_with(|| pk(a).cmp(&pk(b))));
}

/// Cut the requested page out of `rows`, which must already be in total order.
///
/// `base_pk == -1` starts from the first (forward) or last (backward) rank.
/// Otherwise the base row must be present in `rows`; a cursor excluded by the
/// active filter is an error, never a partial page. Backward pages come back
/// in backward reading order (descending rank).
pub fn window<T>(
    mut rows: Vec<T>,
    pk: impl Fn(&T) -> i64,
    req: &PageRequest,
) -> Result<Vec<T>, PageError> {
    let base = if req.base_pk == FIRST_PAGE {
        None
    } else {
        Some(
            rows.iter()
                .position(|r| pk(r) == req.base_pk)
                .ok_or(PageError::CursorNotFound)?,
        )
    };

    let n = rows.len();
    let range = match (req.direction, base) {
        (Direction::Forward, None) => 0..req.count.min(n),
        (Direction::Forward, Some(i)) => (i + 1).min(n)..(i + 1 + req.count).min(n),
        (Direction::Backward, None) => n.saturating_sub(req.count)..n,
        (Direction::Backward, Some(i)) => i.saturating_sub(req.count)..i,
    };

    let mut page: Vec<T> = rows.drain(range).collect();
    if req.direction == Direction::Backward {
        page.reverse();
    }
    Ok(page)
}

/// Parse a comma-separated pk/index list ("3,7,12"); empty segments ignored.
pub fn parse_csv_ints(raw: &str) -> Result<Vec<i64>, PageError> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| PageError::BadFilterList))
        .collect()
}

// endregion: --- Windowing

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        pk: i64,
        key: i64,
    }

    fn rows(pairs: &[(i64, i64)]) -> Vec<Row> {
        pairs.iter().map(|&(pk, key)| Row { pk, key }).collect()
    }

    fn ordered(pairs: &[(i64, i64)]) -> Vec<Row> {
        let mut r = rows(pairs);
        order_rows(&mut r, |a, b| a.key.cmp(&b.key), |r| r.pk);
        r
    }

    fn req(count: i64, direction: Direction, base_pk: i64) -> PageRequest {
        PageRequest::new(count, direction, base_pk).unwrap()
    }

    #[test]
    fn request_validation() {
        assert_eq!(
            PageRequest::new(0, Direction::Forward, -1).unwrap_err(),
            PageError::BadCount
        );
        assert_eq!(
            PageRequest::new(3, Direction::Forward, -2).unwrap_err(),
            PageError::BadBasePk
        );
        assert!(PageRequest::new(1, Direction::Backward, -1).is_ok());
        assert_eq!(Direction::parse("sideways").unwrap_err(), PageError::BadDirection);
        assert_eq!(SortType::parse("by_vibes").unwrap_err(), PageError::BadSortType);
    }

    #[test]
    fn pk_tie_break_is_deterministic() {
        // all keys equal: order must be pk ascending, every time
        let sorted = ordered(&[(9, 5), (2, 5), (7, 5), (4, 5)]);
        let pks: Vec<i64> = sorted.iter().map(|r| r.pk).collect();
        assert_eq!(pks, vec![2, 4, 7, 9]);

        let again = ordered(&[(4, 5), (7, 5), (2, 5), (9, 5)]);
        assert_eq!(sorted, again);
    }

    #[test]
    fn first_page_forward_and_backward() {
        let sorted = ordered(&[(1, 10), (2, 20), (3, 30), (4, 40)]);

        let fwd = window(sorted.clone(), |r| r.pk, &req(2, Direction::Forward, -1)).unwrap();
        assert_eq!(fwd.iter().map(|r| r.pk).collect::<Vec<_>>(), vec![1, 2]);

        // backward from the end reads back-to-front
        let bwd = window(sorted, |r| r.pk, &req(2, Direction::Backward, -1)).unwrap();
        assert_eq!(bwd.iter().map(|r| r.pk).collect::<Vec<_>>(), vec![4, 3]);
    }

    #[test]
    fn empty_set_first_page_is_empty_not_error() {
        let page = window(Vec::<Row>::new(), |r| r.pk, &req(5, Direction::Forward, -1)).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn cursor_not_in_rows_is_rejected() {
        let sorted = ordered(&[(1, 10), (2, 20)]);
        let err = window(sorted, |r| r.pk, &req(2, Direction::Forward, 99)).unwrap_err();
        assert_eq!(err, PageError::CursorNotFound);
    }

    #[test]
    fn forward_pages_concatenate_without_gaps_or_duplicates() {
        let sorted = ordered(&[(5, 2), (1, 9), (8, 2), (3, 7), (6, 1), (2, 9), (9, 4)]);
        let expected: Vec<i64> = sorted.iter().map(|r| r.pk).collect();

        let mut walked = Vec::new();
        let mut base = FIRST_PAGE;
        loop {
            let page = window(sorted.clone(), |r| r.pk, &req(3, Direction::Forward, base)).unwrap();
            if page.is_empty() {
                break;
            }
            base = page.last().unwrap().pk;
            walked.extend(page.iter().map(|r| r.pk));
        }
        assert_eq!(walked, expected);
    }

    #[test]
    fn backward_from_last_reverses_forward_walk() {
        let sorted = ordered(&[(5, 2), (1, 9), (8, 2), (3, 7), (6, 1), (2, 9), (9, 4)]);
        let mut expected: Vec<i64> = sorted.iter().map(|r| r.pk).collect();
        let last_pk = *expected.last().unwrap();
        expected.reverse();

        // start from the final record's pk and walk backward
        let mut walked = vec![last_pk];
        let mut base = last_pk;
        loop {
            let page =
                window(sorted.clone(), |r| r.pk, &req(2, Direction::Backward, base)).unwrap();
            if page.is_empty() {
                break;
            }
            base = page.last().unwrap().pk;
            walked.extend(page.iter().map(|r| r.pk));
        }
        assert_eq!(walked, expected);
    }

    #[test]
    fn forward_window_beyond_base() {
        let sorted = ordered(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
        let page = window(sorted, |r| r.pk, &req(2, Direction::Forward, 2)).unwrap();
        assert_eq!(page.iter().map(|r| r.pk).collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn short_final_page() {
        let sorted = ordered(&[(1, 1), (2, 2), (3, 3)]);
        let page = window(sorted, |r| r.pk, &req(10, Direction::Forward, 2)).unwrap();
        assert_eq!(page.iter().map(|r| r.pk).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn csv_parsing() {
        assert_eq!(parse_csv_ints("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_csv_ints("").unwrap(), Vec::<i64>::new());
        assert_eq!(parse_csv_ints("4,,5").unwrap(), vec![4, 5]);
        // a malformed list names itself, not the cursor
        assert_eq!(parse_csv_ints("1,x").unwrap_err(), PageError::BadFilterList);
    }
}

// endregion: --- Tests
