//! Search, stable sorting, and fixed-size pagination over in-memory listings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Name,
    Level,
    Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Comparable projection of a record for one [`SortKey`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Date(NaiveDate),
    Text(String),
    Rank(u8),
}

/// Records that can appear in a searchable, sortable listing.
pub trait Listable {
    fn display_name(&self) -> &str;
    fn sort_value(&self, key: SortKey) -> SortValue;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

fn matches_search<T: Listable>(item: &T, needle: &str) -> bool {
    item.display_name().to_lowercase().contains(needle)
}

/// Stable sort; equal keys keep their incoming order in both directions.
pub fn sort_items<T: Listable>(items: &mut [T], key: SortKey, direction: SortDirection) {
    items.sort_by(|left, right| {
        let ordering = left.sort_value(key).cmp(&right.sort_value(key));
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Slice `items` into a 1-based page. Page 0 reads as page 1; page size 0 uses `default_page_size`.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize, default_page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = match page_size {
        0 => default_page_size.max(1),
        size => size,
    };
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let offset = (page - 1).saturating_mul(page_size);

    let items = items.into_iter().skip(offset).take(page_size).collect();

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Search, sort, and paginate in one pass.
pub fn apply_query<T: Listable>(items: Vec<T>, query: &ListQuery, default_page_size: usize) -> Page<T> {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase);

    let mut filtered: Vec<T> = match needle {
        Some(needle) => items
            .into_iter()
            .filter(|item| matches_search(item, &needle))
            .collect(),
        None => items,
    };

    sort_items(&mut filtered, query.sort, query.direction);
    paginate(filtered, query.page, query.page_size, default_page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        filed: NaiveDate,
        rank: u8,
    }

    impl Listable for Row {
        fn display_name(&self) -> &str {
            self.name
        }

        fn sort_value(&self, key: SortKey) -> SortValue {
            match key {
                SortKey::Date => SortValue::Date(self.filed),
                SortKey::Name => SortValue::Text(self.name.to_lowercase()),
                SortKey::Level | SortKey::Priority => SortValue::Rank(self.rank),
            }
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date")
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "Layla Haddad", filed: date(3), rank: 2 },
            Row { name: "Omar Nasser", filed: date(1), rank: 1 },
            Row { name: "Sara Khalil", filed: date(2), rank: 2 },
            Row { name: "Yusuf Amin", filed: date(4), rank: 1 },
        ]
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut items = rows();
        sort_items(&mut items, SortKey::Priority, SortDirection::Asc);
        let names: Vec<_> = items.iter().map(|row| row.name).collect();
        assert_eq!(
            names,
            vec!["Omar Nasser", "Yusuf Amin", "Layla Haddad", "Sara Khalil"]
        );
    }

    #[test]
    fn descending_dates_put_latest_first() {
        let mut items = rows();
        sort_items(&mut items, SortKey::Date, SortDirection::Desc);
        assert_eq!(items[0].name, "Yusuf Amin");
        assert_eq!(items[3].name, "Omar Nasser");
    }

    #[test]
    fn paginate_reports_totals_and_handles_overflow() {
        let page = paginate(rows(), 2, 3, DEFAULT_PAGE_SIZE);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_items, 4);
        assert_eq!(page.total_pages, 2);

        let past_end = paginate(rows(), 5, 3, DEFAULT_PAGE_SIZE);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.page, 5);
    }

    #[test]
    fn zero_page_and_size_fall_back_to_defaults() {
        let page = paginate(rows(), 0, 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn search_is_case_insensitive() {
        let query = ListQuery {
            search: Some("  KHAL ".to_string()),
            sort: SortKey::Name,
            direction: SortDirection::Asc,
            ..ListQuery::default()
        };
        let page = apply_query(rows(), &query, DEFAULT_PAGE_SIZE);
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].name, "Sara Khalil");
    }
}
