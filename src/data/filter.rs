use chrono::NaiveDateTime;

use super::model::{parse_timestamp, Dataset, VisitRecord};

// ---------------------------------------------------------------------------
// Filter criteria: per-query predicate inputs
// ---------------------------------------------------------------------------

/// Raw per-query filter inputs. All optional; absent or empty criteria
/// impose no constraint. Date bounds arrive as raw strings and are parsed
/// leniently when the filter runs — an unparseable bound is dropped.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against username, full name, or
    /// website address.
    pub search_text: Option<String>,
    /// Case-insensitive exact class match.
    pub class_name: Option<String>,
    /// Inclusive lower bound on the last visit time.
    pub start_date: Option<String>,
    /// Inclusive upper bound on the last visit time.
    pub end_date: Option<String>,
}

/// Criteria after trimming, lowercasing, and date parsing. Bounds that
/// failed to parse are already gone here.
struct ActiveCriteria {
    search: Option<String>,
    class: Option<String>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
}

impl FilterCriteria {
    fn resolve(&self) -> ActiveCriteria {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase)
        };

        ActiveCriteria {
            search: non_empty(&self.search_text),
            class: non_empty(&self.class_name),
            start: self.start_date.as_deref().and_then(parse_timestamp),
            end: self.end_date.as_deref().and_then(parse_timestamp),
        }
    }
}

fn matches(record: &VisitRecord, criteria: &ActiveCriteria) -> bool {
    if let Some(needle) = &criteria.search {
        let hit = record.username.to_lowercase().contains(needle)
            || record.full_name.to_lowercase().contains(needle)
            || record.website.to_lowercase().contains(needle);
        if !hit {
            return false;
        }
    }

    if let Some(class) = &criteria.class {
        if record.class_name.to_lowercase() != *class {
            return false;
        }
    }

    // Sentinel timestamps never match an active date bound.
    if let Some(start) = criteria.start {
        match record.last_visit_time {
            Some(ts) if ts >= start => {}
            _ => return false,
        }
    }
    if let Some(end) = criteria.end {
        match record.last_visit_time {
            Some(ts) if ts <= end => {}
            _ => return false,
        }
    }

    true
}

/// Filter the dataset. Returns the indices of matching rows, in dataset
/// order; applying identical criteria to an already-filtered view keeps
/// every row.
pub fn apply(dataset: &Dataset, criteria: &FilterCriteria) -> View {
    let active = criteria.resolve();
    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| matches(rec, &active))
        .map(|(i, _)| i)
        .collect();
    View { indices }
}

// ---------------------------------------------------------------------------
// View: an ordered subsequence of the dataset
// ---------------------------------------------------------------------------

/// Ordered indices into a [`Dataset`] produced by filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    indices: Vec<usize>,
}

impl View {
    /// The unfiltered view over the whole dataset.
    pub fn all(dataset: &Dataset) -> View {
        View {
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// One page of the view, 1-indexed. Pages past the end, or page
    /// numbers ≤ 0, yield an empty window; the view itself is untouched.
    pub fn page(&self, page_number: i64, per_page: usize) -> &[usize] {
        if page_number <= 0 || per_page == 0 {
            return &[];
        }
        let start = match usize::try_from(page_number - 1)
            .ok()
            .and_then(|n| n.checked_mul(per_page))
        {
            Some(s) if s < self.indices.len() => s,
            _ => return &[],
        };
        let end = (start + per_page).min(self.indices.len());
        &self.indices[start..end]
    }

    /// Iterate the view's records in order.
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a VisitRecord> {
        self.indices.iter().map(|&i| &dataset.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::parse_timestamp;

    fn record(
        username: &str,
        full_name: &str,
        class_name: &str,
        website: &str,
        last_visit: Option<&str>,
    ) -> VisitRecord {
        VisitRecord {
            username: username.to_string(),
            full_name: full_name.to_string(),
            class_name: class_name.to_string(),
            website: website.to_string(),
            visits_to_website: 1,
            last_visit_time: last_visit.and_then(parse_timestamp),
            total_visits: 1,
        }
    }

    fn sample_dataset() -> Dataset {
        Dataset {
            records: vec![
                record("u001", "Ada Moreno", "10a", "math.example.org", Some("2024-03-01 10:00:00")),
                record("u002", "Ben Okafor", "10B", "news.example.com", Some("2024-03-02 09:30:00")),
                record("u003", "Cleo Brandt", "11C", "ada-fans.example.com", None),
                record("u004", "Dai Tanaka", "10a", "video.example.net", Some("2024-03-05 16:45:00")),
            ],
        }
    }

    fn criteria() -> FilterCriteria {
        FilterCriteria::default()
    }

    #[test]
    fn no_criteria_keeps_everything_in_order() {
        let ds = sample_dataset();
        let view = apply(&ds, &criteria());
        assert_eq!(view.indices(), &[0, 1, 2, 3]);
    }

    #[test]
    fn search_matches_any_of_three_fields() {
        let ds = sample_dataset();
        let view = apply(
            &ds,
            &FilterCriteria {
                search_text: Some("  ADA ".to_string()),
                ..criteria()
            },
        );
        // "Ada Moreno" (full name) and "ada-fans.example.com" (website).
        assert_eq!(view.indices(), &[0, 2]);
    }

    #[test]
    fn class_match_is_exact_but_case_insensitive() {
        let ds = sample_dataset();
        let view = apply(
            &ds,
            &FilterCriteria {
                class_name: Some("10A".to_string()),
                ..criteria()
            },
        );
        // "10a" matches, "10B" does not.
        assert_eq!(view.indices(), &[0, 3]);
    }

    #[test]
    fn date_bounds_are_inclusive_and_exclude_sentinels() {
        let ds = sample_dataset();
        let view = apply(
            &ds,
            &FilterCriteria {
                start_date: Some("2024-03-02 09:30:00".to_string()),
                ..criteria()
            },
        );
        // Row 2 has no timestamp and never matches a date bound.
        assert_eq!(view.indices(), &[1, 3]);

        let view = apply(
            &ds,
            &FilterCriteria {
                end_date: Some("2024-03-02 09:30:00".to_string()),
                ..criteria()
            },
        );
        assert_eq!(view.indices(), &[0, 1]);
    }

    #[test]
    fn unparseable_bound_is_ignored() {
        let ds = sample_dataset();
        let view = apply(
            &ds,
            &FilterCriteria {
                start_date: Some("soonish".to_string()),
                ..criteria()
            },
        );
        assert_eq!(view.len(), ds.len());
    }

    #[test]
    fn criteria_combine_with_and() {
        let ds = sample_dataset();
        let view = apply(
            &ds,
            &FilterCriteria {
                search_text: Some("example".to_string()),
                class_name: Some("10a".to_string()),
                start_date: Some("2024-03-02".to_string()),
                end_date: None,
            },
        );
        assert_eq!(view.indices(), &[3]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = sample_dataset();
        let crit = FilterCriteria {
            search_text: Some("example".to_string()),
            class_name: Some("10A".to_string()),
            ..criteria()
        };

        let once = apply(&ds, &crit);
        let narrowed = Dataset {
            records: once.records(&ds).cloned().collect(),
        };
        let twice = apply(&narrowed, &crit);

        assert_eq!(twice.len(), once.len());
        let again: Vec<_> = twice.records(&narrowed).cloned().collect();
        let first: Vec<_> = once.records(&ds).cloned().collect();
        assert_eq!(again, first);
    }

    #[test]
    fn pages_partition_the_view() {
        let ds = Dataset {
            records: (0..10)
                .map(|i| record(&format!("u{i:03}"), "", "10a", "site.example.org", None))
                .collect(),
        };
        let view = View::all(&ds);

        let mut seen: Vec<usize> = Vec::new();
        let mut page_number = 1;
        loop {
            let window = view.page(page_number, 3);
            if window.is_empty() {
                break;
            }
            seen.extend_from_slice(window);
            page_number += 1;
        }
        assert_eq!(seen, view.indices());
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let ds = sample_dataset();
        let view = View::all(&ds);
        assert!(view.page(100, 50).is_empty());
        assert!(view.page(0, 50).is_empty());
        assert!(view.page(-1, 50).is_empty());
        assert_eq!(view.page(1, 50).len(), 4);
    }
}
