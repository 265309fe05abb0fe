use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::filter::View;
use super::model::Dataset;

/// How many entries the top-websites / active-students rankings keep.
pub const TOP_N: usize = 10;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Parallel label/value lists, the shape chart frontends consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub data: Vec<i64>,
}

/// Aggregate statistics over a view. Computed fresh per query, never
/// cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Distinct usernames in the view.
    pub total_students: usize,
    /// Sum of `total_visits` across the view.
    pub total_visits: i64,
    /// Distinct website addresses in the view.
    pub unique_websites: usize,
    /// Per-row mean of `total_visits`, rounded to 2 decimals. This is a
    /// row mean, not a per-distinct-student mean.
    pub avg_visits_per_student: f64,
    /// Top sites by summed `visits_to_website`, descending.
    pub top_websites: ChartSeries,
    /// Top usernames by summed `total_visits`, descending.
    pub active_students: ChartSeries,
    /// `total_visits` summed per calendar day, ascending by date. Rows
    /// with the sentinel timestamp are not in this series.
    pub visits_over_time: ChartSeries,
}

impl Summary {
    /// The well-defined all-zero summary for an empty view.
    pub fn empty() -> Self {
        Summary {
            total_students: 0,
            total_visits: 0,
            unique_websites: 0,
            avg_visits_per_student: 0.0,
            top_websites: ChartSeries::default(),
            active_students: ChartSeries::default(),
            visits_over_time: ChartSeries::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-key sums that remember first-seen order, so rankings can break
/// ties by first occurrence.
#[derive(Default)]
struct GroupTotals {
    order: Vec<(String, i64)>,
    index: HashMap<String, usize>,
}

impl GroupTotals {
    fn add(&mut self, key: &str, amount: i64) {
        match self.index.get(key) {
            Some(&i) => self.order[i].1 += amount,
            None => {
                self.index.insert(key.to_string(), self.order.len());
                self.order.push((key.to_string(), amount));
            }
        }
    }

    /// Largest `n` sums, descending; stable sort keeps first-seen order
    /// among equal sums.
    fn top(mut self, n: usize) -> ChartSeries {
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.order.truncate(n);
        let (labels, data) = self.order.into_iter().unzip();
        ChartSeries { labels, data }
    }
}

/// Compute the aggregate statistics for a view. Pure and deterministic:
/// identical input order yields identical output.
pub fn summarize(dataset: &Dataset, view: &View) -> Summary {
    if view.is_empty() {
        return Summary::empty();
    }

    let mut students: HashSet<&str> = HashSet::new();
    let mut websites: HashSet<&str> = HashSet::new();
    let mut total_visits: i64 = 0;
    let mut site_totals = GroupTotals::default();
    let mut student_totals = GroupTotals::default();
    let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();

    for rec in view.records(dataset) {
        students.insert(&rec.username);
        websites.insert(&rec.website);
        total_visits += rec.total_visits;
        site_totals.add(&rec.website, rec.visits_to_website);
        student_totals.add(&rec.username, rec.total_visits);
        if let Some(ts) = rec.last_visit_time {
            *per_day.entry(ts.date()).or_default() += rec.total_visits;
        }
    }

    let mean = total_visits as f64 / view.len() as f64;

    let mut over_time = ChartSeries::default();
    for (date, count) in per_day {
        over_time.labels.push(date.format("%Y-%m-%d").to_string());
        over_time.data.push(count);
    }

    Summary {
        total_students: students.len(),
        total_visits,
        unique_websites: websites.len(),
        avg_visits_per_student: (mean * 100.0).round() / 100.0,
        top_websites: site_totals.top(TOP_N),
        active_students: student_totals.top(TOP_N),
        visits_over_time: over_time,
    }
}
