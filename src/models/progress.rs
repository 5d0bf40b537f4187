use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use super::utc;

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutProgress {
    pub id: i64,
    pub customer_id: i64,
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    pub sessions_attended: i64,
    pub trainer_notes: String,
    pub customer_notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone, Default)]
pub struct DbWorkoutProgress {
    pub id: Option<i64>,
    pub customer_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    pub sessions_attended: Option<i64>,
    pub trainer_notes: Option<String>,
    pub customer_notes: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbWorkoutProgress> for WorkoutProgress {
    fn from(db: DbWorkoutProgress) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            customer_id: db.customer_id.unwrap_or_default(),
            date: db.date.unwrap_or_default(),
            weight: db.weight,
            bmi: db.bmi,
            sessions_attended: db.sessions_attended.unwrap_or_default(),
            trainer_notes: db.trainer_notes.unwrap_or_default(),
            customer_notes: db.customer_notes.unwrap_or_default(),
            created_at: utc(db.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct ProgressChart {
    pub dates: Vec<String>,
    pub weights: Vec<Option<f64>>,
    pub bmis: Vec<Option<f64>>,
}

/// Chart series in chronological order from entries sorted newest first.
pub fn progress_chart(entries: &[WorkoutProgress]) -> ProgressChart {
    let mut chart = ProgressChart::default();
    for entry in entries.iter().rev() {
        chart.dates.push(entry.date.format("%Y-%m-%d").to_string());
        chart.weights.push(entry.weight);
        chart.bmis.push(entry.bmi);
    }
    chart
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_is_chronological() {
        let entry = |day: u32, weight: f64| {
            WorkoutProgress::from(DbWorkoutProgress {
                date: NaiveDate::from_ymd_opt(2025, 3, day),
                weight: Some(weight),
                ..Default::default()
            })
        };
        let newest_first = vec![entry(3, 80.0), entry(2, 81.0), entry(1, 82.0)];

        let chart = progress_chart(&newest_first);
        assert_eq!(chart.dates, vec!["2025-03-01", "2025-03-02", "2025-03-03"]);
        assert_eq!(chart.weights, vec![Some(82.0), Some(81.0), Some(80.0)]);
        assert_eq!(chart.bmis, vec![None, None, None]);
    }
}
