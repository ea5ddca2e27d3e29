// ── Per-item quantity history ──
//
// Bounded, append-only log of quantity snapshots. Once full, every push
// evicts the oldest point. Timestamps never go backwards.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of points retained per item.
pub const HISTORY_CAPACITY: usize = 20;

/// What produced a history point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HistoryKind {
    Usage,
    Restock,
    Manual,
}

impl HistoryKind {
    /// Positive deltas are restocks; zero and negative deltas count as usage.
    pub fn from_delta(delta: i64) -> Self {
        if delta > 0 { Self::Restock } else { Self::Usage }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: u32,
    pub kind: HistoryKind,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history point {index} is older than the point before it")]
    Unordered { index: usize },
}

/// Ring buffer of at most [`HISTORY_CAPACITY`] points, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<HistoryPoint>", into = "Vec<HistoryPoint>")]
pub struct History {
    points: VecDeque<HistoryPoint>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pre-sorted backfill. Only the newest
    /// [`HISTORY_CAPACITY`] points are kept.
    pub fn from_points(points: Vec<HistoryPoint>) -> Result<Self, HistoryError> {
        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(HistoryError::Unordered { index: index + 1 });
        }

        let skip = points.len().saturating_sub(HISTORY_CAPACITY);
        Ok(Self {
            points: points.into_iter().skip(skip).collect(),
        })
    }

    /// Append at the tail, evicting the oldest point when full.
    ///
    /// A timestamp earlier than the current tail (clock step backwards) is
    /// raised to the tail's timestamp.
    pub fn push(&mut self, mut point: HistoryPoint) {
        if let Some(last) = self.points.back() {
            if point.timestamp < last.timestamp {
                point.timestamp = last.timestamp;
            }
        }
        if self.points.len() == HISTORY_CAPACITY {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&HistoryPoint> {
        self.points.front()
    }

    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryPoint> {
        self.points.iter().copied().collect()
    }
}

impl TryFrom<Vec<HistoryPoint>> for History {
    type Error = HistoryError;

    fn try_from(points: Vec<HistoryPoint>) -> Result<Self, Self::Error> {
        Self::from_points(points)
    }
}

impl From<History> for Vec<HistoryPoint> {
    fn from(history: History) -> Self {
        history.points.into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn point(minute: i64, value: u32) -> HistoryPoint {
        HistoryPoint {
            timestamp: at(minute),
            value,
            kind: HistoryKind::Usage,
        }
    }

    #[test]
    fn push_evicts_oldest_once_full() {
        let mut history = History::new();
        for minute in 0..25 {
            history.push(point(minute, u32::try_from(minute).unwrap()));
        }

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.first().unwrap().value, 5);
        assert_eq!(history.last().unwrap().value, 24);
        let values: Vec<u32> = history.iter().map(|p| p.value).collect();
        assert_eq!(values, (5..25).collect::<Vec<u32>>());
    }

    #[test]
    fn push_never_moves_time_backwards() {
        let mut history = History::new();
        history.push(point(10, 1));
        history.push(point(3, 2));

        assert_eq!(history.last().unwrap().timestamp, at(10));
        assert_eq!(history.last().unwrap().value, 2);
    }

    #[test]
    fn backfill_keeps_newest_points() {
        let points: Vec<_> = (0..30).map(|m| point(m, 0)).collect();
        let history = History::from_points(points).unwrap();

        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.first().unwrap().timestamp, at(10));
    }

    #[test]
    fn backfill_rejects_unsorted_points() {
        let err = History::from_points(vec![point(5, 0), point(4, 0)]).unwrap_err();
        assert_eq!(err, HistoryError::Unordered { index: 1 });
    }

    #[test]
    fn kind_follows_delta_sign() {
        assert_eq!(HistoryKind::from_delta(5), HistoryKind::Restock);
        assert_eq!(HistoryKind::from_delta(-1), HistoryKind::Usage);
        assert_eq!(HistoryKind::from_delta(0), HistoryKind::Usage);
    }

    #[test]
    fn deserialize_rejects_unsorted_json() {
        let json = r#"[
            {"timestamp": "2024-01-02T00:00:00Z", "value": 1, "kind": "usage"},
            {"timestamp": "2024-01-01T00:00:00Z", "value": 2, "kind": "restock"}
        ]"#;
        assert!(serde_json::from_str::<History>(json).is_err());
    }
}
