use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Unique draw identifier.
pub type DrawId = Uuid;

/// One recorded draw. Immutable once recorded; numbers are kept as an
/// ascending set regardless of how they arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDraw {
    pub id: DrawId,
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "ordered_set")]
    pub numbers: Vec<u32>,
    #[serde(default, deserialize_with = "ordered_set")]
    pub bonus_numbers: Vec<u32>,
    #[serde(default)]
    pub jackpot_value: f64,
}

fn ordered_set<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<u32>::deserialize(deserializer)?;
    Ok(to_ordered_set(raw))
}

fn to_ordered_set(numbers: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut v: Vec<u32> = numbers.into_iter().collect();
    v.sort_unstable();
    v.dedup();
    v
}

impl HistoricalDraw {
    pub fn new(timestamp: DateTime<Utc>, numbers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            numbers: to_ordered_set(numbers),
            bonus_numbers: Vec::new(),
            jackpot_value: 0.0,
        }
    }

    pub fn with_bonus(mut self, bonus: impl IntoIterator<Item = u32>) -> Self {
        self.bonus_numbers = to_ordered_set(bonus);
        self
    }

    pub fn with_jackpot(mut self, jackpot_value: f64) -> Self {
        self.jackpot_value = jackpot_value;
        self
    }

    pub fn contains(&self, n: u32) -> bool {
        self.numbers.binary_search(&n).is_ok()
    }

    /// Sum of the main numbers.
    pub fn sum(&self) -> u64 {
        self.numbers.iter().map(|&n| n as u64).sum()
    }

    /// The same draw with its bonus numbers in the main slot, so pool-agnostic
    /// generators can score the bonus pool.
    pub fn bonus_view(&self) -> HistoricalDraw {
        HistoricalDraw {
            id: self.id,
            timestamp: self.timestamp,
            numbers: self.bonus_numbers.clone(),
            bonus_numbers: Vec::new(),
            jackpot_value: self.jackpot_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_sorted_and_deduplicated() {
        let d = HistoricalDraw::new(Utc::now(), [9, 3, 3, 1]);
        assert_eq!(d.numbers, vec![1, 3, 9]);
        assert!(d.contains(3));
        assert!(!d.contains(2));
        assert_eq!(d.sum(), 13);
    }

    #[test]
    fn deserialize_normalizes_order() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "timestamp": "2024-01-01T00:00:00Z",
            "numbers": [5, 1, 3],
            "bonus_numbers": [2, 2]
        }"#;
        let d: HistoricalDraw = serde_json::from_str(json).unwrap();
        assert_eq!(d.numbers, vec![1, 3, 5]);
        assert_eq!(d.bonus_numbers, vec![2]);
        assert_eq!(d.jackpot_value, 0.0);
    }

    #[test]
    fn bonus_view_swaps_pools() {
        let d = HistoricalDraw::new(Utc::now(), [1, 2, 3]).with_bonus([7]);
        let b = d.bonus_view();
        assert_eq!(b.numbers, vec![7]);
        assert!(b.bonus_numbers.is_empty());
        assert_eq!(b.id, d.id);
    }
}
