use serde::{Deserialize, Serialize};

use crate::draw::HistoricalDraw;
use crate::error::InputError;

/// The bounded integer space a draw type draws from.
///
/// Main numbers come from `[min, max]`; the optional bonus pool draws
/// `bonus_count` numbers from `[1, bonus_max]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Domain {
    /// Draw type identifier (e.g. "powerball").
    #[serde(default)]
    pub id: String,
    /// Numbers drawn per draw.
    pub count: u32,
    pub min: u32,
    pub max: u32,
    #[serde(default)]
    pub bonus_count: u32,
    #[serde(default)]
    pub bonus_max: u32,
}

impl Domain {
    pub fn new(id: impl Into<String>, count: u32, min: u32, max: u32) -> Self {
        Self {
            id: id.into(),
            count,
            min,
            max,
            bonus_count: 0,
            bonus_max: 0,
        }
    }

    pub fn with_bonus(mut self, bonus_count: u32, bonus_max: u32) -> Self {
        self.bonus_count = bonus_count;
        self.bonus_max = bonus_max;
        self
    }

    /// Reject domains that cannot be drawn from.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.count == 0 {
            return Err(InputError::EmptyDomain {
                domain: self.id.clone(),
            });
        }
        if self.min > self.max {
            return Err(InputError::InvertedRange {
                domain: self.id.clone(),
                min: self.min,
                max: self.max,
            });
        }
        let size = self.size()?;
        if self.count > size {
            return Err(InputError::CountExceedsRange {
                domain: self.id.clone(),
                count: self.count,
                size,
            });
        }
        if self.bonus_count > self.bonus_max {
            return Err(InputError::InvalidBonusPool {
                domain: self.id.clone(),
                count: self.bonus_count,
                max: self.bonus_max,
            });
        }
        Ok(())
    }

    /// Number of candidates in `[min, max]`, zero for an inverted range.
    pub fn size(&self) -> Result<u32, InputError> {
        if self.min > self.max {
            return Ok(0);
        }
        (self.max - self.min)
            .checked_add(1)
            .ok_or_else(|| InputError::RangeTooLarge {
                domain: self.id.clone(),
                min: self.min,
                max: self.max,
            })
    }

    /// All candidates in ascending order.
    pub fn candidates(&self) -> impl Iterator<Item = u32> {
        self.min..=self.max
    }

    pub fn contains(&self, n: u32) -> bool {
        n >= self.min && n <= self.max
    }

    /// Upper bound of the "low" half: candidates `<= midpoint` are low.
    pub fn midpoint(&self) -> u32 {
        self.min + (self.max.saturating_sub(self.min)) / 2
    }

    /// The bonus pool as a domain of its own, if this draw type has one.
    pub fn bonus_pool(&self) -> Option<Domain> {
        if self.bonus_count == 0 {
            return None;
        }
        Some(Domain::new(format!("{}:bonus", self.id), self.bonus_count, 1, self.bonus_max))
    }

    /// Check a single draw against this domain.
    ///
    /// Bonus numbers are only checked when the domain has a bonus pool.
    pub fn validate_draw(&self, draw: &HistoricalDraw) -> Result<(), InputError> {
        if draw.numbers.is_empty() {
            return Err(InputError::EmptyDraw { draw_id: draw.id });
        }
        if let Some(&number) = draw.numbers.iter().find(|n| !self.contains(**n)) {
            return Err(InputError::NumberOutOfRange {
                draw_id: draw.id,
                number,
                min: self.min,
                max: self.max,
            });
        }
        if self.bonus_count > 0 {
            if let Some(&number) = draw
                .bonus_numbers
                .iter()
                .find(|n| **n == 0 || **n > self.bonus_max)
            {
                return Err(InputError::NumberOutOfRange {
                    draw_id: draw.id,
                    number,
                    min: 1,
                    max: self.bonus_max,
                });
            }
        }
        Ok(())
    }

    /// Validate the domain and every draw of a history.
    pub fn validate_history(&self, history: &[HistoricalDraw]) -> Result<(), InputError> {
        self.validate()?;
        history.iter().try_for_each(|d| self.validate_draw(d))
    }
}
