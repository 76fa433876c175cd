use std::fmt;
use std::str::FromStr;

use crate::error::{CollectionError, Result};
use crate::value::Value;

/// Tokens accepted as an unbounded range end
const INFINITE_ENDS: &[&str] = &["Inf", "Infinite"];

/// Numeric bound or step of a range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn is_zero(self) -> bool {
        self.as_f64() == 0.0
    }

    fn parse(part: &str, spec: &str) -> Result<Self> {
        let part = part.trim();
        let not_a_number = || malformed(spec, format!("`{part}` is not a number"));

        if part.is_empty() || part.starts_with('.') || part.ends_with('.') {
            return Err(not_a_number());
        }
        if let Ok(n) = part.parse::<i64>() {
            return Ok(Number::Int(n));
        }
        match part.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Number::Float(n)),
            _ => Err(not_a_number()),
        }
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::Int(n)
    }
}

impl From<i32> for Number {
    fn from(n: i32) -> Self {
        Number::Int(i64::from(n))
    }
}

impl From<f64> for Number {
    fn from(n: f64) -> Self {
        Number::Float(n)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            Number::Float(n) => write!(f, "{n}"),
        }
    }
}

fn malformed(spec: &str, reason: impl fmt::Display) -> CollectionError {
    CollectionError::InvalidArgument(format!("malformed range `{spec}`: {reason}"))
}

/// Arithmetic progression with an inclusive end
///
/// Written `start..end` or `start..step..end`; `end` may be `Inf` or
/// `Infinite`. Without a step the progression counts by one towards `end`.
/// Any float component makes every element a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSpec {
    start: Number,
    step: Option<Number>,
    end: Option<Number>,
}

impl RangeSpec {
    pub fn new(start: impl Into<Number>, end: impl Into<Number>) -> Self {
        Self {
            start: start.into(),
            step: None,
            end: Some(end.into()),
        }
    }

    /// Counts up from `start` without end
    pub fn unbounded(start: impl Into<Number>) -> Self {
        Self {
            start: start.into(),
            step: None,
            end: None,
        }
    }

    pub fn with_step(self, step: impl Into<Number>) -> Result<Self> {
        let step = step.into();
        if step.is_zero() {
            return Err(CollectionError::InvalidArgument(
                "range step must not be zero".to_string(),
            ));
        }
        Ok(Self {
            step: Some(step),
            ..self
        })
    }

    pub fn start(&self) -> Number {
        self.start
    }

    pub fn end(&self) -> Option<Number> {
        self.end
    }

    pub fn is_infinite(&self) -> bool {
        self.end.is_none()
    }

    /// Explicit step, or one unit towards the end
    pub fn step(&self) -> Number {
        if let Some(step) = self.step {
            return step;
        }
        match self.end {
            Some(end) if end.as_f64() < self.start.as_f64() => Number::Int(-1),
            _ => Number::Int(1),
        }
    }

    fn is_float(&self) -> bool {
        [Some(self.start), Some(self.step()), self.end]
            .into_iter()
            .flatten()
            .any(|n| matches!(n, Number::Float(_)))
    }

    /// Fresh iterator over the progression
    pub(crate) fn values(&self) -> Box<dyn Iterator<Item = Value>> {
        if self.is_float() {
            return self.float_values();
        }

        let (Number::Int(start), Number::Int(step)) = (self.start, self.step()) else {
            return self.float_values();
        };
        let end = match self.end {
            Some(Number::Int(end)) => Some(end),
            _ => None,
        };

        let mut next = Some(start);
        Box::new(std::iter::from_fn(move || {
            let current = next?;
            let within = match end {
                Some(end) if step > 0 => current <= end,
                Some(end) => current >= end,
                None => true,
            };
            if !within {
                next = None;
                return None;
            }
            next = current.checked_add(step);
            Some(Value::Int(current))
        }))
    }

    // Elements are computed from their index so the error does not accumulate
    fn float_values(&self) -> Box<dyn Iterator<Item = Value>> {
        let start = self.start.as_f64();
        let step = self.step().as_f64();
        let end = self.end.map(Number::as_f64);

        Box::new(
            (0u64..)
                .map(move |index| start + index as f64 * step)
                .take_while(move |current| match end {
                    Some(end) if step > 0.0 => *current <= end,
                    Some(end) => *current >= end,
                    None => true,
                })
                .map(Value::from),
        )
    }
}

impl FromStr for RangeSpec {
    type Err = CollectionError;

    fn from_str(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.split("..").collect();
        let (start, step, end) = match parts.as_slice() {
            [start, end] => (*start, None, *end),
            [start, step, end] => (*start, Some(*step), *end),
            _ => {
                return Err(malformed(
                    spec,
                    "expected `start..end` or `start..step..end`",
                ));
            }
        };

        let start = Number::parse(start, spec)?;
        let end = match end.trim() {
            end if INFINITE_ENDS.contains(&end) => None,
            end => Some(Number::parse(end, spec)?),
        };
        let range = Self {
            start,
            step: None,
            end,
        };

        match step {
            Some(step) => range
                .with_step(Number::parse(step, spec)?)
                .map_err(|_| malformed(spec, "step must not be zero")),
            None => Ok(range),
        }
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)?;
        if let Some(step) = self.step {
            write!(f, "..{step}")?;
        }
        match self.end {
            Some(end) => write!(f, "..{end}"),
            None => write!(f, "..Inf"),
        }
    }
}
