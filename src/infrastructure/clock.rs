use crate::infrastructure::error::InfraError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of "now" and of the local calendar day used as "today".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn timezone(&self) -> Tz;

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone()).date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    timezone: Tz,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self { now, timezone }
    }

    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Tz::UTC)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn timezone(&self) -> Tz {
        self.timezone
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, InfraError> {
    let name = name.trim();
    name.parse::<Tz>()
        .map_err(|_| InfraError::InvalidConfig(format!("unknown timezone '{name}'")))
}
