use crate::error::{PlanningError, PlanningResult};
use crate::model::Period;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    holidays: HashSet<NaiveDate>,
    non_working_days: HashSet<Weekday>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendarConfig {
    working_days: Vec<Weekday>,
    #[serde(default)]
    holidays: Vec<NaiveDate>,
}

/// Monday to Friday, no holidays.
impl Default for WorkCalendar {
    fn default() -> Self {
        Self {
            holidays: HashSet::new(),
            non_working_days: HashSet::from([Weekday::Sat, Weekday::Sun]),
        }
    }
}

impl WorkCalendar {
    pub const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    pub fn custom<I, J>(working_days: I, holidays: J) -> PlanningResult<Self>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let config = WorkCalendarConfig::new(working_days, holidays)?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &WorkCalendarConfig) -> Self {
        let working_set: HashSet<Weekday> = config.working_days.iter().copied().collect();
        let non_working_days = Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !working_set.contains(day))
            .collect();

        Self {
            holidays: config.holidays.iter().copied().collect(),
            non_working_days,
        }
    }

    pub fn to_config(&self) -> WorkCalendarConfig {
        WorkCalendarConfig::from(self)
    }

    /// Add multiple holidays at once
    pub fn add_holidays(&mut self, dates: &[NaiveDate]) {
        self.holidays.extend(dates);
    }

    /// Set custom working days (e.g., Mon-Sat for 6-day weeks)
    pub fn set_working_days(&mut self, days: Vec<Weekday>) {
        self.non_working_days.clear();
        for day in Self::ALL_WEEKDAYS {
            if !days.contains(&day) {
                self.non_working_days.insert(day);
            }
        }
    }

    /// Check if a date counts as a business day
    pub fn is_available(&self, date: NaiveDate) -> bool {
        !self.holidays.contains(&date) && !self.non_working_days.contains(&date.weekday())
    }

    /// Number of working weekdays in a seven day week.
    pub fn working_days_per_week(&self) -> u32 {
        (7 - self.non_working_days.len()) as u32
    }

    /// Count available days in a date range (inclusive)
    pub fn count_available_days(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        let mut count = 0;
        let mut current = start;

        while current <= end {
            if self.is_available(current) {
                count += 1;
            }
            current = current + Duration::days(1);
        }
        count
    }

    pub fn business_days_in(&self, period: Period) -> u32 {
        self.count_available_days(period.first_day(), period.last_day())
    }

    /// Business days in the given month. Fails only when `(year, month)` is not a
    /// real calendar month.
    pub fn business_days(&self, year: i32, month: u32) -> PlanningResult<u32> {
        let period = Period::new(year, month).ok_or_else(|| {
            PlanningError::InvalidInput(format!("{year}-{month:02} is not a calendar month"))
        })?;
        Ok(self.business_days_in(period))
    }
}

impl WorkCalendarConfig {
    pub fn new<I, J>(working_days: I, holidays: J) -> PlanningResult<Self>
    where
        I: IntoIterator<Item = Weekday>,
        J: IntoIterator<Item = NaiveDate>,
    {
        let mut working: Vec<Weekday> = working_days.into_iter().collect();
        if working.is_empty() {
            return Err(PlanningError::invalid_config(
                "calendar.working_days",
                "at least one working day is required",
            ));
        }
        working.sort_by_key(|wd| wd.num_days_from_monday());
        working.dedup_by(|a, b| a.num_days_from_monday() == b.num_days_from_monday());

        let mut holidays: Vec<NaiveDate> = holidays.into_iter().collect();
        holidays.sort();
        holidays.dedup();

        Ok(Self {
            working_days: working,
            holidays,
        })
    }

    pub fn working_days(&self) -> &[Weekday] {
        &self.working_days
    }

    pub fn holidays(&self) -> &[NaiveDate] {
        &self.holidays
    }
}

impl Default for WorkCalendarConfig {
    fn default() -> Self {
        WorkCalendarConfig::from(&WorkCalendar::default())
    }
}

impl From<&WorkCalendar> for WorkCalendarConfig {
    fn from(calendar: &WorkCalendar) -> Self {
        let working = WorkCalendar::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| !calendar.non_working_days.contains(day))
            .collect();

        let mut holidays: Vec<NaiveDate> = calendar.holidays.iter().copied().collect();
        holidays.sort();

        Self {
            working_days: working,
            holidays,
        }
    }
}
