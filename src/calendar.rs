//! Month grid for browsing journal entries by day.

use chrono::{Datelike, Days, Months, NaiveDate};
use std::collections::HashSet;
use std::fmt::Write;

use crate::utils::format_date;

pub const WEEKDAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub selected: bool,
    pub highlighted: bool,
}

/// One month laid out in Sunday-first weeks, padded with the neighbouring
/// months' days so every week is complete.
#[derive(Debug, Clone)]
pub struct MonthView {
    month_start: NaiveDate,
    selected: NaiveDate,
    highlighted: HashSet<String>,
}

impl MonthView {
    /// Month containing `selected`, with `highlighted` days (YYYY-MM-DD) marked
    pub fn new<I, S>(selected: NaiveDate, highlighted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            month_start: selected.with_day(1).unwrap_or(selected),
            selected,
            highlighted: highlighted.into_iter().map(Into::into).collect(),
        }
    }

    pub fn month_start(&self) -> NaiveDate {
        self.month_start
    }

    /// Move the visible month by `offset` months; the selection is kept
    pub fn shift(&mut self, offset: i32) {
        let months = Months::new(offset.unsigned_abs());
        let shifted = if offset >= 0 {
            self.month_start.checked_add_months(months)
        } else {
            self.month_start.checked_sub_months(months)
        };
        if let Some(start) = shifted {
            self.month_start = start;
        }
    }

    /// Show the month containing `date` and select it
    pub fn select(&mut self, date: NaiveDate) {
        self.selected = date;
        self.month_start = date.with_day(1).unwrap_or(date);
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn title(&self) -> String {
        self.month_start.format("%B %Y").to_string()
    }

    pub fn weeks(&self) -> Vec<[CalendarDay; 7]> {
        let month_end = self
            .month_start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(self.month_start);

        let lead = self.month_start.weekday().num_days_from_sunday() as u64;
        let trail = 6 - month_end.weekday().num_days_from_sunday() as u64;
        let grid_start = self.month_start - Days::new(lead);
        let grid_end = month_end + Days::new(trail);

        let mut weeks = Vec::new();
        let mut day = grid_start;
        while day <= grid_end {
            let week: [CalendarDay; 7] = std::array::from_fn(|i| {
                let date = day + Days::new(i as u64);
                CalendarDay {
                    date,
                    in_month: date.month() == self.month_start.month()
                        && date.year() == self.month_start.year(),
                    selected: date == self.selected,
                    highlighted: self.highlighted.contains(&format_date(date)),
                }
            });
            weeks.push(week);
            day = day + Days::new(7);
        }
        weeks
    }

    /// Plain-text rendering: `*` marks days with entries, brackets the selected day
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:^35}", self.title());
        for header in WEEKDAY_HEADERS {
            let _ = write!(out, " {:>3} ", header);
        }
        out.push('\n');

        for week in self.weeks() {
            for cell in week.iter() {
                if !cell.in_month {
                    out.push_str("     ");
                    continue;
                }
                let mark = if cell.highlighted { '*' } else { ' ' };
                if cell.selected {
                    let _ = write!(out, "[{:>2}]{}", cell.date.day(), mark);
                } else {
                    let _ = write!(out, " {:>2} {}", cell.date.day(), mark);
                }
            }
            out.push('\n');
        }
        out
    }
}
