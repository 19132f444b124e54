//! Date picker navigation.
//!
//! The picker only shows one month at a time and offers relative paging
//! controls, so reaching a date is a convergence loop: read the displayed
//! year/month, page one step toward the target, read again.

use {
    chrono::{Datelike, NaiveDate},
    tracing::debug,
};

use ticketscope_browser::{Locator, PageDriver};

use crate::{error::ScrapeError, markup::PortalMarkup, settings::PortalSettings};

const PHASE: &str = "date picker";

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Year and zero-based month currently displayed by the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub year: i32,
    pub month: u32,
}

impl CalendarCursor {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    /// Paging clicks needed to reach `target`: one per year, one per month.
    pub fn steps_to(self, target: Self) -> u32 {
        self.year.abs_diff(target.year) + self.month.abs_diff(target.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    Previous,
    Next,
}

/// Direction to page from `shown` toward `target`, `None` once there.
pub fn paging<T: Ord>(shown: T, target: T) -> Option<Paging> {
    match shown.cmp(&target) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Greater => Some(Paging::Previous),
        std::cmp::Ordering::Less => Some(Paging::Next),
    }
}

/// Parse a year label such as `2024` (trailing locale suffixes ignored).
pub fn parse_year_label(label: &str) -> Option<i32> {
    let digits: String = label
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Parse a month label into 0..=11. Accepts English names (first three
/// letters, any case) and plain month numbers.
pub fn parse_month_label(label: &str) -> Option<u32> {
    let label = label.trim();
    if let Ok(number) = label.parse::<u32>() {
        return (1..=12).contains(&number).then(|| number - 1);
    }
    let prefix: String = label.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .and_then(|i| u32::try_from(i).ok())
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Year,
    Month,
}

impl Unit {
    fn name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
        }
    }
}

pub struct CalendarNavigator<'a> {
    driver: &'a dyn PageDriver,
    markup: &'a PortalMarkup,
    settings: &'a PortalSettings,
}

impl<'a> CalendarNavigator<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        markup: &'a PortalMarkup,
        settings: &'a PortalSettings,
    ) -> Self {
        Self {
            driver,
            markup,
            settings,
        }
    }

    /// Open the picker behind `widget`, page to `target`, pick the day and
    /// confirm.
    pub async fn select_date(&self, widget: &Locator, target: NaiveDate) -> Result<(), ScrapeError> {
        let browser = |e| ScrapeError::from_browser(PHASE, e);

        self.driver.click(widget).await.map_err(browser)?;
        self.driver
            .wait_for(&self.popup(), self.settings.timeouts.option)
            .await
            .map_err(browser)?;

        let cursor = CalendarCursor::of(target);
        let year_steps = self.converge(Unit::Year, cursor.year).await?;
        let month_steps = self
            .converge(Unit::Month, i32::try_from(cursor.month).unwrap_or_default())
            .await?;

        let cell = self.day_cell(target);
        if self.driver.count(&cell).await.map_err(browser)? == 0 {
            return Err(ScrapeError::DateNotSelectable { date: target });
        }
        let class = self
            .driver
            .attribute(&cell, "class")
            .await
            .map_err(browser)?
            .unwrap_or_default();
        if class
            .split_whitespace()
            .any(|c| c == self.markup.picker_disabled_class)
        {
            return Err(ScrapeError::DateNotSelectable { date: target });
        }

        self.driver.click(&cell).await.map_err(browser)?;
        self.driver
            .click(&self.in_popup(&self.markup.picker_ok))
            .await
            .map_err(browser)?;

        debug!(%target, year_steps, month_steps, "date selected");
        Ok(())
    }

    /// Page until the displayed `unit` equals `target`; returns the number of
    /// paging clicks issued.
    async fn converge(&self, unit: Unit, target: i32) -> Result<u32, ScrapeError> {
        let mut steps = 0;
        loop {
            let shown = self.read(unit).await?;
            let Some(direction) = paging(shown, target) else {
                return Ok(steps);
            };
            if steps >= self.settings.max_paging_steps {
                return Err(ScrapeError::NavigationTimeout {
                    phase: PHASE,
                    detail: format!(
                        "{} still {shown} after {steps} paging steps toward {target}",
                        unit.name()
                    ),
                });
            }
            self.driver
                .click(&self.pager(unit, direction))
                .await
                .map_err(|e| ScrapeError::from_browser(PHASE, e))?;
            steps += 1;
        }
    }

    async fn read(&self, unit: Unit) -> Result<i32, ScrapeError> {
        let selector = match unit {
            Unit::Year => &self.markup.picker_year_label,
            Unit::Month => &self.markup.picker_month_label,
        };
        let label = self
            .driver
            .text(&self.in_popup(selector))
            .await
            .map_err(|e| ScrapeError::from_browser(PHASE, e))?;
        let parsed = match unit {
            Unit::Year => parse_year_label(&label),
            Unit::Month => parse_month_label(&label).and_then(|m| i32::try_from(m).ok()),
        };
        parsed.ok_or_else(|| ScrapeError::NavigationTimeout {
            phase: PHASE,
            detail: format!("unreadable {} label {label:?}", unit.name()),
        })
    }

    fn popup(&self) -> Locator {
        Locator::css(&self.markup.picker_popup).visible()
    }

    fn in_popup(&self, selector: &str) -> Locator {
        Locator::css(selector).within(self.popup())
    }

    fn pager(&self, unit: Unit, direction: Paging) -> Locator {
        let selector = match (unit, direction) {
            (Unit::Year, Paging::Previous) => &self.markup.picker_prev_year,
            (Unit::Year, Paging::Next) => &self.markup.picker_next_year,
            (Unit::Month, Paging::Previous) => &self.markup.picker_prev_month,
            (Unit::Month, Paging::Next) => &self.markup.picker_next_month,
        };
        self.in_popup(selector)
    }

    fn day_cell(&self, date: NaiveDate) -> Locator {
        self.in_popup(&format!(r#"td[title="{}"]"#, date.format("%Y-%m-%d")))
    }
}
