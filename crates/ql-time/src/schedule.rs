//! `Schedule`: the coupon dates of an instrument.
//!
//! A schedule is generated from an effective date, a termination date and a
//! tenor by stepping from an anchor date (the termination date when
//! generating backward, the effective date when generating forward).  The
//! period left over at the other end is the stub; whether it is reported as
//! short or long is decided by [`SchedulePolicy::long_stub_threshold`].
//!
//! Generation happens on unadjusted dates.  Interior dates are then rolled
//! with the schedule convention, the two boundaries with their own
//! conventions, and dates that collapse onto each other are dropped, so the
//! final dates are always strictly increasing.

use crate::business_day_convention::BusinessDayConvention;
use crate::calendar::Calendar;
use crate::date::Date;
use crate::period::Period;
use ql_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Direction of date generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateGeneration {
    /// Step back from the termination date; the stub is at the front.
    Backward,
    /// Step forward from the effective date; the stub is at the back.
    Forward,
    /// Only the effective and termination dates.
    Zero,
}

/// How interior dates are snapped when the anchor is a month end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EndOfMonthRule {
    /// Calendar month end for unadjusted schedules, last business day
    /// otherwise.
    #[default]
    ByConvention,
    /// Last business day of the month.
    LastBusinessDay,
    /// Last calendar day of the month.
    LastCalendarDay,
}

/// Configurable schedule-generation policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulePolicy {
    /// A stub longer than this multiple of the regular period is long.
    pub long_stub_threshold: f64,
    /// Month-end snapping rule.
    pub end_of_month: EndOfMonthRule,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            long_stub_threshold: 1.5,
            end_of_month: EndOfMonthRule::ByConvention,
        }
    }
}

/// Which end of the schedule carries the stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StubPosition {
    /// First period.
    Front,
    /// Last period.
    Back,
}

/// Length classification of a stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StubKind {
    /// At most the threshold multiple of a regular period.
    Short,
    /// Longer than the threshold multiple of a regular period.
    Long,
}

/// An irregular period at either end of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stub {
    /// Where the stub sits.
    pub position: StubPosition,
    /// Whether it is short or long.
    pub kind: StubKind,
}

/// An ordered, strictly increasing sequence of at least two dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    dates: Vec<Date>,
    is_regular: Vec<bool>,
    tenor: Option<Period>,
    rule: DateGeneration,
    stub: Option<Stub>,
}

impl Schedule {
    /// Build a schedule from explicit dates.  Every period is flagged
    /// regular and no stub is reported.
    ///
    /// # Errors
    /// [`Error::InvalidScheduleRange`] unless there are at least two
    /// strictly increasing dates.
    pub fn from_dates(dates: Vec<Date>) -> Result<Self> {
        if dates.len() < 2 {
            return Err(Error::InvalidScheduleRange(format!(
                "a schedule needs at least two dates, got {}",
                dates.len()
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(Error::InvalidScheduleRange(format!(
                "dates not strictly increasing: {} then {}",
                w[0], w[1]
            )));
        }
        Ok(Self {
            is_regular: vec![true; dates.len() - 1],
            dates,
            tenor: None,
            rule: DateGeneration::Zero,
            stub: None,
        })
    }

    /// All dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always `false`; kept for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The first (adjusted effective) date.
    pub fn start_date(&self) -> Date {
        self.dates[0]
    }

    /// The last (adjusted termination) date.
    pub fn end_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Consecutive `(start, end)` pairs.
    pub fn periods(&self) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.dates.windows(2).map(|w| (w[0], w[1]))
    }

    /// Whether period `i` (between `dates[i]` and `dates[i + 1]`) is a full
    /// tenor.
    pub fn is_regular(&self, i: usize) -> bool {
        self.is_regular.get(i).copied().unwrap_or(false)
    }

    /// Generation tenor, `None` for explicit or zero-coupon schedules.
    pub fn tenor(&self) -> Option<Period> {
        self.tenor
    }

    /// Generation rule.
    pub fn rule(&self) -> DateGeneration {
        self.rule
    }

    /// The stub, if the schedule has one.
    pub fn stub(&self) -> Option<Stub> {
        self.stub
    }

    /// Last schedule date strictly before `date`.
    pub fn previous_date(&self, date: Date) -> Option<Date> {
        let i = self.dates.partition_point(|d| *d < date);
        i.checked_sub(1).map(|i| self.dates[i])
    }

    /// First schedule date on or after `date`.
    pub fn next_date(&self, date: Date) -> Option<Date> {
        let i = self.dates.partition_point(|d| *d < date);
        self.dates.get(i).copied()
    }
}

/// Builder for [`Schedule`].
#[derive(Debug)]
pub struct ScheduleBuilder<'a> {
    effective_date: Date,
    termination_date: Date,
    tenor: Period,
    calendar: &'a dyn Calendar,
    convention: BusinessDayConvention,
    effective_convention: Option<BusinessDayConvention>,
    termination_convention: BusinessDayConvention,
    rule: DateGeneration,
    end_of_month: bool,
    first_date: Option<Date>,
    next_to_last_date: Option<Date>,
    policy: SchedulePolicy,
}

impl<'a> ScheduleBuilder<'a> {
    /// Begin building a schedule.  Defaults: `Following` for every date,
    /// backward generation, no end-of-month snapping.
    pub fn new(
        effective_date: Date,
        termination_date: Date,
        tenor: Period,
        calendar: &'a dyn Calendar,
    ) -> Self {
        Self {
            effective_date,
            termination_date,
            tenor,
            calendar,
            convention: BusinessDayConvention::Following,
            effective_convention: None,
            termination_convention: BusinessDayConvention::Following,
            rule: DateGeneration::Backward,
            end_of_month: false,
            first_date: None,
            next_to_last_date: None,
            policy: SchedulePolicy::default(),
        }
    }

    /// Convention for interior dates (and the effective date unless set
    /// separately).
    pub fn with_convention(mut self, c: BusinessDayConvention) -> Self {
        self.convention = c;
        self
    }

    /// Convention for the effective date.
    pub fn with_effective_convention(mut self, c: BusinessDayConvention) -> Self {
        self.effective_convention = Some(c);
        self
    }

    /// Convention for the termination date.
    pub fn with_termination_convention(mut self, c: BusinessDayConvention) -> Self {
        self.termination_convention = c;
        self
    }

    /// Generation direction.
    pub fn with_rule(mut self, rule: DateGeneration) -> Self {
        self.rule = rule;
        self
    }

    /// Snap interior dates to month ends when the anchor is a month end.
    pub fn end_of_month(mut self, eom: bool) -> Self {
        self.end_of_month = eom;
        self
    }

    /// Explicit end of the front stub.
    pub fn with_first_date(mut self, d: Date) -> Self {
        self.first_date = Some(d);
        self
    }

    /// Explicit start of the back stub.
    pub fn with_next_to_last_date(mut self, d: Date) -> Self {
        self.next_to_last_date = Some(d);
        self
    }

    /// Stub threshold and month-end rule.
    pub fn with_policy(mut self, policy: SchedulePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Generate the schedule.
    pub fn build(self) -> Result<Schedule> {
        let (eff, term) = (self.effective_date, self.termination_date);
        if term <= eff {
            return Err(Error::InvalidScheduleRange(format!(
                "termination date {term} not after effective date {eff}"
            )));
        }

        let mut nodes = if self.rule == DateGeneration::Zero {
            vec![Node::boundary(eff, true), Node::boundary(term, true)]
        } else {
            if self.tenor.length <= 0 {
                return Err(Error::InvalidScheduleRange(format!(
                    "tenor must be positive, got {}",
                    self.tenor
                )));
            }
            self.check_stub_dates()?;
            let mut nodes = match self.rule {
                DateGeneration::Forward => self.generate_forward()?,
                _ => self.generate_backward()?,
            };
            self.snap_to_month_end(&mut nodes)?;
            nodes
        };

        self.adjust(&mut nodes)?;
        let nodes = dedup(nodes)?;

        let tenor = (self.rule != DateGeneration::Zero).then_some(self.tenor);
        let stub = match tenor {
            Some(tenor) => self.classify_stub(&nodes, tenor)?,
            None => None,
        };
        let schedule = Schedule {
            dates: nodes.iter().map(|n| n.date).collect(),
            is_regular: nodes[1..].iter().map(|n| n.regular).collect(),
            tenor,
            rule: self.rule,
            stub,
        };
        tracing::debug!(
            dates = schedule.len(),
            rule = ?schedule.rule,
            stub = ?schedule.stub,
            "generated schedule"
        );
        Ok(schedule)
    }

    fn check_stub_dates(&self) -> Result<()> {
        let (eff, term) = (self.effective_date, self.termination_date);
        for (name, d) in [("first", self.first_date), ("next-to-last", self.next_to_last_date)] {
            if let Some(d) = d {
                if d <= eff || d >= term {
                    return Err(Error::InvalidScheduleRange(format!(
                        "{name} date {d} outside ({eff}, {term})"
                    )));
                }
            }
        }
        if let (Some(first), Some(ntl)) = (self.first_date, self.next_to_last_date) {
            if ntl < first {
                return Err(Error::InvalidScheduleRange(format!(
                    "next-to-last date {ntl} before first date {first}"
                )));
            }
        }
        Ok(())
    }

    fn generate_backward(&self) -> Result<Vec<Node>> {
        let (eff, term) = (self.effective_date, self.termination_date);
        let seed = self.next_to_last_date.unwrap_or(term);
        let exit = self.first_date.unwrap_or(eff);

        let mut nodes = vec![Node::boundary(term, false)];
        if let Some(ntl) = self.next_to_last_date {
            let regular = ntl.shift(self.tenor)? == term;
            nodes.push(Node::boundary(ntl, false));
            nodes[0].regular = regular;
        }
        let mut n = 1;
        loop {
            // Stepping below the supported range means the bound was crossed.
            let d = match seed.shift(self.tenor * -n) {
                Ok(d) if d >= exit => d,
                _ => break,
            };
            if let Some(last) = nodes.last_mut() {
                last.regular = true;
            }
            if d == exit {
                nodes.push(Node::boundary(d, false));
                break;
            }
            nodes.push(Node::generated(d));
            n += 1;
        }
        if nodes.last().map(|n| n.unadjusted) != Some(exit) {
            nodes.push(Node::boundary(exit, false));
        }
        if let Some(first) = self.first_date {
            let regular = first.shift(-self.tenor)? == eff;
            if let Some(last) = nodes.last_mut() {
                last.regular = regular;
            }
            nodes.push(Node::boundary(eff, false));
        }
        nodes.reverse();
        nodes[0].regular = true;
        Ok(nodes)
    }

    fn generate_forward(&self) -> Result<Vec<Node>> {
        let (eff, term) = (self.effective_date, self.termination_date);
        let seed = self.first_date.unwrap_or(eff);
        let exit = self.next_to_last_date.unwrap_or(term);

        let mut nodes = vec![Node::boundary(eff, true)];
        if let Some(first) = self.first_date {
            let regular = eff.shift(self.tenor)? == first;
            nodes.push(Node::boundary(first, regular));
        }
        let mut n = 1;
        loop {
            let d = match seed.shift(self.tenor * n) {
                Ok(d) if d <= exit => d,
                _ => break,
            };
            if d == exit {
                nodes.push(Node::boundary(d, true));
                break;
            }
            let mut node = Node::generated(d);
            node.regular = true;
            nodes.push(node);
            n += 1;
        }
        if nodes.last().map(|n| n.unadjusted) != Some(exit) {
            nodes.push(Node::boundary(exit, false));
        }
        if let Some(ntl) = self.next_to_last_date {
            let regular = ntl.shift(self.tenor)? == term;
            nodes.push(Node::boundary(term, regular));
        }
        Ok(nodes)
    }

    fn snap_to_month_end(&self, nodes: &mut [Node]) -> Result<()> {
        if !self.end_of_month {
            return Ok(());
        }
        let anchor = match self.rule {
            DateGeneration::Forward => self.first_date.unwrap_or(self.effective_date),
            _ => self.next_to_last_date.unwrap_or(self.termination_date),
        };
        if !(anchor.is_end_of_month() || self.calendar.is_end_of_month(anchor)?) {
            return Ok(());
        }
        let calendar_day = match self.policy.end_of_month {
            EndOfMonthRule::LastCalendarDay => true,
            EndOfMonthRule::LastBusinessDay => false,
            EndOfMonthRule::ByConvention => self.convention == BusinessDayConvention::Unadjusted,
        };
        for node in nodes.iter_mut().filter(|n| n.generated) {
            node.unadjusted = if calendar_day {
                node.unadjusted.end_of_month()
            } else {
                self.calendar.end_of_month(node.unadjusted)?
            };
        }
        Ok(())
    }

    fn adjust(&self, nodes: &mut [Node]) -> Result<()> {
        let last = nodes.len() - 1;
        let effective_convention = self.effective_convention.unwrap_or(self.convention);
        for (i, node) in nodes.iter_mut().enumerate() {
            let convention = match i {
                0 => effective_convention,
                i if i == last => self.termination_convention,
                _ => self.convention,
            };
            node.date = self.calendar.adjust(node.unadjusted, convention)?;
        }
        Ok(())
    }

    fn classify_stub(&self, nodes: &[Node], tenor: Period) -> Result<Option<Stub>> {
        let n = nodes.len();
        let front = || -> Result<Option<Stub>> {
            if nodes[1].regular {
                return Ok(None);
            }
            let inner = nodes[1].unadjusted;
            let stub_days = inner - nodes[0].unadjusted;
            let regular_days = inner - inner.shift(-tenor)?;
            Ok(Some(self.stub_of(StubPosition::Front, stub_days, regular_days)))
        };
        let back = || -> Result<Option<Stub>> {
            if nodes[n - 1].regular {
                return Ok(None);
            }
            let inner = nodes[n - 2].unadjusted;
            let stub_days = nodes[n - 1].unadjusted - inner;
            let regular_days = inner.shift(tenor)? - inner;
            Ok(Some(self.stub_of(StubPosition::Back, stub_days, regular_days)))
        };
        // The stub on the side away from the anchor comes first.
        match self.rule {
            DateGeneration::Forward => Ok(back()?.or(front()?)),
            _ => Ok(front()?.or(back()?)),
        }
    }

    fn stub_of(&self, position: StubPosition, stub_days: i32, regular_days: i32) -> Stub {
        let kind = if stub_days as f64 > self.policy.long_stub_threshold * regular_days as f64 {
            StubKind::Long
        } else {
            StubKind::Short
        };
        Stub { position, kind }
    }
}

/// Generate schedule dates in one call.
///
/// Shorthand for [`ScheduleBuilder`] with the default policy and no
/// explicit stub dates.
#[allow(clippy::too_many_arguments)]
pub fn generate(
    effective_date: Date,
    termination_date: Date,
    tenor: Period,
    calendar: &dyn Calendar,
    convention: BusinessDayConvention,
    termination_convention: BusinessDayConvention,
    rule: DateGeneration,
    end_of_month: bool,
) -> Result<Vec<Date>> {
    let schedule = ScheduleBuilder::new(effective_date, termination_date, tenor, calendar)
        .with_convention(convention)
        .with_termination_convention(termination_convention)
        .with_rule(rule)
        .end_of_month(end_of_month)
        .build()?;
    Ok(schedule.dates)
}

/// A date being generated.  `regular` refers to the period that ends at
/// this date.
#[derive(Debug, Clone, Copy)]
struct Node {
    unadjusted: Date,
    date: Date,
    regular: bool,
    generated: bool,
}

impl Node {
    fn boundary(d: Date, regular: bool) -> Self {
        Self {
            unadjusted: d,
            date: d,
            regular,
            generated: false,
        }
    }

    fn generated(d: Date) -> Self {
        Self {
            unadjusted: d,
            date: d,
            regular: false,
            generated: true,
        }
    }
}

/// Drop dates that adjustment moved onto or behind their predecessor.
/// The termination date always survives.
fn dedup(nodes: Vec<Node>) -> Result<Vec<Node>> {
    let last = nodes.len() - 1;
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    // Set when a date was dropped for landing before its predecessor: the
    // merged period is no longer a full tenor.
    let mut merged = false;
    for (i, mut node) in nodes.into_iter().enumerate() {
        if i == last {
            while out.len() > 1 && out[out.len() - 1].date >= node.date {
                if let Some(dropped) = out.pop() {
                    node.regular &= dropped.date == node.date;
                }
            }
        }
        match out.last() {
            None => out.push(node),
            Some(prev) if node.date > prev.date => {
                node.regular &= !merged;
                merged = false;
                out.push(node);
            }
            Some(_) if i == last => {
                return Err(Error::InvalidScheduleRange(format!(
                    "effective and termination dates both adjust to {}",
                    node.date
                )));
            }
            Some(prev) => merged |= node.date < prev.date,
        }
    }
    Ok(out)
}
