// Schedule interpretation module
//
// Turns five-field cron expressions into short English phrases for display
// and computes upcoming fire times. Humanizing never fails: anything outside
// the recognised shapes is returned as written.

use crate::errors::ScheduleError;
use crate::models::DEFAULT_TIMEZONE;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

const WEEKDAYS: [&str; 7] = [
    "Sundays",
    "Mondays",
    "Tuesdays",
    "Wednesdays",
    "Thursdays",
    "Fridays",
    "Saturdays",
];

/// The five positional fields of a cron expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronFields<'a> {
    pub minute: &'a str,
    pub hour: &'a str,
    pub day_of_month: &'a str,
    pub month: &'a str,
    pub day_of_week: &'a str,
}

impl<'a> CronFields<'a> {
    /// Split an expression on whitespace; `None` unless there are exactly five fields
    pub fn parse(expr: &'a str) -> Option<Self> {
        let mut parts = expr.split_whitespace();
        let fields = CronFields {
            minute: parts.next()?,
            hour: parts.next()?,
            day_of_month: parts.next()?,
            month: parts.next()?,
            day_of_week: parts.next()?,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(fields)
    }

    fn calendar_is_any(&self) -> bool {
        is_any(self.day_of_month) && is_any(self.month) && is_any(self.day_of_week)
    }

    /// Minute and hour as a valid wall-clock time
    fn clock(&self) -> Option<(u32, u32)> {
        let minute = literal(self.minute).filter(|m| *m < 60)?;
        let hour = literal(self.hour).filter(|h| *h < 24)?;
        Some((hour, minute))
    }
}

type HumanizeRule = fn(&CronFields<'_>) -> Option<String>;

/// Ordered rule table; the first rule that produces a phrase wins
const HUMANIZE_RULES: &[(&str, HumanizeRule)] = &[
    ("every_n_minutes", every_n_minutes),
    ("every_n_hours", every_n_hours),
    ("weekly", weekly),
    ("monthly", monthly),
    ("daily", daily),
];

/// Describe a cron expression in plain English.
///
/// Returns `expr` unchanged when it is not a five-field expression or does
/// not match any supported shape. A timezone other than UTC is appended in
/// parentheses.
pub fn humanize(expr: &str, timezone: Option<&str>) -> String {
    let Some(fields) = CronFields::parse(expr) else {
        return expr.to_string();
    };

    HUMANIZE_RULES
        .iter()
        .find_map(|(name, rule)| {
            let phrase = rule(&fields)?;
            tracing::trace!(expression = expr, rule = *name, "Matched humanize rule");
            Some(phrase)
        })
        .map(|phrase| format!("{}{}", phrase, timezone_suffix(timezone)))
        .unwrap_or_else(|| expr.to_string())
}

fn timezone_suffix(timezone: Option<&str>) -> String {
    match timezone.map(str::trim) {
        Some(tz) if !tz.is_empty() && tz != DEFAULT_TIMEZONE => format!(" ({})", tz),
        _ => String::new(),
    }
}

fn is_any(field: &str) -> bool {
    field == "*"
}

/// Plain base-10 literal made only of ASCII digits
fn literal(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// `*/N` with N > 0
fn step(field: &str) -> Option<u32> {
    field
        .strip_prefix("*/")
        .and_then(literal)
        .filter(|n| *n > 0)
}

fn every_n_minutes(fields: &CronFields<'_>) -> Option<String> {
    let n = step(fields.minute)?;
    if !(is_any(fields.hour) && fields.calendar_is_any()) {
        return None;
    }
    Some(match n {
        1 => "every minute".to_string(),
        n => format!("every {} minutes", n),
    })
}

fn every_n_hours(fields: &CronFields<'_>) -> Option<String> {
    let n = step(fields.hour)?;
    if !fields.calendar_is_any() {
        return None;
    }
    let minute = literal(fields.minute);
    if minute.is_some_and(|m| m >= 60) {
        return None;
    }
    Some(match (n, minute) {
        (1, _) => "every hour".to_string(),
        (n, Some(minute)) if minute > 0 => format!("every {} hours at :{:02}", n, minute),
        (n, _) => format!("every {} hours", n),
    })
}

fn weekly(fields: &CronFields<'_>) -> Option<String> {
    let (hour, minute) = fields.clock()?;
    if !(is_any(fields.day_of_month) && is_any(fields.month)) {
        return None;
    }
    let weekday = literal(fields.day_of_week).and_then(|dow| WEEKDAYS.get(dow as usize))?;
    Some(format!("On {} at {:02}:{:02}", weekday, hour, minute))
}

fn monthly(fields: &CronFields<'_>) -> Option<String> {
    let (hour, minute) = fields.clock()?;
    if !(is_any(fields.month) && is_any(fields.day_of_week)) {
        return None;
    }
    let day = literal(fields.day_of_month).filter(|d| (1..=31).contains(d))?;
    Some(format!(
        "On the {} of every month at {:02}:{:02}",
        ordinal(day),
        hour,
        minute
    ))
}

fn daily(fields: &CronFields<'_>) -> Option<String> {
    let (hour, minute) = fields.clock()?;
    if !fields.calendar_is_any() {
        return None;
    }
    Some(format!("Daily at {:02}:{:02}", hour, minute))
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

// ============================================================================
// Next execution time
// ============================================================================

/// Expand a five-field expression into the seven-field form of the `cron`
/// crate (`sec min hour dom month dow year`).
///
/// The crate numbers weekdays 1-7 starting at Sunday, so numeric weekday
/// values are shifted from the usual 0=Sunday numbering.
pub fn normalize_cron_expr(expr: &str) -> Result<String, ScheduleError> {
    let fields = CronFields::parse(expr).ok_or_else(|| ScheduleError::InvalidCronExpression {
        expression: expr.to_string(),
        reason: "expected 5 fields".to_string(),
    })?;

    Ok(format!(
        "0 {} {} {} {} {} *",
        fields.minute,
        fields.hour,
        fields.day_of_month,
        fields.month,
        shift_weekdays(fields.day_of_week)
    ))
}

fn shift_weekdays(field: &str) -> String {
    let (base, step) = match field.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (field, None),
    };

    let mut shifted = String::with_capacity(field.len());
    let mut digits = String::new();
    for c in base.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        flush_weekday(&mut digits, &mut shifted);
        shifted.push(c);
    }
    flush_weekday(&mut digits, &mut shifted);

    match step {
        Some(step) => format!("{}/{}", shifted, step),
        None => shifted,
    }
}

fn flush_weekday(digits: &mut String, out: &mut String) {
    if digits.is_empty() {
        return;
    }
    match digits.parse::<u32>() {
        Ok(day) => out.push_str(&((day % 7) + 1).to_string()),
        Err(_) => out.push_str(digits),
    }
    digits.clear();
}

/// Parse a five-field expression with the `cron` crate
pub fn parse_cron_expression(expr: &str) -> Result<CronSchedule, ScheduleError> {
    let normalized = normalize_cron_expr(expr)?;
    CronSchedule::from_str(&normalized).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expr.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve an IANA timezone name, falling back to UTC
pub fn resolve_timezone(timezone: Option<&str>) -> Tz {
    timezone
        .and_then(|tz| Tz::from_str(tz.trim()).ok())
        .unwrap_or(Tz::UTC)
}

/// Next fire time strictly after `after`, evaluated in the job's timezone.
/// `None` when the expression cannot be evaluated.
pub fn next_run(expr: &str, timezone: Option<&str>, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let schedule = match parse_cron_expression(expr) {
        Ok(schedule) => schedule,
        Err(e) => {
            tracing::debug!(expression = expr, error = %e, "Cannot compute next run");
            return None;
        }
    };

    let tz = resolve_timezone(timezone);
    schedule
        .after(&after.with_timezone(&tz))
        .next()
        .map(|next| next.with_timezone(&Utc))
}
