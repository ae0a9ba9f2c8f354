//! Date handling for article front-matter and feeds.
//!
//! Article dates are written as `yyyy/MM/dd`. Anything else is treated as
//! "no date": the article page is still emitted but stays out of the feeds.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::time::SystemTime;

/// Front-matter date format (`2024/03/01`).
pub const ARTICLE_DATE_FORMAT: &str = "%Y/%m/%d";

/// Parse a front-matter date. Returns `None` when the string does not match
/// [`ARTICLE_DATE_FORMAT`] or names a day that does not exist.
pub fn parse_article_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ARTICLE_DATE_FORMAT).ok()
}

/// RFC 2822 timestamp at midnight UTC, as rss `pubDate` expects.
pub fn to_rfc2822(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).and_utc().to_rfc2822()
}

/// `YYYY-MM-DD` (UTC) for sitemap `lastmod`.
pub fn to_ymd(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format("%Y-%m-%d").to_string()
}
