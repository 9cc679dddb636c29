//! 时间工具函数 (业务时区转换)
//!
//! 所有预订时间在进入核心逻辑前统一转换为业务时区 (`Tz`)，
//! 存储层写入带偏移量的 RFC 3339 字符串。

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime,
    SecondsFormat, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;

/// 无时区格式 (按业务时区解释)
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// 解析 ISO 8601 时间字符串 → 业务时区
///
/// - 带偏移量 (`2026-10-18T19:30:00+02:00`, `...Z`) 直接换算
/// - 不带偏移量 (`2026-10-18T19:30`) 视为业务时区本地时间
pub fn parse_instant(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&tz));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| localize(naive, tz))
}

/// 本地时间 → 业务时区
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，按 UTC 解释。
pub fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    naive
        .and_local_timezone(tz)
        .latest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// 日期 + 时间 → 业务时区
pub fn at(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Tz> {
    localize(date.and_time(time), tz)
}

/// 存储格式: `2026-10-18T19:30:00+02:00`
pub fn to_store_string(instant: &DateTime<Tz>) -> String {
    instant
        .fixed_offset()
        .to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// 创建时间戳 (UTC, 毫秒精度)
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 业务时区当前日期
pub fn today(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// 本周一 00:00 到下周一 00:00 (业务时区)
pub fn week_bounds(date: NaiveDate, tz: Tz) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    let start = at(monday, NaiveTime::MIN, tz).fixed_offset();
    let end = at(monday + Duration::days(7), NaiveTime::MIN, tz).fixed_offset();
    (start, end)
}

/// 下月 1 日 00:00 (业务时区)，即本月查询的开区间终点
pub fn month_end(date: NaiveDate, tz: Tz) -> DateTime<FixedOffset> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date + Duration::days(1));
    at(first, NaiveTime::MIN, tz).fixed_offset()
}

/// 解析 `sun,mon` 形式的星期列表
pub fn parse_weekdays(value: &str) -> Result<Vec<Weekday>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Weekday>()
                .map_err(|_| format!("unknown weekday '{}'", s))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const PARIS: Tz = chrono_tz::Europe::Paris;

    #[test]
    fn test_parse_offset_instant_converts_to_business_tz() {
        let dt = parse_instant("2026-10-18T17:30:00Z", PARIS).unwrap();
        // CEST (+02:00) in October before the switch
        assert_eq!(dt.hour(), 19);
        assert_eq!(dt.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
    }

    #[test]
    fn test_parse_naive_instant_is_local() {
        let dt = parse_instant("2026-10-18T12:30", PARIS).unwrap();
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.minute(), 30);

        let dt = parse_instant("2026-10-18T12:30:00", PARIS).unwrap();
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_invalid_instant() {
        assert!(parse_instant("", PARIS).is_none());
        assert!(parse_instant("tomorrow at noon", PARIS).is_none());
        assert!(parse_instant("2026-13-40T12:00", PARIS).is_none());
    }

    #[test]
    fn test_store_string_round_trips_through_parse() {
        let dt = at(
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            PARIS,
        );
        let stored = to_store_string(&dt);
        assert_eq!(stored, "2026-10-18T19:30:00+02:00");
        assert_eq!(parse_instant(&stored, PARIS).unwrap(), dt);
    }

    #[test]
    fn test_month_end_is_first_of_next_month() {
        let end = month_end(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), PARIS);
        assert_eq!(end.to_rfc3339(), "2026-11-01T00:00:00+01:00");
        let end = month_end(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(), PARIS);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn test_week_bounds_start_on_monday() {
        // 2026-10-18 is a Sunday
        let (start, end) = week_bounds(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), PARIS);
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 12).unwrap());
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    }

    #[test]
    fn test_parse_weekdays() {
        assert_eq!(parse_weekdays("sun, mon").unwrap(), vec![Weekday::Sun, Weekday::Mon]);
        assert!(parse_weekdays("").unwrap().is_empty());
        assert!(parse_weekdays("funday").is_err());
    }
}
