//! Business-hours-aware TTL computation.
//!
//! Upstream reference rates are published once a day at a known local
//! time (e.g. 16:00 CET plus a processing buffer). A cached table must
//! never outlive the next publication, and must refresh more eagerly
//! during business hours than overnight. The policy is a pure function
//! of the current instant, so it can be tested without a clock.

use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;

/// TTL policy for cached rate tables.
#[derive(Clone, Debug)]
pub struct TtlPolicy {
    /// Reference timezone of the upstream publication schedule.
    pub timezone: Tz,
    /// Local hour at which the upstream publishes new rates.
    pub publication_hour: u32,
    /// Safety buffer after the publication hour.
    pub publication_buffer: Duration,
    /// TTL ceiling while inside the business window.
    pub business_ttl: Duration,
    /// TTL ceiling outside the business window.
    pub off_hours_ttl: Duration,
    /// Business window start hour (inclusive), local time.
    pub business_start_hour: u32,
    /// Business window end hour (exclusive), local time.
    pub business_end_hour: u32,
}

impl TtlPolicy {
    /// Compute the TTL for an entry cached at `now`.
    ///
    /// The result is the tighter of the applicable ceiling and the time
    /// remaining until the next scheduled publication, so the cache
    /// never serves data past the next known upstream refresh point.
    pub fn ttl_at(&self, now: DateTime<Utc>) -> Duration {
        let local = now.with_timezone(&self.timezone).naive_local();

        let publication = chrono::Duration::hours(i64::from(self.publication_hour.min(23)))
            + chrono::Duration::from_std(self.publication_buffer).unwrap_or_default();

        let mut next_publication = local.date().and_hms_opt(0, 0, 0).unwrap_or(local) + publication;
        if local >= next_publication {
            next_publication += chrono::Duration::days(1);
        }

        let remaining = (next_publication - local).to_std().unwrap_or_default();

        let hour = local.hour();
        let ceiling = if hour >= self.business_start_hour && hour < self.business_end_hour {
            self.business_ttl
        } else {
            self.off_hours_ttl
        };

        remaining.min(ceiling)
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Europe::Berlin,
            publication_hour: 16,
            publication_buffer: Duration::from_secs(15 * 60),
            business_ttl: Duration::from_secs(30 * 60),
            off_hours_ttl: Duration::from_secs(6 * 60 * 60),
            business_start_hour: 8,
            business_end_hour: 18,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Policy pinned to UTC with no buffer so the arithmetic is legible.
    fn utc_policy() -> TtlPolicy {
        TtlPolicy {
            timezone: chrono_tz::UTC,
            publication_hour: 16,
            publication_buffer: Duration::ZERO,
            business_ttl: Duration::from_secs(30 * 60),
            off_hours_ttl: Duration::from_secs(6 * 60 * 60),
            business_start_hour: 8,
            business_end_hour: 18,
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_business_hours_ttl_capped_by_ceiling() {
        // 10:00, six hours before publication: the 30-minute business
        // ceiling is the binding constraint.
        let ttl = utc_policy().ttl_at(at(10, 0));
        assert_eq!(ttl, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_ttl_never_exceeds_time_to_publication() {
        // 15:45, fifteen minutes before publication.
        let ttl = utc_policy().ttl_at(at(15, 45));
        assert_eq!(ttl, Duration::from_secs(15 * 60));
    }

    #[test]
    fn test_off_hours_ttl_capped_by_off_ceiling() {
        // 20:00, twenty hours until tomorrow's publication: the 6-hour
        // off-hours ceiling binds.
        let ttl = utc_policy().ttl_at(at(20, 0));
        assert_eq!(ttl, Duration::from_secs(6 * 60 * 60));
    }

    #[test]
    fn test_publication_rolls_to_next_day() {
        // 16:30 is past today's publication; next one is tomorrow 16:00,
        // and inside the business window the 30-minute ceiling binds.
        let ttl = utc_policy().ttl_at(at(16, 30));
        assert_eq!(ttl, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_early_morning_respects_remaining_time() {
        // 03:00 off-hours: 13 hours remain, ceiling is 6 hours.
        let ttl = utc_policy().ttl_at(at(3, 0));
        assert_eq!(ttl, Duration::from_secs(6 * 60 * 60));
    }

    #[test]
    fn test_publication_buffer_shifts_the_deadline() {
        let policy = TtlPolicy {
            publication_buffer: Duration::from_secs(15 * 60),
            ..utc_policy()
        };
        // 16:10 is before 16:15 (hour + buffer): five minutes remain.
        let ttl = policy.ttl_at(at(16, 10));
        assert_eq!(ttl, Duration::from_secs(5 * 60));
    }

    #[test]
    fn test_timezone_is_respected() {
        let policy = TtlPolicy {
            timezone: chrono_tz::Europe::Berlin,
            ..utc_policy()
        };
        // 2025-03-12 14:45 UTC is 15:45 in Berlin (CET, +1): fifteen
        // minutes to the 16:00 local publication.
        let ttl = policy.ttl_at(at(14, 45));
        assert_eq!(ttl, Duration::from_secs(15 * 60));
    }
}
