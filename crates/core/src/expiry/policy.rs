//! Expiry decisions and lifetime options.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::error::ExpiryError;

/// Lifetimes a client may request for an upload.
///
/// The set is closed: retention drives storage cost, so arbitrary durations
/// are never accepted from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryOption {
    /// 10 minutes.
    TenMinutes,
    /// 1 hour.
    OneHour,
    /// 24 hours.
    OneDay,
    /// 7 days.
    SevenDays,
}

impl ExpiryOption {
    /// Every option, shortest first.
    pub const ALL: [Self; 4] = [
        Self::TenMinutes,
        Self::OneHour,
        Self::OneDay,
        Self::SevenDays,
    ];

    /// Length of the option in minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::TenMinutes => 10,
            Self::OneHour => 60,
            Self::OneDay => 1440,
            Self::SevenDays => 10_080,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TenMinutes => "10 minutes",
            Self::OneHour => "1 hour",
            Self::OneDay => "24 hours",
            Self::SevenDays => "7 days",
        }
    }

    /// Length of the option as a duration.
    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::minutes(i64::from(self.minutes()))
    }

    /// Parse from a minute count; `None` for anything off the list.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.minutes() == minutes)
    }

    /// The longest offered lifetime.
    #[must_use]
    pub const fn max() -> Self {
        Self::SevenDays
    }
}

/// Returns whether a record with `expiration` is expired at `now`.
#[must_use]
pub fn is_expired(expiration: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expiration
}

/// Time left until `expiration`. Zero or negative means expired.
#[must_use]
pub fn remaining(expiration: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    expiration - now
}

/// Coarse human-readable remaining time.
///
/// Whole minutes below an hour, whole hours below a day, whole days
/// otherwise. Each tier floors.
#[must_use]
pub fn format_remaining(expiration: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = remaining(expiration, now);
    if left <= Duration::zero() {
        return "Expired".to_string();
    }

    let minutes = left.num_minutes();
    if minutes < 60 {
        format!("{minutes} minutes")
    } else if minutes < 1440 {
        format!("{} hours", minutes / 60)
    } else {
        format!("{} days", minutes / 1440)
    }
}

/// Computes the absolute expiration for a requested lifetime.
///
/// # Errors
///
/// Returns [`ExpiryError::UnsupportedDuration`] when `requested_minutes`
/// is not one of [`ExpiryOption::ALL`].
pub fn compute_expiration(
    now: DateTime<Utc>,
    requested_minutes: u32,
) -> Result<DateTime<Utc>, ExpiryError> {
    let option = ExpiryOption::from_minutes(requested_minutes).ok_or(
        ExpiryError::UnsupportedDuration {
            minutes: requested_minutes,
        },
    )?;
    Ok(now + option.duration())
}

/// How far past the longest option a client timestamp may land and still be
/// clamped rather than rejected.
pub const CLOCK_SKEW_TOLERANCE: Duration = Duration::minutes(5);

/// Accepts a client-computed absolute expiration.
///
/// Clients compute the timestamp before the upload finishes, so it cannot be
/// matched exactly against an option. It must fall after `now`; a timestamp
/// beyond `now + longest option` is clamped to that bound when it overshoots
/// by no more than [`CLOCK_SKEW_TOLERANCE`].
///
/// # Errors
///
/// Returns [`ExpiryError::NotInFuture`] or [`ExpiryError::TooFar`].
pub fn validate_expiration(
    expiration: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ExpiryError> {
    if is_expired(expiration, now) {
        return Err(ExpiryError::NotInFuture);
    }
    let max = ExpiryOption::max();
    let latest = now + max.duration();
    if expiration <= latest {
        return Ok(expiration);
    }
    if expiration - latest > CLOCK_SKEW_TOLERANCE {
        return Err(ExpiryError::TooFar {
            max_minutes: max.minutes(),
        });
    }
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn test_expired_at_exact_boundary() {
        let now = t0();
        assert!(is_expired(now, now));
        assert!(!is_expired(now + Duration::seconds(1), now));
        assert!(is_expired(now - Duration::seconds(1), now));
    }

    #[rstest]
    #[case(Duration::seconds(30), "0 minutes")]
    #[case(Duration::minutes(5), "5 minutes")]
    #[case(Duration::minutes(59) + Duration::seconds(59), "59 minutes")]
    #[case(Duration::minutes(60), "1 hours")]
    #[case(Duration::minutes(1439), "23 hours")]
    #[case(Duration::minutes(1440), "1 days")]
    #[case(Duration::days(7), "7 days")]
    #[case(Duration::zero(), "Expired")]
    #[case(Duration::minutes(-3), "Expired")]
    fn test_format_remaining(#[case] left: Duration, #[case] expected: &str) {
        let now = t0();
        assert_eq!(format_remaining(now + left, now), expected);
    }

    #[rstest]
    #[case(10)]
    #[case(60)]
    #[case(1440)]
    #[case(10_080)]
    fn test_compute_expiration_allowed(#[case] minutes: u32) {
        let now = t0();
        let expiration = compute_expiration(now, minutes).expect("allowed duration");
        assert_eq!(expiration - now, Duration::minutes(i64::from(minutes)));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(30)]
    #[case(10_081)]
    #[case(u32::MAX)]
    fn test_compute_expiration_rejected(#[case] minutes: u32) {
        assert_eq!(
            compute_expiration(t0(), minutes),
            Err(ExpiryError::UnsupportedDuration { minutes })
        );
    }

    #[test]
    fn test_validate_expiration_bounds() {
        let now = t0();
        assert_eq!(
            validate_expiration(now, now),
            Err(ExpiryError::NotInFuture)
        );
        assert!(validate_expiration(now + Duration::minutes(9), now).is_ok());
        assert_eq!(
            validate_expiration(now + Duration::days(7), now),
            Ok(now + Duration::days(7))
        );
        assert_eq!(
            validate_expiration(now + Duration::days(7) + Duration::minutes(6), now),
            Err(ExpiryError::TooFar { max_minutes: 10_080 })
        );
    }

    #[rstest]
    #[case(Duration::seconds(1))]
    #[case(Duration::seconds(2))]
    #[case(Duration::minutes(5))]
    fn test_validate_expiration_clamps_client_skew(#[case] ahead: Duration) {
        let now = t0();
        assert_eq!(
            validate_expiration(now + Duration::days(7) + ahead, now),
            Ok(now + Duration::days(7))
        );
    }

    #[test]
    fn test_option_lookup() {
        for option in ExpiryOption::ALL {
            assert_eq!(ExpiryOption::from_minutes(option.minutes()), Some(option));
        }
        assert_eq!(ExpiryOption::from_minutes(15), None);
        assert_eq!(ExpiryOption::OneDay.label(), "24 hours");
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn any_now() -> impl Strategy<Value = DateTime<Utc>> {
        // 2000-01-01 .. 2100-01-01
        (946_684_800i64..4_102_444_800i64)
            .prop_map(|secs| DateTime::from_timestamp(secs, 0).expect("in range"))
    }

    fn any_option() -> impl Strategy<Value = ExpiryOption> {
        prop::sample::select(ExpiryOption::ALL.to_vec())
    }

    // A freshly computed expiration is live at creation and expired once
    // the full lifetime has elapsed.
    proptest! {
        #[test]
        fn prop_fresh_expiration_is_live(now in any_now(), option in any_option()) {
            let expiration = compute_expiration(now, option.minutes()).expect("allowed");
            prop_assert!(!is_expired(expiration, now));
            prop_assert!(!is_expired(expiration, expiration - Duration::seconds(1)));
            prop_assert!(is_expired(expiration, now + option.duration()));
            prop_assert!(is_expired(expiration, now + option.duration() + Duration::seconds(1)));
        }
    }

    // Off-list minute counts are always rejected.
    proptest! {
        #[test]
        fn prop_unlisted_minutes_rejected(minutes in any::<u32>()) {
            let result = compute_expiration(DateTime::<Utc>::UNIX_EPOCH, minutes);
            if ExpiryOption::from_minutes(minutes).is_some() {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(ExpiryError::UnsupportedDuration { minutes }));
            }
        }
    }

    // Remaining time and expiry agree.
    proptest! {
        #[test]
        fn prop_remaining_sign_matches_expiry(now in any_now(), offset in -100_000i64..100_000) {
            let expiration = now + Duration::seconds(offset);
            let left = remaining(expiration, now);
            prop_assert_eq!(left <= Duration::zero(), is_expired(expiration, now));
            prop_assert_eq!(format_remaining(expiration, now) == "Expired", is_expired(expiration, now));
        }
    }
}
