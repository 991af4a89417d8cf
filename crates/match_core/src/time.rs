use chrono::{DateTime, Utc};

/// Ephemeral records live 72 hours past session end.
pub const SESSION_TTL_SECS: i64 = 72 * 3600;

/// Expiration marker for an ephemeral record, as epoch seconds.
/// Fractional seconds of `end_time` are floored before the offset is added.
pub fn ttl_epoch(end_time: &DateTime<Utc>) -> i64 {
    end_time.timestamp() + SESSION_TTL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ttl_is_exactly_72h_after_end() {
        let end = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(ttl_epoch(&end), end.timestamp() + 259_200);
    }

    #[test]
    fn ttl_floors_subsecond_end_times() {
        let end = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        assert_eq!(ttl_epoch(&end), 1_700_000_000 + 259_200);
    }
}
