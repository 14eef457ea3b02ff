#[cfg(test)]
mod tests {
    use crate::availability::{
        compute_available_slots, explain_slot, slot_grid, BookedInterval, SlotExclusion,
    };
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use termin_config::AvailabilityConfig;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_time(hm(h, m))
    }

    /// The Friday before, so nothing on Monday is in the past.
    fn before() -> NaiveDateTime {
        at(NaiveDate::from_ymd_opt(2025, 5, 30).unwrap(), 8, 0)
    }

    fn business_hours() -> AvailabilityConfig {
        AvailabilityConfig {
            start_hour: 9,
            end_hour: 17,
            slot_granularity_minutes: 30,
            include_weekend: false,
            ..AvailabilityConfig::default()
        }
    }

    #[test]
    fn full_day_has_sixteen_half_hour_slots() {
        let slots = compute_available_slots(monday(), &business_hours(), &[], before(), 30);
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first().map(String::as_str), Some("09:00"));
        assert_eq!(slots.last().map(String::as_str), Some("16:30"));
    }

    #[test]
    fn booking_removes_its_slot() {
        let booked = [BookedInterval::new(hm(9, 0), hm(9, 30))];
        let slots = compute_available_slots(monday(), &business_hours(), &booked, before(), 30);
        assert_eq!(slots.len(), 15);
        assert!(!slots.contains(&"09:00".to_string()));
        assert_eq!(slots[0], "09:30");
    }

    #[test]
    fn enormous_duration_fits_nowhere() {
        let slots =
            compute_available_slots(monday(), &business_hours(), &[], before(), u32::MAX);
        assert!(slots.is_empty());
        assert_eq!(
            explain_slot(monday(), hm(16, 30), &business_hours(), &[], before(), u32::MAX),
            Some(SlotExclusion::OutsideHours)
        );
    }

    #[test]
    fn huge_display_horizon_means_no_horizon() {
        let config = AvailabilityConfig {
            display_horizon_weeks: u32::MAX,
            ..business_hours()
        };
        assert_eq!(compute_available_slots(monday(), &config, &[], before(), 30).len(), 16);
    }

    #[test]
    fn longer_duration_must_fit_before_closing() {
        let slots = compute_available_slots(monday(), &business_hours(), &[], before(), 90);
        assert_eq!(slots.last().map(String::as_str), Some("15:30"));
        assert!(!slots.contains(&"16:00".to_string()));
    }

    #[test]
    fn longer_duration_skips_starts_running_into_bookings() {
        let booked = [BookedInterval::new(hm(10, 0), hm(10, 30))];
        let slots = compute_available_slots(monday(), &business_hours(), &booked, before(), 60);
        assert!(slots.contains(&"09:00".to_string()));
        assert!(!slots.contains(&"09:30".to_string()));
        assert!(!slots.contains(&"10:00".to_string()));
        assert!(slots.contains(&"10:30".to_string()));
    }

    #[test]
    fn hourly_grid() {
        let config = AvailabilityConfig {
            slot_granularity_minutes: 60,
            ..business_hours()
        };
        let grid = slot_grid(&config);
        assert_eq!(grid.len(), 8);
        assert_eq!(grid[1], hm(10, 0));
    }

    #[test]
    fn past_slots_are_hidden_on_the_current_day() {
        let now = at(monday(), 11, 10);
        let slots = compute_available_slots(monday(), &business_hours(), &[], now, 30);
        assert_eq!(slots.first().map(String::as_str), Some("11:30"));
        // A slot starting exactly now is still bookable.
        let exact = compute_available_slots(monday(), &business_hours(), &[], at(monday(), 11, 0), 30);
        assert_eq!(exact.first().map(String::as_str), Some("11:00"));
    }

    #[test]
    fn weekend_depends_on_flag() {
        let saturday = NaiveDate::from_ymd_opt(2025, 6, 7).unwrap();
        assert!(compute_available_slots(saturday, &business_hours(), &[], before(), 30).is_empty());

        let config = AvailabilityConfig {
            include_weekend: true,
            ..business_hours()
        };
        assert_eq!(compute_available_slots(saturday, &config, &[], before(), 30).len(), 16);
    }

    #[test]
    fn horizon_limits_how_far_ahead() {
        let config = AvailabilityConfig {
            display_horizon_weeks: 1,
            ..business_hours()
        };
        let now = before();
        let within = NaiveDate::from_ymd_opt(2025, 6, 6).unwrap();
        let beyond = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        assert!(!compute_available_slots(within, &config, &[], now, 30).is_empty());
        assert!(compute_available_slots(beyond, &config, &[], now, 30).is_empty());

        let unlimited = AvailabilityConfig {
            display_horizon_weeks: 0,
            ..business_hours()
        };
        let far = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(compute_available_slots(far, &unlimited, &[], now, 30).len(), 16);
    }

    #[test]
    fn lock_until_hides_earlier_slots() {
        let config = AvailabilityConfig {
            lock_until: Some(at(monday(), 12, 0)),
            ..business_hours()
        };
        let slots = compute_available_slots(monday(), &config, &[], before(), 30);
        assert_eq!(slots.first().map(String::as_str), Some("12:00"));
    }

    #[test]
    fn locked_without_date_hides_everything() {
        let config = AvailabilityConfig {
            locked: true,
            ..business_hours()
        };
        assert!(compute_available_slots(monday(), &config, &[], before(), 30).is_empty());

        // An explicit lock date takes precedence over the flag.
        let dated = AvailabilityConfig {
            locked: true,
            lock_until: Some(at(monday(), 16, 0)),
            ..business_hours()
        };
        assert_eq!(compute_available_slots(monday(), &dated, &[], before(), 30), vec!["16:00", "16:30"]);
    }

    #[test]
    fn zero_duration_yields_nothing() {
        assert!(compute_available_slots(monday(), &business_hours(), &[], before(), 0).is_empty());
    }

    #[test]
    fn explains_the_first_failing_rule() {
        let config = business_hours();
        let booked = [BookedInterval::new(hm(9, 0), hm(10, 0))];
        let explain = |start, now, duration| explain_slot(monday(), start, &config, &booked, now, duration);

        assert_eq!(explain(hm(9, 15), before(), 30), Some(SlotExclusion::NotOnGrid));
        assert_eq!(explain(hm(16, 30), before(), 60), Some(SlotExclusion::OutsideHours));
        assert_eq!(explain(hm(9, 0), at(monday(), 12, 0), 30), Some(SlotExclusion::Past));
        assert_eq!(explain(hm(9, 30), before(), 30), Some(SlotExclusion::Overlap));
        assert_eq!(explain(hm(10, 0), before(), 30), None);
        assert_eq!(explain(hm(10, 0), before(), 0), Some(SlotExclusion::InvalidDuration));
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let booked = [BookedInterval::new(hm(13, 0), hm(14, 30))];
        let first = compute_available_slots(monday(), &business_hours(), &booked, before(), 60);
        let second = compute_available_slots(monday(), &business_hours(), &booked, before(), 60);
        assert_eq!(first, second);
    }
}
