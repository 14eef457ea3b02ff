#[cfg(test)]
mod tests {
    use crate::availability::{compute_available_slots, slot_grid, BookedInterval};
    use crate::calendar::{format_time, minutes_of_day, parse_time, time_from_minutes};
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;
    use termin_config::AvailabilityConfig;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn long_before() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn config_strategy() -> impl Strategy<Value = AvailabilityConfig> {
        (0u32..22, 1u32..12, prop_oneof![Just(30u32), Just(60u32)]).prop_map(
            |(start, span, granularity)| AvailabilityConfig {
                start_hour: start,
                end_hour: (start + span).min(23),
                slot_granularity_minutes: granularity,
                display_horizon_weeks: 0,
                ..AvailabilityConfig::default()
            },
        )
    }

    /// Non-overlapping bookings on half-hour boundaries.
    fn booked_strategy() -> impl Strategy<Value = Vec<BookedInterval>> {
        prop::collection::vec((0u32..46, 1u32..4), 0..6).prop_map(|raw| {
            let mut cursor = 0u32;
            let mut intervals = Vec::new();
            for (gap, len) in raw {
                let start = cursor + gap * 30 % 240;
                let end = start + len * 30;
                if end >= 24 * 60 {
                    break;
                }
                if let (Some(s), Some(e)) = (time_from_minutes(start), time_from_minutes(end)) {
                    intervals.push(BookedInterval::new(s, e));
                }
                cursor = end;
            }
            intervals
        })
    }

    proptest! {
        #[test]
        fn slots_stay_within_business_hours(
            config in config_strategy(),
            booked in booked_strategy(),
            duration_steps in 1u32..5,
        ) {
            let duration = duration_steps * 30;
            let slots = compute_available_slots(monday(), &config, &booked, long_before(), duration);
            for slot in slots {
                let start = minutes_of_day(parse_time(&slot).unwrap());
                prop_assert!(start >= config.start_hour * 60);
                prop_assert!(start + duration <= config.end_hour * 60);
            }
        }

        #[test]
        fn available_and_occupied_partition_the_grid(
            config in config_strategy(),
            booked in booked_strategy(),
            duration_steps in 1u32..5,
        ) {
            let duration = duration_steps * 30;
            let available = compute_available_slots(monday(), &config, &booked, long_before(), duration);

            for start in slot_grid(&config) {
                let s = minutes_of_day(start);
                let e = s + duration;
                let occupied = e > config.end_hour * 60
                    || booked.iter().any(|b| minutes_of_day(b.start) < e && s < minutes_of_day(b.end));
                let listed = available.contains(&format_time(start));
                prop_assert_eq!(listed, !occupied, "start {} duration {}", format_time(start), duration);
            }
            prop_assert!(available.len() <= slot_grid(&config).len());
        }

        #[test]
        fn output_is_sorted_and_deterministic(
            config in config_strategy(),
            booked in booked_strategy(),
        ) {
            let first = compute_available_slots(monday(), &config, &booked, long_before(), 30);
            let second = compute_available_slots(monday(), &config, &booked, long_before(), 30);
            prop_assert_eq!(&first, &second);
            let mut sorted = first.clone();
            sorted.sort();
            prop_assert_eq!(first, sorted);
        }
    }
}
