pub struct RuleCase {
    pub name: &'static str,
    pub dtstart: &'static str,
    pub tzid: &'static str,
    pub rule: &'static str,
    pub expected: &'static [&'static str],
    pub limit: usize,
}

impl RuleCase {
    pub fn start(&self) -> chrono::DateTime<chrono_tz::Tz> {
        let tz: chrono_tz::Tz = self
            .tzid
            .parse()
            .unwrap_or_else(|err| panic!("Case {} has bad zone: {err}", self.name));
        let naive = chrono::NaiveDateTime::parse_from_str(self.dtstart, "%Y%m%dT%H%M%S")
            .unwrap_or_else(|err| panic!("Case {} has bad DTSTART: {err}", self.name));
        chrono::TimeZone::from_local_datetime(&tz, &naive)
            .single()
            .unwrap_or_else(|| panic!("Case {} has an ambiguous DTSTART", self.name))
    }

    pub fn expected_timestamps(&self) -> Vec<i64> {
        self.expected
            .iter()
            .map(|value| {
                chrono::DateTime::parse_from_rfc3339(value)
                    .unwrap_or_else(|err| panic!("Failed to parse rfc3339 value {value}: {err}"))
                    .timestamp()
            })
            .collect()
    }
}

#[expect(clippy::too_many_lines)]
pub fn rule_cases() -> Vec<RuleCase> {
    vec![
        RuleCase {
            name: "daily_interval_until",
            dtstart: "20240701T080000",
            tzid: "America/Toronto",
            rule: "FREQ=DAILY;INTERVAL=3;UNTIL=20240714T040000Z",
            expected: &[
                "2024-07-01T08:00:00-04:00",
                "2024-07-04T08:00:00-04:00",
                "2024-07-07T08:00:00-04:00",
                "2024-07-10T08:00:00-04:00",
                "2024-07-13T08:00:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "weekly_by_day_until",
            dtstart: "20240701T080000",
            tzid: "America/Toronto",
            rule: "FREQ=WEEKLY;BYDAY=MO,WE,FR;UNTIL=20240713T040000Z",
            expected: &[
                "2024-07-01T08:00:00-04:00",
                "2024-07-03T08:00:00-04:00",
                "2024-07-05T08:00:00-04:00",
                "2024-07-08T08:00:00-04:00",
                "2024-07-10T08:00:00-04:00",
                "2024-07-12T08:00:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "monthly_by_month_day",
            dtstart: "20240701T080000",
            tzid: "America/Toronto",
            rule: "FREQ=MONTHLY;COUNT=3;BYMONTHDAY=1",
            expected: &[
                "2024-07-01T08:00:00-04:00",
                "2024-08-01T08:00:00-04:00",
                "2024-09-01T08:00:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "monthly_first_monday",
            dtstart: "20240701T080000",
            tzid: "America/Toronto",
            rule: "FREQ=MONTHLY;COUNT=3;BYDAY=MO;BYSETPOS=1",
            expected: &[
                "2024-07-01T08:00:00-04:00",
                "2024-08-05T08:00:00-04:00",
                "2024-09-02T08:00:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "yearly_by_month",
            dtstart: "20240701T080000",
            tzid: "America/Toronto",
            rule: "FREQ=YEARLY;COUNT=3;BYMONTH=7",
            expected: &[
                "2024-07-01T08:00:00-04:00",
                "2025-07-01T08:00:00-04:00",
                "2026-07-01T08:00:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "yearly_first_monday_of_july",
            dtstart: "20240701T080000",
            tzid: "America/Toronto",
            rule: "FREQ=YEARLY;COUNT=3;BYMONTH=7;BYDAY=MO;BYSETPOS=1",
            expected: &[
                "2024-07-01T08:00:00-04:00",
                "2025-07-07T08:00:00-04:00",
                "2026-07-06T08:00:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "daily_keeps_wall_clock_across_dst",
            dtstart: "20240309T093000",
            tzid: "America/New_York",
            rule: "FREQ=DAILY;COUNT=3",
            expected: &[
                "2024-03-09T09:30:00-05:00",
                "2024-03-10T09:30:00-04:00",
                "2024-03-11T09:30:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "weekly_utc_tu_th",
            dtstart: "19970902T090000",
            tzid: "UTC",
            rule: "FREQ=WEEKLY;COUNT=3;BYDAY=TU,TH",
            expected: &[
                "1997-09-02T09:00:00+00:00",
                "1997-09-04T09:00:00+00:00",
                "1997-09-09T09:00:00+00:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "monthly_last_friday",
            dtstart: "20240126T120000",
            tzid: "Europe/Berlin",
            rule: "FREQ=MONTHLY;COUNT=3;BYDAY=-1FR",
            expected: &[
                "2024-01-26T12:00:00+01:00",
                "2024-02-23T12:00:00+01:00",
                "2024-03-29T12:00:00+01:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "start_outside_pattern_is_first",
            dtstart: "20240701T080000",
            tzid: "America/Toronto",
            rule: "FREQ=WEEKLY;COUNT=3;BYDAY=TU",
            expected: &[
                "2024-07-01T08:00:00-04:00",
                "2024-07-02T08:00:00-04:00",
                "2024-07-09T08:00:00-04:00",
            ],
            limit: 100,
        },
        RuleCase {
            name: "endless_hourly_limited_by_caller",
            dtstart: "20120101T090000",
            tzid: "UTC",
            rule: "FREQ=HOURLY",
            expected: &[
                "2012-01-01T09:00:00+00:00",
                "2012-01-01T10:00:00+00:00",
                "2012-01-01T11:00:00+00:00",
            ],
            limit: 3,
        },
    ]
}
