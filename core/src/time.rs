// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Time related utils.

use crate::Error;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Utc;

/// DateTime is the alias of `chrono::DateTime<Utc>`.
pub type DateTime = chrono::DateTime<Utc>;

/// Create datetime of now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into SAS format: `2022-03-13T07:20:04Z`
///
/// Storage services reject fractional seconds, so they are dropped.
pub fn format_sas_datetime(t: DateTime) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Format time into http date: `Sun, 06 Nov 1994 08:49:37 GMT`
///
/// ## Note
///
/// HTTP date is slightly different from RFC2822.
///
/// - Timezone is fixed to GMT.
/// - Day must be 2 digit.
pub fn format_http_date(t: DateTime) -> String {
    t.format("%a, %d %b %Y %T GMT").to_string()
}

/// Parse a client supplied date/time.
///
/// Accepted forms:
///
/// - RFC3339: `2199-03-12T07:00:00Z`, `2199-03-12T09:00:00+02:00`
/// - Without offset, taken as UTC: `2199-03-12T07:00:00`
/// - Date only, taken as midnight UTC: `2199-03-12`
pub fn parse_datetime(s: &str) -> crate::Result<DateTime> {
    let s = s.trim();

    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(t.and_utc());
    }
    if let Some(t) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(t.and_utc());
    }

    Err(Error::expiration_invalid(format!(
        "expiry is not a valid date/time: {s}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2199, 3, 12, 7, 0, 0).unwrap()
    }

    #[test]
    fn test_format_sas_datetime() {
        let t = test_time() + chrono::Duration::milliseconds(345);
        assert_eq!("2199-03-12T07:00:00Z", format_sas_datetime(t));
    }

    #[test]
    fn test_format_http_date() {
        let t = Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap();
        assert_eq!("Tue, 01 Mar 2022 08:12:34 GMT", format_http_date(t));
    }

    #[test]
    fn test_parse_datetime() {
        let cases = vec![
            ("2199-03-12T07:00:00Z", test_time()),
            ("2199-03-12T07:00:00.000Z", test_time()),
            ("2199-03-12T09:00:00+02:00", test_time()),
            ("2199-03-12T07:00:00", test_time()),
            (
                "2199-03-12",
                Utc.with_ymd_and_hms(2199, 3, 12, 0, 0, 0).unwrap(),
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(parse_datetime(input).unwrap(), expected, "input: {input}");
        }
    }

    #[test]
    fn test_parse_datetime_invalid() {
        for input in ["", "tomorrow", "2199-13-12", "12/03/2199"] {
            let err = parse_datetime(input).unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::ExpirationInvalid, "{input}");
        }
    }
}
