//! Clock component — time variables and the minute tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use homewire_app::intercom::IntercomLink;
use homewire_app::ports::Component;
use homewire_domain::code::ComponentCode;
use homewire_domain::template::Variables;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Type tag of clock components.
pub const CLOCK_KIND: &str = "clock";

/// Event broadcast at every minute boundary.
pub const CRON_EVENT: &str = "cron-event";

/// Publishes the local time.
pub struct Clock {
    code: ComponentCode,
    name: String,
    link: IntercomLink,
}

impl Clock {
    pub fn new(code: impl Into<ComponentCode>, name: impl Into<String>, link: IntercomLink) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            link,
        }
    }

    async fn run(self: Arc<Self>) {
        loop {
            let now = Local::now();
            let wait = until_next_minute(&now);
            tokio::time::sleep(wait).await;

            let Some(boundary) = chrono::TimeDelta::from_std(wait)
                .ok()
                .and_then(|delta| now.checked_add_signed(delta))
            else {
                continue;
            };
            tracing::debug!(component = %self.code, at = %boundary, "cron tick");
            self.link.send(&self.code, CRON_EVENT, cron_payload(&boundary));
        }
    }
}

/// Time variables for `now`.
///
/// `time_dow` counts from 0 (Sunday) to 6.
#[must_use]
pub fn variables_at<Tz: TimeZone>(now: &DateTime<Tz>) -> Variables
where
    Tz::Offset: std::fmt::Display,
{
    [
        ("time_ts", "%Y%m%d%H%M%S"),
        ("time_day", "%Y%m%d"),
        ("time_hour", "%H"),
        ("time_minute", "%M"),
        ("time_second", "%S"),
        ("time_dow", "%w"),
        ("time_time", "%H%M%S"),
    ]
    .into_iter()
    .map(|(name, format)| (name.to_string(), Value::String(now.format(format).to_string())))
    .collect()
}

/// Payload of the `cron-event` raised at `at`.
///
/// `dow` counts from 1 (Monday) to 7.
#[must_use]
pub fn cron_payload<Tz: TimeZone>(at: &DateTime<Tz>) -> Value {
    json!({
        "dow": at.weekday().number_from_monday().to_string(),
        "hour": at.hour(),
        "minute": at.minute(),
    })
}

fn until_next_minute<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let elapsed = Duration::from_secs(u64::from(now.second()))
        + Duration::from_nanos(u64::from(now.nanosecond()));
    Duration::from_secs(60).saturating_sub(elapsed)
}

impl Component for Clock {
    fn code(&self) -> &ComponentCode {
        &self.code
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        CLOCK_KIND
    }

    fn variables(&self) -> Variables {
        variables_at(&Local::now())
    }

    fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        let link = self.link.clone();
        link.spawn(self.run())
    }
}
