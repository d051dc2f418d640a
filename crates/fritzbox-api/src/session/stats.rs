// Statistics, logbook and overview pages

use chrono::{Days, Local};
use serde_json::Value;
use tracing::debug;

use crate::decode::{
    CounterPeriod, DailyUsage, DataDecoder, Decoder, JsonDecoder, LogEntry, LogbookDecoder,
    OnlineCounterDecoder, OnlineCounterRow, TrafficVolume, TrafficVolumeDecoder,
};
use crate::error::Error;
use crate::session::{DATA_PAGE, Session};
use crate::transport::{Form, Transport};

const DSL_SPECTRUM_PAGE: &str = "/internet/dsl_spectrum.lua";
const DSL_STATS_PAGE: &str = "/internet/dsl_stats_graph.lua";

impl<T: Transport> Session<T> {
    fn online_counter_page(&self) -> Result<String, Error> {
        let form = Form::new()
            .field("page", "netCnt")
            .field("lang", "de")
            .field("xhr", 1);
        self.post_form(DATA_PAGE, &form)
    }

    /// All rows of the online counter, today first.
    pub fn online_counter(&self) -> Result<Vec<OnlineCounterRow>, Error> {
        OnlineCounterDecoder.decode(&self.online_counter_page()?)
    }

    /// Exact byte counters for one period.
    pub fn traffic_volume(&self, period: CounterPeriod) -> Result<TrafficVolume, Error> {
        TrafficVolumeDecoder::new(period).decode(&self.online_counter_page()?)
    }

    /// Yesterday's usage: online time and connections from the counter
    /// table, volumes from the byte counters.
    pub fn yesterday_usage(&self) -> Result<DailyUsage, Error> {
        let body = self.online_counter_page()?;
        let rows = OnlineCounterDecoder.decode(&body)?;
        let row = rows
            .iter()
            .find(|r| r.period == CounterPeriod::Yesterday)
            .ok_or_else(|| Error::decode("online counter has no row for yesterday", &body))?;
        let volume = TrafficVolumeDecoder::new(CounterPeriod::Yesterday).decode(&body)?;

        let date = Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        debug!(%date, "assembled daily usage");

        Ok(DailyUsage {
            date,
            online_time: row.online_time.clone(),
            total_mb: volume.total_mb(),
            download_mb: volume.received_mb(),
            upload_mb: volume.sent_mb(),
            connections: row.connections,
        })
    }

    /// Raw DSL spectrum data.
    pub fn dsl_spectrum(&self) -> Result<Value, Error> {
        let body = self.get_page(DSL_SPECTRUM_PAGE, &Form::new().field("useajax", 1))?;
        JsonDecoder::<Value>::new().decode(&body)
    }

    /// Raw DSL error statistics graph data.
    pub fn dsl_stats(&self) -> Result<Value, Error> {
        let body = self.get_page(DSL_STATS_PAGE, &Form::new().field("useajax", 1))?;
        JsonDecoder::<Value>::new().decode(&body)
    }

    /// The system logbook, newest first as the router sends it.
    pub fn logbook(&self) -> Result<Vec<LogEntry>, Error> {
        let form = Form::new()
            .field("page", "log")
            .field("lang", "de")
            .field("xhrid", "all")
            .field("xhr", 1);
        LogbookDecoder.decode(&self.post_form(DATA_PAGE, &form)?)
    }

    /// The `data` object of the home overview page.
    pub fn overview(&self) -> Result<Value, Error> {
        let form = Form::new()
            .field("page", "overview")
            .field("lang", "de")
            .field("xhr", 1)
            .field("xhrID", "all");
        DataDecoder::<Value>::new().decode(&self.post_form(DATA_PAGE, &form)?)
    }
}
