use vela_core::{AGGREGATE_SOURCE, Candle, Trade};

/// One open bucket for one symbol. Owned exclusively by the aggregator and
/// never escapes; observers only ever see [`Candle`] snapshots.
#[derive(Debug)]
pub(crate) struct Window {
    start_ms: i64,
    end_ms: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    vol: f64,
    sum_pv: f64,
    sum_v: f64,
    count: u64,
    last_ts: i64,
    init: bool,
}

impl Window {
    pub(crate) const fn new(start_ms: i64, end_ms: i64) -> Self {
        Self {
            start_ms,
            end_ms,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            vol: 0.0,
            sum_pv: 0.0,
            sum_v: 0.0,
            count: 0,
            last_ts: 0,
            init: false,
        }
    }

    pub(crate) const fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub(crate) const fn end_ms(&self) -> i64 {
        self.end_ms
    }

    pub(crate) const fn is_init(&self) -> bool {
        self.init
    }

    /// Fold one trade into the window.
    pub(crate) fn fold(&mut self, trade: &Trade) {
        let price = trade.price;
        if !self.init {
            self.open = price;
            self.high = price;
            self.low = price;
            self.init = true;
        }
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
        self.vol += trade.qty;
        self.sum_pv += price * trade.qty;
        self.sum_v += trade.qty;
        self.count += 1;
        self.last_ts = self.last_ts.max(trade.ts_ms());
    }

    /// Snapshot the window as an immutable candle.
    pub(crate) fn candle(&self, symbol: &str, is_final: bool) -> Candle {
        let vwap = if self.sum_v > 0.0 {
            self.sum_pv / self.sum_v
        } else {
            0.0
        };
        Candle {
            symbol: symbol.to_string(),
            window_start_ms: self.start_ms,
            window_end_ms: self.end_ms,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.vol,
            vwap,
            is_final,
            source: AGGREGATE_SOURCE.to_string(),
            last_trade_ts: self.last_ts,
            trade_count: self.count,
        }
    }
}
