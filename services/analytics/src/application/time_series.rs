//! 时间序列构建
//!
//! 以今天为最后一天、固定回看窗口，按天对所有平台的样本求和。缺失的日期为零，
//! 窗口外的样本被忽略。

use chrono::{Days, NaiveDate};
use creator_config::MAX_TIME_SERIES_DAYS;

use crate::domain::{DailySample, TimeSeriesPoint};

/// 时间序列构建器
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesBuilder {
    days: u32,
}

impl TimeSeriesBuilder {
    /// 窗口长度限制在 `1..=MAX_TIME_SERIES_DAYS`
    pub fn new(days: u32) -> Self {
        Self {
            days: days.clamp(1, MAX_TIME_SERIES_DAYS),
        }
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// 构建按日期升序排列的序列
    pub fn build<'a, I>(&self, today: NaiveDate, histories: I) -> Vec<TimeSeriesPoint>
    where
        I: IntoIterator<Item = &'a [DailySample]>,
    {
        let start = today
            .checked_sub_days(Days::new(u64::from(self.days - 1)))
            .unwrap_or(NaiveDate::MIN);
        let mut buckets = vec![(0u64, 0u64, 0u64); self.days as usize];

        for sample in histories.into_iter().flatten() {
            let offset = (sample.date - start).num_days();
            let Ok(index) = usize::try_from(offset) else {
                continue;
            };
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.0 = bucket.0.saturating_add(sample.revenue);
                bucket.1 = bucket.1.saturating_add(sample.subscribers);
                bucket.2 = bucket.2.saturating_add(sample.views);
            }
        }

        buckets
            .into_iter()
            .zip(start.iter_days())
            .map(|((revenue, subscribers, views), date)| TimeSeriesPoint {
                date: date.format("%b %d").to_string(),
                revenue,
                subscribers,
                views,
            })
            .collect()
    }
}
