//! 演示数据
//!
//! `aggregation.demo_mode = true` 时代替真实平台，返回固定的指标和带上升趋势与随机波动的每日历史。

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use rand::Rng;

use crate::domain::{DailySample, FetchOutcome, PlatformFetcher, RawPlatformResult};

pub struct DemoFetcher {
    sample: RawPlatformResult,
    days: u32,
}

impl DemoFetcher {
    /// 内置平台的演示数据，未知平台返回 `None`
    pub fn for_platform(id: &str, days: u32) -> Option<Self> {
        // (收入（元）, 订阅, 播放, 互动率)
        let (revenue, subscribers, views, engagement) = match id {
            "patreon" => (4250, 127, None, 85.0),
            "youtube" => (2180, 45_300, Some(284_000), 72.0),
            "twitch" => (3890, 892, Some(156_000), 68.0),
            "whop" => (1560, 43, None, 90.0),
            _ => return None,
        };

        Some(Self {
            sample: RawPlatformResult {
                revenue: revenue * 100,
                subscribers,
                views,
                engagement: Some(engagement),
                history: Vec::new(),
            },
            days: days.max(1),
        })
    }

    fn history(&self, today: NaiveDate) -> Vec<DailySample> {
        let mut rng = rand::thread_rng();
        let days = u64::from(self.days);
        let daily_revenue = self.sample.revenue / days;
        let daily_views = self.sample.views.unwrap_or(0) / days;

        (0..days)
            .filter_map(|i| {
                let date = today.checked_sub_days(Days::new(days - 1 - i))?;
                // 从 80% 线性上升到 120%，叠加 ±10% 波动
                let trend = 0.8 + 0.4 * i as f64 / days as f64;
                let mut scaled = |base: u64| {
                    (base as f64 * (trend + rng.gen_range(-0.1..0.1))).max(0.0) as u64
                };
                Some(DailySample {
                    date,
                    revenue: scaled(daily_revenue),
                    subscribers: scaled(self.sample.subscribers),
                    views: scaled(daily_views),
                })
            })
            .collect()
    }
}

#[async_trait]
impl PlatformFetcher for DemoFetcher {
    async fn fetch(&self) -> FetchOutcome {
        let history = self.history(Utc::now().date_naive());
        Ok(RawPlatformResult {
            history,
            ..self.sample.clone()
        })
    }
}
