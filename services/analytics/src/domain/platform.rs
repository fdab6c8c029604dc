//! 平台展示元数据

use serde::{Deserialize, Serialize};

/// 平台的静态信息，与抓取结果无关
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// URL 中使用的标识，例如 `youtube`
    pub id: String,
    /// 展示名称，同时作为 `PlatformMetrics.name`
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl PlatformProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }

    /// 内置平台
    pub fn builtin(id: &str) -> Option<Self> {
        let (name, color, icon) = match id {
            "youtube" => ("YouTube", "#FF0000", "📹"),
            "patreon" => ("Patreon", "#FF424D", "🎨"),
            "twitch" => ("Twitch", "#9146FF", "🎮"),
            "whop" => ("Whop", "#7C3AED", "💎"),
            _ => return None,
        };
        Some(Self::new(id, name, color, icon))
    }
}
