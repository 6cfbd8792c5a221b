//! Track Context - Value Objects

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 搜索结果中的一首歌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongListing {
    /// 播放页相对路径，例如 `/music/39466`
    pub link: String,
    pub title: String,
    pub artist: String,
}

impl SongListing {
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            artist: artist.into(),
        }
    }
}

/// 播放页数据
///
/// 页面内嵌 JSON 的全部字段，加上单独提取的歌词（`lrc` 键）。
/// 字段集合由上游决定，这里只为常用字段提供访问器。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackPlayInfo(Map<String, Value>);

impl TrackPlayInfo {
    pub const PLAY_ID_KEY: &'static str = "play_id";
    pub const TITLE_KEY: &'static str = "mp3_title";
    pub const ARTIST_KEY: &'static str = "mp3_author";
    pub const COVER_KEY: &'static str = "mp3_cover";
    pub const LYRICS_KEY: &'static str = "lrc";
    pub const LYRICS_URL_KEY: &'static str = "lrc_url";

    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// 合并歌词文本，覆盖同名字段
    pub fn with_lyrics(mut self, lyrics: impl Into<String>) -> Self {
        self.0
            .insert(Self::LYRICS_KEY.to_string(), Value::String(lyrics.into()));
        self
    }

    /// 读取字符串字段；数字字段按十进制文本返回
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn play_id(&self) -> Option<String> {
        self.get_str(Self::PLAY_ID_KEY).filter(|id| !id.is_empty())
    }

    pub fn title(&self) -> Option<String> {
        self.get_str(Self::TITLE_KEY)
    }

    pub fn artist(&self) -> Option<String> {
        self.get_str(Self::ARTIST_KEY)
    }

    pub fn cover_url(&self) -> Option<String> {
        self.get_str(Self::COVER_KEY)
    }

    pub fn lyrics(&self) -> String {
        self.get_str(Self::LYRICS_KEY).unwrap_or_default()
    }

    pub fn lyrics_url(&self) -> Option<String> {
        self.get_str(Self::LYRICS_URL_KEY)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// 播放地址接口响应 `{ code, data: { url, ... } }`
///
/// 地址可能与会话绑定，所以这个响应从不缓存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayUrlResult {
    #[serde(default)]
    pub code: i64,

    #[serde(default)]
    pub data: Option<PlayUrlData>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayUrlData {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlayUrlResult {
    /// 可播放地址，空字符串视为缺失
    pub fn play_url(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.url.as_deref())
            .filter(|url| !url.is_empty())
    }
}

/// 交付给调用方（以及上传协作者）的曲目记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecord {
    pub url: String,
    pub title: String,
    pub artist: String,
    pub artwork_url: String,
    pub lrc_text: String,
    pub lrc_url: String,
}

impl TrackRecord {
    pub const UNKNOWN_TITLE: &'static str = "未知歌曲";
    pub const UNKNOWN_ARTIST: &'static str = "未知歌手";

    pub fn from_play_info(info: &TrackPlayInfo, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: info
                .title()
                .unwrap_or_else(|| Self::UNKNOWN_TITLE.to_string()),
            artist: info
                .artist()
                .unwrap_or_else(|| Self::UNKNOWN_ARTIST.to_string()),
            artwork_url: info.cover_url().unwrap_or_default(),
            lrc_text: info.lyrics(),
            lrc_url: info.lyrics_url().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn play_info(value: Value) -> TrackPlayInfo {
        match value {
            Value::Object(map) => TrackPlayInfo::new(map),
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_play_id_accepts_numbers() {
        let info = play_info(json!({ "play_id": 42 }));
        assert_eq!(info.play_id().as_deref(), Some("42"));

        let info = play_info(json!({ "play_id": "" }));
        assert_eq!(info.play_id(), None);
    }

    #[test]
    fn test_with_lyrics_overrides_field() {
        let info = play_info(json!({ "lrc": "old" })).with_lyrics("new");
        assert_eq!(info.lyrics(), "new");
    }

    #[test]
    fn test_play_url_result() {
        let result: PlayUrlResult = serde_json::from_value(json!({
            "code": 1,
            "data": { "url": "https://cdn.example.com/a.mp3", "bitrate": 320 },
            "msg": "ok"
        }))
        .unwrap();
        assert_eq!(result.play_url(), Some("https://cdn.example.com/a.mp3"));
        assert_eq!(result.extra.get("msg"), Some(&json!("ok")));

        let missing: PlayUrlResult = serde_json::from_value(json!({ "code": 0 })).unwrap();
        assert_eq!(missing.play_url(), None);
    }

    #[test]
    fn test_track_record_defaults() {
        let info = play_info(json!({ "play_id": "1" }));
        let record = TrackRecord::from_play_info(&info, "https://cdn.example.com/a.mp3");
        assert_eq!(record.title, TrackRecord::UNKNOWN_TITLE);
        assert_eq!(record.artist, TrackRecord::UNKNOWN_ARTIST);
        assert_eq!(record.lrc_text, "");

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("artworkUrl").is_some());
        assert!(json.get("lrcText").is_some());
    }
}
