//! Gequbao Page Parser - 歌曲宝页面提取
//!
//! 搜索结果页：`div.card-text` 内的每个 `a.music-link`，
//! 歌名在 `span.music-title`，歌手在 `small`。
//!
//! 播放页：`div#content-lrc` 中的歌词，以及脚本中 `window.appData = {...};` 的 JSON。
//! 上游改版只需要改这个文件。

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

use crate::application::ports::PageParserPort;
use crate::domain::{SongListing, TrackPlayInfo};

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid selector {css}: {err:?}"))
}

fn regex(pattern: &'static str, desc: &'static str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid {desc} regex: {err}"))
}

fn results_container() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("div.card-text"))
}

fn song_link() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("a.music-link"))
}

fn song_title() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("span.music-title"))
}

fn song_artist() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("small"))
}

fn lyrics_block() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("div#content-lrc"))
}

fn script_block() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| selector("script"))
}

/// `appData = ` 赋值的起点（可带 `window.` 前缀）
fn app_data_assignment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"(?:\bwindow\.)?\bappData\s*=\s*\{", "appData assignment"))
}

/// 语句结束边界 `};`
fn statement_end() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| regex(r"\}\s*;", "statement end"))
}

/// 元素内去首尾空白后的文本，空文本视为缺失
fn trimmed_text(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// 歌曲宝页面解析器
#[derive(Debug, Default, Clone, Copy)]
pub struct GequbaoPageParser;

impl GequbaoPageParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_listing_entry(link: ElementRef<'_>) -> Option<SongListing> {
        let href = link.value().attr("href").map(str::trim).filter(|h| !h.is_empty())?;
        let title = link.select(song_title()).next().and_then(trimmed_text)?;
        let artist = link.select(song_artist()).next().and_then(trimmed_text)?;
        Some(SongListing::new(href, title, artist))
    }

    /// 歌词文本，`<br>` 之间的文本按行拼接
    fn extract_lyrics(document: &Html) -> String {
        document
            .select(lyrics_block())
            .next()
            .map(|block| block.text().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }

    /// 在脚本内容中查找 `appData` 对象
    ///
    /// 从赋值处开始依次尝试每个 `};` 边界，取第一个能解析为 JSON 对象的片段
    fn extract_app_data(script: &str) -> Option<serde_json::Map<String, Value>> {
        for assignment in app_data_assignment().find_iter(script) {
            // 匹配以 `{` 结尾，对象从这里开始
            let start = assignment.end() - 1;
            let rest = &script[start..];

            for boundary in statement_end().find_iter(rest) {
                let candidate = &rest[..boundary.start() + 1];
                match serde_json::from_str::<Value>(candidate) {
                    Ok(Value::Object(map)) => return Some(map),
                    Ok(_) => break,
                    Err(e) => {
                        tracing::trace!(error = %e, "appData candidate is not valid JSON");
                    }
                }
            }
        }
        None
    }
}

impl PageParserPort for GequbaoPageParser {
    fn parse_listing(&self, html: &str) -> Vec<SongListing> {
        let document = Html::parse_document(html);

        let container = match document.select(results_container()).next() {
            Some(container) => container,
            None => {
                tracing::debug!("Search results container not found");
                return Vec::new();
            }
        };

        let mut skipped = 0usize;
        let listings: Vec<SongListing> = container
            .select(song_link())
            .filter_map(|link| {
                let entry = Self::parse_listing_entry(link);
                if entry.is_none() {
                    skipped += 1;
                }
                entry
            })
            .collect();

        tracing::debug!(found = listings.len(), skipped = skipped, "Parsed search results");
        listings
    }

    fn parse_track_page(&self, html: &str) -> Option<TrackPlayInfo> {
        let document = Html::parse_document(html);
        let lyrics = Self::extract_lyrics(&document);

        for script in document.select(script_block()) {
            let content = script.text().collect::<String>();
            if let Some(data) = Self::extract_app_data(&content) {
                tracing::debug!(
                    fields = data.len(),
                    lyrics_len = lyrics.len(),
                    "Extracted track page data"
                );
                return Some(TrackPlayInfo::new(data).with_lyrics(lyrics));
            }
        }

        tracing::error!("Failed to extract appData JSON from track page");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="card-text">
            <div class="row">
              <a class="music-link" href="/music/39466">
                <span class="music-title">园游会</span>
                <small>周杰伦</small>
              </a>
            </div>
            <div class="row">
              <a class="music-link" href="/music/100">
                <span class="music-title">没有歌手</span>
              </a>
            </div>
            <div class="row">
              <a class="music-link">
                <span class="music-title">没有链接</span>
                <small>某人</small>
              </a>
            </div>
            <div class="row">
              <a class="music-link" href="/music/200">
                <span class="music-title">  晴天 </span>
                <small> 周杰伦 </small>
              </a>
            </div>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_listing_skips_incomplete_entries() {
        let listings = GequbaoPageParser::new().parse_listing(SEARCH_PAGE);
        assert_eq!(
            listings,
            vec![
                SongListing::new("/music/39466", "园游会", "周杰伦"),
                SongListing::new("/music/200", "晴天", "周杰伦"),
            ]
        );
    }

    #[test]
    fn test_parse_listing_one_good_one_missing_artist() {
        let html = r#"
            <div class="card-text">
              <a class="music-link" href="/music/1"><span class="music-title">A</span><small>X</small></a>
              <a class="music-link" href="/music/2"><span class="music-title">B</span></a>
            </div>
        "#;
        let listings = GequbaoPageParser::new().parse_listing(html);
        assert_eq!(listings, vec![SongListing::new("/music/1", "A", "X")]);
    }

    #[test]
    fn test_parse_listing_without_container_is_empty() {
        let html = r#"<a class="music-link" href="/music/1"><span class="music-title">A</span><small>X</small></a>"#;
        assert!(GequbaoPageParser::new().parse_listing(html).is_empty());
        assert!(GequbaoPageParser::new().parse_listing("").is_empty());
    }

    #[test]
    fn test_parse_track_page() {
        let html = r#"
            <html><head>
              <script type="text/javascript">var other = 1;</script>
              <script type="text/javascript">
                window.appData = {
                  "play_id": "42",
                  "mp3_title": "园游会",
                  "mp3_author": "周杰伦",
                  "mp3_cover": "https://img.example.com/cover.jpg"
                };
                window.other = {"x": 1};
              </script>
            </head><body>
              <div id="content-lrc">[00:01]第一行<br />[00:05]第二行</div>
            </body></html>
        "#;
        let info = GequbaoPageParser::new().parse_track_page(html).unwrap();
        assert_eq!(info.play_id().as_deref(), Some("42"));
        assert_eq!(info.title().as_deref(), Some("园游会"));
        assert_eq!(info.lyrics(), "[00:01]第一行\n[00:05]第二行");
    }

    #[test]
    fn test_parse_track_page_nested_object() {
        let html = r#"<script>appData = {"play_id": "7", "extra": {"a": 1}};</script>"#;
        let info = GequbaoPageParser::new().parse_track_page(html).unwrap();
        assert_eq!(info.play_id().as_deref(), Some("7"));
        assert_eq!(info.lyrics(), "");
        assert_eq!(info.fields()["extra"]["a"], 1);
    }

    #[test]
    fn test_parse_track_page_first_valid_script_wins() {
        let html = r#"
            <script>window.appData = {broken: true};</script>
            <script>window.appData = {"play_id": "second"};</script>
            <script>window.appData = {"play_id": "third"};</script>
        "#;
        let info = GequbaoPageParser::new().parse_track_page(html).unwrap();
        assert_eq!(info.play_id().as_deref(), Some("second"));
    }

    #[test]
    fn test_parse_track_page_without_data_is_none() {
        let html = r#"<div id="content-lrc">歌词</div><script>var x = {"a": 1};</script>"#;
        assert!(GequbaoPageParser::new().parse_track_page(html).is_none());
    }
}
