//! 搜索意图识别
//!
//! 根据关键词与首条结果的精确匹配（不区分大小写）判断是搜歌手还是搜歌曲：
//! - 歌手：在同一歌手的结果中随机挑一首
//! - 歌曲（以及无法判断的情况）：直接取首条结果

use rand::seq::SliceRandom;
use rand::Rng;

use super::track::{SearchError, SongListing};

/// 搜索意图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIntent {
    /// 关键词等于首条结果的歌手名
    Artist,
    /// 关键词等于首条结果的歌名
    Song,
    /// 其他情况，例如 "歌手 歌名" 组合或模糊匹配
    Fallback,
}

/// 按首条结果对关键词分类
pub fn classify_intent(keyword: &str, top: &SongListing) -> SearchIntent {
    let keyword = keyword.to_lowercase();
    if keyword == top.artist.to_lowercase() {
        SearchIntent::Artist
    } else if keyword == top.title.to_lowercase() {
        SearchIntent::Song
    } else {
        SearchIntent::Fallback
    }
}

/// 选出要播放的曲目
///
/// 空结果返回 [`SearchError::NoResults`]。随机源由调用方注入。
pub fn resolve_listing<'a, R>(
    keyword: &str,
    listings: &'a [SongListing],
    rng: &mut R,
) -> Result<&'a SongListing, SearchError>
where
    R: Rng + ?Sized,
{
    let top = listings
        .first()
        .ok_or_else(|| SearchError::no_results(keyword))?;

    let intent = classify_intent(keyword, top);
    tracing::info!(keyword = %keyword, intent = ?intent, "Search intent classified");

    match intent {
        SearchIntent::Artist => {
            let artist = top.artist.to_lowercase();
            let same_artist: Vec<&SongListing> = listings
                .iter()
                .filter(|l| l.artist.to_lowercase() == artist)
                .collect();

            match same_artist.choose(rng) {
                Some(selected) => {
                    tracing::info!(
                        artist = %top.artist,
                        title = %selected.title,
                        candidates = same_artist.len(),
                        "Picked random song for artist"
                    );
                    Ok(*selected)
                }
                None => {
                    tracing::warn!(
                        artist = %top.artist,
                        "No songs matched the top artist, using top result"
                    );
                    Ok(top)
                }
            }
        }
        SearchIntent::Song | SearchIntent::Fallback => {
            tracing::info!(title = %top.title, "Using top result");
            Ok(top)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn listings() -> Vec<SongListing> {
        vec![
            SongListing::new("/music/1", "江南", "林俊杰"),
            SongListing::new("/music/2", "晴天", "周杰伦"),
            SongListing::new("/music/3", "修炼爱情", "林俊杰"),
        ]
    }

    #[test]
    fn test_classify_intent() {
        let top = SongListing::new("/music/1", "Hello", "Adele");
        assert_eq!(classify_intent("ADELE", &top), SearchIntent::Artist);
        assert_eq!(classify_intent("hello", &top), SearchIntent::Song);
        assert_eq!(classify_intent("adele hello", &top), SearchIntent::Fallback);
    }

    #[test]
    fn test_artist_intent_picks_only_matching_artist() {
        let listings = listings();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            let selected = resolve_listing("林俊杰", &listings, &mut rng).unwrap();
            assert_eq!(selected.artist, "林俊杰");
            seen.insert(selected.link.clone());
        }

        // 两首候选都应被选中过，第三首永远不会
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("/music/1"));
        assert!(seen.contains("/music/3"));
    }

    #[test]
    fn test_song_intent_returns_top_result() {
        let listings = listings();
        let mut rng = StdRng::seed_from_u64(1);
        let selected = resolve_listing("江南", &listings, &mut rng).unwrap();
        assert_eq!(selected, &listings[0]);
    }

    #[test]
    fn test_fallback_intent_returns_top_result() {
        let listings = listings();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let selected = resolve_listing("林俊杰 江南", &listings, &mut rng).unwrap();
            assert_eq!(selected, &listings[0]);
        }
    }

    #[test]
    fn test_empty_listings_is_no_results() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = resolve_listing("anything", &[], &mut rng).unwrap_err();
        assert!(err.is_no_results());
        assert!(err.to_string().contains("anything"));
    }
}
