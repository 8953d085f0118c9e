use std::collections::HashMap;

/// スレッドID × 描画幅 ごとの描画結果キャッシュ
///
/// 空のIDはキャッシュしない（毎回ビルダーを呼ぶ）。
#[derive(Debug)]
pub struct RenderCache<V> {
    entries: HashMap<String, HashMap<usize, V>>,
    hits: usize,
    misses: usize,
}

impl<V> Default for RenderCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<V> RenderCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, thread_id: &str, width: usize) -> Option<&V> {
        self.entries.get(thread_id)?.get(&width)
    }

    /// 空IDは無視
    pub fn put(&mut self, thread_id: &str, width: usize, value: V) {
        if thread_id.is_empty() {
            return;
        }
        self.entries
            .entry(thread_id.to_string())
            .or_default()
            .insert(width, value);
    }

    /// キャッシュ済みならそれを返し、なければ `build` で作って保存する
    pub fn get_or_insert_with<F>(&mut self, thread_id: &str, width: usize, build: F) -> V
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(thread_id, width) {
            let value = value.clone();
            self.hits += 1;
            return value;
        }
        self.misses += 1;
        let value = build();
        self.put(thread_id, width, value.clone());
        value
    }

    /// 保持しているエントリ総数
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_builder_runs_once_per_key() {
        let mut cache: RenderCache<Vec<String>> = RenderCache::new();
        let calls = Cell::new(0);
        let build = || {
            calls.set(calls.get() + 1);
            vec!["line".to_string()]
        };

        let first = cache.get_or_insert_with("T1", 80, build);
        let second = cache.get_or_insert_with("T1", 80, build);
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_widths_are_cached_independently() {
        let mut cache = RenderCache::new();
        cache.put("T1", 80, "wide");
        cache.put("T1", 40, "narrow");
        assert_eq!(cache.get("T1", 80), Some(&"wide"));
        assert_eq!(cache.get("T1", 40), Some(&"narrow"));
        assert_eq!(cache.get("T1", 60), None);
        assert_eq!(cache.get("T2", 80), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_empty_id_is_never_cached() {
        let mut cache = RenderCache::new();
        let calls = Cell::new(0);
        for _ in 0..3 {
            cache.get_or_insert_with("", 80, || {
                calls.set(calls.get() + 1);
                1
            });
        }
        assert_eq!(calls.get(), 3);
        assert!(cache.is_empty());
        assert_eq!(cache.get("", 80), None);
    }

    #[test]
    fn test_put_overwrites() {
        let mut cache = RenderCache::new();
        cache.put("T1", 80, 1);
        cache.put("T1", 80, 2);
        assert_eq!(cache.get("T1", 80), Some(&2));
        assert_eq!(cache.len(), 1);
        assert!(!cache.is_empty());
    }
}
