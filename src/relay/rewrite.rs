//! Cache path → public URL rewriting.
//!
//! The backend answers a file-producing `process` request with the absolute
//! path of the produced file inside its cache directory. Callers can only
//! reach that file through the URL prefix the web server maps onto the same
//! directory, so the relay swaps one for the other:
//!
//! ```text
//! /var/cache/vt_server/ab/cd.wav  →  /vt_server_audio/ab/cd.wav
//! ```

use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::config::{CacheConfig, RewriteStrategy};
use crate::relay::response::RelayResponse;

#[derive(Debug, Clone)]
pub struct PathRewriter {
    cache_dir: PathBuf,
    cache_dir_text: String,
    public_prefix: String,
    strategy: RewriteStrategy,
}

impl PathRewriter {
    pub fn new(cache: &CacheConfig) -> Self {
        Self {
            cache_dir: PathBuf::from(&cache.directory_path),
            cache_dir_text: cache.directory_path.clone(),
            public_prefix: cache.public_url_prefix.clone(),
            strategy: cache.rewrite_strategy,
        }
    }

    pub fn strategy(&self) -> RewriteStrategy {
        self.strategy
    }

    /// The public URL for `details`, or `None` when it is not a cache path.
    pub fn rewrite(&self, details: &str) -> Option<String> {
        match self.strategy {
            RewriteStrategy::Prefix => self.rewrite_prefix(details),
            RewriteStrategy::Substring => self.rewrite_substring(details),
        }
    }

    /// Rewrite `details` in place when the reply is a success carrying a
    /// string. Returns whether anything changed.
    pub fn apply(&self, response: &mut RelayResponse) -> bool {
        if !response.is_ok() {
            return false;
        }
        let url = match &response.details {
            Value::String(details) => self.rewrite(details),
            _ => None,
        };
        match url {
            Some(url) => {
                response.details = Value::String(url);
                true
            }
            None => false,
        }
    }

    fn rewrite_prefix(&self, details: &str) -> Option<String> {
        let rest = Path::new(details).strip_prefix(&self.cache_dir).ok()?;

        let mut url = String::from("/");
        url.push_str(self.public_prefix.trim_matches('/'));
        for component in rest.components() {
            match component {
                Component::Normal(part) => {
                    url.push('/');
                    url.push_str(part.to_str()?);
                }
                // `..` or a second root would escape the cache directory.
                _ => return None,
            }
        }
        Some(url)
    }

    fn rewrite_substring(&self, details: &str) -> Option<String> {
        if self.cache_dir_text.is_empty() || !details.contains(&self.cache_dir_text) {
            return None;
        }
        Some(format!(
            "/{}",
            details.replace(&self.cache_dir_text, &self.public_prefix)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rewriter(strategy: RewriteStrategy) -> PathRewriter {
        PathRewriter::new(&CacheConfig {
            directory_path: "/var/cache/vt_server".into(),
            public_url_prefix: "vt_server_audio".into(),
            rewrite_strategy: strategy,
        })
    }

    #[test]
    fn both_strategies_map_cache_paths() {
        for strategy in [RewriteStrategy::Prefix, RewriteStrategy::Substring] {
            assert_eq!(
                rewriter(strategy).rewrite("/var/cache/vt_server/x/y.wav").as_deref(),
                Some("/vt_server_audio/x/y.wav"),
                "{strategy:?}"
            );
        }
    }

    #[test]
    fn rewriting_twice_is_a_no_op() {
        for strategy in [RewriteStrategy::Prefix, RewriteStrategy::Substring] {
            let rewriter = rewriter(strategy);
            let once = rewriter.rewrite("/var/cache/vt_server/x/y.wav").unwrap();
            assert_eq!(rewriter.rewrite(&once), None, "{strategy:?}");
        }
    }

    #[test]
    fn prefix_matches_whole_components_only() {
        let rewriter = rewriter(RewriteStrategy::Prefix);
        assert_eq!(rewriter.rewrite("/var/cache/vt_server2/x.wav"), None);
        assert_eq!(rewriter.rewrite("/tmp/var/cache/vt_server/x.wav"), None);
        assert_eq!(rewriter.rewrite("wait"), None);
    }

    #[test]
    fn substring_rewrites_anywhere() {
        let rewriter = rewriter(RewriteStrategy::Substring);
        assert_eq!(
            rewriter.rewrite("/tmp/var/cache/vt_server/x.wav").as_deref(),
            Some("//tmpvt_server_audio/x.wav")
        );
        assert_eq!(rewriter.rewrite("wait"), None);
    }

    #[test]
    fn prefix_refuses_to_escape_the_cache() {
        let rewriter = rewriter(RewriteStrategy::Prefix);
        assert_eq!(rewriter.rewrite("/var/cache/vt_server/../../etc/passwd"), None);
    }

    #[test]
    fn prefix_normalizes_slashes() {
        let rewriter = PathRewriter::new(&CacheConfig {
            directory_path: "/var/cache/vt_server/".into(),
            public_url_prefix: "/audio/".into(),
            rewrite_strategy: RewriteStrategy::Prefix,
        });
        assert_eq!(
            rewriter.rewrite("/var/cache/vt_server//a/./b.flac").as_deref(),
            Some("/audio/a/b.flac")
        );
    }

    #[test]
    fn apply_only_touches_successful_string_details() {
        let rewriter = rewriter(RewriteStrategy::Prefix);

        let mut ok = RelayResponse::ok("/var/cache/vt_server/a.wav");
        assert!(rewriter.apply(&mut ok));
        assert_eq!(ok.details, json!("/vt_server_audio/a.wav"));

        let mut failed = RelayResponse::error("/var/cache/vt_server/a.wav");
        assert!(!rewriter.apply(&mut failed));
        assert_eq!(failed.details, json!("/var/cache/vt_server/a.wav"));

        let mut structured = RelayResponse::ok(json!({"path": "/var/cache/vt_server/a.wav"}));
        assert!(!rewriter.apply(&mut structured));
    }
}
