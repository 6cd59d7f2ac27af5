use std::{future::Future, io::ErrorKind, path::PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::ContentError;

const MAX_SLUG_LEN: usize = 128;

/// URL-safe content identifier. Only ASCII alphanumerics, `-` and `_`, so it
/// can never name anything outside the content root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SLUG_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if valid {
            Ok(Slug(raw.to_string()))
        } else {
            Err(ContentError::InvalidSlug {
                slug: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where raw post text comes from.
pub trait ContentStore {
    fn retrieve(&self, slug: &Slug) -> impl Future<Output = Result<String, ContentError>> + Send;

    /// Every slug the store can serve.
    fn slugs(&self) -> impl Future<Output = Result<Vec<Slug>, ContentError>> + Send;
}

/// Markdown files in a directory, one `<slug>.md` per post.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsContentStore { root: root.into() }
    }
}

impl ContentStore for FsContentStore {
    async fn retrieve(&self, slug: &Slug) -> Result<String, ContentError> {
        let path = self.root.join(format!("{}.md", slug.as_str()));
        let not_found = || ContentError::NotFound {
            slug: slug.to_string(),
        };

        // `x.md` can be a directory
        match fs::metadata(&path).await {
            Ok(meta) if !meta.is_file() => return Err(not_found()),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found()),
            _ => {}
        }

        match fs::read(&path).await {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Ok(text),
                Err(e) => {
                    warn!("Post {} is not valid UTF-8; replacing invalid bytes", slug);
                    Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(ContentError::Io(e)),
        }
    }

    async fn slugs(&self) -> Result<Vec<Slug>, ContentError> {
        let mut slugs = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_file = entry.file_type().await.map_or(false, |t| t.is_file());
            if is_file && path.extension().map_or(false, |ext| ext == "md") {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                match Slug::parse(stem) {
                    Ok(slug) => slugs.push(slug),
                    Err(_) => debug!("Skipping post with unusable file name: {}", path.display()),
                }
            }
        }
        slugs.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(slugs)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_path_traversal_and_separators() {
        for bad in ["", "..", "../secret", "a/b", "a\\b", "post.md", "sp ace"] {
            assert!(Slug::parse(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(Slug::parse(&"a".repeat(129)).is_err());
    }

    #[test]
    fn accepts_url_safe_slugs() {
        let slug = Slug::parse("study-in-finland_2025").unwrap();
        assert_eq!(slug.as_str(), "study-in-finland_2025");
    }

    #[tokio::test]
    async fn fs_store_reports_missing_file_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.md"), "---\ntitle: Hi\n---\nBody").await.unwrap();
        fs::write(dir.path().join("bad name.md"), "ignored").await.unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").await.unwrap();

        let store = FsContentStore::new(dir.path());
        let text = store.retrieve(&Slug::parse("hello").unwrap()).await.unwrap();
        assert!(text.contains("title: Hi"));

        let err = store.retrieve(&Slug::parse("missing").unwrap()).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));

        let slugs = store.slugs().await.unwrap();
        assert_eq!(slugs, vec![Slug::parse("hello").unwrap()]);
    }

    #[tokio::test]
    async fn invalid_utf8_post_is_decoded_lossily() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.md"), b"---\ntitle: Caf\xff\xfe\n---\nBody".as_slice())
            .await
            .unwrap();

        let store = FsContentStore::new(dir.path());
        let text = store.retrieve(&Slug::parse("bad").unwrap()).await.unwrap();
        assert!(text.starts_with("---\ntitle: Caf\u{fffd}"));
        assert!(text.ends_with("Body"));
    }

    #[tokio::test]
    async fn markdown_named_directory_is_not_a_post() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("drafts.md")).await.unwrap();

        let store = FsContentStore::new(dir.path());
        assert!(store.slugs().await.unwrap().is_empty());
        let err = store.retrieve(&Slug::parse("drafts").unwrap()).await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }));
    }
}
