use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use walkdir::WalkDir;

static IMAGE_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(png|jpe?g|webp|avif|gif|svg)$").expect("static regex"));

pub const PUBLIC_PREFIX: &str = "/hero";

/// List hero images as public paths, sorted by file name. A missing
/// directory yields an empty list.
pub fn list_hero_images(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if IMAGE_EXT_RE.is_match(&name) {
            images.push(format!("{}/{}", PUBLIC_PREFIX, name));
        }
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_lists_only_images_sorted() -> Result<()> {
        let dir = tempdir()?;
        for name in ["b.JPG", "a.png", "notes.txt", "c.webp", "d.svg"] {
            fs::write(dir.path().join(name), b"x")?;
        }
        fs::create_dir(dir.path().join("nested.png"))?;

        assert_eq!(
            list_hero_images(dir.path())?,
            vec!["/hero/a.png", "/hero/b.JPG", "/hero/c.webp", "/hero/d.svg"]
        );
        Ok(())
    }

    #[test]
    fn test_missing_dir_is_empty() -> Result<()> {
        let dir = tempdir()?;
        assert!(list_hero_images(&dir.path().join("nope"))?.is_empty());
        Ok(())
    }
}
