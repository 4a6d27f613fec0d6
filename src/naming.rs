//! Output naming policies for saved images.
//!
//! Every save targets `dir/stem.ext`. What happens when that file already
//! exists depends on the [`SavePolicy`]:
//!
//! | Policy | Existing `stem.ext` | Written to | Deletes first |
//! |---|---|---|---|
//! | `Replace` | yes | `stem.ext` | `stem.ext` |
//! | `Thumbnail` | yes | `stem-WxH.ext` | `stem-WxH.ext`, if present |
//! | `Timestamp` | yes | `stem-<unix secs>.ext` | nothing |
//! | any | no | `stem.ext` | nothing |
//!
//! `W×H` is the size the caller asked for in `resize`, not the computed
//! output size, so repeated thumbnail runs at the same request overwrite each
//! other.
//!
//! Planning is pure: the filesystem is consulted through an `exists`
//! callback so policies can be tested without touching disk.

use crate::types::Dimensions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How to name a saved file when the target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SavePolicy {
    /// Overwrite the target.
    #[default]
    Replace,
    /// Keep the target; write `stem-WxH.ext` next to it.
    Thumbnail,
    /// Keep the target; write `stem-<unix secs>.ext` next to it.
    Timestamp,
}

/// Where a save will land and whether something must be deleted first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub path: PathBuf,
    pub remove_existing: bool,
}

/// Split `target` into `(dir, stem)`.
///
/// A target without a file stem (e.g. `/`) gets the stem `image`.
fn split_target(target: &Path) -> (PathBuf, String) {
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    (dir, stem)
}

/// `dir/stem.ext` for `target` with its extension replaced by `extension`.
pub fn base_path(target: &Path, extension: &str) -> PathBuf {
    let (dir, stem) = split_target(target);
    dir.join(format!("{stem}.{extension}"))
}

/// `dir/stem-WxH.ext`.
pub fn thumbnail_path(target: &Path, extension: &str, crop: Dimensions) -> PathBuf {
    let (dir, stem) = split_target(target);
    dir.join(format!("{stem}-{}x{}.{extension}", crop.width, crop.height))
}

/// `dir/stem-<secs>.ext`.
pub fn timestamp_path(target: &Path, extension: &str, unix_secs: u64) -> PathBuf {
    let (dir, stem) = split_target(target);
    dir.join(format!("{stem}-{unix_secs}.{extension}"))
}

/// Decide the output path for a save.
///
/// # Arguments
/// * `target` - Requested path; only its directory and stem are used
/// * `extension` - Extension of the output format
/// * `policy` - Naming policy
/// * `crop` - Requested resize dimensions (thumbnail suffix)
/// * `unix_secs` - Current time (timestamp suffix)
/// * `exists` - Filesystem probe
pub fn plan_output(
    target: &Path,
    extension: &str,
    policy: SavePolicy,
    crop: Dimensions,
    unix_secs: u64,
    exists: impl Fn(&Path) -> bool,
) -> OutputPlan {
    let base = base_path(target, extension);
    if !exists(&base) {
        return OutputPlan {
            path: base,
            remove_existing: false,
        };
    }

    match policy {
        SavePolicy::Replace => OutputPlan {
            path: base,
            remove_existing: true,
        },
        SavePolicy::Thumbnail => {
            let path = thumbnail_path(target, extension, crop);
            let remove_existing = exists(&path);
            OutputPlan {
                path,
                remove_existing,
            }
        }
        SavePolicy::Timestamp => OutputPlan {
            path: timestamp_path(target, extension, unix_secs),
            remove_existing: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CROP: Dimensions = Dimensions {
        width: 360,
        height: 200,
    };

    fn plan(policy: SavePolicy, existing: &[&str]) -> OutputPlan {
        plan_output(
            Path::new("/img/photo.png"),
            "jpg",
            policy,
            CROP,
            1_700_000_000,
            |p| existing.iter().any(|e| Path::new(e) == p),
        )
    }

    #[test]
    fn base_path_swaps_extension() {
        assert_eq!(
            base_path(Path::new("/img/photo.png"), "webp"),
            PathBuf::from("/img/photo.webp")
        );
    }

    #[test]
    fn base_path_without_directory() {
        assert_eq!(base_path(Path::new("photo"), "bmp"), PathBuf::from("photo.bmp"));
    }

    #[test]
    fn missing_target_is_written_directly_for_every_policy() {
        for policy in [
            SavePolicy::Replace,
            SavePolicy::Thumbnail,
            SavePolicy::Timestamp,
        ] {
            assert_eq!(
                plan(policy, &[]),
                OutputPlan {
                    path: PathBuf::from("/img/photo.jpg"),
                    remove_existing: false,
                }
            );
        }
    }

    #[test]
    fn replace_deletes_existing_target() {
        assert_eq!(
            plan(SavePolicy::Replace, &["/img/photo.jpg"]),
            OutputPlan {
                path: PathBuf::from("/img/photo.jpg"),
                remove_existing: true,
            }
        );
    }

    #[test]
    fn thumbnail_suffixes_requested_size() {
        assert_eq!(
            plan(SavePolicy::Thumbnail, &["/img/photo.jpg"]),
            OutputPlan {
                path: PathBuf::from("/img/photo-360x200.jpg"),
                remove_existing: false,
            }
        );
    }

    #[test]
    fn thumbnail_deletes_previous_thumbnail() {
        let plan = plan(
            SavePolicy::Thumbnail,
            &["/img/photo.jpg", "/img/photo-360x200.jpg"],
        );
        assert_eq!(plan.path, PathBuf::from("/img/photo-360x200.jpg"));
        assert!(plan.remove_existing);
    }

    #[test]
    fn timestamp_never_deletes() {
        let plan = plan(SavePolicy::Timestamp, &["/img/photo.jpg"]);
        assert_eq!(plan.path, PathBuf::from("/img/photo-1700000000.jpg"));
        assert!(!plan.remove_existing);
    }

    #[test]
    fn policy_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: SavePolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"thumbnail\"").unwrap();
        assert_eq!(w.policy, SavePolicy::Thumbnail);
    }
}
