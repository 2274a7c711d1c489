use crate::models::{FileEntry, RenamePlan, SubstitutionScope};
use camino::Utf8PathBuf;

/// Replace the first occurrence of `search` in `haystack` with `replace`.
///
/// The match is literal. When `search` is empty or absent the input comes
/// back unchanged.
pub fn replace_first(haystack: &str, search: &str, replace: &str) -> String {
    if search.is_empty() {
        return haystack.to_string();
    }
    haystack.replacen(search, replace, 1)
}

/// Compute where `entry` goes for the given patterns.
///
/// With [`SubstitutionScope::FileName`] only the last path component is
/// rewritten, so the destination always stays next to the source. With
/// [`SubstitutionScope::FullPath`] the whole path string is rewritten and a
/// match in a parent directory wins over one in the file name.
pub fn plan_destination(
    entry: &FileEntry,
    search: &str,
    replace: &str,
    scope: SubstitutionScope,
) -> RenamePlan {
    let original = entry.path();

    let destination = match scope {
        SubstitutionScope::FullPath => {
            Utf8PathBuf::from(replace_first(original.as_str(), search, replace))
        }
        SubstitutionScope::FileName => match original.file_name() {
            Some(name) => original.with_file_name(replace_first(name, search, replace)),
            None => original.to_path_buf(),
        },
    };

    RenamePlan {
        original: entry.clone(),
        destination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_first_only_first_occurrence() {
        assert_eq!(replace_first("IMG_IMG.jpg", "IMG", "PHOTO"), "PHOTO_IMG.jpg");
        assert_eq!(replace_first("DSC_001.jpg", "IMG", "PHOTO"), "DSC_001.jpg");
        assert_eq!(replace_first("abc", "", "x"), "abc");
    }

    #[test]
    fn test_replace_first_is_literal() {
        // Regex metacharacters carry no special meaning
        assert_eq!(replace_first("a.b.jpg", ".", "_"), "a_b.jpg");
        assert_eq!(replace_first("IMG(1).jpg", "(1)", "$1"), "IMG$1.jpg");
    }

    #[test]
    fn test_plan_file_name_scope() {
        let entry = FileEntry::new("/photos/IMG/IMG_001.jpg");
        let plan = plan_destination(&entry, "IMG", "PHOTO", SubstitutionScope::FileName);

        assert_eq!(plan.destination, Utf8PathBuf::from("/photos/IMG/PHOTO_001.jpg"));
        assert!(!plan.is_unchanged());
    }

    #[test]
    fn test_plan_full_path_scope_hits_parent_first() {
        let entry = FileEntry::new("/photos/IMG/IMG_001.jpg");
        let plan = plan_destination(&entry, "IMG", "PHOTO", SubstitutionScope::FullPath);

        assert_eq!(plan.destination, Utf8PathBuf::from("/photos/PHOTO/IMG_001.jpg"));
    }

    #[test]
    fn test_plan_without_match_is_unchanged() {
        let entry = FileEntry::new("/photos/DSC_001.jpg");
        let plan = plan_destination(&entry, "IMG", "PHOTO", SubstitutionScope::FileName);

        assert!(plan.is_unchanged());
        assert_eq!(plan.destination, entry.path());
    }
}
