use procmaps::MapEntry;

use super::{Result, Session};

/// One pattern hit, as an absolute target address plus the backing name of
/// the region it landed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub addr: usize,
    pub region: String,
}

/// Outcome of a full-space search. Regions that could not be read are
/// collected instead of failing the search.
#[derive(Debug, Default)]
pub struct SearchReport {
    pub matches: Vec<Match>,
    pub skipped: Vec<MapEntry>,
}

/// Brute-force scan for every occurrence of `needle`, overlapping included:
/// a first-byte pre-check, then a full compare. An empty needle matches
/// nothing.
pub fn find_pattern<'a>(haystack: &'a [u8], needle: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    let end = (haystack.len() + 1).saturating_sub(needle.len());
    (0..end)
        .filter(move |&i| !needle.is_empty() && haystack[i] == needle[0] && haystack[i..i + needle.len()] == *needle)
}

impl Session {
    /// Searches every region (optionally only those whose name contains
    /// `filter`) for a literal byte pattern. Unreadable regions are skipped
    /// and reported, not fatal.
    pub fn search(&self, pattern: &[u8], filter: Option<&str>) -> Result<SearchReport> {
        self.ensure_attached()?;
        let mut report = SearchReport::default();
        for region in self.process().maps() {
            if filter.is_some_and(|f| !region.name().contains(f)) {
                continue;
            }
            let buf = match self.read(region.begin(), region.size()) {
                Ok(buf) => buf,
                Err(_) => {
                    report.skipped.push(region.clone());
                    continue;
                }
            };
            for offset in find_pattern(&buf, pattern) {
                report.matches.push(Match {
                    addr: region.begin() + offset,
                    region: region.name().to_string(),
                });
            }
        }
        Ok(report)
    }
}

#[test]
fn test_find_pattern_at_bounds() {
    let haystack = b"abcdefab";
    let hits = find_pattern(haystack, b"ab").collect::<Vec<_>>();
    assert_eq!(hits, vec![0, 6]);
}

#[test]
fn test_find_pattern_overlapping() {
    let hits = find_pattern(b"aaaa", b"aa").collect::<Vec<_>>();
    assert_eq!(hits, vec![0, 1, 2]);
}

#[test]
fn test_find_pattern_absent() {
    assert_eq!(find_pattern(b"abcdef", b"xy").count(), 0);
}

#[test]
fn test_find_pattern_degenerate() {
    assert_eq!(find_pattern(b"ab", b"abcd").count(), 0);
    assert_eq!(find_pattern(b"", b"a").count(), 0);
    assert_eq!(find_pattern(b"abc", b"").count(), 0);
}

#[test]
fn test_find_pattern_whole_buffer() {
    assert_eq!(find_pattern(b"abc", b"abc").collect::<Vec<_>>(), vec![0]);
}
