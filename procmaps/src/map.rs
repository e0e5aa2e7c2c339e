/// One parsed line of a `/proc/<pid>/maps` listing.
///
/// Parsing is best effort per field: anything missing or malformed is left at
/// its zero/empty default instead of failing the whole line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEntry {
    begin: usize,
    end: usize,
    permissions: String,
    offset: usize,
    device: String,
    inode: usize,
    name: String,
}

impl MapEntry {
    /// Fields in listing order: `begin-end perms offset dev inode name`,
    /// where the trailing name is the rest of the line and may contain spaces.
    pub fn parse(line: &str) -> Self {
        let mut entry = Self::default();
        let mut split = line.trim_end().splitn(6, ' ');
        if let Some(range) = split.next() {
            let mut range = range.split('-');
            entry.begin = range.next().and_then(|s| usize::from_str_radix(s, 16).ok()).unwrap_or(0);
            entry.end = range.next().and_then(|s| usize::from_str_radix(s, 16).ok()).unwrap_or(0);
        }
        if let Some(perms) = split.next() {
            entry.permissions = perms.to_string();
        }
        if let Some(offset) = split.next() {
            entry.offset = usize::from_str_radix(offset, 16).unwrap_or(0);
        }
        if let Some(dev) = split.next() {
            entry.device = dev.to_string();
        }
        if let Some(inode) = split.next() {
            entry.inode = inode.parse().unwrap_or(0);
        }
        if let Some(name) = split.next() {
            entry.name = name.trim_start().to_string();
        }
        entry
    }

    #[inline]
    pub fn begin(&self) -> usize {
        self.begin
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    #[inline]
    pub fn permissions(&self) -> &str {
        &self.permissions
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[inline]
    pub fn inode(&self) -> usize {
        self.inode
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_executable(&self) -> bool {
        self.permissions.contains('x')
    }

    /// Half-open range test: `begin <= addr < end`.
    #[inline]
    pub fn contains(&self, addr: usize) -> bool {
        self.begin <= addr && addr < self.end
    }
}

impl std::fmt::Display for MapEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:x}-{:x} {} {:08x} {} {} {}",
            self.begin, self.end, self.permissions, self.offset, self.device, self.inode, self.name
        )
    }
}

#[test]
fn test_parse_library_line() {
    let map = MapEntry::parse("400000-401000 r-xp 00000000 08:01 1234  /lib/libfoo.so");
    assert_eq!(map.begin(), 0x400000);
    assert_eq!(map.end(), 0x401000);
    assert_eq!(map.size(), 0x1000);
    assert_eq!(map.permissions(), "r-xp");
    assert!(map.is_executable());
    assert_eq!(map.offset(), 0);
    assert_eq!(map.device(), "08:01");
    assert_eq!(map.inode(), 1234);
    assert_eq!(map.name(), "/lib/libfoo.so");
}

#[test]
fn test_parse_anonymous_line() {
    let map = MapEntry::parse("b6f00000-b6f21000 rw-p 00000000 00:00 0");
    assert_eq!(map.begin(), 0xb6f00000);
    assert_eq!(map.end(), 0xb6f21000);
    assert_eq!(map.permissions(), "rw-p");
    assert!(!map.is_executable());
    assert_eq!(map.inode(), 0);
    assert_eq!(map.name(), "");
}

#[test]
fn test_parse_name_with_spaces() {
    let map = MapEntry::parse("8000-9000 r-xp 00000000 b3:17 42  /data/app with space/libx.so");
    assert_eq!(map.name(), "/data/app with space/libx.so");
}

#[test]
fn test_parse_pseudo_region() {
    let map = MapEntry::parse("bef5d000-bef7e000 rw-p 00000000 00:00 0          [stack]");
    assert_eq!(map.name(), "[stack]");
    assert_eq!(map.size(), 0x21000);
}

#[test]
fn test_parse_malformed_defaults() {
    let map = MapEntry::parse("garbage");
    assert_eq!(map.begin(), 0);
    assert_eq!(map.end(), 0);
    assert_eq!(map.size(), 0);
    assert_eq!(map.permissions(), "");
    assert_eq!(map.name(), "");

    let map = MapEntry::parse("1000-zzzz r--p");
    assert_eq!(map.begin(), 0x1000);
    assert_eq!(map.end(), 0);
    assert_eq!(map.permissions(), "r--p");
}

#[test]
fn test_contains_half_open() {
    let map = MapEntry::parse("1000-2000 rw-p 00000000 00:00 0");
    assert!(map.contains(0x1000));
    assert!(map.contains(0x1fff));
    assert!(!map.contains(0x2000));
    assert!(!map.contains(0xfff));
}

#[test]
fn test_display_round_trip() {
    let line = "400000-401000 r-xp 00000000 08:01 1234 /lib/libfoo.so";
    assert_eq!(MapEntry::parse(line).to_string(), line);
}
