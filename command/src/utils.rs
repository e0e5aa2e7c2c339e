use std::{fs, io, os::unix::fs::PermissionsExt, path::Path};

/// Parses a hex string into bytes; odd-length or non-hex input is rejected.
pub fn parse_pattern(value: &str) -> Result<Vec<u8>, String> {
    if value.is_empty() || value.len() % 2 != 0 {
        return Err(format!("pattern must be a non-empty even-length hex string: {value}"));
    }
    value
        .as_bytes()
        .chunks_exact(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .map_err(|e| e.to_string())
                .and_then(|s| u8::from_str_radix(s, 16).map_err(|e| e.to_string()))
        })
        .collect()
}

/// 16-byte rows: address, hex bytes, printable ASCII.
pub fn hexdump(base: usize, bytes: &[u8]) {
    for (i, row) in bytes.chunks(16).enumerate() {
        let hex = row.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ");
        let ascii = row
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect::<String>();
        println!("{:08x}  |  {hex:<47}  |  {ascii}", base + i * 16);
    }
}

/// Persists a dumped region. The tool runs as root; the mode is loosened so
/// a normal user can pull the file afterwards.
pub fn write_dump(path: &Path, bytes: &[u8]) -> io::Result<()> {
    fs::write(path, bytes)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[test]
fn test_parse_pattern_ok() {
    assert_eq!(parse_pattern("deadBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(parse_pattern("00").unwrap(), vec![0]);
}

#[test]
fn test_parse_pattern_rejects_odd_length() {
    assert!(parse_pattern("abc").is_err());
    assert!(parse_pattern("").is_err());
}

#[test]
fn test_parse_pattern_rejects_non_hex() {
    assert!(parse_pattern("zz00").is_err());
    assert!(parse_pattern("12 4").is_err());
}
