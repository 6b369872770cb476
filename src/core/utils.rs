use std::{io::Write, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use super::Error;

pub fn write_json_file<T: Serialize, P: AsRef<Path>>(data: &T, path: P) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json_file<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, Error> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Parses the decimal suffix that follows `base` in `name`.
pub fn numeric_suffix(name: &str, base: &str) -> Option<u64> {
    let suffix = name.strip_prefix(base)?;
    if suffix.is_empty() || !suffix.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_suffix_needs_digits_only() {
        assert_eq!(numeric_suffix("Foo16", "Foo"), Some(16));
        assert_eq!(numeric_suffix("Foo0", "Foo"), Some(0));
        assert_eq!(numeric_suffix("Foo", "Foo"), None);
        assert_eq!(numeric_suffix("FooNegative", "Foo"), None);
        assert_eq!(numeric_suffix("Foo-1", "Foo"), None);
        assert_eq!(numeric_suffix("Foo1a", "Foo"), None);
        assert_eq!(numeric_suffix("Bar1", "Foo"), None);
    }
}
