use crate::store::{Shard, Upload};

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Binary-scaled size with two truncated decimals, `--` when unknown.
pub fn format_bytes(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return "--".to_string();
    };
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes;
    let mut unit = 0;
    while size >= 1024 && unit < UNITS.len() - 1 {
        size /= 1024;
        unit += 1;
    }
    if unit == 0 {
        return format!("{bytes} B");
    }

    let denominator = 1024_u128.pow(unit as u32);
    let scaled = u128::from(bytes) * 100 / denominator;
    format!("{}.{:02} {}", scaled / 100, scaled % 100, UNITS[unit])
}

/// Sum of known shard sizes, or `None` when no shard reports one.
pub fn sum_shard_sizes(shards: &[Shard]) -> Option<u64> {
    shards
        .iter()
        .filter_map(|shard| shard.size)
        .fold(None, |total, size| Some(total.unwrap_or(0) + size))
}

pub fn upload_size(upload: &Upload) -> Option<u64> {
    upload.size.or_else(|| sum_shard_sizes(&upload.shards))
}

/// Parses a numeric prompt answer, falling back on empty or non-numeric input.
pub fn parse_number_input(raw: &str, fallback: usize, min: usize, max: usize) -> usize {
    let raw = raw.trim();
    if raw.is_empty() {
        return fallback;
    }
    match raw.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => {
            let floored = parsed.floor();
            if floored <= min as f64 {
                min
            } else if floored >= max as f64 {
                max
            } else {
                floored as usize
            }
        }
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_scales_and_truncates() {
        assert_eq!(format_bytes(None), "--");
        assert_eq!(format_bytes(Some(0)), "0 B");
        assert_eq!(format_bytes(Some(1023)), "1023 B");
        assert_eq!(format_bytes(Some(1024)), "1.00 KB");
        assert_eq!(format_bytes(Some(1535)), "1.49 KB");
        assert_eq!(format_bytes(Some(5 * 1024 * 1024 + 1)), "5.00 MB");
        assert_eq!(format_bytes(Some(3 * 1024_u64.pow(5))), "3072.00 TB");
    }

    #[test]
    fn parse_number_input_floors_clamps_and_falls_back() {
        assert_eq!(parse_number_input("", 50, 1, 500), 50);
        assert_eq!(parse_number_input("  ", 50, 1, 500), 50);
        assert_eq!(parse_number_input("abc", 50, 1, 500), 50);
        assert_eq!(parse_number_input("12.9", 50, 1, 500), 12);
        assert_eq!(parse_number_input("0", 3, 1, 10), 1);
        assert_eq!(parse_number_input("-4", 3, 1, 10), 1);
        assert_eq!(parse_number_input("99", 3, 1, 10), 10);
        assert_eq!(parse_number_input("1e3", 50, 1, 500), 500);
    }

    #[test]
    fn upload_size_falls_back_to_shards() {
        let shard = |size| Shard {
            cid: "bag".to_string(),
            size,
            digest: None,
        };
        let mut upload = Upload {
            root: "bafy".to_string(),
            shards: vec![shard(Some(10)), shard(None), shard(Some(5))],
            size: None,
            inserted_at: None,
        };
        assert_eq!(upload_size(&upload), Some(15));

        upload.shards = vec![shard(None)];
        assert_eq!(upload_size(&upload), None);

        upload.size = Some(7);
        assert_eq!(upload_size(&upload), Some(7));
    }
}
